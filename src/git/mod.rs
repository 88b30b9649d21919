//! Git commit-window extraction using libgit2
//!
//! Supplies the quick-scan mode with the last N commits on a repository's
//! primary branch, each carrying its changed-file set (added/modified,
//! filtered to `.py`) and basic commit metadata.

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use git2::{BranchType, Delta, Repository};
use std::path::Path;
use tracing::debug;

/// One commit in the scanned window, most recent first.
#[derive(Debug, Clone)]
pub struct CommitEntry {
    /// 1-based position inside the window (1 = newest)
    pub index: usize,
    /// Full commit hash
    pub hash: String,
    /// Commit timestamp (ISO 8601, UTC)
    pub date: String,
    /// Author as `Name <email>`
    pub author: String,
    /// Commit message (first line)
    pub message: String,
    /// Added/modified `.py` files, relative to the repository root
    pub changed_files: Vec<String>,
}

/// Resolve the primary branch: prefer `main`, fall back to `master`.
///
/// A repository with neither is an explicit early error — silently scanning
/// zero commits would masquerade as a clean result.
pub fn primary_branch(repo: &Repository) -> Result<String> {
    for name in ["main", "master"] {
        if repo.find_branch(name, BranchType::Local).is_ok() {
            return Ok(name.to_string());
        }
    }
    bail!("repository has no 'main' or 'master' branch");
}

/// The last `depth` commits on the primary branch with their changed-file
/// sets. Each commit is diffed against its first parent, or against the
/// empty tree for a root commit.
pub fn commit_window(repo_path: &Path, depth: usize) -> Result<Vec<CommitEntry>> {
    let repo = Repository::open(repo_path)
        .with_context(|| format!("failed to open git repository at {}", repo_path.display()))?;

    let branch_name = primary_branch(&repo)?;
    let branch = repo
        .find_branch(&branch_name, BranchType::Local)
        .with_context(|| format!("failed to resolve branch '{branch_name}'"))?;
    let head = branch
        .get()
        .target()
        .with_context(|| format!("branch '{branch_name}' has no target commit"))?;
    debug!(branch = %branch_name, "resolved primary branch");

    let mut revwalk = repo.revwalk()?;
    revwalk.push(head)?;

    let mut entries = Vec::new();
    for oid in revwalk.take(depth) {
        let oid = oid?;
        let commit = repo.find_commit(oid)?;

        let tree = commit.tree()?;
        let parent_tree = commit
            .parent(0)
            .ok()
            .map(|parent| parent.tree())
            .transpose()?;
        let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

        let mut changed_files = Vec::new();
        for delta in diff.deltas() {
            if !matches!(delta.status(), Delta::Added | Delta::Modified) {
                continue;
            }
            let path = delta.new_file().path().or_else(|| delta.old_file().path());
            if let Some(path) = path {
                if path.extension().and_then(|e| e.to_str()) == Some("py") {
                    changed_files.push(path.to_string_lossy().to_string());
                }
            }
        }

        let author = commit.author();
        entries.push(CommitEntry {
            index: entries.len() + 1,
            hash: commit.id().to_string(),
            date: format_commit_time(commit.time().seconds()),
            author: format!(
                "{} <{}>",
                author.name().unwrap_or("Unknown"),
                author.email().unwrap_or("")
            ),
            message: commit
                .message()
                .unwrap_or("")
                .lines()
                .next()
                .unwrap_or("")
                .trim()
                .to_string(),
            changed_files,
        });
    }

    Ok(entries)
}

fn format_commit_time(seconds: i64) -> String {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_default()
}
