//! Quick-scan integration tests
//!
//! Builds a real git repository with git2 and verifies commit-window
//! correctness: smells are tagged to the commit that touched the file, and
//! clean commits contribute nothing.

use git2::Repository;
use smellscan::scan::{output, ProjectAnalyzer};
use std::fs;
use std::path::Path;

const SMELLY_SOURCE: &str = "\
import pandas as pd

def load(df):
    a = df['x'][0]
    b = df['y'][1]
    return a, b
";

const CLEAN_SOURCE: &str = "\
def add(a, b):
    return a + b
";

fn init_repo(dir: &Path) -> Repository {
    let repo = Repository::init(dir).expect("init repo");
    {
        let mut config = repo.config().expect("config");
        config.set_str("user.name", "Test").expect("name");
        config
            .set_str("user.email", "test@example.com")
            .expect("email");
    }
    repo.set_head("refs/heads/main").expect("set head");
    repo
}

fn commit_all(repo: &Repository, message: &str) -> String {
    let mut index = repo.index().expect("index");
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .expect("add");
    index.write().expect("write index");
    let tree_id = index.write_tree().expect("tree");
    let tree = repo.find_tree(tree_id).expect("find tree");
    let signature = repo.signature().expect("signature");
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        message,
        &tree,
        &parents,
    )
    .expect("commit")
    .to_string()
}

#[test]
fn quick_scan_tags_smells_to_their_commits() {
    let repo_dir = tempfile::tempdir().expect("repo dir");
    let out_dir = tempfile::tempdir().expect("out dir");
    let repo = init_repo(repo_dir.path());

    // Commit 1 introduces two smells, commit 2 reintroduces the same smells
    // in a different file, commit 3 adds a clean file.
    fs::write(repo_dir.path().join("first.py"), SMELLY_SOURCE).unwrap();
    let hash_one = commit_all(&repo, "introduce smells");

    fs::write(repo_dir.path().join("second.py"), SMELLY_SOURCE).unwrap();
    let hash_two = commit_all(&repo, "reintroduce smells elsewhere");

    fs::write(repo_dir.path().join("clean.py"), CLEAN_SOURCE).unwrap();
    let hash_three = commit_all(&repo, "add clean file");

    let analyzer = ProjectAnalyzer::new(out_dir.path()).expect("analyzer");
    let total = analyzer
        .quick_scan(repo_dir.path(), 3)
        .expect("quick scan should succeed");
    assert!(total >= 4, "expected smells from two commits, got {total}");

    let results = output::read_results(
        &out_dir
            .path()
            .join("output/project_details/quickscan_results.csv"),
    )
    .expect("quickscan results");

    let tagged = |hash: &str| {
        results
            .iter()
            .filter(|r| {
                r.commit
                    .as_ref()
                    .is_some_and(|c| c.commit_hash == hash)
            })
            .count()
    };

    assert!(tagged(&hash_one) >= 2, "commit 1 should carry its smells");
    assert!(tagged(&hash_two) >= 2, "commit 2 should carry its smells");
    assert_eq!(tagged(&hash_three), 0, "clean commit must stay clean");

    // Every record carries full commit metadata and a repo-relative path.
    for record in &results {
        let commit = record.commit.as_ref().expect("commit metadata");
        assert!(!commit.commit_author.is_empty());
        assert!(!commit.commit_date.is_empty());
        assert!(commit.relative_file.ends_with(".py"));
        assert_eq!(commit.project_path, repo_dir.path().display().to_string());
    }

    // The merge step produced an overview with the same records.
    let overview = output::read_results(&out_dir.path().join("output/overview.csv"))
        .expect("overview");
    assert_eq!(overview.len(), results.len());
}

#[test]
fn quick_scan_fails_without_primary_branch() {
    let repo_dir = tempfile::tempdir().expect("repo dir");
    let out_dir = tempfile::tempdir().expect("out dir");
    let repo = Repository::init(repo_dir.path()).expect("init repo");

    // A branch that is neither main nor master.
    repo.set_head("refs/heads/trunk").expect("set head");
    fs::write(repo_dir.path().join("a.py"), CLEAN_SOURCE).unwrap();
    {
        let mut config = repo.config().expect("config");
        config.set_str("user.name", "Test").expect("name");
        config
            .set_str("user.email", "test@example.com")
            .expect("email");
    }
    let mut index = repo.index().expect("index");
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .expect("add");
    index.write().expect("write index");
    let tree_id = index.write_tree().expect("tree");
    let tree = repo.find_tree(tree_id).expect("find tree");
    let signature = repo.signature().expect("signature");
    repo.commit(Some("HEAD"), &signature, &signature, "init", &tree, &[])
        .expect("commit");

    let analyzer = ProjectAnalyzer::new(out_dir.path()).expect("analyzer");
    let err = analyzer
        .quick_scan(repo_dir.path(), 3)
        .expect_err("must fail early without main/master");
    assert!(err.to_string().contains("branch"));
}
