//! Execution log for resumable batch scans
//!
//! An append-only text file with one project identifier per completed
//! project. Its presence and last entry define the resume point; entries may
//! land out of directory-enumeration order under parallel completion, so
//! resume compares identifiers, not positions.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct ExecutionLog {
    path: PathBuf,
}

impl ExecutionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create or truncate the log, starting a fresh (non-resuming) run.
    pub fn initialize(&self) -> Result<()> {
        File::create(&self.path)
            .with_context(|| format!("failed to initialize execution log {}", self.path.display()))?;
        Ok(())
    }

    /// Append one completed project identifier.
    ///
    /// Callers in parallel mode must hold the shared batch lock around the
    /// whole read-modify-write, not just this call.
    pub fn append(&self, project: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open execution log {}", self.path.display()))?;
        writeln!(file, "{project}")
            .with_context(|| format!("failed to append to execution log {}", self.path.display()))?;
        Ok(())
    }

    /// The last logged project identifier, if any.
    pub fn last_entry(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .next_back()
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_append_last() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = ExecutionLog::new(dir.path().join("execution_log.txt"));

        assert_eq!(log.last_entry(), None);

        log.initialize().unwrap();
        log.append("project_a").unwrap();
        log.append("project_b").unwrap();
        assert_eq!(log.last_entry(), Some("project_b".to_string()));

        // A fresh run truncates previous entries.
        log.initialize().unwrap();
        assert_eq!(log.last_entry(), None);
    }
}
