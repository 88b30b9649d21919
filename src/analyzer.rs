//! One-shot analysis API
//!
//! Analyzes an arbitrary set of files and directories without touching the
//! persistent output layout, returning an in-memory summary. Unlike a project
//! scan, an input that matches no Python files is not an error here — the
//! summary is simply empty.

use crate::inspector::Inspector;
use crate::models::AnalysisSummary;
use crate::scan::files;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct SmellAnalyzer {
    inspector: Inspector,
}

impl SmellAnalyzer {
    pub fn new() -> Self {
        Self {
            inspector: Inspector::new(),
        }
    }

    /// Analyze every Python file reachable from `paths`.
    ///
    /// Files that fail to read or parse are skipped (logged at debug level);
    /// partial failure never aborts the run.
    pub fn analyze(&self, paths: &[PathBuf]) -> AnalysisSummary {
        let mut detections = Vec::new();

        for path in paths {
            for file in files::collect_python_files(path) {
                match self.inspector.inspect(&file) {
                    Ok(mut records) => detections.append(&mut records),
                    Err(err) => {
                        debug!(file = %file.display(), "skipping file: {err}");
                    }
                }
            }
        }

        AnalysisSummary::from_detections(detections)
    }

    /// Analyze a single path.
    pub fn analyze_path(&self, path: &Path) -> AnalysisSummary {
        self.analyze(&[path.to_path_buf()])
    }
}

impl Default for SmellAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
