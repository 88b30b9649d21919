//! Python source file collection

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory names never descended into; vendored interpreters and
/// environments are not part of the project under analysis.
const SKIPPED_DIRS: [&str; 2] = ["venv", "lib"];

/// Collect every `.py` file under `path`, sorted for deterministic scan
/// order. A direct `.py` file path is returned as-is.
pub fn collect_python_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return if has_python_extension(path) {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        };
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && entry
                    .file_name()
                    .to_str()
                    .map(|name| SKIPPED_DIRS.contains(&name))
                    .unwrap_or(false))
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && has_python_extension(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

fn has_python_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("py")
}
