//! CSV-shaped result persistence
//!
//! The output layout is an `output/` root containing `overview.csv` plus one
//! `project_details/<project>_results.csv` per project or commit window; the
//! `project_details` directory is the merge input for `overview.csv`. A
//! sibling `error.txt` receives one line per file that failed to parse or
//! load.
//!
//! No external CSV dependency: the schema is fixed and flat, so writing and
//! reading stay local to this module (quoting handles commas, quotes, and
//! stray newlines in messages).

use crate::models::{CommitMeta, DetectionRecord};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};
use walkdir::WalkDir;

const BASE_COLUMNS: [&str; 6] = [
    "filename",
    "function_name",
    "smell_name",
    "line",
    "description",
    "additional_info",
];

const COMMIT_COLUMNS: [&str; 7] = [
    "commit_index",
    "commit_hash",
    "commit_date",
    "commit_author",
    "commit_msg",
    "relative_file",
    "project_path",
];

/// Write records to a CSV file. The commit columns are present whenever any
/// record carries commit metadata.
pub fn write_results(path: &Path, records: &[DetectionRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let with_commits = records.iter().any(|r| r.commit.is_some());
    let mut out = String::new();

    let mut header: Vec<&str> = BASE_COLUMNS.to_vec();
    if with_commits {
        header.extend(COMMIT_COLUMNS);
    }
    out.push_str(&header.join(","));
    out.push('\n');

    for record in records {
        let mut fields = vec![
            escape(&record.filename),
            escape(&record.function_name),
            escape(&record.smell_name),
            record.line.to_string(),
            escape(&record.description),
            escape(&record.additional_info),
        ];
        if with_commits {
            match &record.commit {
                Some(commit) => fields.extend([
                    commit.commit_index.to_string(),
                    escape(&commit.commit_hash),
                    escape(&commit.commit_date),
                    escape(&commit.commit_author),
                    escape(&commit.commit_msg),
                    escape(&commit.relative_file),
                    escape(&commit.project_path),
                ]),
                None => fields.extend(std::iter::repeat(String::new()).take(7)),
            }
        }
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    fs::write(path, out).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Read records back from a CSV file written by [`write_results`].
pub fn read_results(path: &Path) -> Result<Vec<DetectionRecord>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut lines = content.lines();

    let Some(header_line) = lines.next() else {
        return Ok(Vec::new());
    };
    let header: Vec<String> = parse_line(header_line);
    let column = |name: &str| header.iter().position(|h| h == name);

    let Some(filename_idx) = column("filename") else {
        warn!(file = %path.display(), "skipping CSV without a filename column");
        return Ok(Vec::new());
    };
    let field = |row: &[String], name: &str| -> String {
        column(name)
            .and_then(|idx| row.get(idx).cloned())
            .unwrap_or_default()
    };

    let mut records = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let row = parse_line(line);
        if row.len() <= filename_idx {
            warn!(file = %path.display(), "skipping malformed CSV row");
            continue;
        }

        let commit_hash = field(&row, "commit_hash");
        let commit = if commit_hash.is_empty() {
            None
        } else {
            Some(CommitMeta {
                commit_index: field(&row, "commit_index").parse().unwrap_or(0),
                commit_hash,
                commit_date: field(&row, "commit_date"),
                commit_author: field(&row, "commit_author"),
                commit_msg: field(&row, "commit_msg"),
                relative_file: field(&row, "relative_file"),
                project_path: field(&row, "project_path"),
            })
        };

        records.push(DetectionRecord {
            filename: field(&row, "filename"),
            function_name: field(&row, "function_name"),
            smell_name: field(&row, "smell_name"),
            line: field(&row, "line").parse().unwrap_or(0),
            description: field(&row, "description"),
            additional_info: field(&row, "additional_info"),
            commit,
        });
    }

    Ok(records)
}

/// Union every per-project CSV under `details_dir` into
/// `<output_dir>/overview.csv`.
pub fn merge_results(details_dir: &Path, output_dir: &Path) -> Result<usize> {
    let mut merged: Vec<DetectionRecord> = Vec::new();

    if details_dir.is_dir() {
        let mut csv_files: Vec<_> = WalkDir::new(details_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry.path().extension().and_then(|e| e.to_str()) == Some("csv")
            })
            .map(|entry| entry.into_path())
            .collect();
        csv_files.sort();

        for file in csv_files {
            match read_results(&file) {
                Ok(records) if records.is_empty() => {
                    info!(file = %file.display(), "skipping empty result file");
                }
                Ok(mut records) => merged.append(&mut records),
                Err(err) => warn!(file = %file.display(), "failed to read result file: {err:#}"),
            }
        }
    }

    if merged.is_empty() {
        info!("no project results to merge");
        return Ok(0);
    }

    let overview = output_dir.join("overview.csv");
    write_results(&overview, &merged)?;
    info!(path = %overview.display(), records = merged.len(), "merged overview written");
    Ok(merged.len())
}

/// Append one failure line to the error side-channel. Never blocks the scan:
/// a failure to record the error is only logged.
pub fn append_error(output_dir: &Path, file: &str, message: &str) {
    if let Err(err) = try_append_error(output_dir, file, message) {
        warn!("failed to record error for {file}: {err:#}");
    }
}

fn try_append_error(output_dir: &Path, file: &str, message: &str) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let mut handle = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_dir.join("error.txt"))?;
    writeln!(handle, "Error in file {file}: {message}")?;
    Ok(())
}

fn escape(field: &str) -> String {
    // Messages never legitimately span lines; normalize before quoting.
    let field = field.replace(['\n', '\r'], " ");
    if field.contains(',') || field.contains('"') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field
    }
}

fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> DetectionRecord {
        DetectionRecord {
            filename: "proj/a.py".to_string(),
            function_name: "train".to_string(),
            smell_name: "merge_api_parameter_not_explicitly_set".to_string(),
            line: 12,
            description: "Calls to Pandas' `merge` API should explicitly set parameters like \
                          'how', 'on', and 'validate' to avoid unexpected behavior."
                .to_string(),
            additional_info: "Incomplete parameters in `merge`. Consider specifying 'how', 'on', \
                              and 'validate'."
                .to_string(),
            commit: None,
        }
    }

    #[test]
    fn test_csv_roundtrip_with_commas_and_quotes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("results.csv");

        let mut record = sample_record();
        record.additional_info = "says \"hello\", twice".to_string();
        write_results(&path, &[record.clone()]).unwrap();

        let read = read_results(&path).unwrap();
        assert_eq!(read, vec![record]);
    }

    #[test]
    fn test_csv_roundtrip_with_commit_meta() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("quickscan_results.csv");

        let mut record = sample_record();
        record.commit = Some(CommitMeta {
            commit_index: 2,
            commit_hash: "deadbeef".to_string(),
            commit_date: "2024-03-01T12:00:00".to_string(),
            commit_author: "Dev <dev@example.com>".to_string(),
            commit_msg: "fix training, again".to_string(),
            relative_file: "a.py".to_string(),
            project_path: "/repo".to_string(),
        });
        write_results(&path, &[record.clone()]).unwrap();

        let read = read_results(&path).unwrap();
        assert_eq!(read, vec![record]);
    }

    #[test]
    fn test_merge_unions_project_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let details = dir.path().join("project_details");

        let a = sample_record();
        let mut b = sample_record();
        b.filename = "other/b.py".to_string();
        write_results(&details.join("p1_results.csv"), &[a]).unwrap();
        write_results(&details.join("p2_results.csv"), &[b]).unwrap();

        let merged = merge_results(&details, dir.path()).unwrap();
        assert_eq!(merged, 2);

        let overview = read_results(&dir.path().join("overview.csv")).unwrap();
        assert_eq!(overview.len(), 2);
    }

    #[test]
    fn test_error_side_channel_format() {
        let dir = tempfile::tempdir().expect("tempdir");
        append_error(dir.path(), "bad.py", "invalid syntax");

        let content = fs::read_to_string(dir.path().join("error.txt")).unwrap();
        assert_eq!(content, "Error in file bad.py: invalid syntax\n");
    }
}
