//! Core data models for smellscan
//!
//! These models are used throughout the codebase for representing
//! detected smells and scan-level summaries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Commit metadata attached to records produced by a quick scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMeta {
    /// 1-based position of the commit inside the scanned window
    pub commit_index: usize,
    /// Full commit hash
    pub commit_hash: String,
    /// Commit timestamp (ISO 8601)
    pub commit_date: String,
    /// Author as `Name <email>`
    pub commit_author: String,
    /// Commit message (first line)
    pub commit_msg: String,
    /// Path of the analyzed file relative to the repository root
    pub relative_file: String,
    /// Path of the scanned repository
    pub project_path: String,
}

/// One detected code smell.
///
/// Immutable once created. `line` is 1-indexed into the original source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub filename: String,
    pub function_name: String,
    pub smell_name: String,
    pub line: u32,
    pub description: String,
    pub additional_info: String,
    /// Present only for quick-scan results
    #[serde(flatten, skip_serializing_if = "Option::is_none", default)]
    pub commit: Option<CommitMeta>,
}

/// Ordered collection of records for one file, project, or commit window.
///
/// Concatenation is associative and insertion-ordered; no implicit dedup.
pub type ScanResult = Vec<DetectionRecord>;

/// Aggregated result of a one-shot analysis over arbitrary paths.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub total_smells: usize,
    pub smells_by_file: BTreeMap<String, usize>,
    pub smells_by_type: BTreeMap<String, usize>,
    pub detections: Vec<DetectionRecord>,
}

impl AnalysisSummary {
    /// Build a summary from detection records.
    pub fn from_detections(detections: Vec<DetectionRecord>) -> Self {
        let mut smells_by_file: BTreeMap<String, usize> = BTreeMap::new();
        let mut smells_by_type: BTreeMap<String, usize> = BTreeMap::new();

        for record in &detections {
            *smells_by_file.entry(record.filename.clone()).or_insert(0) += 1;
            *smells_by_type.entry(record.smell_name.clone()).or_insert(0) += 1;
        }

        Self {
            total_smells: detections.len(),
            smells_by_file,
            smells_by_type,
            detections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(file: &str, smell: &str) -> DetectionRecord {
        DetectionRecord {
            filename: file.to_string(),
            function_name: "train".to_string(),
            smell_name: smell.to_string(),
            line: 3,
            description: "desc".to_string(),
            additional_info: String::new(),
            commit: None,
        }
    }

    #[test]
    fn test_summary_counts() {
        let summary = AnalysisSummary::from_detections(vec![
            record("a.py", "Chain_Indexing"),
            record("a.py", "in_place_apis_misused"),
            record("b.py", "Chain_Indexing"),
        ]);

        assert_eq!(summary.total_smells, 3);
        assert_eq!(summary.smells_by_file["a.py"], 2);
        assert_eq!(summary.smells_by_type["Chain_Indexing"], 2);
    }

    #[test]
    fn test_record_json_omits_commit_when_absent() {
        let json = serde_json::to_string(&record("a.py", "memory_not_freed")).unwrap();
        assert!(!json.contains("commit_hash"));
    }
}
