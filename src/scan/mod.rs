//! Scan orchestration
//!
//! Drives the file inspector across file sets: a single project, a
//! multi-project batch (sequential or thread-parallel with a resumable
//! execution log), and a git-commit-windowed quick scan. All three modes
//! funnel through one merge step that unions every project-level result into
//! `output/overview.csv`.

pub mod files;
pub mod log;
pub mod output;

use crate::git;
use crate::inspector::Inspector;
use crate::models::{CommitMeta, DetectionRecord, ScanResult};
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

use self::log::ExecutionLog;

/// Handles project-level analysis and all result persistence.
pub struct ProjectAnalyzer {
    output_path: PathBuf,
    inspector: Inspector,
}

/// Mutable state shared by parallel batch workers. Guarded by a single lock
/// so the running total and the execution-log append stay consistent under
/// concurrent completions.
struct BatchState {
    total_smells: usize,
}

impl ProjectAnalyzer {
    /// Create an analyzer rooted at `output_root`, cleaning (or creating) its
    /// `output/` directory for a fresh run.
    pub fn new(output_root: &Path) -> Result<Self> {
        let output_path = output_root.join("output");
        if output_path.exists() {
            fs::remove_dir_all(&output_path)
                .with_context(|| format!("failed to clean {}", output_path.display()))?;
        }
        fs::create_dir_all(&output_path)
            .with_context(|| format!("failed to create {}", output_path.display()))?;

        Ok(Self {
            output_path,
            inspector: Inspector::new(),
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Analyze a single project and persist both its detail file and the
    /// overview.
    pub fn analyze_project(&self, project_path: &Path) -> Result<usize> {
        let project_name = project_name_of(project_path);
        info!(project = %project_name, "starting analysis");

        let records = self.scan_project(project_path)?;
        self.save_results(&records, "overview.csv", None)?;
        self.save_results(
            &records,
            &format!("{project_name}_results.csv"),
            Some("project_details"),
        )?;

        info!(
            project = %project_name,
            smells = records.len(),
            "finished analysis"
        );
        Ok(records.len())
    }

    /// Sequentially analyze every project subdirectory under `base_path`.
    ///
    /// With `resume`, every project sorting at or before the last logged
    /// entry is skipped and the log is extended in place; otherwise the log
    /// restarts empty.
    pub fn analyze_projects_sequential(&self, base_path: &Path, resume: bool) -> Result<usize> {
        let (projects, execution_log) = self.prepare_batch(base_path, resume)?;
        let progress = batch_progress(projects.len());
        let mut total_smells = 0usize;

        for project in &projects {
            progress.set_message(project.clone());
            match self.scan_project(&base_path.join(project)) {
                Ok(records) => {
                    if !records.is_empty() {
                        self.save_results(
                            &records,
                            &format!("{project}_results.csv"),
                            Some("project_details"),
                        )?;
                    }
                    total_smells += records.len();
                    execution_log.append(project)?;
                    info!(project = %project, smells = records.len(), "project analyzed");
                }
                Err(err) => warn!(project = %project, "error analyzing project: {err:#}"),
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        self.merge_all_results()?;
        info!(total_smells, "sequential batch complete");
        Ok(total_smells)
    }

    /// Analyze project subdirectories in parallel, one worker task per
    /// project. File-level work inside one project is always sequential.
    pub fn analyze_projects_parallel(
        &self,
        base_path: &Path,
        max_workers: usize,
        resume: bool,
    ) -> Result<usize> {
        let (projects, execution_log) = self.prepare_batch(base_path, resume)?;
        let progress = batch_progress(projects.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_workers.max(1))
            .build()
            .context("failed to build worker pool")?;

        let state = Mutex::new(BatchState { total_smells: 0 });

        pool.install(|| {
            projects.par_iter().for_each(|project| {
                match self.scan_project(&base_path.join(project)) {
                    Ok(records) => {
                        if !records.is_empty() {
                            if let Err(err) = self.save_results(
                                &records,
                                &format!("{project}_results.csv"),
                                Some("project_details"),
                            ) {
                                warn!(project = %project, "failed to save project results: {err:#}");
                            }
                        }

                        // Counter update and log append form one critical
                        // section; completion order is non-deterministic.
                        let mut guard = state
                            .lock()
                            .unwrap_or_else(std::sync::PoisonError::into_inner);
                        guard.total_smells += records.len();
                        if let Err(err) = execution_log.append(project) {
                            warn!(project = %project, "failed to append execution log: {err:#}");
                        }
                        drop(guard);

                        info!(project = %project, smells = records.len(), "project analyzed");
                    }
                    Err(err) => warn!(project = %project, "error analyzing project: {err:#}"),
                }
                progress.inc(1);
            });
        });
        progress.finish_and_clear();

        self.merge_all_results()?;
        let total_smells = state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .total_smells;
        info!(total_smells, "parallel batch complete");
        Ok(total_smells)
    }

    /// Quick scan: analyze only files touched in the last `commit_depth`
    /// commits of the repository's primary branch, tagging every record with
    /// its commit.
    pub fn quick_scan(&self, repo_path: &Path, commit_depth: usize) -> Result<usize> {
        info!(repo = %repo_path.display(), depth = commit_depth, "quick scan starting");

        let window = git::commit_window(repo_path, commit_depth)?;
        let mut results: ScanResult = Vec::new();

        for commit in &window {
            for relative_file in &commit.changed_files {
                let absolute = repo_path.join(relative_file);
                // Files deleted or moved since the commit no longer exist in
                // the working tree and are skipped.
                if !absolute.is_file() {
                    continue;
                }

                match self.inspector.inspect(&absolute) {
                    Ok(records) if records.is_empty() => {}
                    Ok(records) => {
                        info!(
                            commit = &commit.hash[..7.min(commit.hash.len())],
                            file = %relative_file,
                            smells = records.len(),
                            "smells found"
                        );
                        results.extend(records.into_iter().map(|mut record| {
                            record.commit = Some(CommitMeta {
                                commit_index: commit.index,
                                commit_hash: commit.hash.clone(),
                                commit_date: commit.date.clone(),
                                commit_author: commit.author.clone(),
                                commit_msg: commit.message.clone(),
                                relative_file: relative_file.clone(),
                                project_path: repo_path.display().to_string(),
                            });
                            record
                        }));
                    }
                    Err(err) => {
                        warn!(file = %relative_file, commit = %commit.hash, "error inspecting file: {err}");
                        output::append_error(&self.output_path, relative_file, &err.to_string());
                    }
                }
            }
        }

        let total = results.len();
        if !results.is_empty() {
            self.save_results(&results, "quickscan_results.csv", Some("project_details"))?;
        }
        self.merge_all_results()?;

        info!(total, "quick scan complete");
        Ok(total)
    }

    /// Union every per-project result file into the overview.
    pub fn merge_all_results(&self) -> Result<()> {
        output::merge_results(&self.output_path.join("project_details"), &self.output_path)?;
        Ok(())
    }

    /// Inspect every Python file of one project, reporting per-file failures
    /// to the error side-channel and continuing.
    fn scan_project(&self, project_path: &Path) -> Result<ScanResult> {
        let filenames = files::collect_python_files(project_path);
        if filenames.is_empty() {
            bail!(
                "the project '{}' contains no Python files",
                project_path.display()
            );
        }

        let mut records: ScanResult = Vec::new();
        for filename in &filenames {
            match self.inspector.inspect(filename) {
                Ok(mut found) => {
                    if !found.is_empty() {
                        info!(
                            file = %filename.display(),
                            smells = found.len(),
                            "smells found"
                        );
                    }
                    records.append(&mut found);
                }
                Err(err) => {
                    warn!(file = %filename.display(), "error analyzing file: {err}");
                    output::append_error(
                        &self.output_path,
                        &filename.display().to_string(),
                        &err.to_string(),
                    );
                }
            }
        }

        Ok(records)
    }

    fn save_results(
        &self,
        records: &[DetectionRecord],
        filename: &str,
        subdir: Option<&str>,
    ) -> Result<()> {
        if records.is_empty() {
            info!(filename, "no results to save");
            return Ok(());
        }
        let path = match subdir {
            Some(subdir) => self.output_path.join(subdir).join(filename),
            None => self.output_path.join(filename),
        };
        output::write_results(&path, records)?;
        info!(path = %path.display(), "results saved");
        Ok(())
    }

    /// Enumerate project subdirectories and set up the execution log for a
    /// batch run. Returns the (possibly resume-filtered) project list.
    fn prepare_batch(&self, base_path: &Path, resume: bool) -> Result<(Vec<String>, ExecutionLog)> {
        fs::create_dir_all(base_path)
            .with_context(|| format!("failed to create {}", base_path.display()))?;

        let execution_log = ExecutionLog::new(base_path.join("execution_log.txt"));
        let last_logged = if resume {
            execution_log.last_entry().unwrap_or_default()
        } else {
            execution_log.initialize()?;
            String::new()
        };

        let mut projects: Vec<String> = fs::read_dir(base_path)
            .with_context(|| format!("failed to read {}", base_path.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| name != "output" && name != "execution_log.txt")
            .collect();
        projects.sort();

        if resume && !last_logged.is_empty() {
            projects.retain(|name| name.as_str() > last_logged.as_str());
            info!(after = %last_logged, "resuming batch");
        }

        Ok((projects, execution_log))
    }
}

fn project_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("project")
        .to_string()
}

fn batch_progress(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::with_template("[{bar:40}] {pos}/{len} {msg}")
            .expect("valid progress template"),
    );
    progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SMELLY_SOURCE: &str = "\
import pandas as pd

def load(df):
    return df['a'][0]
";

    fn make_project(base: &Path, name: &str, file_count: usize) {
        let project = base.join(name);
        fs::create_dir_all(&project).unwrap();
        for i in 0..file_count {
            fs::write(project.join(format!("mod_{i}.py")), SMELLY_SOURCE).unwrap();
        }
    }

    #[test]
    fn test_analyze_project_writes_outputs() {
        let workspace = tempfile::tempdir().expect("tempdir");
        let base = workspace.path().join("projects");
        make_project(&base, "alpha", 2);

        let analyzer = ProjectAnalyzer::new(workspace.path()).unwrap();
        let total = analyzer.analyze_project(&base.join("alpha")).unwrap();
        assert_eq!(total, 2);

        assert!(workspace.path().join("output/overview.csv").is_file());
        assert!(workspace
            .path()
            .join("output/project_details/alpha_results.csv")
            .is_file());
    }

    #[test]
    fn test_empty_project_is_an_error() {
        let workspace = tempfile::tempdir().expect("tempdir");
        let project = workspace.path().join("empty");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join("readme.md"), "no python here\n").unwrap();

        let analyzer = ProjectAnalyzer::new(workspace.path()).unwrap();
        let err = analyzer.analyze_project(&project).expect_err("should fail");
        assert!(err.to_string().contains("no Python files"));
    }

    #[test]
    fn test_unparseable_file_reported_not_fatal() {
        let workspace = tempfile::tempdir().expect("tempdir");
        let base = workspace.path().join("projects");
        make_project(&base, "alpha", 1);
        fs::write(base.join("alpha/broken.py"), "def f(:\n").unwrap();

        let analyzer = ProjectAnalyzer::new(workspace.path()).unwrap();
        let total = analyzer.analyze_project(&base.join("alpha")).unwrap();
        assert_eq!(total, 1);

        let errors =
            fs::read_to_string(workspace.path().join("output/error.txt")).expect("error.txt");
        assert!(errors.contains("Error in file"));
        assert!(errors.contains("broken.py"));
    }

    #[test]
    fn test_sequential_batch_resume_skips_completed_projects() {
        let workspace = tempfile::tempdir().expect("tempdir");
        let base = workspace.path().join("batch");
        make_project(&base, "p1", 1);
        make_project(&base, "p2", 1);
        make_project(&base, "p3", 2);

        // A previous run completed p1 and p2 before stopping.
        let log = ExecutionLog::new(base.join("execution_log.txt"));
        log.initialize().unwrap();
        log.append("p1").unwrap();
        log.append("p2").unwrap();

        let analyzer = ProjectAnalyzer::new(workspace.path()).unwrap();
        let total = analyzer.analyze_projects_sequential(&base, true).unwrap();

        // Only p3 ran: two files, one smell each.
        assert_eq!(total, 2);
        let details = workspace.path().join("output/project_details");
        assert!(details.join("p3_results.csv").is_file());
        assert!(!details.join("p1_results.csv").exists());
        assert!(!details.join("p2_results.csv").exists());

        // The log now records p3 after the resumed entries.
        assert_eq!(log.last_entry(), Some("p3".to_string()));
    }

    #[test]
    fn test_parallel_batch_counts_and_logs_every_project() {
        let workspace = tempfile::tempdir().expect("tempdir");
        let base = workspace.path().join("batch");
        make_project(&base, "p1", 1);
        make_project(&base, "p2", 3);
        make_project(&base, "p3", 2);

        let analyzer = ProjectAnalyzer::new(workspace.path()).unwrap();
        let total = analyzer.analyze_projects_parallel(&base, 3, false).unwrap();
        assert_eq!(total, 6);

        let log_content = fs::read_to_string(base.join("execution_log.txt")).unwrap();
        let mut logged: Vec<&str> = log_content.lines().collect();
        logged.sort_unstable();
        assert_eq!(logged, vec!["p1", "p2", "p3"]);

        let overview =
            output::read_results(&workspace.path().join("output/overview.csv")).unwrap();
        assert_eq!(overview.len(), 6);
    }
}
