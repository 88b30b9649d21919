//! CLI command definitions and handlers

use crate::analyzer::SmellAnalyzer;
use crate::scan::ProjectAnalyzer;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// Smellscan - static detection of ML-specific code smells
#[derive(Parser, Debug)]
#[command(name = "smellscan")]
#[command(
    version,
    about = "Detect machine-learning-specific code smells in Python codebases",
    long_about = "Smellscan statically analyzes Python source trees for anti-patterns in \
tensor/array libraries, dataframe libraries, and model-training APIs: unguarded gradient \
accumulation, chained indexing, unset hyperparameters, in-place API misuse, and more.\n\n\
Results are written as CSV tables under an output/ directory; the analyze subcommand \
prints an in-memory summary instead.",
    after_help = "\
Examples:
  smellscan analyze src/                      Summarize smells in a directory
  smellscan analyze train.py --format json    JSON summary for scripting
  smellscan scan /path/to/project             Persist CSV results for one project
  smellscan batch /path/to/projects --parallel --workers 8
  smellscan batch /path/to/projects --resume  Continue an interrupted batch
  smellscan quickscan /path/to/repo --depth 5 Analyze files changed recently"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze files or directories and print a summary (nothing persisted)
    Analyze {
        /// Files (.py) or directories to analyze
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Analyze one project and persist CSV results under <output>/output/
    Scan {
        /// Path to the project root
        path: PathBuf,

        /// Directory receiving the output/ tree
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },

    /// Analyze every project subdirectory under a base path
    Batch {
        /// Directory containing one subdirectory per project
        path: PathBuf,

        /// One worker thread per project instead of sequential execution
        #[arg(long)]
        parallel: bool,

        /// Number of parallel workers (1-64)
        #[arg(long, default_value = "8", value_parser = parse_workers)]
        workers: usize,

        /// Resume after the last project recorded in the execution log
        #[arg(long)]
        resume: bool,

        /// Directory receiving the output/ tree
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },

    /// Analyze only files changed in the last N commits of a repository
    Quickscan {
        /// Path to the git repository
        repo: PathBuf,

        /// Number of commits to scan on the primary branch
        #[arg(long, default_value = "1")]
        depth: usize,

        /// Directory receiving the output/ tree
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze { paths, format } => run_analyze(&paths, &format),
        Commands::Scan { path, output } => {
            let analyzer = ProjectAnalyzer::new(&output)?;
            let total = analyzer.analyze_project(&path)?;
            print_total(total);
            Ok(())
        }
        Commands::Batch {
            path,
            parallel,
            workers,
            resume,
            output,
        } => {
            let analyzer = ProjectAnalyzer::new(&output)?;
            let total = if parallel {
                analyzer.analyze_projects_parallel(&path, workers, resume)?
            } else {
                analyzer.analyze_projects_sequential(&path, resume)?
            };
            print_total(total);
            Ok(())
        }
        Commands::Quickscan {
            repo,
            depth,
            output,
        } => {
            let analyzer = ProjectAnalyzer::new(&output)?;
            let total = analyzer.quick_scan(&repo, depth)?;
            print_total(total);
            Ok(())
        }
    }
}

fn run_analyze(paths: &[PathBuf], format: &str) -> Result<()> {
    let summary = SmellAnalyzer::new().analyze(paths);

    if format == "json" {
        let json =
            serde_json::to_string_pretty(&summary).context("failed to serialize summary")?;
        println!("{json}");
        return Ok(());
    }

    println!(
        "{} {}",
        style("Total smells:").bold(),
        style(summary.total_smells).bold().cyan()
    );

    if summary.total_smells == 0 {
        return Ok(());
    }

    println!("\n{}", style("By smell:").bold());
    for (smell, count) in &summary.smells_by_type {
        println!("  {count:>4}  {smell}");
    }

    println!("\n{}", style("Detections:").bold());
    for record in &summary.detections {
        println!(
            "  {}:{}  {}  {}",
            style(&record.filename).dim(),
            record.line,
            style(&record.smell_name).yellow(),
            record.function_name
        );
    }

    Ok(())
}

fn print_total(total: usize) {
    println!(
        "{} {}",
        style("Total code smells found:").bold(),
        style(total).bold().cyan()
    );
}
