//! File inspector
//!
//! Composes the pipeline for one file: parse, extract libraries, build the
//! per-function context, run the rule engine over each function in source
//! order, and return the concatenated result. Parsing may terminate the
//! pipeline early; every later stage is single-pass and non-suspending.

use crate::catalogs::ReferenceCatalog;
use crate::detectors::{FunctionContext, PyFunction, RuleEngine};
use crate::extract::{dataframes, variables, walk, LibraryAliasMap};
use crate::models::ScanResult;
use crate::parsers::{self, ParseFailure, SourceFile};
use rustpython_parser::ast::{Stmt, Suite};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Why a file produced no result.
///
/// Both variants are non-fatal at the batch level; callers report them to the
/// error side-channel and move on.
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("failed to read file: {0}")]
    Unreadable(#[source] std::io::Error),
    #[error("{0}")]
    Syntax(#[from] ParseFailure),
}

/// Inspects Python files for ML code smells.
///
/// Owns the reference catalogs for its whole lifetime; they are loaded once
/// here and shared read-only with every detector invocation.
pub struct Inspector {
    catalog: ReferenceCatalog,
    engine: RuleEngine,
}

impl Inspector {
    pub fn new() -> Self {
        Self {
            catalog: ReferenceCatalog::load(),
            engine: RuleEngine::new(),
        }
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    /// Inspect a file on disk.
    pub fn inspect(&self, path: &Path) -> Result<ScanResult, InspectError> {
        let text = std::fs::read_to_string(path).map_err(InspectError::Unreadable)?;
        self.inspect_source(&path.display().to_string(), &text)
    }

    /// Inspect source text directly (the file-on-disk path uses this too).
    pub fn inspect_source(&self, filename: &str, text: &str) -> Result<ScanResult, InspectError> {
        let source = SourceFile::new(filename, text);
        let module = parsers::parse_resilient(&source)?;

        let libraries = LibraryAliasMap::from_suite(&module.suite);
        let pandas_alias = libraries.alias_of("pandas").map(str::to_string);

        let mut records = Vec::new();
        for function in collect_functions(&module.suite) {
            let ctx = FunctionContext {
                libraries: &libraries,
                variables: variables::variable_definitions(function.body, &module),
                dataframe_variables: dataframes::dataframe_variables(
                    function.args,
                    function.body,
                    pandas_alias.as_deref(),
                    &self.catalog,
                ),
                catalog: &self.catalog,
                source: &source,
                module: &module,
            };
            self.engine
                .check_function(&function, &ctx, filename, &mut records);
        }

        debug!(file = filename, count = records.len(), "inspection complete");
        Ok(records)
    }
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

/// Every function and method in the module, in source order.
fn collect_functions(suite: &Suite) -> Vec<PyFunction<'_>> {
    let mut functions = Vec::new();
    walk::walk_stmts(suite, &mut |stmt| match stmt {
        Stmt::FunctionDef(def) => functions.push(PyFunction {
            name: def.name.as_str(),
            args: &*def.args,
            body: &def.body,
            is_async: false,
        }),
        Stmt::AsyncFunctionDef(def) => functions.push(PyFunction {
            name: def.name.as_str(),
            args: &*def.args,
            body: &def.body,
            is_async: true,
        }),
        _ => {}
    });
    functions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_indexing_and_conversion_in_one_pass() {
        let inspector = Inspector::new();
        let source = "\
import pandas as pd

def process():
    df = pd.DataFrame({'A': [1, 2]})
    first = df['A'][0]
    raw = df.values
    return first, raw
";
        let records = inspector
            .inspect_source("test.py", source)
            .expect("should inspect");

        let chain: Vec<_> = records
            .iter()
            .filter(|r| r.smell_name == "Chain_Indexing")
            .collect();
        let conversion: Vec<_> = records
            .iter()
            .filter(|r| r.smell_name == "dataframe_conversion_api_misused")
            .collect();

        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].line, 5);
        assert_eq!(chain[0].function_name, "process");
        assert_eq!(conversion.len(), 1);
        assert_eq!(conversion[0].line, 6);
        assert_eq!(conversion[0].function_name, "process");
    }

    #[test]
    fn test_inspection_is_idempotent() {
        let inspector = Inspector::new();
        let source = "\
import pandas as pd
import numpy as np

def load(df):
    if df['x'][0] == np.nan:
        return None
    return df
";
        let first = inspector.inspect_source("test.py", source).expect("run 1");
        let second = inspector.inspect_source("test.py", source).expect("run 2");
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_methods_and_nested_functions_visited_in_source_order() {
        let inspector = Inspector::new();
        let source = "\
import pandas as pd

class Pipeline:
    def stage_one(self, df):
        _ = df['a'][0]

def stage_two(df):
    _ = df['b'][1]
";
        let records = inspector
            .inspect_source("test.py", source)
            .expect("should inspect");
        let functions: Vec<&str> = records.iter().map(|r| r.function_name.as_str()).collect();
        assert_eq!(functions, vec!["stage_one", "stage_two"]);
    }

    #[test]
    fn test_syntax_error_is_reported_not_masked() {
        let inspector = Inspector::new();
        let err = inspector
            .inspect_source("bad.py", "def f(:\n    pass\n")
            .expect_err("should fail");
        assert!(matches!(err, InspectError::Syntax(_)));
    }

    #[test]
    fn test_gradients_not_cleared_in_loop() {
        let inspector = Inspector::new();
        let source = "\
import torch

def train(loader):
    optimizer = make_optimizer()
    loss = compute()
    for batch in loader:
        loss.backward()
        optimizer.step()
";
        let records = inspector
            .inspect_source("train.py", source)
            .expect("should inspect");
        assert!(records
            .iter()
            .any(|r| r.smell_name == "gradients_not_cleared_before_backward_propagation"));
    }

    #[test]
    fn test_zero_grad_before_backward_is_clean() {
        let inspector = Inspector::new();
        let source = "\
import torch

def train(loader):
    optimizer = make_optimizer()
    loss = compute()
    for batch in loader:
        optimizer.zero_grad()
        loss.backward()
        optimizer.step()
";
        let records = inspector
            .inspect_source("train.py", source)
            .expect("should inspect");
        assert!(!records
            .iter()
            .any(|r| r.smell_name == "gradients_not_cleared_before_backward_propagation"));
    }

    #[test]
    fn test_hyperparameters_not_set() {
        let inspector = Inspector::new();
        let source = "\
from sklearn.cluster import KMeans

def cluster(data):
    model = KMeans()
    return model.fit(data)
";
        let records = inspector
            .inspect_source("cluster.py", source)
            .expect("should inspect");
        assert!(records
            .iter()
            .any(|r| r.smell_name == "hyperparameters_not_explicitly_set"));
    }

    #[test]
    fn test_legacy_file_still_analyzed() {
        // Legacy syntax plus a smell: the fallback parse must still feed the
        // rule engine.
        let inspector = Inspector::new();
        let source = "\
import pandas as pd

def summarize(d):
    df = pd.DataFrame({'a': [1]})
    for k, v in d.iteritems():
        print k
    x = df['a'][0]
    return x
";
        let records = inspector
            .inspect_source("legacy.py", source)
            .expect("legacy source should be analyzable");
        assert!(records.iter().any(|r| r.smell_name == "Chain_Indexing"));
    }
}
