//! Per-function analysis context
//!
//! Built once per file by the inspector and shared read-only across every
//! detector evaluating that file's functions. Recomputing it per detector
//! would be wasted work and a correctness hazard if computed inconsistently.

use crate::catalogs::ReferenceCatalog;
use crate::extract::{LibraryAliasMap, VariableDef};
use crate::parsers::{ParsedModule, SourceFile};
use rustpython_parser::ast::{self, Ranged, Stmt};
use std::collections::{HashMap, HashSet};

/// One function (or method) as handed to the rule engine, in source order.
pub struct PyFunction<'a> {
    pub name: &'a str,
    pub args: &'a ast::Arguments,
    pub body: &'a [Stmt],
    pub is_async: bool,
}

/// Everything a detector may consult about the function under analysis.
pub struct FunctionContext<'a> {
    /// Canonical library name → in-file alias
    pub libraries: &'a LibraryAliasMap,
    /// Variable name → definition-site metadata, for this function
    pub variables: HashMap<String, VariableDef>,
    /// Subset of variables inferred to be dataframe-typed
    pub dataframe_variables: HashSet<String>,
    /// Shared reference catalogs (never mutated during a scan)
    pub catalog: &'a ReferenceCatalog,
    /// The original source, for literal line reporting
    pub source: &'a SourceFile,
    /// The parsed module, for offset-to-line mapping
    pub module: &'a ParsedModule,
}

impl FunctionContext<'_> {
    /// 1-indexed source line of an AST node.
    pub fn line_of(&self, node: &impl Ranged) -> u32 {
        self.module.line_of(node)
    }

    /// Literal source text of a line, for detector diagnostics.
    pub fn snippet(&self, line: u32) -> &str {
        self.source.line_text(line).unwrap_or("<code not available>")
    }

    pub fn pandas_alias(&self) -> Option<&str> {
        self.libraries.alias_of("pandas")
    }

    pub fn numpy_alias(&self) -> Option<&str> {
        self.libraries.alias_of("numpy")
    }

    pub fn tensorflow_alias(&self) -> Option<&str> {
        self.libraries.alias_of("tensorflow")
    }

    pub fn torch_alias(&self) -> Option<&str> {
        self.libraries.alias_of("torch")
    }

    /// True if `name` was assigned somewhere in this function.
    pub fn is_local_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// True if `name` is inferred to hold a dataframe.
    pub fn is_dataframe(&self, name: &str) -> bool {
        self.dataframe_variables.contains(name)
    }
}
