//! Library import extraction
//!
//! Builds the per-file alias map used to resolve attribute-access roots back
//! to a canonical library name regardless of import style (`import X`,
//! `import X as Y`, `from X import a as b`).

use crate::extract::walk;
use rustpython_parser::ast::{Expr, Stmt, Suite};
use std::collections::HashMap;

/// Canonical library name → in-file alias.
///
/// The alias falls back to the canonical name itself when the import carries
/// no `as` clause, so a lookup always yields the token actually usable in the
/// file. Insertion order is preserved for reverse (alias → library) lookups.
#[derive(Debug, Default)]
pub struct LibraryAliasMap {
    order: Vec<String>,
    aliases: HashMap<String, String>,
}

impl LibraryAliasMap {
    /// Collect every import in the module.
    pub fn from_suite(suite: &Suite) -> Self {
        let mut map = Self::default();

        walk::walk_stmts(suite, &mut |stmt| match stmt {
            Stmt::Import(import) => {
                for alias in &import.names {
                    map.insert(
                        alias.name.as_str(),
                        alias.asname.as_ref().map(|a| a.as_str()),
                    );
                }
            }
            Stmt::ImportFrom(import) => {
                let module = import.module.as_ref().map(|m| m.as_str()).unwrap_or("");
                for alias in &import.names {
                    let full_name = if module.is_empty() {
                        alias.name.as_str().to_string()
                    } else {
                        format!("{}.{}", module, alias.name.as_str())
                    };
                    map.insert(&full_name, alias.asname.as_ref().map(|a| a.as_str()));
                }
            }
            _ => {}
        });

        map
    }

    fn insert(&mut self, name: &str, asname: Option<&str>) {
        if !self.aliases.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.aliases
            .insert(name.to_string(), asname.unwrap_or(name).to_string());
    }

    /// The in-file alias bound to a canonical library name.
    pub fn alias_of(&self, library: &str) -> Option<&str> {
        self.aliases.get(library).map(String::as_str)
    }

    /// The canonical library name an alias is bound to, if any.
    pub fn library_for_alias(&self, alias: &str) -> Option<&str> {
        self.order
            .iter()
            .find(|name| self.aliases.get(*name).map(String::as_str) == Some(alias))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Full dotted name of a call target, with the root identifier mapped
    /// back to its canonical library name when it is a known alias.
    ///
    /// `t.use_deterministic_algorithms` resolves to
    /// `torch.use_deterministic_algorithms` under `import torch as t`.
    pub fn dotted_name_of(&self, func: &Expr) -> String {
        let mut parts: Vec<&str> = Vec::new();
        let mut current = func;
        loop {
            match current {
                Expr::Attribute(attr) => {
                    parts.push(attr.attr.as_str());
                    current = &attr.value;
                }
                Expr::Name(name) => {
                    let root = name.id.as_str();
                    parts.push(self.library_for_alias(root).unwrap_or(root));
                    break;
                }
                _ => break,
            }
        }
        parts.reverse();
        parts.join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustpython_parser::Parse;

    fn aliases(source: &str) -> LibraryAliasMap {
        let suite = Suite::parse(source, "test.py").expect("test source should parse");
        LibraryAliasMap::from_suite(&suite)
    }

    #[test]
    fn test_import_with_alias() {
        let map = aliases("import pandas as pd\nimport torch\n");
        assert_eq!(map.alias_of("pandas"), Some("pd"));
        assert_eq!(map.alias_of("torch"), Some("torch"));
        assert_eq!(map.alias_of("numpy"), None);
    }

    #[test]
    fn test_from_import_uses_full_name() {
        let map = aliases("from numpy import array\nfrom sklearn.svm import SVC\n");
        assert_eq!(map.alias_of("numpy.array"), Some("numpy.array"));
        assert_eq!(map.alias_of("sklearn.svm.SVC"), Some("sklearn.svm.SVC"));
    }

    #[test]
    fn test_reverse_lookup() {
        let map = aliases("import tensorflow as tf\n");
        assert_eq!(map.library_for_alias("tf"), Some("tensorflow"));
        assert_eq!(map.library_for_alias("np"), None);
    }

    #[test]
    fn test_dotted_name_resolves_alias_root() {
        let map = aliases("import torch as t\n");
        let suite =
            Suite::parse("t.use_deterministic_algorithms(True)\n", "test.py").expect("parses");
        let rustpython_parser::ast::Stmt::Expr(stmt) = &suite[0] else {
            panic!("expected expression statement");
        };
        let Expr::Call(call) = &*stmt.value else {
            panic!("expected call");
        };
        assert_eq!(
            map.dotted_name_of(&call.func),
            "torch.use_deterministic_algorithms"
        );
    }
}
