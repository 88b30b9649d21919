//! DataFrame variable inference
//!
//! Narrows a function's variables to those whose assignment traces back to a
//! pandas DataFrame: direct construction through the pandas alias, derivation
//! through a known DataFrame method, or plain aliasing of an already-known
//! DataFrame variable. Function parameters are included wholesale — the
//! original heuristic treats any parameter as a potential frame, and the
//! detectors guarded by this set inherit that over-approximation.

use crate::catalogs::ReferenceCatalog;
use crate::extract::walk;
use rustpython_parser::ast::{self, Expr, Stmt};
use std::collections::HashSet;

/// Names of every positional/keyword parameter of a function.
pub fn parameter_names(args: &ast::Arguments) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for arg in args.posonlyargs.iter().chain(args.args.iter()) {
        names.push(arg.def.arg.as_str());
    }
    if let Some(vararg) = &args.vararg {
        names.push(vararg.arg.as_str());
    }
    for arg in &args.kwonlyargs {
        names.push(arg.def.arg.as_str());
    }
    if let Some(kwarg) = &args.kwarg {
        names.push(kwarg.arg.as_str());
    }
    names
}

/// Infer the set of dataframe-typed variable names in one function.
///
/// Single pass in source order; the set grows as assignments are seen, so
/// derivations only recognize variables already known at that point.
pub fn dataframe_variables(
    args: &ast::Arguments,
    body: &[Stmt],
    pandas_alias: Option<&str>,
    catalog: &ReferenceCatalog,
) -> HashSet<String> {
    let mut variables: HashSet<String> =
        parameter_names(args).into_iter().map(str::to_string).collect();

    walk::walk_stmts(body, &mut |stmt| {
        let Stmt::Assign(assign) = stmt else {
            return;
        };

        match &*assign.value {
            Expr::Call(call) => {
                if let Expr::Attribute(attr) = &*call.func {
                    let constructed = matches!(&*attr.value, Expr::Name(name)
                        if Some(name.id.as_str()) == pandas_alias
                            && attr.attr.as_str() == "DataFrame");
                    let derived = catalog.is_dataframe_method(attr.attr.as_str())
                        && matches!(&*attr.value, Expr::Name(name)
                            if variables.contains(name.id.as_str()));
                    // Any catalog-method call also counts, even off an
                    // unknown receiver; this mirrors the reference heuristic.
                    let method_result = catalog.is_dataframe_method(attr.attr.as_str());

                    if constructed || derived || method_result {
                        for target in &assign.targets {
                            if let Expr::Name(name) = target {
                                variables.insert(name.id.as_str().to_string());
                            }
                        }
                    }
                }
            }
            Expr::Name(source_name) => {
                // Aliasing keeps the dataframe-ness of the source variable.
                if variables.contains(source_name.id.as_str()) {
                    for target in &assign.targets {
                        if let Expr::Name(name) = target {
                            if name.id.as_str() != source_name.id.as_str() {
                                variables.insert(name.id.as_str().to_string());
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    });

    variables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{parse_resilient, SourceFile};

    fn dataframe_vars(source: &str) -> HashSet<String> {
        let file = SourceFile::new("test.py", source);
        let module = parse_resilient(&file).expect("test source should parse");
        let Stmt::FunctionDef(func) = &module.suite[0] else {
            panic!("expected function definition");
        };
        let catalog = ReferenceCatalog::load();
        dataframe_variables(&func.args, &func.body, Some("pd"), &catalog)
    }

    #[test]
    fn test_constructed_dataframe_detected() {
        let vars = dataframe_vars("def f():\n    df = pd.DataFrame({'a': [1]})\n");
        assert!(vars.contains("df"));
    }

    #[test]
    fn test_parameters_included() {
        let vars = dataframe_vars("def f(data, frame):\n    pass\n");
        assert!(vars.contains("data"));
        assert!(vars.contains("frame"));
    }

    #[test]
    fn test_derived_and_aliased_dataframes() {
        let vars = dataframe_vars(
            "def f():\n    df = pd.DataFrame({'a': [1]})\n    cleaned = df.dropna()\n    view = cleaned\n",
        );
        assert!(vars.contains("cleaned"));
        assert!(vars.contains("view"));
    }

    #[test]
    fn test_unrelated_assignments_excluded() {
        let vars = dataframe_vars("def f():\n    n = 10\n    total = n + 1\n");
        assert!(!vars.contains("n"));
        assert!(!vars.contains("total"));
    }
}
