//! Per-function variable definition extraction
//!
//! Collects simple-assignment targets and the syntactic shape of their
//! right-hand side. Detectors use this to answer "was this name ever assigned
//! the result of constructing something" without full type inference.

use crate::extract::walk;
use crate::parsers::ParsedModule;
use rustpython_parser::ast::{Expr, Stmt};
use std::collections::HashMap;

/// Syntactic shape of an assignment's right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RhsShape {
    Call,
    Name,
    Constant,
    Attribute,
    Other,
}

/// Where and how a variable was last assigned inside a function.
#[derive(Debug, Clone)]
pub struct VariableDef {
    pub line: u32,
    pub shape: RhsShape,
}

/// Extract variable definitions from a function body.
///
/// Later assignments overwrite earlier ones, matching the per-name map the
/// detectors expect.
pub fn variable_definitions(
    body: &[Stmt],
    module: &ParsedModule,
) -> HashMap<String, VariableDef> {
    let mut definitions = HashMap::new();

    walk::walk_stmts(body, &mut |stmt| {
        if let Stmt::Assign(assign) = stmt {
            let shape = match &*assign.value {
                Expr::Call(_) => RhsShape::Call,
                Expr::Name(_) => RhsShape::Name,
                Expr::Constant(_) => RhsShape::Constant,
                Expr::Attribute(_) => RhsShape::Attribute,
                _ => RhsShape::Other,
            };
            for target in &assign.targets {
                if let Expr::Name(name) = target {
                    definitions.insert(
                        name.id.as_str().to_string(),
                        VariableDef {
                            line: module.line_of(assign),
                            shape,
                        },
                    );
                }
            }
        }
    });

    definitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{parse_resilient, SourceFile};

    fn definitions(source: &str) -> HashMap<String, VariableDef> {
        let file = SourceFile::new("test.py", source);
        let module = parse_resilient(&file).expect("test source should parse");
        let Stmt::FunctionDef(func) = &module.suite[0] else {
            panic!("expected function definition");
        };
        variable_definitions(&func.body, &module)
    }

    #[test]
    fn test_simple_assignments_collected() {
        let defs = definitions(
            "def f():\n    model = Net()\n    x = 1\n    y = model\n    z = a.b\n",
        );
        assert_eq!(defs["model"].shape, RhsShape::Call);
        assert_eq!(defs["x"].shape, RhsShape::Constant);
        assert_eq!(defs["y"].shape, RhsShape::Name);
        assert_eq!(defs["z"].shape, RhsShape::Attribute);
        assert_eq!(defs["model"].line, 2);
    }

    #[test]
    fn test_non_name_targets_skipped() {
        let defs = definitions("def f(d):\n    d['k'] = 1\n    obj.attr = 2\n");
        assert!(defs.is_empty());
    }

    #[test]
    fn test_nested_assignments_included() {
        let defs = definitions("def f():\n    for i in range(3):\n        acc = i\n");
        assert!(defs.contains_key("acc"));
    }
}
