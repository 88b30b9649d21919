//! Source-order AST traversal helpers
//!
//! rustpython's AST has no built-in walker, so the extractors and detectors
//! share these. All traversals visit nodes in source order; detectors rely on
//! that for both line attribution and ordering-sensitive checks.

use rustpython_parser::ast::{self, Expr, Stmt};

/// Visit every statement in `stmts`, recursing into nested bodies
/// (functions, classes, loops, conditionals, `with`, `try`, `match`).
pub fn walk_stmts<'a>(stmts: &'a [Stmt], visit: &mut dyn FnMut(&'a Stmt)) {
    for stmt in stmts {
        visit(stmt);
        for body in child_bodies(stmt) {
            walk_stmts(body, visit);
        }
    }
}

/// Visit every expression reachable from `stmts`, including expressions
/// nested in sub-statements.
pub fn walk_exprs<'a>(stmts: &'a [Stmt], visit: &mut dyn FnMut(&'a Expr)) {
    walk_stmts(stmts, &mut |stmt| {
        for expr in stmt_exprs(stmt) {
            walk_expr(expr, visit);
        }
    });
}

/// Visit `expr` and every sub-expression beneath it.
pub fn walk_expr<'a>(expr: &'a Expr, visit: &mut dyn FnMut(&'a Expr)) {
    visit(expr);
    for child in child_exprs(expr) {
        walk_expr(child, visit);
    }
}

/// Collect every loop statement (`for`, `async for`, `while`) under `stmts`,
/// nested loops included, in source order.
pub fn loops<'a>(stmts: &'a [Stmt]) -> Vec<&'a Stmt> {
    let mut found = Vec::new();
    walk_stmts(stmts, &mut |stmt| {
        if matches!(stmt, Stmt::For(_) | Stmt::AsyncFor(_) | Stmt::While(_)) {
            found.push(stmt);
        }
    });
    found
}

/// Resolve the base of a chained attribute/call expression back to its root
/// identifier: `a.b.c.d` and `a.b.c.d()` both resolve to `a`.
pub fn base_name(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Name(name) => Some(name.id.as_str()),
        Expr::Attribute(attr) => base_name(&attr.value),
        Expr::Call(call) => base_name(&call.func),
        _ => None,
    }
}

/// Statement bodies that contain further statements.
fn child_bodies<'a>(stmt: &'a Stmt) -> Vec<&'a [Stmt]> {
    match stmt {
        Stmt::FunctionDef(s) => vec![s.body.as_slice()],
        Stmt::AsyncFunctionDef(s) => vec![s.body.as_slice()],
        Stmt::ClassDef(s) => vec![s.body.as_slice()],
        Stmt::For(s) => vec![s.body.as_slice(), s.orelse.as_slice()],
        Stmt::AsyncFor(s) => vec![s.body.as_slice(), s.orelse.as_slice()],
        Stmt::While(s) => vec![s.body.as_slice(), s.orelse.as_slice()],
        Stmt::If(s) => vec![s.body.as_slice(), s.orelse.as_slice()],
        Stmt::With(s) => vec![s.body.as_slice()],
        Stmt::AsyncWith(s) => vec![s.body.as_slice()],
        Stmt::Try(s) => {
            let mut bodies: Vec<&[Stmt]> = vec![s.body.as_slice()];
            for handler in &s.handlers {
                let ast::ExceptHandler::ExceptHandler(h) = handler;
                bodies.push(h.body.as_slice());
            }
            bodies.push(s.orelse.as_slice());
            bodies.push(s.finalbody.as_slice());
            bodies
        }
        Stmt::TryStar(s) => {
            let mut bodies: Vec<&[Stmt]> = vec![s.body.as_slice()];
            for handler in &s.handlers {
                let ast::ExceptHandler::ExceptHandler(h) = handler;
                bodies.push(h.body.as_slice());
            }
            bodies.push(s.orelse.as_slice());
            bodies.push(s.finalbody.as_slice());
            bodies
        }
        Stmt::Match(s) => s.cases.iter().map(|case| case.body.as_slice()).collect(),
        _ => vec![],
    }
}

/// Expressions directly embedded in a statement (not those of nested
/// statements, which `walk_stmts` reaches on its own).
fn stmt_exprs<'a>(stmt: &'a Stmt) -> Vec<&'a Expr> {
    match stmt {
        Stmt::Expr(s) => vec![&*s.value],
        Stmt::Assign(s) => {
            let mut exprs: Vec<&Expr> = s.targets.iter().collect();
            exprs.push(&*s.value);
            exprs
        }
        Stmt::AugAssign(s) => vec![&*s.target, &*s.value],
        Stmt::AnnAssign(s) => {
            let mut exprs: Vec<&Expr> = vec![&*s.target, &*s.annotation];
            if let Some(value) = &s.value {
                exprs.push(&**value);
            }
            exprs
        }
        Stmt::Return(s) => s.value.iter().map(|v| &**v).collect(),
        Stmt::Delete(s) => s.targets.iter().collect(),
        Stmt::For(s) => vec![&*s.target, &*s.iter],
        Stmt::AsyncFor(s) => vec![&*s.target, &*s.iter],
        Stmt::While(s) => vec![&*s.test],
        Stmt::If(s) => vec![&*s.test],
        Stmt::With(s) => with_item_exprs(&s.items),
        Stmt::AsyncWith(s) => with_item_exprs(&s.items),
        Stmt::Raise(s) => {
            let mut exprs: Vec<&Expr> = Vec::new();
            if let Some(exc) = &s.exc {
                exprs.push(&**exc);
            }
            if let Some(cause) = &s.cause {
                exprs.push(&**cause);
            }
            exprs
        }
        Stmt::Assert(s) => {
            let mut exprs: Vec<&Expr> = vec![&*s.test];
            if let Some(msg) = &s.msg {
                exprs.push(&**msg);
            }
            exprs
        }
        Stmt::Match(s) => {
            let mut exprs: Vec<&Expr> = vec![&*s.subject];
            for case in &s.cases {
                if let Some(guard) = &case.guard {
                    exprs.push(&**guard);
                }
            }
            exprs
        }
        _ => vec![],
    }
}

fn with_item_exprs(items: &[ast::WithItem]) -> Vec<&Expr> {
    let mut exprs: Vec<&Expr> = Vec::new();
    for item in items {
        exprs.push(&item.context_expr);
        if let Some(vars) = &item.optional_vars {
            exprs.push(&**vars);
        }
    }
    exprs
}

fn child_exprs<'a>(expr: &'a Expr) -> Vec<&'a Expr> {
    match expr {
        Expr::BoolOp(e) => e.values.iter().collect(),
        Expr::NamedExpr(e) => vec![&*e.target, &*e.value],
        Expr::BinOp(e) => vec![&*e.left, &*e.right],
        Expr::UnaryOp(e) => vec![&*e.operand],
        Expr::Lambda(e) => vec![&*e.body],
        Expr::IfExp(e) => vec![&*e.test, &*e.body, &*e.orelse],
        Expr::Dict(e) => e.keys.iter().flatten().chain(e.values.iter()).collect(),
        Expr::Set(e) => e.elts.iter().collect(),
        Expr::ListComp(e) => comprehension_exprs(&e.elt, None, &e.generators),
        Expr::SetComp(e) => comprehension_exprs(&e.elt, None, &e.generators),
        Expr::DictComp(e) => comprehension_exprs(&e.key, Some(&*e.value), &e.generators),
        Expr::GeneratorExp(e) => comprehension_exprs(&e.elt, None, &e.generators),
        Expr::Await(e) => vec![&*e.value],
        Expr::Yield(e) => e.value.iter().map(|v| &**v).collect(),
        Expr::YieldFrom(e) => vec![&*e.value],
        Expr::Compare(e) => {
            let mut exprs: Vec<&Expr> = vec![&*e.left];
            exprs.extend(e.comparators.iter());
            exprs
        }
        Expr::Call(e) => {
            let mut exprs: Vec<&Expr> = vec![&*e.func];
            exprs.extend(e.args.iter());
            exprs.extend(e.keywords.iter().map(|kw| &kw.value));
            exprs
        }
        Expr::FormattedValue(e) => {
            let mut exprs: Vec<&Expr> = vec![&*e.value];
            if let Some(spec) = &e.format_spec {
                exprs.push(&**spec);
            }
            exprs
        }
        Expr::JoinedStr(e) => e.values.iter().collect(),
        Expr::Attribute(e) => vec![&*e.value],
        Expr::Subscript(e) => vec![&*e.value, &*e.slice],
        Expr::Starred(e) => vec![&*e.value],
        Expr::List(e) => e.elts.iter().collect(),
        Expr::Tuple(e) => e.elts.iter().collect(),
        Expr::Slice(e) => {
            let mut exprs: Vec<&Expr> = Vec::new();
            if let Some(lower) = &e.lower {
                exprs.push(&**lower);
            }
            if let Some(upper) = &e.upper {
                exprs.push(&**upper);
            }
            if let Some(step) = &e.step {
                exprs.push(&**step);
            }
            exprs
        }
        _ => vec![],
    }
}

fn comprehension_exprs<'a>(
    elt: &'a Expr,
    value: Option<&'a Expr>,
    generators: &'a [ast::Comprehension],
) -> Vec<&'a Expr> {
    let mut exprs = vec![elt];
    if let Some(value) = value {
        exprs.push(value);
    }
    for generator in generators {
        exprs.push(&generator.target);
        exprs.push(&generator.iter);
        exprs.extend(generator.ifs.iter());
    }
    exprs
}
