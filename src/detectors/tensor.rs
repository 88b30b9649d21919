//! NumPy and TensorFlow tensor-usage smells

use crate::detectors::base::{SmellDetector, SmellFragment};
use crate::detectors::context::{FunctionContext, PyFunction};
use crate::extract::walk;
use anyhow::Result;
use rustpython_parser::ast::{Expr, ExprCall, Stmt};
use std::collections::HashSet;

/// Check whether a call's receiver chain matches `base.attr1.attr2...()`,
/// e.g. `tf.keras.backend.clear_session()`.
fn is_nested_call(call: &ExprCall, base: &str, attributes: &[&str]) -> bool {
    let mut current = &*call.func;
    for attr in attributes.iter().rev() {
        let Expr::Attribute(attribute) = current else {
            return false;
        };
        if attribute.attr.as_str() != *attr {
            return false;
        }
        current = &attribute.value;
    }
    matches!(current, Expr::Name(name) if name.id.as_str() == base)
}

/// `np.dot()` used for matrix multiplication instead of `np.matmul`.
pub struct MatrixMultiplicationApiMisused;

impl MatrixMultiplicationApiMisused {
    /// Heuristic: at least two arguments, one of which is a matrix literal
    /// (list of lists) or a variable.
    fn looks_like_matrix_multiplication(call: &ExprCall) -> bool {
        if call.args.len() < 2 {
            return false;
        }
        call.args.iter().any(|arg| match arg {
            Expr::List(list) => list.elts.iter().all(|el| matches!(el, Expr::List(_))),
            Expr::Name(_) => true,
            _ => false,
        })
    }
}

impl SmellDetector for MatrixMultiplicationApiMisused {
    fn name(&self) -> &'static str {
        "matrix_multiplication_api_misused"
    }

    fn description(&self) -> &'static str {
        "Using `dot()` for matrix multiplication is discouraged. Use `np.matmul` instead."
    }

    fn detect(&self, function: &PyFunction, ctx: &FunctionContext) -> Result<Vec<SmellFragment>> {
        let mut smells = Vec::new();
        let Some(numpy_alias) = ctx.numpy_alias() else {
            return Ok(smells);
        };

        walk::walk_exprs(function.body, &mut |expr| {
            let Expr::Call(call) = expr else {
                return;
            };
            let Expr::Attribute(attr) = &*call.func else {
                return;
            };
            if attr.attr.as_str() != "dot" {
                return;
            }
            if !matches!(&*attr.value, Expr::Name(name) if name.id.as_str() == numpy_alias) {
                return;
            }
            if Self::looks_like_matrix_multiplication(call) {
                let line = ctx.line_of(call);
                smells.push(SmellFragment::new(
                    line,
                    format!(
                        "Detected misuse of `dot()` for matrix multiplication. Consider using \
                         `np.matmul` instead. Code: {}",
                        ctx.snippet(line)
                    ),
                ));
            }
        });

        Ok(smells)
    }
}

/// `tf.constant` grown with `tf.concat` inside a loop instead of
/// `tf.TensorArray`.
pub struct TensorArrayNotUsed;

impl TensorArrayNotUsed {
    fn concat_argument_names(call: &ExprCall) -> Vec<String> {
        let mut names = Vec::new();
        for arg in &call.args {
            match arg {
                Expr::Name(name) => names.push(name.id.as_str().to_string()),
                Expr::List(list) => {
                    for item in &list.elts {
                        match item {
                            Expr::Name(name) => names.push(name.id.as_str().to_string()),
                            Expr::Call(inner) => {
                                if let Expr::Name(func) = &*inner.func {
                                    names.push(func.id.as_str().to_string());
                                }
                            }
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }
        names
    }
}

impl SmellDetector for TensorArrayNotUsed {
    fn name(&self) -> &'static str {
        "tensor_array_not_used"
    }

    fn description(&self) -> &'static str {
        "If `tf.constant()` is used to initialize an array and modified in a loop, it may cause \
         errors. Consider using `tf.TensorArray` for dynamically growing arrays."
    }

    fn detect(&self, function: &PyFunction, ctx: &FunctionContext) -> Result<Vec<SmellFragment>> {
        let mut smells = Vec::new();
        let Some(tf_alias) = ctx.tensorflow_alias() else {
            return Ok(smells);
        };

        // First pass: tensors initialized with `tf.constant`.
        let mut tensor_constants: HashSet<String> = HashSet::new();
        walk::walk_stmts(function.body, &mut |stmt| {
            let Stmt::Assign(assign) = stmt else {
                return;
            };
            let Expr::Call(call) = &*assign.value else {
                return;
            };
            if is_nested_call(call, tf_alias, &["constant"]) {
                for target in &assign.targets {
                    if let Expr::Name(name) = target {
                        tensor_constants.insert(name.id.as_str().to_string());
                    }
                }
            }
        });

        // Second pass: those tensors re-concatenated inside a loop.
        for loop_stmt in walk::loops(function.body) {
            walk::walk_stmts(std::slice::from_ref(loop_stmt), &mut |stmt| {
                let Stmt::Assign(assign) = stmt else {
                    return;
                };
                let Expr::Call(call) = &*assign.value else {
                    return;
                };
                if !is_nested_call(call, tf_alias, &["concat"]) {
                    return;
                }
                let modified = Self::concat_argument_names(call)
                    .into_iter()
                    .any(|name| tensor_constants.contains(&name));
                if modified {
                    smells.push(SmellFragment::new(
                        ctx.line_of(assign),
                        "Using `tf.TensorArray` is better for dynamically growing arrays.",
                    ));
                }
            });
        }

        Ok(smells)
    }
}

/// `tf.tile` where broadcasting would do.
pub struct BroadcastingFeatureNotUsed;

impl BroadcastingFeatureNotUsed {
    fn is_tile_call(expr: &Expr, tf_alias: &str) -> bool {
        matches!(expr, Expr::Call(call) if is_nested_call(call, tf_alias, &["tile"]))
    }
}

impl SmellDetector for BroadcastingFeatureNotUsed {
    fn name(&self) -> &'static str {
        "Broadcasting_Feature_Not_Used"
    }

    fn description(&self) -> &'static str {
        "Using broadcasting in TensorFlow is preferred over tiling arrays unnecessarily. \
         Broadcasting allows arithmetic between arrays of different shapes, saving memory and \
         computation time."
    }

    fn detect(&self, function: &PyFunction, ctx: &FunctionContext) -> Result<Vec<SmellFragment>> {
        let mut smells = Vec::new();
        let Some(tf_alias) = ctx.tensorflow_alias() else {
            return Ok(smells);
        };

        // Variables produced by a `tf.tile` assignment.
        let mut tiled_variables: HashSet<String> = HashSet::new();
        walk::walk_stmts(function.body, &mut |stmt| {
            let Stmt::Assign(assign) = stmt else {
                return;
            };
            let Expr::Call(call) = &*assign.value else {
                return;
            };
            if is_nested_call(call, tf_alias, &["tile"]) {
                if let Some(Expr::Name(name)) = assign.targets.first() {
                    tiled_variables.insert(name.id.as_str().to_string());
                }
            }
        });

        walk::walk_exprs(function.body, &mut |expr| {
            let Expr::BinOp(binop) = expr else {
                return;
            };

            let tiled_operand = [&binop.left, &binop.right].into_iter().find_map(|side| {
                match &**side {
                    Expr::Name(name) if tiled_variables.contains(name.id.as_str()) => {
                        Some(name.id.as_str().to_string())
                    }
                    _ => None,
                }
            });

            if let Some(variable) = tiled_operand {
                smells.push(SmellFragment::new(
                    ctx.line_of(binop),
                    format!(
                        "Variable '{variable}' involves unnecessary tiling. Consider using \
                         broadcasting instead."
                    ),
                ));
            } else if Self::is_tile_call(&binop.left, tf_alias)
                || Self::is_tile_call(&binop.right, tf_alias)
            {
                smells.push(SmellFragment::new(
                    ctx.line_of(binop),
                    "Inline use of `tf.tile` detected. Consider using broadcasting instead.",
                ));
            }
        });

        Ok(smells)
    }
}

/// Equivalence comparison against NaN, which is never equal to anything.
pub struct NanEquivalenceComparisonMisused;

impl NanEquivalenceComparisonMisused {
    fn is_nan(expr: &Expr, numpy_alias: &str) -> bool {
        match expr {
            Expr::Attribute(attr) => {
                attr.attr.as_str() == "nan"
                    && matches!(&*attr.value, Expr::Name(name)
                        if name.id.as_str() == numpy_alias)
            }
            // `from numpy import nan`
            Expr::Name(name) => name.id.as_str() == "nan",
            _ => false,
        }
    }
}

impl SmellDetector for NanEquivalenceComparisonMisused {
    fn name(&self) -> &'static str {
        "nan_equivalence_comparison_misused"
    }

    fn description(&self) -> &'static str {
        "Direct equivalence comparisons with NaN should be avoided. Use functions like \
         np.isnan() instead."
    }

    fn detect(&self, function: &PyFunction, ctx: &FunctionContext) -> Result<Vec<SmellFragment>> {
        let mut smells = Vec::new();
        let Some(numpy_alias) = ctx.numpy_alias() else {
            return Ok(smells);
        };

        walk::walk_exprs(function.body, &mut |expr| {
            let Expr::Compare(compare) = expr else {
                return;
            };
            let involves_nan = Self::is_nan(&compare.left, numpy_alias)
                || compare
                    .comparators
                    .iter()
                    .any(|comparator| Self::is_nan(comparator, numpy_alias));
            if involves_nan {
                smells.push(SmellFragment::new(
                    ctx.line_of(compare),
                    "Direct equivalence comparison with NaN detected. Use np.isnan() instead.",
                ));
            }
        });

        Ok(smells)
    }
}

/// Keras models built inside a loop without `clear_session` between
/// iterations.
pub struct MemoryNotFreed;

const MODEL_CONSTRUCTORS: [&str; 2] = ["Sequential", "Model"];

impl SmellDetector for MemoryNotFreed {
    fn name(&self) -> &'static str {
        "memory_not_freed"
    }

    fn description(&self) -> &'static str {
        "Memory not freed after model definition in loops may lead to memory leakage. Consider \
         using tf.keras.backend.clear_session() to free memory explicitly."
    }

    fn detect(&self, function: &PyFunction, ctx: &FunctionContext) -> Result<Vec<SmellFragment>> {
        let mut smells = Vec::new();
        let Some(tf_alias) = ctx.tensorflow_alias() else {
            return Ok(smells);
        };

        for loop_stmt in walk::loops(function.body) {
            let mut model_defined = false;
            let mut memory_freed = false;

            walk::walk_exprs(std::slice::from_ref(loop_stmt), &mut |expr| {
                let Expr::Call(call) = expr else {
                    return;
                };
                if MODEL_CONSTRUCTORS
                    .iter()
                    .any(|method| is_nested_call(call, tf_alias, &["keras", *method]))
                {
                    model_defined = true;
                }
                if is_nested_call(call, tf_alias, &["keras", "backend", "clear_session"]) {
                    memory_freed = true;
                }
            });

            if model_defined && !memory_freed {
                smells.push(SmellFragment::new(
                    ctx.line_of(loop_stmt),
                    "Memory not freed after model definition in loop. Consider using \
                     tf.keras.backend.clear_session().",
                ));
            }
        }

        Ok(smells)
    }
}
