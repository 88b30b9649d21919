//! Pandas usage smells
//!
//! Every detector here is guarded on the pandas import: without the alias the
//! file cannot be using dataframes and the detector returns nothing.

use crate::detectors::base::{SmellDetector, SmellFragment};
use crate::detectors::context::{FunctionContext, PyFunction};
use crate::extract::walk;
use anyhow::Result;
use malachite_bigint::BigInt;
use rustpython_parser::ast::{Constant, Expr, Ranged, Stmt};
use std::collections::HashSet;

/// `df["a"][0]` on a dataframe variable.
pub struct ChainIndexing;

impl SmellDetector for ChainIndexing {
    fn name(&self) -> &'static str {
        "Chain_Indexing"
    }

    fn description(&self) -> &'static str {
        "Using chain indexing may cause performance issues."
    }

    fn detect(&self, function: &PyFunction, ctx: &FunctionContext) -> Result<Vec<SmellFragment>> {
        let mut smells = Vec::new();
        if ctx.pandas_alias().is_none() {
            return Ok(smells);
        }

        walk::walk_exprs(function.body, &mut |expr| {
            if let Expr::Subscript(outer) = expr {
                if let Expr::Subscript(inner) = &*outer.value {
                    if let Expr::Name(name) = &*inner.value {
                        if ctx.is_dataframe(name.id.as_str()) {
                            smells.push(SmellFragment::new(
                                ctx.line_of(outer),
                                format!(
                                    "Chained indexing detected in variable '{}'.",
                                    name.id.as_str()
                                ),
                            ));
                        }
                    }
                }
            }
        });

        Ok(smells)
    }
}

/// `df.values` — deprecated conversion attribute with an unclear return type.
pub struct DataFrameConversionApiMisused;

impl SmellDetector for DataFrameConversionApiMisused {
    fn name(&self) -> &'static str {
        "dataframe_conversion_api_misused"
    }

    fn description(&self) -> &'static str {
        "Using the `values` attribute in Pandas is deprecated. Use NumPy or explicit methods instead."
    }

    fn detect(&self, function: &PyFunction, ctx: &FunctionContext) -> Result<Vec<SmellFragment>> {
        let mut smells = Vec::new();
        if ctx.pandas_alias().is_none() {
            return Ok(smells);
        }

        walk::walk_exprs(function.body, &mut |expr| {
            if let Expr::Attribute(attr) = expr {
                if attr.attr.as_str() == "values" {
                    if let Expr::Name(name) = &*attr.value {
                        if ctx.is_dataframe(name.id.as_str()) {
                            let line = ctx.line_of(attr);
                            smells.push(SmellFragment::new(
                                line,
                                format!(
                                    "Misuse of the 'values' attribute detected in variable '{}'. \
                                     Consider using NumPy or explicit conversion methods instead; \
                                     `values` is deprecated and its return type is unclear. \
                                     Code: {}",
                                    name.id.as_str(),
                                    ctx.snippet(line)
                                ),
                            ));
                        }
                    }
                }
            }
        });

        Ok(smells)
    }
}

/// In-place dataframe APIs called with `inplace=False` or with an unassigned
/// result.
pub struct InPlaceApisMisused;

impl SmellDetector for InPlaceApisMisused {
    fn name(&self) -> &'static str {
        "in_place_apis_misused"
    }

    fn description(&self) -> &'static str {
        "Check whether the result of the operation is assigned to a variable or the in-place \
         parameter is set. Some developers mistakenly assume in-place operations always save memory."
    }

    fn detect(&self, function: &PyFunction, ctx: &FunctionContext) -> Result<Vec<SmellFragment>> {
        let mut smells = Vec::new();
        if ctx.pandas_alias().is_none() {
            return Ok(smells);
        }

        // Calls appearing directly as an assignment's right-hand side, keyed
        // by byte range.
        let mut assigned_calls: HashSet<(usize, usize)> = HashSet::new();
        walk::walk_stmts(function.body, &mut |stmt| {
            if let Stmt::Assign(assign) = stmt {
                if let Expr::Call(call) = &*assign.value {
                    assigned_calls.insert(range_key(call));
                }
            }
        });

        walk::walk_exprs(function.body, &mut |expr| {
            let Expr::Call(call) = expr else {
                return;
            };
            let Expr::Attribute(attr) = &*call.func else {
                return;
            };
            let Expr::Name(receiver) = &*attr.value else {
                return;
            };
            if !ctx.is_dataframe(receiver.id.as_str())
                || !ctx.catalog.is_dataframe_method(attr.attr.as_str())
            {
                return;
            }

            // `inplace` passed as anything but a literal bool counts as unset.
            let mut inplace_flag: Option<bool> = None;
            for keyword in &call.keywords {
                if keyword.arg.as_ref().map(|a| a.as_str()) == Some("inplace") {
                    if let Expr::Constant(constant) = &keyword.value {
                        if let Constant::Bool(flag) = &constant.value {
                            inplace_flag = Some(*flag);
                        }
                    }
                }
            }

            if inplace_flag == Some(false) {
                smells.push(SmellFragment::new(
                    ctx.line_of(call),
                    format!(
                        "Explicitly setting `inplace=False` for `{}` may cause confusion. \
                         Consider assigning the result to a variable or explicitly using \
                         `inplace=True`.",
                        attr.attr.as_str()
                    ),
                ));
            }

            if inplace_flag.is_none() && !assigned_calls.contains(&range_key(call)) {
                smells.push(SmellFragment::new(
                    ctx.line_of(call),
                    format!(
                        "The result of the `{}` method is not assigned to a variable, and the \
                         `inplace` parameter is not explicitly set. Consider assigning the \
                         result or setting `inplace=True`.",
                        attr.attr.as_str()
                    ),
                ));
            }
        });

        Ok(smells)
    }
}

/// `merge` called without the parameters that pin down its join semantics.
pub struct MergeApiParameterNotExplicitlySet;

impl SmellDetector for MergeApiParameterNotExplicitlySet {
    fn name(&self) -> &'static str {
        "merge_api_parameter_not_explicitly_set"
    }

    fn description(&self) -> &'static str {
        "Calls to Pandas' `merge` API should explicitly set parameters like 'how', 'on', and \
         'validate' to avoid unexpected behavior."
    }

    fn detect(&self, function: &PyFunction, ctx: &FunctionContext) -> Result<Vec<SmellFragment>> {
        let mut smells = Vec::new();
        let Some(pandas_alias) = ctx.pandas_alias() else {
            return Ok(smells);
        };

        walk::walk_exprs(function.body, &mut |expr| {
            let Expr::Call(call) = expr else {
                return;
            };
            let Expr::Attribute(attr) = &*call.func else {
                return;
            };
            if attr.attr.as_str() != "merge" {
                return;
            }

            let is_dataframe_call = matches!(&*attr.value, Expr::Name(name)
                if ctx.is_dataframe(name.id.as_str()));
            let is_pandas_call = matches!(&*attr.value, Expr::Attribute(base)
                if matches!(&*base.value, Expr::Name(name) if name.id.as_str() == pandas_alias));
            if !is_dataframe_call && !is_pandas_call {
                return;
            }

            if call.keywords.is_empty() {
                smells.push(SmellFragment::new(
                    ctx.line_of(call),
                    "Missing explicit parameters in `merge` (e.g., 'how', 'on', 'validate').",
                ));
                return;
            }

            let given: HashSet<&str> = call
                .keywords
                .iter()
                .filter_map(|kw| kw.arg.as_ref().map(|a| a.as_str()))
                .collect();
            if !["how", "on", "validate"].iter().all(|p| given.contains(p)) {
                smells.push(SmellFragment::new(
                    ctx.line_of(call),
                    "Incomplete parameters in `merge`. Consider specifying 'how', 'on', and \
                     'validate'.",
                ));
            }
        });

        Ok(smells)
    }
}

/// `pd.DataFrame` / `pd.read_csv` without an explicit `dtype`.
pub struct ColumnsAndDatatypeNotExplicitlySet;

impl SmellDetector for ColumnsAndDatatypeNotExplicitlySet {
    fn name(&self) -> &'static str {
        "columns_and_datatype_not_explicitly_set"
    }

    fn description(&self) -> &'static str {
        "Pandas' DataFrame or read_csv methods should explicitly set 'dtype' to avoid \
         unexpected behavior."
    }

    fn detect(&self, function: &PyFunction, ctx: &FunctionContext) -> Result<Vec<SmellFragment>> {
        let mut smells = Vec::new();
        let Some(pandas_alias) = ctx.pandas_alias() else {
            return Ok(smells);
        };

        walk::walk_exprs(function.body, &mut |expr| {
            let Expr::Call(call) = expr else {
                return;
            };
            let Expr::Attribute(attr) = &*call.func else {
                return;
            };
            let method = attr.attr.as_str();
            if method != "DataFrame" && method != "read_csv" {
                return;
            }
            if !matches!(&*attr.value, Expr::Name(name) if name.id.as_str() == pandas_alias) {
                return;
            }

            if call.keywords.is_empty() {
                smells.push(SmellFragment::new(
                    ctx.line_of(call),
                    format!("Missing explicit 'dtype' in {method} call."),
                ));
            } else {
                let has_dtype = call
                    .keywords
                    .iter()
                    .any(|kw| kw.arg.as_ref().map(|a| a.as_str()) == Some("dtype"));
                if !has_dtype {
                    smells.push(SmellFragment::new(
                        ctx.line_of(call),
                        format!("'dtype' not explicitly set in {method} call."),
                    ));
                }
            }
        });

        Ok(smells)
    }
}

/// New dataframe columns initialized with `0` or `""` instead of NaN.
pub struct EmptyColumnMisinitialization;

impl SmellDetector for EmptyColumnMisinitialization {
    fn name(&self) -> &'static str {
        "empty_column_misinitialization"
    }

    fn description(&self) -> &'static str {
        "Using zeros or empty strings to initialize new DataFrame columns may cause issues. \
         Consider using NaN (e.g., np.nan) instead."
    }

    fn detect(&self, function: &PyFunction, ctx: &FunctionContext) -> Result<Vec<SmellFragment>> {
        let mut smells = Vec::new();
        if ctx.pandas_alias().is_none() {
            return Ok(smells);
        }

        walk::walk_stmts(function.body, &mut |stmt| {
            let Stmt::Assign(assign) = stmt else {
                return;
            };
            if assign.targets.len() != 1 {
                return;
            }
            let Expr::Subscript(target) = &assign.targets[0] else {
                return;
            };
            let Expr::Name(frame) = &*target.value else {
                return;
            };
            if !ctx.is_dataframe(frame.id.as_str()) {
                return;
            }

            let Expr::Constant(value) = &*assign.value else {
                return;
            };
            let is_zero_or_empty = match &value.value {
                Constant::Int(i) => i == &BigInt::from(0),
                Constant::Str(s) => s.is_empty(),
                _ => false,
            };
            if !is_zero_or_empty {
                return;
            }

            let Expr::Constant(column) = &*target.slice else {
                return;
            };
            let column_name = match &column.value {
                Constant::Str(s) if !s.is_empty() => s.clone(),
                Constant::Int(i) if i != &BigInt::from(0) => i.to_string(),
                _ => return,
            };

            smells.push(SmellFragment::new(
                ctx.line_of(assign),
                format!(
                    "Column '{}' in DataFrame '{}' is initialized with a zero or an empty \
                     string. Consider using NaN instead.",
                    column_name,
                    frame.id.as_str()
                ),
            ));
        });

        Ok(smells)
    }
}

/// Row-wise iteration and `apply`-style operations where vectorization works.
pub struct UnnecessaryIteration;

const INEFFICIENT_METHODS: [&str; 4] = ["iterrows", "itertuples", "apply", "applymap"];

impl UnnecessaryIteration {
    /// Dataframe variable, or a subscript into one (`df["a"]`).
    fn is_dataframe_expr(expr: &Expr, ctx: &FunctionContext) -> bool {
        match expr {
            Expr::Name(name) => ctx.is_dataframe(name.id.as_str()),
            Expr::Subscript(sub) => matches!(&*sub.value, Expr::Name(name)
                if ctx.is_dataframe(name.id.as_str())),
            _ => false,
        }
    }

    fn is_inefficient_call(expr: &Expr, ctx: &FunctionContext) -> bool {
        let Expr::Call(call) = expr else {
            return false;
        };
        let Expr::Attribute(attr) = &*call.func else {
            return false;
        };
        INEFFICIENT_METHODS.contains(&attr.attr.as_str())
            && Self::is_dataframe_expr(&attr.value, ctx)
    }
}

impl SmellDetector for UnnecessaryIteration {
    fn name(&self) -> &'static str {
        "unnecessary_iteration"
    }

    fn description(&self) -> &'static str {
        "Iterating through Pandas objects or using inefficient operations like `apply` is \
         generally slow. Use built-in vectorized methods (e.g., join, groupby) instead of loops."
    }

    fn detect(&self, function: &PyFunction, ctx: &FunctionContext) -> Result<Vec<SmellFragment>> {
        let mut smells = Vec::new();
        if ctx.pandas_alias().is_none() {
            return Ok(smells);
        }

        for loop_stmt in walk::loops(function.body) {
            // `for _ in df.iterrows():` is flagged on the loop itself and the
            // body is not re-checked.
            if let Stmt::For(for_stmt) = loop_stmt {
                if Self::is_inefficient_call(&for_stmt.iter, ctx) {
                    smells.push(SmellFragment::new(
                        ctx.line_of(for_stmt),
                        "Inefficient iteration detected. Consider using vectorized operations \
                         instead.",
                    ));
                    continue;
                }
            }

            // Otherwise report the first inefficient operation in the loop.
            let mut first_line: Option<u32> = None;
            walk::walk_exprs(std::slice::from_ref(loop_stmt), &mut |expr| {
                if first_line.is_none() && Self::is_inefficient_call(expr, ctx) {
                    first_line = Some(ctx.line_of(expr));
                }
            });
            if let Some(line) = first_line {
                smells.push(SmellFragment::new(
                    line,
                    "Inefficient operation detected inside the loop. Consider using vectorized \
                     operations instead.",
                ));
            }
        }

        Ok(smells)
    }
}

fn range_key(node: &impl Ranged) -> (usize, usize) {
    let range = node.range();
    (usize::from(range.start()), usize::from(range.end()))
}
