//! Model-training API smells (PyTorch and model constructors)

use crate::detectors::base::{SmellDetector, SmellFragment};
use crate::detectors::context::{FunctionContext, PyFunction};
use crate::extract::walk;
use anyhow::Result;
use rustpython_parser::ast::{Constant, Expr};

/// `backward()` inside a loop with no preceding `zero_grad()`.
pub struct GradientsNotCleared;

impl SmellDetector for GradientsNotCleared {
    fn name(&self) -> &'static str {
        "gradients_not_cleared_before_backward_propagation"
    }

    fn description(&self) -> &'static str {
        "Gradients must be cleared using `zero_grad()` before calling `backward()`."
    }

    fn detect(&self, function: &PyFunction, ctx: &FunctionContext) -> Result<Vec<SmellFragment>> {
        let mut smells = Vec::new();
        if ctx.torch_alias().is_none() {
            return Ok(smells);
        }

        for loop_stmt in walk::loops(function.body) {
            // Source-order scan: a `zero_grad()` seen before the `backward()`
            // clears the flag for the rest of the loop.
            let mut zero_grad_called = false;

            walk::walk_exprs(std::slice::from_ref(loop_stmt), &mut |expr| {
                let Expr::Call(call) = expr else {
                    return;
                };
                let Expr::Attribute(attr) = &*call.func else {
                    return;
                };
                let Expr::Name(receiver) = &*attr.value else {
                    return;
                };
                if !ctx.is_local_variable(receiver.id.as_str()) {
                    return;
                }

                match attr.attr.as_str() {
                    "zero_grad" => zero_grad_called = true,
                    "backward" if !zero_grad_called => {
                        let line = ctx.line_of(call);
                        smells.push(SmellFragment::new(
                            line,
                            format!(
                                "`zero_grad()` not called before `backward()` in loop. Code: {}",
                                ctx.snippet(line)
                            ),
                        ));
                    }
                    _ => {}
                }
            });
        }

        Ok(smells)
    }
}

/// Direct calls to a model's `forward` method instead of the callable model.
pub struct PytorchCallMethodMisused;

impl SmellDetector for PytorchCallMethodMisused {
    fn name(&self) -> &'static str {
        "pytorch_call_method_misused"
    }

    fn description(&self) -> &'static str {
        "Direct calls to `forward` in PyTorch models are discouraged. Use the model instance \
         directly instead."
    }

    fn detect(&self, function: &PyFunction, ctx: &FunctionContext) -> Result<Vec<SmellFragment>> {
        let mut smells = Vec::new();
        if ctx.torch_alias().is_none() {
            return Ok(smells);
        }

        walk::walk_exprs(function.body, &mut |expr| {
            let Expr::Call(call) = expr else {
                return;
            };
            let Expr::Attribute(attr) = &*call.func else {
                return;
            };
            if attr.attr.as_str() != "forward" {
                return;
            }

            // `self.forward(x)` inside a model class is special-cased; any
            // other receiver must resolve to a local variable.
            match walk::base_name(&attr.value) {
                Some("self") => {
                    smells.push(SmellFragment::new(
                        ctx.line_of(call),
                        "Direct call to `self.forward()` detected. Use the model instance \
                         directly instead.",
                    ));
                }
                Some(base) if ctx.is_local_variable(base) => {
                    smells.push(SmellFragment::new(
                        ctx.line_of(call),
                        format!(
                            "Direct call to `{base}.forward()` detected. Use the model instance \
                             directly instead."
                        ),
                    ));
                }
                _ => {}
            }
        });

        Ok(smells)
    }
}

/// `torch.use_deterministic_algorithms(True)`, a common performance trap.
pub struct DeterministicAlgorithmOption;

impl SmellDetector for DeterministicAlgorithmOption {
    fn name(&self) -> &'static str {
        "deterministic_algorithm_option_not_used"
    }

    fn description(&self) -> &'static str {
        "Using `torch.use_deterministic_algorithms(True)` can cause performance issues. Avoid \
         using this option unless determinism is strictly required."
    }

    fn detect(&self, function: &PyFunction, ctx: &FunctionContext) -> Result<Vec<SmellFragment>> {
        let mut smells = Vec::new();

        walk::walk_exprs(function.body, &mut |expr| {
            let Expr::Call(call) = expr else {
                return;
            };
            let full_name = ctx.libraries.dotted_name_of(&call.func);
            if full_name != "torch.use_deterministic_algorithms"
                && full_name != "use_deterministic_algorithms"
            {
                return;
            }

            let enabled = call.args.len() == 1
                && matches!(&call.args[0], Expr::Constant(constant)
                    if matches!(constant.value, Constant::Bool(true)));
            if enabled {
                smells.push(SmellFragment::new(
                    ctx.line_of(call),
                    format!("Using `{full_name}(True)` detected. Avoid for performance."),
                ));
            }
        });

        Ok(smells)
    }
}

/// Model constructors invoked with every hyperparameter left at its default.
pub struct HyperparametersNotExplicitlySet;

impl SmellDetector for HyperparametersNotExplicitlySet {
    fn name(&self) -> &'static str {
        "hyperparameters_not_explicitly_set"
    }

    fn description(&self) -> &'static str {
        "Hyperparameters should be explicitly set when defining models to ensure clarity and \
         reproducibility."
    }

    fn detect(&self, function: &PyFunction, ctx: &FunctionContext) -> Result<Vec<SmellFragment>> {
        let mut smells = Vec::new();
        if ctx.libraries.is_empty() {
            return Ok(smells);
        }

        walk::walk_exprs(function.body, &mut |expr| {
            let Expr::Call(call) = expr else {
                return;
            };
            if !call.args.is_empty() || !call.keywords.is_empty() {
                return;
            }

            let full_name = ctx.libraries.dotted_name_of(&call.func);
            let constructor = full_name.rsplit('.').next().unwrap_or(&full_name);
            if ctx.catalog.is_model_constructor(constructor) {
                smells.push(SmellFragment::new(
                    ctx.line_of(call),
                    format!(
                        "Hyperparameters not explicitly set for model '{full_name}'. Consider \
                         defining key hyperparameters for clarity."
                    ),
                ));
            }
        });

        Ok(smells)
    }
}
