//! Base detector trait and types
//!
//! This module defines the core abstractions for smell detection:
//! - `SmellDetector` trait that all detectors must implement
//! - `SmellFragment`, the partial finding a detector emits before the engine
//!   stamps file and function identity onto it

use crate::detectors::context::{FunctionContext, PyFunction};
use anyhow::Result;

/// A partial finding emitted by one detector for one function.
///
/// `line` is 1-indexed into the original source text.
#[derive(Debug, Clone)]
pub struct SmellFragment {
    pub line: u32,
    pub additional_info: String,
}

impl SmellFragment {
    pub fn new(line: u32, additional_info: impl Into<String>) -> Self {
        Self {
            line,
            additional_info: additional_info.into(),
        }
    }
}

/// Trait for all ML code smell detectors.
///
/// Detectors are independent and unordered with respect to each other: one
/// detector never observes side effects of another, and the shared context is
/// read-only. Registration order affects only output ordering.
pub trait SmellDetector: Send + Sync {
    /// Stable smell name stamped onto every record this detector produces.
    fn name(&self) -> &'static str;

    /// Human-readable description of the anti-pattern.
    fn description(&self) -> &'static str;

    /// Analyze one function subtree against its context.
    fn detect(&self, function: &PyFunction, ctx: &FunctionContext) -> Result<Vec<SmellFragment>>;
}
