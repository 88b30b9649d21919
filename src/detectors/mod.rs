//! ML code smell detectors
//!
//! This module provides the detector framework and the smell catalog:
//!
//! - [`base::SmellDetector`] — the capability every detector implements
//! - a registry built once at engine construction; adding a detector never
//!   touches the dispatch loop
//! - [`RuleEngine`] — runs every registered detector against each function
//!   and stamps file/function identity onto the emitted fragments
//!
//! Detector groups mirror the smell families:
//! - `dataframe` — pandas usage patterns
//! - `tensor` — NumPy/TensorFlow tensor patterns
//! - `training` — PyTorch and model-construction patterns

pub mod base;
pub mod context;
mod dataframe;
mod tensor;
mod training;

pub use base::{SmellDetector, SmellFragment};
pub use context::{FunctionContext, PyFunction};

use crate::models::DetectionRecord;
use tracing::warn;

/// Build the full smell catalog, in registration order.
///
/// Order affects only output ordering, never correctness: detectors are
/// independent and share nothing mutable.
pub fn registry() -> Vec<Box<dyn SmellDetector>> {
    vec![
        // API-specific smells
        Box::new(dataframe::ChainIndexing),
        Box::new(dataframe::DataFrameConversionApiMisused),
        Box::new(training::GradientsNotCleared),
        Box::new(tensor::MatrixMultiplicationApiMisused),
        Box::new(training::PytorchCallMethodMisused),
        Box::new(tensor::TensorArrayNotUsed),
        // Generic smells
        Box::new(tensor::BroadcastingFeatureNotUsed),
        Box::new(dataframe::ColumnsAndDatatypeNotExplicitlySet),
        Box::new(training::DeterministicAlgorithmOption),
        Box::new(dataframe::EmptyColumnMisinitialization),
        Box::new(training::HyperparametersNotExplicitlySet),
        Box::new(dataframe::InPlaceApisMisused),
        Box::new(tensor::MemoryNotFreed),
        Box::new(dataframe::MergeApiParameterNotExplicitlySet),
        Box::new(tensor::NanEquivalenceComparisonMisused),
        Box::new(dataframe::UnnecessaryIteration),
    ]
}

/// Runs the smell catalog against one function at a time.
pub struct RuleEngine {
    detectors: Vec<Box<dyn SmellDetector>>,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self {
            detectors: registry(),
        }
    }

    /// Number of registered detectors.
    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Evaluate every detector against `function`, appending completed
    /// records to `out`.
    ///
    /// A failing detector is skipped with a warning; it cannot discard the
    /// findings other detectors already produced for this file.
    pub fn check_function(
        &self,
        function: &PyFunction,
        ctx: &FunctionContext,
        filename: &str,
        out: &mut Vec<DetectionRecord>,
    ) {
        for detector in &self.detectors {
            match detector.detect(function, ctx) {
                Ok(fragments) => {
                    for fragment in fragments {
                        out.push(DetectionRecord {
                            filename: filename.to_string(),
                            function_name: function.name.to_string(),
                            smell_name: detector.name().to_string(),
                            line: fragment.line,
                            description: detector.description().to_string(),
                            additional_info: fragment.additional_info,
                            commit: None,
                        });
                    }
                }
                Err(err) => {
                    warn!(
                        detector = detector.name(),
                        function = function.name,
                        file = filename,
                        "detector failed: {err:#}"
                    );
                }
            }
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_full_catalog() {
        let engine = RuleEngine::new();
        assert_eq!(engine.len(), 16);
    }

    #[test]
    fn test_registry_names_are_unique() {
        let detectors = registry();
        let mut names: Vec<&str> = detectors.iter().map(|d| d.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), detectors.len());
    }
}
