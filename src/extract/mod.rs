//! Semantic extractors
//!
//! Stateless, pure walks over the parsed module that produce the per-function
//! analysis context consumed by the detectors: library aliases, variable
//! definitions, and dataframe-typed variables. The file inspector runs each
//! extractor once and shares the results by reference.

pub mod dataframes;
pub mod libraries;
pub mod variables;
pub mod walk;

pub use libraries::LibraryAliasMap;
pub use variables::{RhsShape, VariableDef};
