//! Reference catalogs of ML-framework names
//!
//! Three immutable lookup tables loaded once from CSV reference data packaged
//! with the binary: pandas DataFrame methods, model constructor signatures,
//! and tensor operations. They are owned by the [`Inspector`](crate::inspector::Inspector)
//! for its whole lifetime and shared read-only with every extractor and
//! detector; nothing reloads them per file.

use std::collections::HashSet;

const DATAFRAME_METHODS_CSV: &str = include_str!("../resources/dataframes.csv");
const MODELS_CSV: &str = include_str!("../resources/models.csv");
const TENSORS_CSV: &str = include_str!("../resources/tensors.csv");

/// A model constructor name and the library it belongs to.
#[derive(Debug, Clone)]
pub struct ModelSignature {
    pub method: String,
    pub library: String,
}

/// Immutable, process-lifetime reference tables.
#[derive(Debug)]
pub struct ReferenceCatalog {
    dataframe_methods: HashSet<String>,
    models: Vec<ModelSignature>,
    tensor_operations: HashSet<String>,
}

impl ReferenceCatalog {
    /// Load all three tables from the embedded reference data.
    pub fn load() -> Self {
        let dataframe_methods = csv_column(DATAFRAME_METHODS_CSV, 0).collect();

        let models = csv_rows(MODELS_CSV)
            .filter(|row| row.len() >= 2)
            .map(|row| ModelSignature {
                // Entries may carry a trailing call marker; normalize it away.
                method: row[0].trim_end_matches("()").to_string(),
                library: row[1].to_string(),
            })
            .collect();

        // Only operations combining more than one tensor input are relevant
        // to the detectors that consume this table.
        let tensor_operations = csv_rows(TENSORS_CSV)
            .filter(|row| {
                row.len() >= 2 && row[1].parse::<u32>().map(|n| n > 1).unwrap_or(false)
            })
            .map(|row| row[0].to_string())
            .collect();

        Self {
            dataframe_methods,
            models,
            tensor_operations,
        }
    }

    pub fn dataframe_methods(&self) -> &HashSet<String> {
        &self.dataframe_methods
    }

    pub fn is_dataframe_method(&self, name: &str) -> bool {
        self.dataframe_methods.contains(name)
    }

    pub fn models(&self) -> &[ModelSignature] {
        &self.models
    }

    /// True if `name` is a known model constructor in any library.
    pub fn is_model_constructor(&self, name: &str) -> bool {
        let name = name.trim_end_matches("()");
        self.models.iter().any(|m| m.method == name)
    }

    /// True if `model` is a constructor belonging to one of `libraries`.
    pub fn model_belongs_to(&self, model: &str, libraries: &[&str]) -> bool {
        self.models
            .iter()
            .any(|m| m.method == model && libraries.contains(&m.library.as_str()))
    }

    pub fn tensor_operations(&self) -> &HashSet<String> {
        &self.tensor_operations
    }
}

fn csv_rows(data: &str) -> impl Iterator<Item = Vec<&str>> {
    data.lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split(',').map(str::trim).collect())
}

fn csv_column(data: &str, index: usize) -> impl Iterator<Item = String> + '_ {
    csv_rows(data).filter_map(move |row| row.get(index).map(|s| s.to_string()))
}
