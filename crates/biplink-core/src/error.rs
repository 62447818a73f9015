//! Error types for biplink-core.

use thiserror::Error;

/// Errors produced while loading, preparing or scoring a dataset.
#[derive(Error, Debug)]
pub enum Error {
    /// Structural violation in the input: duplicate or non-dense ids,
    /// dangling edge endpoints, missing files, mismatched shapes.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// An applicable attribute value could not be read as a number.
    #[error("Attribute '{attribute}' of node {node} is not numeric: {value}")]
    AttributeCoercion {
        /// Node whose row holds the value.
        node: usize,
        /// Attribute name.
        attribute: String,
        /// The raw value as it appeared in the input.
        value: String,
    },

    /// One side of the bipartite split has no nodes (strict mode only).
    #[error("Empty partition: no nodes of type {0}")]
    EmptyPartition(String),

    /// A metric is undefined for the given input.
    #[error("Undefined metric: {0}")]
    UndefinedMetric(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for biplink operations.
pub type Result<T> = std::result::Result<T, Error>;
