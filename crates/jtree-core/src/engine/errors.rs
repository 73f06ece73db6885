//! Error types for network construction and inference.

use thiserror::Error;

/// Errors that can occur while building a network, mutating evidence, or
/// answering queries.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in the future without breaking changes.
///
/// Construction errors are fatal: no partially-built engine is ever returned.
/// Every other variant is reported at the call site and leaves the engine
/// usable.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    /// Malformed network definition (duplicate variable, unknown parent,
    /// empty level set, malformed CPT, cyclic parent graph).
    #[error("construction error: {0}")]
    Construction(String),

    /// A query, evidence assertion or edit named a variable the network lacks.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    /// A query or evidence assertion named a level the variable lacks.
    #[error("unknown level '{level}' for variable '{variable}'")]
    UnknownLevel {
        /// Variable the level was looked up on.
        variable: String,
        /// The missing level label.
        level: String,
    },

    /// Malformed query (empty head, overlapping head and parents, missing
    /// parent coverage, mismatched distribution shape).
    #[error("query error: {0}")]
    Query(String),

    /// A conditional query whose parent combination has zero probability.
    #[error("zero-probability conditioning event: {0}")]
    ZeroProbabilityCondition(String),

    /// Numerical error (negative, NaN or infinite weights and probabilities).
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Internal error (graph-construction invariant breach, not user error).
    #[error("internal error: {0}")]
    Internal(String),
}
