//! Error types for the pdpanel workspace.
//!
//! Every fallible operation in the panel builders, the target orchestrator and
//! the sample weighter returns [`PanelError`]. Errors are raised eagerly and
//! never batched: a failure aborts the whole call and no partial frame is
//! returned.

use thiserror::Error;

/// The main error type for pdpanel operations.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Invalid configuration: unsupported frequency, negative cure gap,
    /// unknown strategy name, empty target set.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A period value or target name could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A required column is missing from the input frame.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// A stateful component was used before it was fitted.
    #[error("Not fitted: {0}")]
    NotFitted(String),

    /// Column content that cannot be processed (wrong dtype, nulls, non-finite values).
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl PanelError {
    /// Whether the error is a caller-side precondition violation
    /// (missing column or unfitted component) rather than bad input values.
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::MissingColumn(_) | Self::NotFitted(_))
    }
}

impl From<String> for PanelError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for PanelError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for pdpanel operations.
pub type Result<T> = std::result::Result<T, PanelError>;
