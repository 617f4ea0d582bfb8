//! Error types for the emigrant-forecast library.

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur during data preparation, training, or forecasting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value (unknown key, out-of-range horizon, ...).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No trained model is loaded for the requested attribute/family pair.
    #[error("no trained {family} model for attribute '{attribute}'")]
    ModelUnavailable { attribute: String, family: String },

    /// No evaluation metrics are stored for the requested attribute.
    #[error("no metrics stored for attribute '{attribute}'")]
    MetricsUnavailable { attribute: String },

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Input table could not be decoded.
    #[error("data error: {0}")]
    Data(String),

    /// Computation error (e.g. non-finite training loss).
    #[error("computation error: {0}")]
    Computation(String),
}
