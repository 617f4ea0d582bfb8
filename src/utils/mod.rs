//! Utility functions shared by the training and evaluation code.

pub mod linalg;
pub mod metrics;
pub mod optimization;

pub use metrics::{evaluate, mae, mse, rmse, EvalMetrics};
pub use optimization::{AdamConfig, AdamState};
