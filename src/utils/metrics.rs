//! Regression metrics for model evaluation.

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// Error statistics between predictions and held-out targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// R-squared (coefficient of determination)
    pub r_squared: f64,
}

/// Compute evaluation metrics between actual and predicted values.
///
/// Sums are accumulated in `f64` regardless of the `f32` inputs.
pub fn evaluate(actual: &[f32], predicted: &[f32]) -> Result<EvalMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }

    let n = actual.len() as f64;

    let mae = pair_sum(actual, predicted, |a, p| (a - p).abs()) / n;
    let mse = pair_sum(actual, predicted, |a, p| (a - p).powi(2)) / n;
    let rmse = mse.sqrt();

    let mean_actual = actual.iter().map(|&a| f64::from(a)).sum::<f64>() / n;
    let ss_tot: f64 = actual
        .iter()
        .map(|&a| (f64::from(a) - mean_actual).powi(2))
        .sum();
    let ss_res = pair_sum(actual, predicted, |a, p| (a - p).powi(2));
    let r_squared = if ss_tot == 0.0 {
        1.0
    } else {
        1.0 - ss_res / ss_tot
    };

    Ok(EvalMetrics {
        mse,
        rmse,
        mae,
        r_squared,
    })
}

fn pair_sum(actual: &[f32], predicted: &[f32], f: impl Fn(f64, f64) -> f64) -> f64 {
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(&a, &p)| f(f64::from(a), f64::from(p)))
        .sum()
}

/// MAE between two slices; NaN on length mismatch or empty input.
pub fn mae(actual: &[f32], predicted: &[f32]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    pair_sum(actual, predicted, |a, p| (a - p).abs()) / actual.len() as f64
}

/// MSE between two slices; NaN on length mismatch or empty input.
pub fn mse(actual: &[f32], predicted: &[f32]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    pair_sum(actual, predicted, |a, p| (a - p).powi(2)) / actual.len() as f64
}

/// RMSE between two slices; NaN on length mismatch or empty input.
pub fn rmse(actual: &[f32], predicted: &[f32]) -> f64 {
    mse(actual, predicted).sqrt()
}
