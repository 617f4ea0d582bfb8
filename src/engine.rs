//! Recursive multi-step forecasting over a single-step predictor.
//!
//! Both model families only ever see a fixed-size window, so forecasting
//! more than one step ahead feeds each prediction back into the history the
//! next window is cut from. Later steps therefore consume earlier
//! predictions instead of observations and errors compound with the
//! horizon; that degradation is inherent to the scheme and is deliberately
//! not masked here.

use crate::error::{ForecastError, Result};
use crate::models::Predictor;

/// Largest horizon a forecast request may ask for.
pub const MAX_HORIZON: usize = 10;

/// Produce `n_steps` future scaled values from `seed` history.
///
/// The seed must hold at least `window` scaled observations; the predictor
/// is invoked once per step on the last `window` values of the growing
/// history. Outputs are returned in generation order.
pub fn forecast_recursive(
    predictor: &dyn Predictor,
    seed: &[f32],
    n_steps: usize,
    window: usize,
) -> Result<Vec<f32>> {
    if window == 0 {
        return Err(ForecastError::InvalidParameter(
            "window size must be positive".to_string(),
        ));
    }
    if n_steps == 0 {
        return Err(ForecastError::InvalidParameter(
            "number of forecast steps must be positive".to_string(),
        ));
    }
    if seed.len() < window {
        return Err(ForecastError::InsufficientData {
            needed: window,
            got: seed.len(),
        });
    }

    let mut history = Vec::with_capacity(seed.len() + n_steps);
    history.extend_from_slice(seed);

    let mut forecasts = Vec::with_capacity(n_steps);
    for _ in 0..n_steps {
        let current = &history[history.len() - window..];
        let next = predictor.predict(current)?;
        history.push(next);
        forecasts.push(next);
    }

    Ok(forecasts)
}

/// Heuristic uncertainty band around a real-unit point estimate.
///
/// Fixed at ±10% with a zero floor on the lower bound. This is an output
/// compatibility contract, not a statistically derived interval.
pub fn uncertainty_band(value: f64) -> (f64, f64) {
    ((value * 0.9).max(0.0), value * 1.1)
}
