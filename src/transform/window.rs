//! Sliding-window conversion of a series into supervised examples.

use crate::error::{ForecastError, Result};

/// Number of past years a model sees when predicting the next one.
pub const WINDOW_SIZE: usize = 5;

/// One supervised training pair: a window of consecutive scaled values and
/// the scaled value immediately following it.
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisedExample {
    pub window: Vec<f32>,
    pub target: f32,
}

/// Slice a series into supervised `(window, target)` examples.
///
/// For every start index `i` in `[0, len - window)` the example is
/// `(series[i..i + window], series[i + window])`. Output order follows the
/// series; downstream split logic relies on this chronological ordering.
///
/// Returns an error when the series is shorter than `window + 1`, in which
/// case no complete example exists.
pub fn windows(series: &[f32], window: usize) -> Result<Vec<SupervisedExample>> {
    if window == 0 {
        return Err(ForecastError::InvalidParameter(
            "window size must be positive".to_string(),
        ));
    }
    if series.len() < window + 1 {
        return Err(ForecastError::InsufficientData {
            needed: window + 1,
            got: series.len(),
        });
    }

    Ok((0..series.len() - window)
        .map(|i| SupervisedExample {
            window: series[i..i + window].to_vec(),
            target: series[i + window],
        })
        .collect())
}
