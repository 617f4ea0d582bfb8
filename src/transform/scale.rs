//! Fixed-constant scaling between real counts and model units.
//!
//! Models train and predict in thousands of emigrants. The same constant is
//! used at training and serving time; values must be descaled before they
//! are surfaced to a caller.

/// Divisor applied to real counts before they reach a model.
pub const SCALE_FACTOR: f32 = 1000.0;

/// Convert a real-unit value to model units.
pub fn scale(value: f32) -> f32 {
    value / SCALE_FACTOR
}

/// Convert a model-unit value back to real units.
pub fn descale(value: f32) -> f32 {
    value * SCALE_FACTOR
}

/// Scale a whole series to model units.
pub fn scale_series(values: &[f32]) -> Vec<f32> {
    values.iter().map(|&v| scale(v)).collect()
}

/// Descale a whole series back to real units.
pub fn descale_series(values: &[f32]) -> Vec<f32> {
    values.iter().map(|&v| descale(v)).collect()
}
