//! Output value types for forecast responses.

use serde::{Deserialize, Serialize};

/// One observed historical point, in real units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub year: i32,
    pub value: f64,
}

/// One forecast point with its heuristic uncertainty band, in real units.
///
/// Invariant for non-negative point estimates: `lower <= value <= upper`,
/// with `lower = max(0, value * 0.9)` and `upper = value * 1.1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub year: i32,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_point_is_plain_data() {
        let point = ForecastPoint {
            year: 2021,
            value: 100.0,
            lower: 90.0,
            upper: 110.0,
        };
        assert!(point.lower <= point.value && point.value <= point.upper);

        let copied = point;
        assert_eq!(copied, point);
    }

    #[test]
    fn historical_point_is_plain_data() {
        let point = HistoricalPoint {
            year: 1981,
            value: 55_000.0,
        };
        assert_eq!(point.year, 1981);
        assert_eq!(point.value, 55_000.0);
    }
}
