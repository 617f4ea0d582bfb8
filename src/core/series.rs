//! Annual time series: one value per calendar year.

use crate::error::{ForecastError, Result};

/// An ordered annual series with strictly increasing, unique years.
///
/// Values are stored in real units; scaling to model units is done by
/// [`crate::transform::scale`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualSeries {
    years: Vec<i32>,
    values: Vec<f32>,
}

impl AnnualSeries {
    /// Create a new series, validating the year/value pairing.
    ///
    /// Years must be strictly increasing; the two vectors must have equal
    /// length.
    pub fn new(years: Vec<i32>, values: Vec<f32>) -> Result<Self> {
        if years.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: years.len(),
                got: values.len(),
            });
        }
        for i in 1..years.len() {
            if years[i] <= years[i - 1] {
                return Err(ForecastError::Data(
                    "years must be strictly increasing".to_string(),
                ));
            }
        }
        Ok(Self { years, values })
    }

    /// Construct from data whose invariants were already enforced upstream.
    pub(crate) fn from_sorted_unchecked(years: Vec<i32>, values: Vec<f32>) -> Self {
        debug_assert_eq!(years.len(), values.len());
        debug_assert!(years.windows(2).all(|w| w[0] < w[1]));
        Self { years, values }
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn first_year(&self) -> Option<i32> {
        self.years.first().copied()
    }

    pub fn last_year(&self) -> Option<i32> {
        self.years.last().copied()
    }

    /// Iterate over `(year, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (i32, f32)> + '_ {
        self.years.iter().copied().zip(self.values.iter().copied())
    }

    /// Restrict the series to years up to and including `cutoff`.
    pub fn up_to(&self, cutoff: i32) -> AnnualSeries {
        let keep = self.years.partition_point(|&y| y <= cutoff);
        AnnualSeries {
            years: self.years[..keep].to_vec(),
            values: self.values[..keep].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_validates_lengths() {
        let err = AnnualSeries::new(vec![1981, 1982], vec![1.0]).unwrap_err();
        assert!(matches!(err, ForecastError::DimensionMismatch { .. }));
    }

    #[test]
    fn new_rejects_non_increasing_years() {
        let err = AnnualSeries::new(vec![1981, 1981], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, ForecastError::Data(_)));

        let err = AnnualSeries::new(vec![1982, 1981], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, ForecastError::Data(_)));
    }

    #[test]
    fn accessors_reflect_contents() {
        let series = AnnualSeries::new(vec![1981, 1982, 1983], vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(series.len(), 3);
        assert!(!series.is_empty());
        assert_eq!(series.first_year(), Some(1981));
        assert_eq!(series.last_year(), Some(1983));
        assert_eq!(series.values(), &[1.0, 2.0, 3.0]);

        let pairs: Vec<_> = series.iter().collect();
        assert_eq!(pairs, vec![(1981, 1.0), (1982, 2.0), (1983, 3.0)]);
    }

    #[test]
    fn up_to_drops_trailing_years() {
        let series =
            AnnualSeries::new(vec![2017, 2018, 2019, 2020], vec![1.0, 2.0, 3.0, 4.0]).unwrap();

        let trimmed = series.up_to(2019);
        assert_eq!(trimmed.years(), &[2017, 2018, 2019]);
        assert_eq!(trimmed.values(), &[1.0, 2.0, 3.0]);

        // Cutoff beyond the last year keeps everything.
        assert_eq!(series.up_to(2025), series);

        // Cutoff before the first year empties the series.
        assert!(series.up_to(2000).is_empty());
    }

    #[test]
    fn empty_series_is_valid() {
        let series = AnnualSeries::new(vec![], vec![]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.last_year(), None);
    }
}
