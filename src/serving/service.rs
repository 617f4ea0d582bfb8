//! The forecast service: registry + default data + static metrics.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{AnnualSeries, Attribute, ForecastPoint, HistoricalPoint, ModelFamily};
use crate::data::{normalize_series, CleanConfig, EmigrantTable};
use crate::engine::{forecast_recursive, uncertainty_band, MAX_HORIZON};
use crate::error::{ForecastError, Result};
use crate::serving::ModelRegistry;
use crate::transform::{descale, scale_series, WINDOW_SIZE};
use crate::utils::metrics::EvalMetrics;

/// Static evaluation report served for one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    /// Free-text provenance note, e.g. which split produced the numbers.
    pub notes: String,
}

impl MetricsReport {
    pub fn from_eval(metrics: &EvalMetrics, notes: impl Into<String>) -> Self {
        Self {
            rmse: metrics.rmse,
            mae: metrics.mae,
            r2: metrics.r_squared,
            notes: notes.into(),
        }
    }
}

/// Caller-supplied series replacing the default table for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesOverride {
    pub years: Vec<i32>,
    pub values: Vec<f32>,
}

/// One forecast request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub attribute: Attribute,
    pub family: ModelFamily,
    /// Number of future years, between 1 and [`MAX_HORIZON`].
    pub horizon: usize,
    /// Optional replacement for the default historical table.
    #[serde(default)]
    pub series: Option<SeriesOverride>,
}

/// Historical span plus forecast points, all in real units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub attribute: Attribute,
    pub family: ModelFamily,
    pub historical: Vec<HistoricalPoint>,
    pub forecast: Vec<ForecastPoint>,
}

/// Immutable serving state, constructed once at initialization.
pub struct ForecastService {
    registry: ModelRegistry,
    table: EmigrantTable,
    metrics: HashMap<Attribute, MetricsReport>,
    clean_config: CleanConfig,
}

impl ForecastService {
    /// Build a service over a populated registry, a cleaned table, and the
    /// per-attribute metrics reports, using the default cleaning config.
    pub fn new(
        registry: ModelRegistry,
        table: EmigrantTable,
        metrics: HashMap<Attribute, MetricsReport>,
    ) -> Self {
        Self {
            registry,
            table,
            metrics,
            clean_config: CleanConfig::default(),
        }
    }

    /// Use a non-default cleaning config for override normalization and the
    /// request-time cutoff. Must match the config the models were trained
    /// under.
    pub fn with_clean_config(mut self, clean_config: CleanConfig) -> Self {
        self.clean_config = clean_config;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Run one forecast request.
    ///
    /// Returns the historical span actually used plus exactly
    /// `request.horizon` forecast points whose years continue consecutively
    /// from the last historical year.
    pub fn forecast(&self, request: &ForecastRequest) -> Result<ForecastResponse> {
        if request.horizon < 1 || request.horizon > MAX_HORIZON {
            return Err(ForecastError::InvalidParameter(format!(
                "horizon must be between 1 and {MAX_HORIZON}"
            )));
        }

        let predictor = self
            .registry
            .get(request.attribute, request.family)
            .ok_or_else(|| ForecastError::ModelUnavailable {
                attribute: request.attribute.to_string(),
                family: request.family.to_string(),
            })?;

        let series = self.resolve_series(request)?;
        if series.len() < WINDOW_SIZE + 1 {
            return Err(ForecastError::InsufficientData {
                needed: WINDOW_SIZE + 1,
                got: series.len(),
            });
        }
        debug!(
            attribute = %request.attribute,
            family = %request.family,
            horizon = request.horizon,
            span = series.len(),
            "forecasting"
        );

        let scaled = scale_series(series.values());
        let predictions = forecast_recursive(predictor, &scaled, request.horizon, WINDOW_SIZE)?;

        let last_year = series.last_year().ok_or(ForecastError::EmptyData)?;
        let historical = series
            .iter()
            .map(|(year, value)| HistoricalPoint {
                year,
                value: f64::from(value),
            })
            .collect();

        let forecast = predictions
            .iter()
            .enumerate()
            .map(|(step, &scaled_value)| {
                let value = f64::from(descale(scaled_value));
                let (lower, upper) = uncertainty_band(value);
                ForecastPoint {
                    year: last_year + (step as i32 + 1),
                    value,
                    lower,
                    upper,
                }
            })
            .collect();

        Ok(ForecastResponse {
            attribute: request.attribute,
            family: request.family,
            historical,
            forecast,
        })
    }

    /// The precomputed metrics report for one attribute.
    pub fn metrics(&self, attribute: Attribute) -> Result<&MetricsReport> {
        self.metrics
            .get(&attribute)
            .ok_or_else(|| ForecastError::MetricsUnavailable {
                attribute: attribute.to_string(),
            })
    }

    /// Pick the request's series and apply the cutoff, so training and
    /// serving observe an identical historical span.
    fn resolve_series(&self, request: &ForecastRequest) -> Result<AnnualSeries> {
        match &request.series {
            Some(series_override) => normalize_series(
                &series_override.years,
                &series_override.values,
                &self.clean_config,
            ),
            None => {
                let series = self.table.series(request.attribute);
                Ok(match self.clean_config.cutoff_year {
                    Some(cutoff) => series.up_to(cutoff),
                    None => series,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{clean, RawRecord};
    use approx::assert_relative_eq;

    /// Test predictor returning the mean of its window.
    struct WindowMean;

    impl crate::models::Predictor for WindowMean {
        fn predict(&self, window: &[f32]) -> Result<f32> {
            Ok(window.iter().sum::<f32>() / window.len() as f32)
        }

        fn family(&self) -> ModelFamily {
            ModelFamily::Pointwise
        }

        fn name(&self) -> &str {
            "WindowMean"
        }
    }

    fn record(year: i32, value: f32) -> RawRecord {
        RawRecord {
            year: year.to_string(),
            male: value.to_string(),
            female: value.to_string(),
            total: value.to_string(),
        }
    }

    fn table_from(values: &[(i32, f32)]) -> EmigrantTable {
        let records: Vec<RawRecord> = values.iter().map(|&(y, v)| record(y, v)).collect();
        clean(&records, &CleanConfig::without_cutoff()).unwrap()
    }

    fn service_with_mean_predictor(values: &[(i32, f32)]) -> ForecastService {
        let mut registry = ModelRegistry::new();
        registry.insert(
            Attribute::Total,
            ModelFamily::Pointwise,
            Box::new(WindowMean),
        );

        let mut metrics = HashMap::new();
        metrics.insert(
            Attribute::Total,
            MetricsReport {
                rmse: 8536.0,
                mae: 7952.0,
                r2: 0.018,
                notes: "Validation on last 20% of years for total emigrants.".to_string(),
            },
        );

        ForecastService::new(registry, table_from(values), metrics)
            .with_clean_config(CleanConfig::without_cutoff())
    }

    fn six_point_table() -> Vec<(i32, f32)> {
        vec![
            (2000, 10.0),
            (2001, 11.0),
            (2002, 12.0),
            (2003, 13.0),
            (2004, 14.0),
            (2005, 15.0),
        ]
    }

    #[test]
    fn forecast_returns_history_and_banded_points() {
        let service = service_with_mean_predictor(&six_point_table());
        let response = service
            .forecast(&ForecastRequest {
                attribute: Attribute::Total,
                family: ModelFamily::Pointwise,
                horizon: 1,
                series: None,
            })
            .unwrap();

        assert_eq!(response.historical.len(), 6);
        assert_eq!(response.historical[0].year, 2000);
        assert_relative_eq!(response.historical[0].value, 10.0);

        // Mean of the last five scaled values, descaled: (11+12+13+14+15)/5.
        assert_eq!(response.forecast.len(), 1);
        let point = &response.forecast[0];
        assert_eq!(point.year, 2006);
        assert_relative_eq!(point.value, 13.0, epsilon = 1e-3);
        assert_relative_eq!(point.lower, point.value * 0.9, epsilon = 1e-9);
        assert_relative_eq!(point.upper, point.value * 1.1, epsilon = 1e-9);
    }

    #[test]
    fn forecast_years_continue_consecutively() {
        let service = service_with_mean_predictor(&six_point_table());
        let response = service
            .forecast(&ForecastRequest {
                attribute: Attribute::Total,
                family: ModelFamily::Pointwise,
                horizon: 4,
                series: None,
            })
            .unwrap();

        let years: Vec<i32> = response.forecast.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2006, 2007, 2008, 2009]);
    }

    #[test]
    fn horizon_bounds_are_enforced() {
        let service = service_with_mean_predictor(&six_point_table());
        for horizon in [0, 11, 100] {
            let err = service
                .forecast(&ForecastRequest {
                    attribute: Attribute::Total,
                    family: ModelFamily::Pointwise,
                    horizon,
                    series: None,
                })
                .unwrap_err();
            assert!(matches!(err, ForecastError::InvalidParameter(_)));
        }
    }

    #[test]
    fn missing_model_is_a_server_side_gap() {
        let service = service_with_mean_predictor(&six_point_table());
        let err = service
            .forecast(&ForecastRequest {
                attribute: Attribute::Total,
                family: ModelFamily::Sequential,
                horizon: 1,
                series: None,
            })
            .unwrap_err();

        assert_eq!(
            err,
            ForecastError::ModelUnavailable {
                attribute: "total".to_string(),
                family: "sequential".to_string(),
            }
        );
    }

    #[test]
    fn window_sized_series_is_insufficient_for_any_forecast() {
        let service = service_with_mean_predictor(&six_point_table()[..5]);
        let err = service
            .forecast(&ForecastRequest {
                attribute: Attribute::Total,
                family: ModelFamily::Pointwise,
                horizon: 1,
                series: None,
            })
            .unwrap_err();

        assert_eq!(err, ForecastError::InsufficientData { needed: 6, got: 5 });
    }

    #[test]
    fn override_series_replaces_the_default_table() {
        let service = service_with_mean_predictor(&six_point_table());
        let response = service
            .forecast(&ForecastRequest {
                attribute: Attribute::Total,
                family: ModelFamily::Pointwise,
                horizon: 1,
                series: Some(SeriesOverride {
                    years: (1990..1996).collect(),
                    values: vec![20.0, 20.0, 20.0, 20.0, 20.0, 20.0],
                }),
            })
            .unwrap();

        assert_eq!(response.historical[0].year, 1990);
        assert_eq!(response.forecast[0].year, 1996);
        assert_relative_eq!(response.forecast[0].value, 20.0, epsilon = 1e-3);
    }

    #[test]
    fn cutoff_applies_to_override_series_too() {
        let mut values = six_point_table();
        values.push((2020, 999.0));
        let service = ForecastService::new(
            {
                let mut registry = ModelRegistry::new();
                registry.insert(
                    Attribute::Total,
                    ModelFamily::Pointwise,
                    Box::new(WindowMean),
                );
                registry
            },
            table_from(&six_point_table()),
            HashMap::new(),
        );
        // Default config cuts at 2019.

        let (years, series_values): (Vec<i32>, Vec<f32>) = values.into_iter().unzip();
        let response = service
            .forecast(&ForecastRequest {
                attribute: Attribute::Total,
                family: ModelFamily::Pointwise,
                horizon: 1,
                series: Some(SeriesOverride {
                    years,
                    values: series_values,
                }),
            })
            .unwrap();

        assert_eq!(
            response.historical.last().map(|p| p.year),
            Some(2005),
            "the 2020 outlier must not reach the model"
        );
    }

    #[test]
    fn metrics_lookup_and_not_found() {
        let service = service_with_mean_predictor(&six_point_table());

        let report = service.metrics(Attribute::Total).unwrap();
        assert_relative_eq!(report.rmse, 8536.0);
        assert!(report.notes.contains("20%"));

        let err = service.metrics(Attribute::Female).unwrap_err();
        assert_eq!(
            err,
            ForecastError::MetricsUnavailable {
                attribute: "female".to_string(),
            }
        );
    }

    #[test]
    fn metrics_report_from_eval() {
        let eval = EvalMetrics {
            mse: 4.0,
            rmse: 2.0,
            mae: 1.5,
            r_squared: 0.9,
        };
        let report = MetricsReport::from_eval(&eval, "validation split");
        assert_relative_eq!(report.rmse, 2.0);
        assert_relative_eq!(report.mae, 1.5);
        assert_relative_eq!(report.r2, 0.9);
        assert_eq!(report.notes, "validation split");
    }
}
