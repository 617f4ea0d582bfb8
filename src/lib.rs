//! # emigrant-forecast
//!
//! Forecasting of annual emigrant count series (total, male, female) with
//! two pretrained regression families: a feed-forward window regressor and
//! a recurrent sequence regressor. Multi-step forecasts are produced
//! recursively, feeding each prediction back into the next input window,
//! and carry a fixed ±10% uncertainty band.
//!
//! The crate covers the whole path from raw tabular records to forecast
//! responses: series preparation, supervised windowing, per-family model
//! selection, the recursive forecast engine, and a read-only serving layer
//! over a registry of trained predictors.

pub mod core;
pub mod data;
pub mod engine;
pub mod error;
pub mod models;
pub mod serving;
pub mod transform;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{AnnualSeries, Attribute, ForecastPoint, HistoricalPoint, ModelFamily};
    pub use crate::data::{clean, load_table, read_records, CleanConfig, EmigrantTable, RawRecord};
    pub use crate::engine::{forecast_recursive, uncertainty_band, MAX_HORIZON};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::{train_attribute, BoxedPredictor, Predictor};
    pub use crate::serving::{ForecastRequest, ForecastService, ModelRegistry};
    pub use crate::transform::{scale_series, windows, SCALE_FACTOR, WINDOW_SIZE};
    pub use crate::utils::{evaluate, EvalMetrics};
}
