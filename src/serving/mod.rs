//! Request-level forecast operations over pretrained models.
//!
//! Everything here is constructed once and read-only afterwards: the
//! registry of trained predictors, the cleaned default table, and the
//! static metrics reports. Concurrent requests share them without
//! synchronization.

mod registry;
mod service;

pub use registry::ModelRegistry;
pub use service::{
    ForecastRequest, ForecastResponse, ForecastService, MetricsReport, SeriesOverride,
};
