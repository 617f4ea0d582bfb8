//! Core data structures for annual series forecasting.

mod attribute;
mod forecast;
mod series;

pub use attribute::{Attribute, ModelFamily};
pub use forecast::{ForecastPoint, HistoricalPoint};
pub use series::AnnualSeries;
