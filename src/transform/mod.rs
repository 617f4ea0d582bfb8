//! Data transformations bridging real-unit series and model inputs.
//!
//! # Example
//!
//! ```
//! use emigrant_forecast::transform::{scale_series, windows, WINDOW_SIZE};
//!
//! let series = vec![10_000.0, 11_000.0, 12_000.0, 13_000.0, 14_000.0, 15_000.0];
//! let scaled = scale_series(&series);
//! let examples = windows(&scaled, WINDOW_SIZE).unwrap();
//! assert_eq!(examples.len(), 1);
//! ```

pub mod scale;
pub mod window;

pub use scale::{descale, descale_series, scale, scale_series, SCALE_FACTOR};
pub use window::{windows, SupervisedExample, WINDOW_SIZE};
