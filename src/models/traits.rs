//! Predictor trait defining the common interface for both model families.

use crate::core::ModelFamily;
use crate::error::Result;

/// Common interface for single-step window predictors.
///
/// A predictor maps a window of scaled values to the next scaled value. It
/// is immutable once trained; any temporal state a sequential implementation
/// keeps lives within a single `predict` call. The trait is object-safe and
/// `Send + Sync` so trained models can be shared across concurrent readers.
pub trait Predictor: Send + Sync {
    /// Predict the scaled value following `window`.
    fn predict(&self, window: &[f32]) -> Result<f32>;

    /// The family this predictor belongs to.
    fn family(&self) -> ModelFamily;

    /// Display name of the model.
    fn name(&self) -> &str;
}

/// Type alias for boxed predictor trait objects.
pub type BoxedPredictor = Box<dyn Predictor>;
