//! Trainable single-step predictors and model selection.

mod traits;

pub mod lstm;
pub mod mlp;
pub mod selection;

pub use lstm::{LstmConfig, LstmRegressor};
pub use mlp::{MlpConfig, MlpRegressor};
pub use selection::{
    chronological_split, pointwise_grid, select_pointwise, select_sequential, sequential_grid,
    train_attribute, validation_metrics, AttributeModels, FamilyOutcome,
};
pub use traits::{BoxedPredictor, Predictor};
