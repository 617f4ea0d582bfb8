//! Registry of trained predictors keyed by attribute and family.

use std::collections::HashMap;

use crate::core::{Attribute, ModelFamily};
use crate::models::{BoxedPredictor, Predictor};

/// Mapping from `(attribute, family)` to a trained predictor.
///
/// Populated before serving starts and never mutated afterwards. A missing
/// entry is a valid state that forecasting rejects explicitly.
#[derive(Default)]
pub struct ModelRegistry {
    models: HashMap<(Attribute, ModelFamily), BoxedPredictor>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a predictor, replacing any previous entry for the pair.
    pub fn insert(
        &mut self,
        attribute: Attribute,
        family: ModelFamily,
        predictor: BoxedPredictor,
    ) {
        self.models.insert((attribute, family), predictor);
    }

    /// Look up the predictor for an `(attribute, family)` pair.
    pub fn get(&self, attribute: Attribute, family: ModelFamily) -> Option<&dyn Predictor> {
        self.models
            .get(&(attribute, family))
            .map(|boxed| boxed.as_ref())
    }

    pub fn contains(&self, attribute: Attribute, family: ModelFamily) -> bool {
        self.models.contains_key(&(attribute, family))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
