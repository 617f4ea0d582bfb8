//! First-order optimizers used by the trainable models.

use serde::{Deserialize, Serialize};

/// Adam hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdamConfig {
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

impl AdamConfig {
    pub fn with_learning_rate(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            ..Self::default()
        }
    }
}

/// Per-tensor Adam moment estimates.
///
/// One state tracks one flat parameter tensor; `step` must be called with a
/// monotonically increasing step counter shared across all tensors of the
/// same model.
#[derive(Debug, Clone)]
pub struct AdamState {
    m: Vec<f32>,
    v: Vec<f32>,
}

impl AdamState {
    pub fn new(len: usize) -> Self {
        Self {
            m: vec![0.0; len],
            v: vec![0.0; len],
        }
    }

    /// Apply one Adam update to `params` given `grads`.
    ///
    /// `t` is the 1-based global step count used for bias correction.
    pub fn step(&mut self, config: &AdamConfig, t: usize, params: &mut [f32], grads: &[f32]) {
        debug_assert_eq!(params.len(), self.m.len());
        debug_assert_eq!(grads.len(), self.m.len());
        debug_assert!(t >= 1);

        let b1 = config.beta1;
        let b2 = config.beta2;
        let correction1 = 1.0 - b1.powi(t as i32);
        let correction2 = 1.0 - b2.powi(t as i32);

        for i in 0..params.len() {
            let g = grads[i];
            self.m[i] = b1 * self.m[i] + (1.0 - b1) * g;
            self.v[i] = b2 * self.v[i] + (1.0 - b2) * g * g;

            let m_hat = self.m[i] / correction1;
            let v_hat = self.v[i] / correction2;
            params[i] -= config.learning_rate * m_hat / (v_hat.sqrt() + config.epsilon);
        }
    }
}
