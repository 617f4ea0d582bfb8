//! Feed-forward regressor for the pointwise family.
//!
//! The window enters as a flat feature vector: hidden layers apply ReLU,
//! the single-unit output layer is linear. Training minimizes a squared
//! loss with an L2 penalty using full-batch Adam, stopping early once the
//! loss plateaus.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::ModelFamily;
use crate::error::{ForecastError, Result};
use crate::models::Predictor;
use crate::transform::SupervisedExample;
use crate::utils::linalg::{matvec, matvec_t, outer_acc};
use crate::utils::optimization::{AdamConfig, AdamState};

/// Hyperparameters for [`MlpRegressor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Widths of the hidden layers, in order.
    pub hidden_layers: Vec<usize>,
    /// L2 regularization strength.
    pub alpha: f32,
    pub learning_rate: f32,
    /// Maximum number of training iterations (full-batch epochs).
    pub max_iter: usize,
    /// Minimum loss improvement that counts as progress.
    pub tol: f32,
    /// Consecutive non-improving iterations tolerated before stopping.
    pub n_iter_no_change: usize,
    /// Seed for weight initialization.
    pub seed: u64,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![32],
            alpha: 1e-4,
            learning_rate: 1e-3,
            max_iter: 2000,
            tol: 1e-4,
            n_iter_no_change: 10,
            seed: 42,
        }
    }
}

impl MlpConfig {
    /// Config with the given capacity knobs and default training schedule.
    pub fn new(hidden_layers: Vec<usize>, alpha: f32) -> Self {
        Self {
            hidden_layers,
            alpha,
            ..Self::default()
        }
    }
}

/// One dense layer with row-major `outputs x inputs` weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DenseLayer {
    weights: Vec<f32>,
    biases: Vec<f32>,
    inputs: usize,
    outputs: usize,
}

fn init_layer(inputs: usize, outputs: usize, rng: &mut StdRng) -> DenseLayer {
    let limit = (6.0 / (inputs + outputs) as f32).sqrt();
    let weights = (0..inputs * outputs)
        .map(|_| rng.gen_range(-limit..limit))
        .collect();
    DenseLayer {
        weights,
        biases: vec![0.0; outputs],
        inputs,
        outputs,
    }
}

/// Feed-forward window regressor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpRegressor {
    config: MlpConfig,
    layers: Option<Vec<DenseLayer>>,
}

impl MlpRegressor {
    pub fn new(config: MlpConfig) -> Self {
        Self {
            config,
            layers: None,
        }
    }

    pub fn config(&self) -> &MlpConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.layers.is_some()
    }

    /// Train on the given supervised examples.
    ///
    /// All windows must share one length; that length becomes the model's
    /// fixed input size.
    pub fn fit(&mut self, examples: &[SupervisedExample]) -> Result<()> {
        if examples.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        let n_inputs = examples[0].window.len();
        if n_inputs == 0 {
            return Err(ForecastError::EmptyData);
        }
        for example in examples {
            if example.window.len() != n_inputs {
                return Err(ForecastError::DimensionMismatch {
                    expected: n_inputs,
                    got: example.window.len(),
                });
            }
        }
        if self.config.hidden_layers.iter().any(|&h| h == 0) {
            return Err(ForecastError::InvalidParameter(
                "hidden layer width must be positive".to_string(),
            ));
        }

        let mut sizes = vec![n_inputs];
        sizes.extend(self.config.hidden_layers.iter().copied());
        sizes.push(1);

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut layers: Vec<DenseLayer> = sizes
            .windows(2)
            .map(|io| init_layer(io[0], io[1], &mut rng))
            .collect();

        let adam = AdamConfig::with_learning_rate(self.config.learning_rate);
        let mut w_states: Vec<AdamState> = layers
            .iter()
            .map(|l| AdamState::new(l.weights.len()))
            .collect();
        let mut b_states: Vec<AdamState> = layers
            .iter()
            .map(|l| AdamState::new(l.biases.len()))
            .collect();

        let n = examples.len() as f32;
        let mut best_loss = f32::INFINITY;
        let mut no_improvement = 0usize;

        for epoch in 1..=self.config.max_iter {
            let mut w_grads: Vec<Vec<f32>> = layers
                .iter()
                .map(|l| vec![0.0; l.weights.len()])
                .collect();
            let mut b_grads: Vec<Vec<f32>> =
                layers.iter().map(|l| vec![0.0; l.biases.len()]).collect();
            let mut sq_err_sum = 0.0f32;

            for example in examples {
                // Forward pass, keeping per-layer activations for backprop.
                let mut activations: Vec<Vec<f32>> = Vec::with_capacity(layers.len() + 1);
                activations.push(example.window.clone());
                for (i, layer) in layers.iter().enumerate() {
                    let mut z = matvec(&layer.weights, layer.outputs, layer.inputs, &activations[i]);
                    for (zi, b) in z.iter_mut().zip(layer.biases.iter()) {
                        *zi += b;
                    }
                    if i + 1 < layers.len() {
                        for v in z.iter_mut() {
                            *v = v.max(0.0);
                        }
                    }
                    activations.push(z);
                }
                let output = activations[layers.len()][0];
                let err = output - example.target;
                sq_err_sum += err * err;

                // Backward pass.
                let mut delta = vec![err];
                for (i, layer) in layers.iter().enumerate().rev() {
                    outer_acc(&mut w_grads[i], &delta, &activations[i]);
                    for (g, d) in b_grads[i].iter_mut().zip(delta.iter()) {
                        *g += d;
                    }
                    if i > 0 {
                        let mut back =
                            matvec_t(&layer.weights, layer.outputs, layer.inputs, &delta);
                        // ReLU gate: activations are zero exactly where the
                        // pre-activation was clipped.
                        for (v, &a) in back.iter_mut().zip(activations[i].iter()) {
                            if a <= 0.0 {
                                *v = 0.0;
                            }
                        }
                        delta = back;
                    }
                }
            }

            // Average data gradients and fold in the L2 penalty.
            let mut penalty = 0.0f32;
            for (i, layer) in layers.iter().enumerate() {
                for (g, &w) in w_grads[i].iter_mut().zip(layer.weights.iter()) {
                    *g = *g / n + self.config.alpha * w / n;
                    penalty += w * w;
                }
                for g in b_grads[i].iter_mut() {
                    *g /= n;
                }
            }
            let loss = 0.5 * sq_err_sum / n + 0.5 * self.config.alpha * penalty / n;
            if !loss.is_finite() {
                return Err(ForecastError::Computation(format!(
                    "training loss diverged at iteration {epoch}"
                )));
            }

            for (i, layer) in layers.iter_mut().enumerate() {
                w_states[i].step(&adam, epoch, &mut layer.weights, &w_grads[i]);
                b_states[i].step(&adam, epoch, &mut layer.biases, &b_grads[i]);
            }

            if loss < best_loss - self.config.tol {
                no_improvement = 0;
            } else {
                no_improvement += 1;
                if no_improvement >= self.config.n_iter_no_change {
                    debug!(epoch, loss, "training loss plateaued, stopping");
                    break;
                }
            }
            if loss < best_loss {
                best_loss = loss;
            }
        }

        self.layers = Some(layers);
        Ok(())
    }
}

impl Predictor for MlpRegressor {
    fn predict(&self, window: &[f32]) -> Result<f32> {
        let layers = self.layers.as_ref().ok_or(ForecastError::FitRequired)?;
        let expected = layers[0].inputs;
        if window.len() != expected {
            return Err(ForecastError::DimensionMismatch {
                expected,
                got: window.len(),
            });
        }

        let mut x = window.to_vec();
        let last = layers.len() - 1;
        for (i, layer) in layers.iter().enumerate() {
            let mut z = matvec(&layer.weights, layer.outputs, layer.inputs, &x);
            for (zi, b) in z.iter_mut().zip(layer.biases.iter()) {
                *zi += b;
            }
            if i < last {
                for v in z.iter_mut() {
                    *v = v.max(0.0);
                }
            }
            x = z;
        }
        Ok(x[0])
    }

    fn family(&self) -> ModelFamily {
        ModelFamily::Pointwise
    }

    fn name(&self) -> &str {
        "MLP"
    }
}
