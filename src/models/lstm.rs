//! Recurrent regressor for the sequential family.
//!
//! A single LSTM layer consumes the window one scaled value at a time; a
//! linear head maps the final hidden state to the next value. Cell and
//! hidden state are rebuilt from zero on every call, so nothing persists
//! across predictions. Training backpropagates through the window steps
//! under Adam, with early stopping on validation loss restoring the
//! best-seen weights.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::ModelFamily;
use crate::error::{ForecastError, Result};
use crate::models::Predictor;
use crate::transform::SupervisedExample;
use crate::utils::linalg::{dot, matvec, matvec_t, outer_acc};
use crate::utils::optimization::{AdamConfig, AdamState};

/// Hyperparameters for [`LstmRegressor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmConfig {
    /// Width of the hidden state.
    pub hidden_units: usize,
    pub learning_rate: f32,
    /// Maximum number of training epochs.
    pub max_epochs: usize,
    /// Minibatch size; batches iterate in chronological order.
    pub batch_size: usize,
    /// Epochs without validation improvement tolerated before stopping.
    pub patience: usize,
    /// Seed for weight initialization.
    pub seed: u64,
}

impl Default for LstmConfig {
    fn default() -> Self {
        Self {
            hidden_units: 32,
            learning_rate: 1e-3,
            max_epochs: 200,
            batch_size: 8,
            patience: 20,
            seed: 42,
        }
    }
}

impl LstmConfig {
    /// Config with the given capacity and default training schedule.
    pub fn new(hidden_units: usize) -> Self {
        Self {
            hidden_units,
            ..Self::default()
        }
    }
}

/// LSTM weights, gates stacked in `i, f, g, o` order.
///
/// Input weights `w` and biases `b` are `4H` vectors; recurrent weights `u`
/// form a row-major `4H x H` matrix; the head maps the final hidden state
/// to one output.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LstmParams {
    hidden: usize,
    w: Vec<f32>,
    u: Vec<f32>,
    b: Vec<f32>,
    head_w: Vec<f32>,
    head_b: f32,
}

impl LstmParams {
    fn init(hidden: usize, rng: &mut StdRng) -> Self {
        let limit_in = (6.0 / (1 + hidden) as f32).sqrt();
        let limit_rec = (3.0 / hidden as f32).sqrt();
        let limit_head = (6.0 / (hidden + 1) as f32).sqrt();

        let w = (0..4 * hidden)
            .map(|_| rng.gen_range(-limit_in..limit_in))
            .collect();
        let u = (0..4 * hidden * hidden)
            .map(|_| rng.gen_range(-limit_rec..limit_rec))
            .collect();
        // Forget-gate bias starts open so early gradients flow through time.
        let mut b = vec![0.0; 4 * hidden];
        b[hidden..2 * hidden].fill(1.0);

        let head_w = (0..hidden)
            .map(|_| rng.gen_range(-limit_head..limit_head))
            .collect();

        Self {
            hidden,
            w,
            u,
            b,
            head_w,
            head_b: 0.0,
        }
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Per-timestep values cached during the forward pass for backpropagation.
struct StepCache {
    x: f32,
    i: Vec<f32>,
    f: Vec<f32>,
    g: Vec<f32>,
    o: Vec<f32>,
    tanh_c: Vec<f32>,
    c_prev: Vec<f32>,
    h_prev: Vec<f32>,
}

/// Gradient accumulators mirroring [`LstmParams`].
struct LstmGrads {
    w: Vec<f32>,
    u: Vec<f32>,
    b: Vec<f32>,
    head_w: Vec<f32>,
    head_b: f32,
}

impl LstmGrads {
    fn zeros(hidden: usize) -> Self {
        Self {
            w: vec![0.0; 4 * hidden],
            u: vec![0.0; 4 * hidden * hidden],
            b: vec![0.0; 4 * hidden],
            head_w: vec![0.0; hidden],
            head_b: 0.0,
        }
    }
}

/// Recurrent window regressor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmRegressor {
    config: LstmConfig,
    params: Option<LstmParams>,
    best_val_loss: Option<f64>,
}

impl LstmRegressor {
    pub fn new(config: LstmConfig) -> Self {
        Self {
            config,
            params: None,
            best_val_loss: None,
        }
    }

    pub fn config(&self) -> &LstmConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }

    /// Lowest validation loss observed during the last `fit`, in scaled
    /// units. The restored weights are the ones that achieved it.
    pub fn best_validation_loss(&self) -> Option<f64> {
        self.best_val_loss
    }

    /// Train on `train`, early-stopping on `validation` loss.
    pub fn fit(
        &mut self,
        train: &[SupervisedExample],
        validation: &[SupervisedExample],
    ) -> Result<()> {
        if train.is_empty() || validation.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if train
            .iter()
            .chain(validation.iter())
            .any(|ex| ex.window.is_empty())
        {
            return Err(ForecastError::EmptyData);
        }
        if self.config.hidden_units == 0 {
            return Err(ForecastError::InvalidParameter(
                "hidden state width must be positive".to_string(),
            ));
        }
        if self.config.batch_size == 0 {
            return Err(ForecastError::InvalidParameter(
                "batch size must be positive".to_string(),
            ));
        }

        let hidden = self.config.hidden_units;
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut params = LstmParams::init(hidden, &mut rng);

        let adam = AdamConfig::with_learning_rate(self.config.learning_rate);
        let mut w_state = AdamState::new(params.w.len());
        let mut u_state = AdamState::new(params.u.len());
        let mut b_state = AdamState::new(params.b.len());
        let mut head_w_state = AdamState::new(params.head_w.len());
        let mut head_b_state = AdamState::new(1);

        let mut best_loss = f64::INFINITY;
        let mut best_params = params.clone();
        let mut wait = 0usize;
        let mut step = 0usize;

        for epoch in 1..=self.config.max_epochs {
            for batch in train.chunks(self.config.batch_size) {
                let mut grads = LstmGrads::zeros(hidden);
                let scale = 2.0 / batch.len() as f32;

                for example in batch {
                    let (prediction, caches, h_final) = forward_cached(&params, &example.window);
                    let dy = scale * (prediction - example.target);
                    backward(&params, &caches, &h_final, dy, &mut grads);
                }

                step += 1;
                w_state.step(&adam, step, &mut params.w, &grads.w);
                u_state.step(&adam, step, &mut params.u, &grads.u);
                b_state.step(&adam, step, &mut params.b, &grads.b);
                head_w_state.step(&adam, step, &mut params.head_w, &grads.head_w);
                head_b_state.step(
                    &adam,
                    step,
                    std::slice::from_mut(&mut params.head_b),
                    &[grads.head_b],
                );
            }

            let val_loss = validation
                .iter()
                .map(|ex| {
                    let err = f64::from(forward(&params, &ex.window) - ex.target);
                    err * err
                })
                .sum::<f64>()
                / validation.len() as f64;
            if !val_loss.is_finite() {
                return Err(ForecastError::Computation(format!(
                    "validation loss diverged at epoch {epoch}"
                )));
            }

            if val_loss < best_loss {
                best_loss = val_loss;
                best_params = params.clone();
                wait = 0;
            } else {
                wait += 1;
                if wait >= self.config.patience {
                    debug!(epoch, best_loss, "validation loss stalled, stopping");
                    break;
                }
            }
        }

        self.params = Some(best_params);
        self.best_val_loss = Some(best_loss);
        Ok(())
    }
}

/// Forward pass without caches, for inference.
fn forward(params: &LstmParams, window: &[f32]) -> f32 {
    let hidden = params.hidden;
    let mut h = vec![0.0f32; hidden];
    let mut c = vec![0.0f32; hidden];

    for &x in window {
        let mut a = matvec(&params.u, 4 * hidden, hidden, &h);
        for (r, ar) in a.iter_mut().enumerate() {
            *ar += params.w[r] * x + params.b[r];
        }
        for k in 0..hidden {
            let i = sigmoid(a[k]);
            let f = sigmoid(a[hidden + k]);
            let g = a[2 * hidden + k].tanh();
            let o = sigmoid(a[3 * hidden + k]);
            c[k] = f * c[k] + i * g;
            h[k] = o * c[k].tanh();
        }
    }

    dot(&params.head_w, &h) + params.head_b
}

/// Forward pass keeping per-step caches for backpropagation through time.
fn forward_cached(params: &LstmParams, window: &[f32]) -> (f32, Vec<StepCache>, Vec<f32>) {
    let hidden = params.hidden;
    let mut h = vec![0.0f32; hidden];
    let mut c = vec![0.0f32; hidden];
    let mut caches = Vec::with_capacity(window.len());

    for &x in window {
        let h_prev = h.clone();
        let c_prev = c.clone();

        let mut a = matvec(&params.u, 4 * hidden, hidden, &h_prev);
        for (r, ar) in a.iter_mut().enumerate() {
            *ar += params.w[r] * x + params.b[r];
        }

        let mut i = vec![0.0f32; hidden];
        let mut f = vec![0.0f32; hidden];
        let mut g = vec![0.0f32; hidden];
        let mut o = vec![0.0f32; hidden];
        let mut tanh_c = vec![0.0f32; hidden];
        for k in 0..hidden {
            i[k] = sigmoid(a[k]);
            f[k] = sigmoid(a[hidden + k]);
            g[k] = a[2 * hidden + k].tanh();
            o[k] = sigmoid(a[3 * hidden + k]);
            c[k] = f[k] * c_prev[k] + i[k] * g[k];
            tanh_c[k] = c[k].tanh();
            h[k] = o[k] * tanh_c[k];
        }

        caches.push(StepCache {
            x,
            i,
            f,
            g,
            o,
            tanh_c,
            c_prev,
            h_prev,
        });
    }

    let prediction = dot(&params.head_w, &h) + params.head_b;
    (prediction, caches, h)
}

/// Backpropagation through time for one sample; accumulates into `grads`.
fn backward(
    params: &LstmParams,
    caches: &[StepCache],
    h_final: &[f32],
    dy: f32,
    grads: &mut LstmGrads,
) {
    let hidden = params.hidden;

    for (g, &h) in grads.head_w.iter_mut().zip(h_final.iter()) {
        *g += dy * h;
    }
    grads.head_b += dy;

    let mut dh: Vec<f32> = params.head_w.iter().map(|&w| dy * w).collect();
    let mut dc = vec![0.0f32; hidden];

    for cache in caches.iter().rev() {
        let mut da = vec![0.0f32; 4 * hidden];
        for k in 0..hidden {
            let do_k = dh[k] * cache.tanh_c[k];
            let dc_k = dc[k] + dh[k] * cache.o[k] * (1.0 - cache.tanh_c[k] * cache.tanh_c[k]);

            let di_k = dc_k * cache.g[k];
            let df_k = dc_k * cache.c_prev[k];
            let dg_k = dc_k * cache.i[k];

            da[k] = di_k * cache.i[k] * (1.0 - cache.i[k]);
            da[hidden + k] = df_k * cache.f[k] * (1.0 - cache.f[k]);
            da[2 * hidden + k] = dg_k * (1.0 - cache.g[k] * cache.g[k]);
            da[3 * hidden + k] = do_k * cache.o[k] * (1.0 - cache.o[k]);

            dc[k] = dc_k * cache.f[k];
        }

        for (r, &da_r) in da.iter().enumerate() {
            grads.w[r] += da_r * cache.x;
            grads.b[r] += da_r;
        }
        outer_acc(&mut grads.u, &da, &cache.h_prev);

        dh = matvec_t(&params.u, 4 * hidden, hidden, &da);
    }
}

impl Predictor for LstmRegressor {
    fn predict(&self, window: &[f32]) -> Result<f32> {
        let params = self.params.as_ref().ok_or(ForecastError::FitRequired)?;
        if window.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        Ok(forward(params, window))
    }

    fn family(&self) -> ModelFamily {
        ModelFamily::Sequential
    }

    fn name(&self) -> &str {
        "LSTM"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::windows;

    fn constant_examples(value: f32, len: usize) -> Vec<SupervisedExample> {
        let series = vec![value; len];
        windows(&series, 5).unwrap()
    }

    fn small_config() -> LstmConfig {
        LstmConfig {
            hidden_units: 4,
            learning_rate: 0.01,
            max_epochs: 200,
            batch_size: 8,
            patience: 200,
            seed: 42,
        }
    }

    #[test]
    fn fit_rejects_empty_splits() {
        let examples = constant_examples(0.5, 12);
        let mut model = LstmRegressor::new(small_config());

        assert!(matches!(
            model.fit(&[], &examples),
            Err(ForecastError::EmptyData)
        ));
        assert!(matches!(
            model.fit(&examples, &[]),
            Err(ForecastError::EmptyData)
        ));
    }

    #[test]
    fn predict_requires_fit() {
        let model = LstmRegressor::new(small_config());
        assert!(matches!(
            model.predict(&[0.5; 5]),
            Err(ForecastError::FitRequired)
        ));
        assert!(model.best_validation_loss().is_none());
    }

    #[test]
    fn learns_a_constant_target() {
        let examples = constant_examples(0.5, 15);
        let (train, validation) = examples.split_at(7);

        let mut model = LstmRegressor::new(small_config());
        model.fit(train, validation).unwrap();

        let prediction = model.predict(&[0.5; 5]).unwrap();
        assert!(
            (prediction - 0.5).abs() < 0.15,
            "prediction {prediction} too far from 0.5"
        );

        let best = model.best_validation_loss().unwrap();
        assert!(best.is_finite() && best >= 0.0);
    }

    #[test]
    fn training_is_deterministic_for_a_fixed_seed() {
        let examples = constant_examples(0.7, 14);
        let (train, validation) = examples.split_at(6);

        let mut a = LstmRegressor::new(small_config());
        let mut b = LstmRegressor::new(small_config());
        a.fit(train, validation).unwrap();
        b.fit(train, validation).unwrap();

        let window = [0.6, 0.65, 0.7, 0.75, 0.8];
        assert_eq!(a.predict(&window).unwrap(), b.predict(&window).unwrap());
    }

    #[test]
    fn state_does_not_persist_across_calls() {
        let examples = constant_examples(0.5, 15);
        let (train, validation) = examples.split_at(7);

        let mut model = LstmRegressor::new(small_config());
        model.fit(train, validation).unwrap();

        let window = [0.2, 0.4, 0.6, 0.8, 1.0];
        let first = model.predict(&window).unwrap();
        model.predict(&[9.0; 5]).unwrap();
        let second = model.predict(&window).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_window_is_rejected() {
        let examples = constant_examples(0.5, 12);
        let (train, validation) = examples.split_at(5);

        let mut model = LstmRegressor::new(small_config());
        model.fit(train, validation).unwrap();

        assert!(matches!(
            model.predict(&[]),
            Err(ForecastError::EmptyData)
        ));
    }

    #[test]
    fn family_and_name() {
        let model = LstmRegressor::new(LstmConfig::default());
        assert_eq!(model.family(), ModelFamily::Sequential);
        assert_eq!(model.name(), "LSTM");
        assert!(!model.is_fitted());
    }
}
