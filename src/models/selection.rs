//! Hyperparameter selection and the per-attribute training procedure.
//!
//! Candidates are trained on the chronologically earlier 80% of the
//! supervised examples and scored on the remaining 20%; no shuffling
//! happens anywhere, so validation data is always strictly later than
//! training data. Selection is lower-is-better with ties going to the
//! earlier candidate in the grid.

use tracing::{debug, info};

use crate::core::AnnualSeries;
use crate::error::{ForecastError, Result};
use crate::models::{LstmConfig, LstmRegressor, MlpConfig, MlpRegressor, Predictor};
use crate::transform::{descale, scale_series, windows, SupervisedExample, WINDOW_SIZE};
use crate::utils::metrics::{evaluate, rmse, EvalMetrics};

/// Minimum number of supervised examples required to train an attribute.
const MIN_EXAMPLES: usize = 10;

/// Split examples chronologically: the first `floor(0.8 * len)` examples
/// train, the remainder validate. Order is preserved on both sides.
pub fn chronological_split(
    examples: &[SupervisedExample],
) -> (&[SupervisedExample], &[SupervisedExample]) {
    let split = examples.len() * 4 / 5;
    examples.split_at(split)
}

/// The fixed candidate grid for the pointwise family.
pub fn pointwise_grid() -> Vec<MlpConfig> {
    vec![
        MlpConfig::new(vec![32], 1e-4),
        MlpConfig::new(vec![64, 32], 1e-4),
        MlpConfig::new(vec![64, 64], 5e-4),
    ]
}

/// The fixed candidate grid for the sequential family.
pub fn sequential_grid() -> Vec<LstmConfig> {
    vec![LstmConfig::new(32), LstmConfig::new(64)]
}

/// Train every pointwise candidate and keep the one with the lowest
/// validation RMSE (scaled units).
pub fn select_pointwise(
    configs: &[MlpConfig],
    train: &[SupervisedExample],
    validation: &[SupervisedExample],
) -> Result<(MlpRegressor, f64)> {
    if configs.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "no candidate configurations".to_string(),
        ));
    }
    if train.is_empty() || validation.is_empty() {
        return Err(ForecastError::EmptyData);
    }

    let mut best: Option<(MlpRegressor, f64)> = None;
    for config in configs {
        let mut model = MlpRegressor::new(config.clone());
        model.fit(train)?;

        let mut predicted = Vec::with_capacity(validation.len());
        let mut actual = Vec::with_capacity(validation.len());
        for example in validation {
            predicted.push(model.predict(&example.window)?);
            actual.push(example.target);
        }
        let score = rmse(&actual, &predicted);
        if !score.is_finite() {
            return Err(ForecastError::Computation(
                "pointwise candidate produced a non-finite validation RMSE".to_string(),
            ));
        }
        debug!(
            hidden = ?config.hidden_layers,
            alpha = config.alpha,
            score,
            "pointwise candidate scored"
        );

        if best.as_ref().map_or(true, |(_, b)| score < *b) {
            best = Some((model, score));
        }
    }

    best.ok_or_else(|| ForecastError::Computation("no candidate was scored".to_string()))
}

/// Train every sequential candidate and keep the one with the lowest best
/// observed validation loss (scaled units).
pub fn select_sequential(
    configs: &[LstmConfig],
    train: &[SupervisedExample],
    validation: &[SupervisedExample],
) -> Result<(LstmRegressor, f64)> {
    if configs.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "no candidate configurations".to_string(),
        ));
    }

    let mut best: Option<(LstmRegressor, f64)> = None;
    for config in configs {
        let mut model = LstmRegressor::new(config.clone());
        model.fit(train, validation)?;
        let score = model
            .best_validation_loss()
            .ok_or_else(|| ForecastError::Computation("fit recorded no validation loss".to_string()))?;
        if !score.is_finite() {
            return Err(ForecastError::Computation(
                "sequential candidate produced a non-finite validation loss".to_string(),
            ));
        }
        debug!(
            hidden_units = config.hidden_units,
            score, "sequential candidate scored"
        );

        if best.as_ref().map_or(true, |(_, b)| score < *b) {
            best = Some((model, score));
        }
    }

    best.ok_or_else(|| ForecastError::Computation("no candidate was scored".to_string()))
}

/// Single-step predictions over the validation split, evaluated in real
/// units after inverse scaling.
pub fn validation_metrics(
    model: &dyn Predictor,
    validation: &[SupervisedExample],
) -> Result<EvalMetrics> {
    let mut actual = Vec::with_capacity(validation.len());
    let mut predicted = Vec::with_capacity(validation.len());
    for example in validation {
        actual.push(descale(example.target));
        predicted.push(descale(model.predict(&example.window)?));
    }
    evaluate(&actual, &predicted)
}

/// Outcome of selecting one family for one attribute.
#[derive(Debug, Clone)]
pub struct FamilyOutcome<M> {
    /// Winning model.
    pub model: M,
    /// Score that won selection, in scaled units: validation RMSE for the
    /// pointwise family, best observed validation loss for the sequential.
    pub score: f64,
    /// Real-unit single-step metrics on the validation split.
    pub metrics: EvalMetrics,
}

/// Best model per family for one attribute.
#[derive(Debug, Clone)]
pub struct AttributeModels {
    pub pointwise: FamilyOutcome<MlpRegressor>,
    pub sequential: FamilyOutcome<LstmRegressor>,
}

/// Run the full training procedure for one attribute series.
///
/// Scales the series, windows it, splits chronologically, selects the best
/// candidate per family over the fixed grids, and evaluates each winner on
/// the validation split in real units.
pub fn train_attribute(series: &AnnualSeries) -> Result<AttributeModels> {
    let scaled = scale_series(series.values());
    let examples = windows(&scaled, WINDOW_SIZE)?;
    if examples.len() < MIN_EXAMPLES {
        return Err(ForecastError::InsufficientData {
            needed: MIN_EXAMPLES + WINDOW_SIZE,
            got: series.len(),
        });
    }

    let (train, validation) = chronological_split(&examples);
    info!(
        train = train.len(),
        validation = validation.len(),
        "training attribute models"
    );

    let (pointwise_model, pointwise_score) =
        select_pointwise(&pointwise_grid(), train, validation)?;
    let pointwise_metrics = validation_metrics(&pointwise_model, validation)?;

    let (sequential_model, sequential_score) =
        select_sequential(&sequential_grid(), train, validation)?;
    let sequential_metrics = validation_metrics(&sequential_model, validation)?;

    Ok(AttributeModels {
        pointwise: FamilyOutcome {
            model: pointwise_model,
            score: pointwise_score,
            metrics: pointwise_metrics,
        },
        sequential: FamilyOutcome {
            model: sequential_model,
            score: sequential_score,
            metrics: sequential_metrics,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_examples(len: usize) -> Vec<SupervisedExample> {
        let series: Vec<f32> = (0..len).map(|i| 0.5 + 0.01 * i as f32).collect();
        windows(&series, WINDOW_SIZE).unwrap()
    }

    #[test]
    fn split_is_eighty_twenty_in_original_order() {
        let examples = ramp_examples(15); // 10 examples
        let (train, validation) = chronological_split(&examples);

        assert_eq!(train.len(), 8);
        assert_eq!(validation.len(), 2);

        let rejoined: Vec<_> = train.iter().chain(validation.iter()).cloned().collect();
        assert_eq!(rejoined, examples);
    }

    #[test]
    fn split_floors_the_training_fraction() {
        let examples = ramp_examples(12); // 7 examples
        let (train, validation) = chronological_split(&examples);
        assert_eq!(train.len(), 5); // floor(0.8 * 7)
        assert_eq!(validation.len(), 2);
    }

    #[test]
    fn grids_match_the_documented_candidates() {
        let pointwise = pointwise_grid();
        assert_eq!(pointwise.len(), 3);
        assert_eq!(pointwise[0].hidden_layers, vec![32]);
        assert_eq!(pointwise[1].hidden_layers, vec![64, 32]);
        assert_eq!(pointwise[2].hidden_layers, vec![64, 64]);
        assert_eq!(pointwise[2].alpha, 5e-4);

        let sequential = sequential_grid();
        assert_eq!(sequential.len(), 2);
        assert_eq!(sequential[0].hidden_units, 32);
        assert_eq!(sequential[1].hidden_units, 64);
    }

    #[test]
    fn select_pointwise_picks_a_finite_scorer() {
        let examples = ramp_examples(20);
        let (train, validation) = chronological_split(&examples);

        let configs = vec![MlpConfig {
            hidden_layers: vec![4],
            max_iter: 200,
            learning_rate: 0.01,
            ..MlpConfig::default()
        }];
        let (model, score) = select_pointwise(&configs, train, validation).unwrap();

        assert!(model.is_fitted());
        assert!(score.is_finite() && score >= 0.0);
    }

    #[test]
    fn select_sequential_picks_a_finite_scorer() {
        let examples = ramp_examples(20);
        let (train, validation) = chronological_split(&examples);

        let configs = vec![LstmConfig {
            hidden_units: 4,
            max_epochs: 50,
            learning_rate: 0.01,
            ..LstmConfig::default()
        }];
        let (model, score) = select_sequential(&configs, train, validation).unwrap();

        assert!(model.is_fitted());
        assert!(score.is_finite() && score >= 0.0);
        assert_eq!(model.best_validation_loss(), Some(score));
    }

    #[test]
    fn empty_grid_is_invalid() {
        let examples = ramp_examples(20);
        let (train, validation) = chronological_split(&examples);

        assert!(matches!(
            select_pointwise(&[], train, validation),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(matches!(
            select_sequential(&[], train, validation),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn train_attribute_needs_enough_examples() {
        // 14 points give 9 examples, one short of the minimum.
        let series = AnnualSeries::new(
            (1981..1995).collect(),
            (0..14).map(|i| 1000.0 + i as f32).collect(),
        )
        .unwrap();

        let err = train_attribute(&series).unwrap_err();
        assert_eq!(
            err,
            ForecastError::InsufficientData {
                needed: 15,
                got: 14
            }
        );
    }
}
