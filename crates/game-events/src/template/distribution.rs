//! Declarative value distributions for template parameters.
//!
//! A distribution describes how to draw one concrete value for a named
//! parameter. The set of kinds is closed; an unknown `kind` in a document is
//! a load-time error via serde's tagged-enum parsing.

use rand::distributions::{Distribution as _, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::{Number, Value};

/// One candidate of a `weighted_choice` distribution.
#[derive(Debug, Clone, Deserialize)]
pub struct WeightedValue {
    pub value: Value,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

fn default_prob_true() -> f64 {
    0.5
}

/// Declarative rule for producing a random value of a given shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Distribution {
    /// Always the same value.
    Fixed {
        #[serde(default)]
        value: Value,
    },
    /// Uniform pick from a non-empty list.
    Choice {
        #[serde(default)]
        values: Vec<Value>,
    },
    /// Weighted pick from value/weight pairs.
    WeightedChoice {
        #[serde(default)]
        values: Vec<WeightedValue>,
    },
    /// Uniform integer in `[min, max]`; inverted bounds are swapped.
    IntRange {
        #[serde(default)]
        min: i64,
        #[serde(default)]
        max: i64,
    },
    /// Uniform float in `[min, max]`; inverted bounds are swapped.
    FloatRange {
        #[serde(default)]
        min: f64,
        #[serde(default)]
        max: f64,
    },
    /// Bernoulli draw; `probTrue` defaults to 0.5 and is clamped to [0, 1].
    Bool {
        #[serde(default = "default_prob_true", rename = "probTrue")]
        prob_true: f64,
    },
}

/// Configuration mistakes detected while sampling.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("choice distribution requires non-empty 'values' array")]
    EmptyChoice,
    #[error("weighted_choice distribution requires non-empty 'values' array")]
    EmptyWeightedChoice,
    #[error("weighted_choice distribution has unusable weights")]
    InvalidWeights,
}

/// Draws one concrete value from a distribution.
pub fn sample_distribution(
    distribution: &Distribution,
    rng: &mut impl Rng,
) -> Result<Value, SampleError> {
    match distribution {
        Distribution::Fixed { value } => Ok(value.clone()),
        Distribution::Choice { values } => values
            .choose(rng)
            .cloned()
            .ok_or(SampleError::EmptyChoice),
        Distribution::WeightedChoice { values } => {
            if values.is_empty() {
                return Err(SampleError::EmptyWeightedChoice);
            }
            let weights: Vec<f64> = values
                .iter()
                .map(|candidate| {
                    // A zero or negative weight counts as the default 1.0.
                    if candidate.weight > 0.0 {
                        candidate.weight
                    } else {
                        default_weight()
                    }
                })
                .collect();
            let index =
                WeightedIndex::new(&weights).map_err(|_| SampleError::InvalidWeights)?;
            Ok(values[index.sample(rng)].value.clone())
        }
        Distribution::IntRange { min, max } => {
            let (low, high) = if max < min { (*max, *min) } else { (*min, *max) };
            Ok(Value::from(rng.gen_range(low..=high)))
        }
        Distribution::FloatRange { min, max } => {
            let (low, high) = if max < min { (*max, *min) } else { (*min, *max) };
            let drawn = rng.gen_range(low..=high);
            Ok(Number::from_f64(drawn)
                .map(Value::Number)
                .unwrap_or(Value::Null))
        }
        Distribution::Bool { prob_true } => {
            let probability = prob_true.clamp(0.0, 1.0);
            Ok(Value::Bool(rng.gen::<f64>() < probability))
        }
    }
}
