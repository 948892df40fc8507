//! Per-pair optimizer state.
//!
//! One record per (bean, machine) pair: the optimizable-parameter metadata
//! captured at creation, the encoded observations in insertion order, the
//! GP hyperparameters in use, and a last-updated timestamp. The raw value
//! map inside each observation is ground truth for the unbounded-parameter
//! envelope; the normalized vector is what the GP consumes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::{ParamValue, ParameterSchema};

/// Stable durable-store key for a (bean, machine) pair.
#[must_use]
pub fn pair_key(bean_id: &str, machine_id: &str) -> String {
    format!("{bean_id}_{machine_id}")
}

/// One historical rated experiment, encoded for the GP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Normalized vector in [0, 1]^D, one component per optimizable
    /// parameter in metadata order.
    pub parameters: Vec<f64>,
    /// Raw value per parameter id as entered by the user.
    pub raw_values: IndexMap<String, ParamValue>,
    /// Rating normalized onto [0, 1].
    pub rating: f64,
}

/// GP hyperparameters captured into a state at creation time.
///
/// Later configuration edits do not retroactively change existing states;
/// this keeps old optimizers reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpHyperparameters {
    /// RBF length scale.
    pub length_scale: f64,
    /// RBF output scale (signal variance).
    pub output_scale: f64,
    /// Observation-noise variance.
    pub noise: f64,
}

/// Persistent Bayesian-optimization state for one (bean, machine) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoState {
    /// Optimizable-parameter metadata captured at creation, in declared
    /// order. Defines the GP input dimension mapping.
    pub parameter_metadata: Vec<ParameterSchema>,
    /// Observations in insertion order.
    pub observations: Vec<Observation>,
    /// Hyperparameters in use for this state.
    pub hyperparameters: GpHyperparameters,
    /// Milliseconds since the Unix epoch of the last mutation.
    pub last_updated: u64,
}

impl BoState {
    /// Create an empty state with captured metadata.
    #[must_use]
    pub fn new(
        parameter_metadata: Vec<ParameterSchema>,
        hyperparameters: GpHyperparameters,
        now_millis: u64,
    ) -> Self {
        Self {
            parameter_metadata,
            observations: Vec::new(),
            hyperparameters,
            last_updated: now_millis,
        }
    }

    /// GP input dimension.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.parameter_metadata.len()
    }

    /// Append an observation and enforce the tail-cap: when the cap is
    /// exceeded the oldest observations are dropped in insertion order.
    pub fn push_observation(&mut self, observation: Observation, max_observations: usize) {
        self.observations.push(observation);
        if self.observations.len() > max_observations {
            let excess = self.observations.len() - max_observations;
            self.observations.drain(..excess);
        }
    }

    /// Historical raw numeric values of one parameter, in insertion order.
    ///
    /// This is the value multiset feeding the unbounded-parameter envelope.
    #[must_use]
    pub fn numeric_history(&self, param_id: &str) -> Vec<f64> {
        self.observations
            .iter()
            .filter_map(|obs| obs.raw_values.get(param_id).and_then(ParamValue::as_number))
            .collect()
    }

    /// Training arrays for the GP: (inputs, normalized ratings).
    #[must_use]
    pub fn training_data(&self) -> (Vec<Vec<f64>>, Vec<f64>) {
        let x = self
            .observations
            .iter()
            .map(|obs| obs.parameters.clone())
            .collect();
        let y = self.observations.iter().map(|obs| obs.rating).collect();
        (x, y)
    }

    /// Check the state's structural invariants: every observation vector
    /// has the metadata dimension, every component is finite and in
    /// [0, 1], and every rating is in [0, 1].
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let dim = self.dimension();
        self.observations.iter().all(|obs| {
            obs.parameters.len() == dim
                && obs
                    .parameters
                    .iter()
                    .all(|v| v.is_finite() && (0.0..=1.0).contains(v))
                && obs.rating.is_finite()
                && (0.0..=1.0).contains(&obs.rating)
        })
    }
}
