//! Advisor configuration.
//!
//! Mistake-proofed through:
//! - Type-safe configuration structs
//! - Compile-time validation via serde
//! - Runtime semantic validation
//!
//! The active configuration is persisted in the durable store under a
//! well-known key and reloaded when the service is constructed; kernel
//! hyperparameters are additionally captured into each optimizer state at
//! creation time, so later edits only affect states created afterwards.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{BrewError, BrewResult};

/// Tunable options for the Bayesian-optimization service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Observations needed before the advisor reports readiness.
    #[validate(range(min = 1))]
    #[serde(default = "default_min_runs_threshold")]
    pub min_runs_threshold: usize,

    /// UCB exploration factor (beta).
    #[validate(range(min = 0.0))]
    #[serde(default = "default_exploration_factor")]
    pub exploration_factor: f64,

    /// Random candidates drawn per suggestion.
    #[validate(range(min = 1))]
    #[serde(default = "default_num_candidates")]
    pub num_candidates: usize,

    /// RBF length scale used at state creation.
    #[serde(default = "default_kernel_length_scale")]
    pub kernel_length_scale: f64,

    /// RBF output scale (signal variance) used at state creation.
    #[serde(default = "default_kernel_output_scale")]
    pub kernel_output_scale: f64,

    /// GP observation-noise variance added to the kernel diagonal.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_kernel_noise")]
    pub kernel_noise: f64,

    /// Tail-cap on observations retained per optimizer state.
    #[validate(range(min = 1))]
    #[serde(default = "default_max_observations")]
    pub max_observations: usize,

    /// Envelope expansion factor for unbounded-continuous parameters.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_number_param_padding")]
    pub number_param_padding: f64,
}

fn default_min_runs_threshold() -> usize {
    5
}

fn default_exploration_factor() -> f64 {
    2.0
}

fn default_num_candidates() -> usize {
    100
}

fn default_kernel_length_scale() -> f64 {
    0.3
}

fn default_kernel_output_scale() -> f64 {
    1.0
}

fn default_kernel_noise() -> f64 {
    0.1
}

fn default_max_observations() -> usize {
    100
}

fn default_number_param_padding() -> f64 {
    0.2
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            min_runs_threshold: default_min_runs_threshold(),
            exploration_factor: default_exploration_factor(),
            num_candidates: default_num_candidates(),
            kernel_length_scale: default_kernel_length_scale(),
            kernel_output_scale: default_kernel_output_scale(),
            kernel_noise: default_kernel_noise(),
            max_observations: default_max_observations(),
            number_param_padding: default_number_param_padding(),
        }
    }
}

impl OptimizerConfig {
    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> BrewResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;

        config.validate()?;
        config.validate_semantic()?;

        Ok(config)
    }

    /// Validate semantic constraints beyond the schema.
    ///
    /// # Errors
    ///
    /// Returns error if a hyperparameter is non-positive or non-finite.
    pub fn validate_semantic(&self) -> BrewResult<()> {
        if self.kernel_length_scale <= 0.0 || !self.kernel_length_scale.is_finite() {
            return Err(BrewError::config(format!(
                "kernel_length_scale must be positive and finite, got {}",
                self.kernel_length_scale
            )));
        }
        if self.kernel_output_scale <= 0.0 || !self.kernel_output_scale.is_finite() {
            return Err(BrewError::config(format!(
                "kernel_output_scale must be positive and finite, got {}",
                self.kernel_output_scale
            )));
        }
        if !self.kernel_noise.is_finite() || self.kernel_noise < 0.0 {
            return Err(BrewError::config(format!(
                "kernel_noise must be non-negative and finite, got {}",
                self.kernel_noise
            )));
        }
        if !self.number_param_padding.is_finite() || self.number_param_padding < 0.0 {
            return Err(BrewError::config(format!(
                "number_param_padding must be non-negative and finite, got {}",
                self.number_param_padding
            )));
        }
        if !self.exploration_factor.is_finite() || self.exploration_factor < 0.0 {
            return Err(BrewError::config(format!(
                "exploration_factor must be non-negative and finite, got {}",
                self.exploration_factor
            )));
        }
        Ok(())
    }

    /// Apply a partial update, returning the merged configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the merged configuration is semantically invalid.
    pub fn merged(&self, patch: &ConfigPatch) -> BrewResult<Self> {
        let mut next = self.clone();
        patch.apply_to(&mut next);
        next.validate()?;
        next.validate_semantic()?;
        Ok(next)
    }
}

/// Partial configuration update: unset fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigPatch {
    /// New readiness threshold.
    #[serde(default)]
    pub min_runs_threshold: Option<usize>,
    /// New UCB exploration factor.
    #[serde(default)]
    pub exploration_factor: Option<f64>,
    /// New candidate count.
    #[serde(default)]
    pub num_candidates: Option<usize>,
    /// New RBF length scale (affects states created afterwards).
    #[serde(default)]
    pub kernel_length_scale: Option<f64>,
    /// New RBF output scale (affects states created afterwards).
    #[serde(default)]
    pub kernel_output_scale: Option<f64>,
    /// New GP noise variance.
    #[serde(default)]
    pub kernel_noise: Option<f64>,
    /// New observation tail-cap.
    #[serde(default)]
    pub max_observations: Option<usize>,
    /// New unbounded-envelope padding.
    #[serde(default)]
    pub number_param_padding: Option<f64>,
}

impl ConfigPatch {
    /// Overwrite the set fields of `config` in place.
    pub fn apply_to(&self, config: &mut OptimizerConfig) {
        if let Some(v) = self.min_runs_threshold {
            config.min_runs_threshold = v;
        }
        if let Some(v) = self.exploration_factor {
            config.exploration_factor = v;
        }
        if let Some(v) = self.num_candidates {
            config.num_candidates = v;
        }
        if let Some(v) = self.kernel_length_scale {
            config.kernel_length_scale = v;
        }
        if let Some(v) = self.kernel_output_scale {
            config.kernel_output_scale = v;
        }
        if let Some(v) = self.kernel_noise {
            config.kernel_noise = v;
        }
        if let Some(v) = self.max_observations {
            config.max_observations = v;
        }
        if let Some(v) = self.number_param_padding {
            config.number_param_padding = v;
        }
    }

    /// True if no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.min_runs_threshold.is_none()
            && self.exploration_factor.is_none()
            && self.num_candidates.is_none()
            && self.kernel_length_scale.is_none()
            && self.kernel_output_scale.is_none()
            && self.kernel_noise.is_none()
            && self.max_observations.is_none()
            && self.number_param_padding.is_none()
    }
}
