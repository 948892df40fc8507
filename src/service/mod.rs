//! The Bayesian-optimization advisor service.
//!
//! Owns per-pair optimizer lifecycle: observation ingestion, suggestion
//! assembly, prediction-curve extraction, configuration management, and
//! persistence. All collaborators (durable store, machine catalog, run
//! history, RNG, clock) are injected, so a fixed seed reproduces every
//! suggestion.
//!
//! The read side is tolerant: `suggest_parameters` and `prediction_curve`
//! return `None` on any internal failure and log the cause. The write side
//! is strict: ingestion, initialization and configuration surface storage
//! errors to the caller.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::adapters::{MachineCatalog, RunHistory};
use crate::config::{ConfigPatch, OptimizerConfig};
use crate::encode;
use crate::engine::clock::Clock;
use crate::engine::rng::BrewRng;
use crate::error::{BrewError, BrewResult};
use crate::model::{acquisition, GaussianProcess, RbfKernel};
use crate::schema::{ParamSpec, ParamValue, ParameterSchema, RunRecord};
use crate::state::{pair_key, BoState, GpHyperparameters, Observation};
use crate::store::StateStore;

/// Well-known store key for the configuration record.
const CONFIG_KEY: &str = "__config__";

/// Outcome of an explicit optimizer initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// A fresh empty state was written.
    Initialized,
    /// The machine has no optimizable parameters; nothing was written.
    NotInitialized,
}

/// A proposed next experiment.
///
/// Distinguished from a historical run by the `suggested` marker; the
/// rating field stays unrated until the user brews and scores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Originating bean.
    pub bean_id: String,
    /// Originating machine.
    pub machine_id: String,
    /// Decoded value per machine parameter, free-text as empty string.
    pub values: IndexMap<String, ParamValue>,
    /// Always `None`: a suggestion is unrated by construction.
    pub rating: Option<u8>,
    /// Marker distinguishing a suggestion from a real historical run.
    pub suggested: bool,
    /// Predicted mean rating on the 1..=10 scale.
    pub expected_rating: f64,
    /// Predicted standard deviation in rating units (one sigma).
    pub expected_std_dev: f64,
}

/// Options for [`BrewAdvisor::prediction_curve`].
#[derive(Debug, Clone, Default)]
pub struct CurveOptions {
    /// Number of samples along the swept parameter; `None` means 50.
    pub num_points: Option<usize>,
    /// Raw values pinning every non-swept parameter.
    pub fixed_values: IndexMap<String, ParamValue>,
}

const DEFAULT_CURVE_POINTS: usize = 50;

/// One-dimensional conditional slice through the GP surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionCurve {
    /// Swept parameter id.
    pub param_id: String,
    /// Decoded x-axis sample per point.
    pub param_values: Vec<ParamValue>,
    /// Predicted mean rating per point, on the 1..=10 scale.
    pub ratings: Vec<f64>,
    /// Predicted standard deviation per point, in rating units.
    pub std_devs: Vec<f64>,
    /// For ordinal parameters: per option, the sample index closest to the
    /// option's canonical position. `None` for other kinds.
    pub valid_indices: Option<Vec<usize>>,
}

/// Brew-parameter advisor over one durable store.
pub struct BrewAdvisor {
    store: Box<dyn StateStore>,
    catalog: Box<dyn MachineCatalog>,
    history: Box<dyn RunHistory>,
    rng: BrewRng,
    clock: Box<dyn Clock>,
    config: OptimizerConfig,
}

impl BrewAdvisor {
    /// Assemble the service from its collaborators.
    ///
    /// The configuration record is loaded from the store; a missing or
    /// unreadable record falls back to defaults.
    #[must_use]
    pub fn new(
        store: Box<dyn StateStore>,
        catalog: Box<dyn MachineCatalog>,
        history: Box<dyn RunHistory>,
        rng: BrewRng,
        clock: Box<dyn Clock>,
    ) -> Self {
        let config = match store.load(CONFIG_KEY) {
            Ok(Some(bytes)) => match bincode::deserialize(&bytes) {
                Ok(config) => config,
                Err(e) => {
                    warn!(error = %e, "stored configuration unreadable; using defaults");
                    OptimizerConfig::default()
                }
            },
            Ok(None) => OptimizerConfig::default(),
            Err(e) => {
                warn!(error = %e, "configuration load failed; using defaults");
                OptimizerConfig::default()
            }
        };

        Self {
            store,
            catalog,
            history,
            rng,
            clock,
            config,
        }
    }

    // ===== Configuration =====

    /// Snapshot of the active configuration.
    #[must_use]
    pub const fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Merge a partial update into the configuration and persist it.
    ///
    /// Kernel hyperparameters only affect states created afterwards;
    /// existing states keep their captured values.
    ///
    /// # Errors
    ///
    /// Returns error if the merged configuration is invalid or the store
    /// rejects the write.
    pub fn set_config(&mut self, patch: &ConfigPatch) -> BrewResult<()> {
        let merged = self.config.merged(patch)?;
        let bytes = bincode::serialize(&merged)
            .map_err(|e| BrewError::serialization(e.to_string()))?;
        self.store.upsert(CONFIG_KEY, &bytes)?;
        self.config = merged;
        Ok(())
    }

    // ===== Lifecycle =====

    /// Write a fresh empty optimizer state for the pair, overwriting any
    /// existing one.
    ///
    /// # Errors
    ///
    /// Returns error if the machine does not exist or the store rejects
    /// the write.
    pub fn initialize_optimizer(
        &mut self,
        bean_id: &str,
        machine_id: &str,
    ) -> BrewResult<InitOutcome> {
        let Some(state) = self.fresh_state(machine_id)? else {
            debug!(machine = %machine_id, "no optimizable parameters; optimizer not initialized");
            return Ok(InitOutcome::NotInitialized);
        };
        self.save_state(bean_id, machine_id, &state)?;
        Ok(InitOutcome::Initialized)
    }

    /// Ingest one run into the pair's optimizer.
    ///
    /// Unrated runs are ignored. The state is lazily created on first
    /// ingestion; machines without optimizable parameters never get one.
    /// Runs missing any optimizable-parameter value are rejected with a
    /// warning and no state change.
    ///
    /// # Errors
    ///
    /// Returns error for an out-of-range rating, an unknown machine, or a
    /// store failure.
    pub fn update_with_run(
        &mut self,
        bean_id: &str,
        machine_id: &str,
        run: &RunRecord,
    ) -> BrewResult<()> {
        let Some(rating) = run.rating else {
            debug!(run = %run.id, "unrated run ignored");
            return Ok(());
        };
        if !(1..=10).contains(&rating) {
            return Err(BrewError::invalid_input(format!(
                "rating {rating} outside 1..=10"
            )));
        }

        let mut state = match self.load_state(bean_id, machine_id)? {
            Some(state) => state,
            None => match self.fresh_state(machine_id)? {
                Some(state) => state,
                None => {
                    debug!(machine = %machine_id, "no optimizable parameters; run ignored");
                    return Ok(());
                }
            },
        };

        let Some(observation) =
            Self::encode_run(&state, run, rating, self.config.number_param_padding)
        else {
            warn!(run = %run.id, "run missing optimizable parameter values; rejected");
            return Ok(());
        };

        state.push_observation(observation, self.config.max_observations);
        state.last_updated = self.clock.now_millis();
        self.save_state(bean_id, machine_id, &state)
    }

    /// True once the pair's state holds enough observations to advise.
    #[must_use]
    pub fn is_ready(&self, bean_id: &str, machine_id: &str) -> bool {
        match self.load_state(bean_id, machine_id) {
            Ok(Some(state)) => state.observations.len() >= self.config.min_runs_threshold,
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "readiness check failed");
                false
            }
        }
    }

    /// Number of observations held for the pair, 0 when no state exists.
    #[must_use]
    pub fn observation_count(&self, bean_id: &str, machine_id: &str) -> usize {
        match self.load_state(bean_id, machine_id) {
            Ok(Some(state)) => state.observations.len(),
            Ok(None) => 0,
            Err(e) => {
                warn!(error = %e, "observation count unavailable");
                0
            }
        }
    }

    /// Remove the pair's optimizer state. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns error if the store rejects the removal.
    pub fn clear_optimizer(&mut self, bean_id: &str, machine_id: &str) -> BrewResult<()> {
        self.store.remove(&pair_key(bean_id, machine_id))
    }

    /// Remove optimizer state for every pair on the machine.
    ///
    /// Best-effort: individual removal failures are logged without
    /// stopping the sweep, so an outer machine delete still succeeds.
    pub fn clear_optimizers_for_machine(&mut self, machine_id: &str) {
        self.clear_matching(|key| key.ends_with(&format!("_{machine_id}")));
    }

    /// Remove optimizer state for every pair using the bean.
    ///
    /// Best-effort, like [`Self::clear_optimizers_for_machine`].
    pub fn clear_optimizers_for_bean(&mut self, bean_id: &str) {
        self.clear_matching(|key| key.starts_with(&format!("{bean_id}_")));
    }

    /// Rebuild the pair's state from the remaining rated history.
    ///
    /// Clears the state, then re-ingests every rated run the history
    /// adapter still knows in order. A pair with no remaining rated runs
    /// ends with no state, matching lazy creation.
    ///
    /// # Errors
    ///
    /// Returns error if the machine does not exist or the store fails.
    pub fn rebuild_optimizer(&mut self, bean_id: &str, machine_id: &str) -> BrewResult<()> {
        self.clear_optimizer(bean_id, machine_id)?;

        let Some(mut state) = self.fresh_state(machine_id)? else {
            return Ok(());
        };

        let runs = self.history.rated_runs_for(bean_id, machine_id);
        let mut ingested = 0usize;
        for run in &runs {
            let Some(rating) = run.rating.filter(|r| (1..=10).contains(r)) else {
                warn!(run = %run.id, "rebuild skipped run with missing or invalid rating");
                continue;
            };
            match Self::encode_run(&state, run, rating, self.config.number_param_padding) {
                Some(observation) => {
                    state.push_observation(observation, self.config.max_observations);
                    ingested += 1;
                }
                None => {
                    warn!(run = %run.id, "rebuild skipped run missing parameter values");
                }
            }
        }

        if ingested == 0 {
            debug!(bean = %bean_id, machine = %machine_id, "no rated history; state stays cleared");
            return Ok(());
        }

        state.last_updated = self.clock.now_millis();
        self.save_state(bean_id, machine_id, &state)
    }

    /// Drop every pair state; optionally restore default configuration.
    ///
    /// Best-effort over individual records.
    ///
    /// # Errors
    ///
    /// Returns error only if the reset configuration cannot be persisted.
    pub fn reset(&mut self, clear_config: bool) -> BrewResult<()> {
        match self.store.keys() {
            Ok(keys) => {
                for key in keys {
                    if key == CONFIG_KEY {
                        continue;
                    }
                    if let Err(e) = self.store.remove(&key) {
                        warn!(key = %key, error = %e, "reset failed to remove state");
                    }
                }
            }
            Err(e) => warn!(error = %e, "reset could not enumerate stored states"),
        }

        if clear_config {
            self.config = OptimizerConfig::default();
            let bytes = bincode::serialize(&self.config)
                .map_err(|e| BrewError::serialization(e.to_string()))?;
            self.store.upsert(CONFIG_KEY, &bytes)?;
        }
        Ok(())
    }

    /// Pair keys with persisted optimizer state.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot enumerate keys.
    pub fn load_known_pairs(&self) -> BrewResult<Vec<String>> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter(|k| k != CONFIG_KEY)
            .collect())
    }

    // ===== Suggestion =====

    /// Propose the next parameter vector for the pair.
    ///
    /// Returns `None` when no state or no observations exist, and on any
    /// internal failure (logged): the surrounding UI hides its advice
    /// rather than surfacing errors.
    pub fn suggest_parameters(&mut self, bean_id: &str, machine_id: &str) -> Option<Suggestion> {
        match self.try_suggest(bean_id, machine_id) {
            Ok(suggestion) => suggestion,
            Err(e) => {
                warn!(bean = %bean_id, machine = %machine_id, error = %e, "suggestion unavailable");
                None
            }
        }
    }

    fn try_suggest(
        &mut self,
        bean_id: &str,
        machine_id: &str,
    ) -> BrewResult<Option<Suggestion>> {
        let Some(state) = self.load_state(bean_id, machine_id)? else {
            return Ok(None);
        };
        if state.observations.is_empty() {
            return Ok(None);
        }
        let machine = self
            .catalog
            .machine_by_id(machine_id)
            .ok_or_else(|| BrewError::state(format!("unknown machine: {machine_id}")))?;

        let mut gp = Self::surrogate(&state);
        let (x, y) = state.training_data();
        gp.fit(x, y)?;

        let candidates = acquisition::sample_candidates(
            &mut self.rng,
            self.config.num_candidates,
            state.dimension(),
        );
        let (means, variances) = gp.predict(&candidates)?;
        let best = acquisition::select_best(&means, &variances, self.config.exploration_factor)?;
        let winner = &candidates[best];

        let padding = self.config.number_param_padding;
        let mut values = IndexMap::new();
        for param in &machine.parameters {
            if matches!(param.spec, ParamSpec::FreeText { .. }) {
                values.insert(param.id.clone(), ParamValue::Text(String::new()));
                continue;
            }
            let idx = state
                .parameter_metadata
                .iter()
                .position(|m| m.id == param.id)
                .ok_or_else(|| {
                    BrewError::state(format!(
                        "parameter {} missing from captured metadata",
                        param.id
                    ))
                })?;
            let meta = &state.parameter_metadata[idx];
            let history = state.numeric_history(&meta.id);
            let value = encode::decode_component(&meta.spec, winner[idx], &history, padding)
                .ok_or_else(|| {
                    BrewError::state(format!("parameter {} cannot be decoded", meta.id))
                })?;
            values.insert(param.id.clone(), value);
        }

        Ok(Some(Suggestion {
            bean_id: bean_id.to_string(),
            machine_id: machine_id.to_string(),
            values,
            rating: None,
            suggested: true,
            expected_rating: encode::denormalize_rating(means[best]),
            expected_std_dev: encode::denormalize_std_dev(variances[best].max(0.0).sqrt()),
        }))
    }

    // ===== Prediction curve =====

    /// Extract a 1-D conditional slice through the GP surface.
    ///
    /// `param_index` indexes the pair's captured metadata. Non-swept
    /// parameters are pinned at the encoding of `opts.fixed_values` (or a
    /// kind-specific fallback). Returns `None` when no state or no
    /// observations exist, and on internal failure (logged).
    pub fn prediction_curve(
        &mut self,
        bean_id: &str,
        machine_id: &str,
        param_index: usize,
        opts: &CurveOptions,
    ) -> Option<PredictionCurve> {
        match self.try_curve(bean_id, machine_id, param_index, opts) {
            Ok(curve) => curve,
            Err(e) => {
                warn!(bean = %bean_id, machine = %machine_id, error = %e, "prediction curve unavailable");
                None
            }
        }
    }

    fn try_curve(
        &mut self,
        bean_id: &str,
        machine_id: &str,
        param_index: usize,
        opts: &CurveOptions,
    ) -> BrewResult<Option<PredictionCurve>> {
        let Some(state) = self.load_state(bean_id, machine_id)? else {
            return Ok(None);
        };
        if state.observations.is_empty() {
            return Ok(None);
        }
        if param_index >= state.dimension() {
            return Err(BrewError::invalid_input(format!(
                "parameter index {param_index} outside dimension {}",
                state.dimension()
            )));
        }
        let num_points = opts.num_points.unwrap_or(DEFAULT_CURVE_POINTS);
        if num_points < 2 {
            return Err(BrewError::invalid_input(
                "a curve needs at least two sample points",
            ));
        }

        let padding = self.config.number_param_padding;

        // Pin every non-swept dimension once; the swept slot is filled per
        // sample below.
        let mut base = vec![0.0; state.dimension()];
        for (j, meta) in state.parameter_metadata.iter().enumerate() {
            if j == param_index {
                continue;
            }
            let history = state.numeric_history(&meta.id);
            base[j] =
                Self::fixed_component(meta, opts.fixed_values.get(&meta.id), &history, padding);
        }

        let samples: Vec<f64> = (0..num_points)
            .map(|k| k as f64 / (num_points - 1) as f64)
            .collect();
        let test_points: Vec<Vec<f64>> = samples
            .iter()
            .map(|&u| {
                let mut point = base.clone();
                point[param_index] = u;
                point
            })
            .collect();

        let mut gp = Self::surrogate(&state);
        let (x, y) = state.training_data();
        gp.fit(x, y)?;
        let (means, variances) = gp.predict(&test_points)?;

        let meta = &state.parameter_metadata[param_index];
        let history = state.numeric_history(&meta.id);
        let mut param_values = Vec::with_capacity(num_points);
        for &u in &samples {
            let value = encode::decode_component(&meta.spec, u, &history, padding)
                .ok_or_else(|| {
                    BrewError::state(format!("parameter {} cannot be decoded", meta.id))
                })?;
            param_values.push(value);
        }

        let ratings: Vec<f64> = means.iter().map(|&m| encode::denormalize_rating(m)).collect();
        let std_devs: Vec<f64> = variances
            .iter()
            .map(|&v| encode::denormalize_std_dev(v.max(0.0).sqrt()))
            .collect();

        let valid_indices = match &meta.spec {
            ParamSpec::Ordinal { options, .. } => {
                let indices = (0..options.len())
                    .map(|opt| {
                        let target = encode::ordinal_position(opt, options.len());
                        Self::closest_sample(&samples, target)
                    })
                    .collect();
                Some(indices)
            }
            _ => None,
        };

        Ok(Some(PredictionCurve {
            param_id: meta.id.clone(),
            param_values,
            ratings,
            std_devs,
            valid_indices,
        }))
    }

    // ===== Internals =====

    fn surrogate(state: &BoState) -> GaussianProcess {
        let kernel = RbfKernel::new(
            state.hyperparameters.length_scale,
            state.hyperparameters.output_scale,
        );
        GaussianProcess::new(kernel, state.hyperparameters.noise)
    }

    /// Fresh unsaved state for the machine, `None` when it has no
    /// optimizable parameters.
    fn fresh_state(&self, machine_id: &str) -> BrewResult<Option<BoState>> {
        let machine = self
            .catalog
            .machine_by_id(machine_id)
            .ok_or_else(|| BrewError::state(format!("unknown machine: {machine_id}")))?;
        let metadata: Vec<ParameterSchema> = machine.optimizable().cloned().collect();
        if metadata.is_empty() {
            return Ok(None);
        }
        Ok(Some(BoState::new(
            metadata,
            GpHyperparameters {
                length_scale: self.config.kernel_length_scale,
                output_scale: self.config.kernel_output_scale,
                noise: self.config.kernel_noise,
            },
            self.clock.now_millis(),
        )))
    }

    /// Encode a run against the state's metadata and current history.
    ///
    /// `None` when any optimizable parameter value is missing or carries
    /// the wrong kind of payload.
    fn encode_run(
        state: &BoState,
        run: &RunRecord,
        rating: u8,
        padding: f64,
    ) -> Option<Observation> {
        let mut parameters = Vec::with_capacity(state.dimension());
        let mut raw_values = IndexMap::new();
        for meta in &state.parameter_metadata {
            let value = run.values.get(&meta.id)?;
            let history = state.numeric_history(&meta.id);
            let u = encode::encode_value(&meta.spec, value, &history, padding)?;
            parameters.push(u);
            raw_values.insert(meta.id.clone(), value.clone());
        }
        Some(Observation {
            parameters,
            raw_values,
            rating: encode::normalize_rating(rating),
        })
    }

    fn fixed_component(
        meta: &ParameterSchema,
        provided: Option<&ParamValue>,
        history: &[f64],
        padding: f64,
    ) -> f64 {
        if let Some(value) = provided {
            if let Some(u) = encode::encode_value(&meta.spec, value, history, padding) {
                return u;
            }
            debug!(param = %meta.id, "fixed value incompatible with parameter kind; using fallback");
        }
        if let Some(default) = meta.spec.default_value() {
            if let Some(u) = encode::encode_value(&meta.spec, &default, history, padding) {
                return u;
            }
        }
        match &meta.spec {
            ParamSpec::Ordinal { .. } => 0.0,
            _ => 0.5,
        }
    }

    fn closest_sample(samples: &[f64], target: f64) -> usize {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (i, &s) in samples.iter().enumerate() {
            let dist = (s - target).abs();
            if dist < best_dist {
                best_dist = dist;
                best = i;
            }
        }
        best
    }

    fn clear_matching(&mut self, matches: impl Fn(&str) -> bool) {
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "cascade clear could not enumerate keys");
                return;
            }
        };
        for key in keys {
            if key == CONFIG_KEY || !matches(&key) {
                continue;
            }
            if let Err(e) = self.store.remove(&key) {
                warn!(key = %key, error = %e, "cascade clear failed for key");
            }
        }
    }

    fn load_state(&self, bean_id: &str, machine_id: &str) -> BrewResult<Option<BoState>> {
        let Some(bytes) = self.store.load(&pair_key(bean_id, machine_id))? else {
            return Ok(None);
        };
        bincode::deserialize(&bytes)
            .map(Some)
            .map_err(|e| BrewError::serialization(format!("state record decode: {e}")))
    }

    fn save_state(&mut self, bean_id: &str, machine_id: &str, state: &BoState) -> BrewResult<()> {
        let bytes = bincode::serialize(state)
            .map_err(|e| BrewError::serialization(format!("state record encode: {e}")))?;
        self.store.upsert(&pair_key(bean_id, machine_id), &bytes)
    }
}
