//! # brewopt
//!
//! Bayesian-optimization core for a brew-parameter advisor.
//!
//! Given a history of rated brewing experiments for one (bean, machine)
//! pair, the crate:
//! - fits a Gaussian Process surrogate over the normalized parameter space,
//! - proposes the next parameter vector under an Upper-Confidence-Bound
//!   acquisition policy,
//! - extracts one-dimensional predictive slices (mean and uncertainty as a
//!   function of one parameter, with all others fixed) for visualization.
//!
//! The advisor is assembled from injected collaborators (durable store,
//! machine catalog, run history, RNG, clock), so every suggestion is
//! reproducible from a seed.
//!
//! ## Example
//!
//! ```rust
//! use brewopt::prelude::*;
//!
//! let advisor = BrewAdvisor::new(
//!     Box::new(MemoryStore::new()),
//!     Box::new(InMemoryCatalog::new()),
//!     Box::new(InMemoryRunHistory::new()),
//!     BrewRng::new(42),
//!     Box::new(SystemClock),
//! );
//! assert_eq!(advisor.config().min_runs_threshold, 5);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,  // Numerical code choices are intentional
    clippy::imprecise_flops,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,  // Many functions can't be const in stable Rust
    clippy::needless_range_loop,   // Sometimes range loops are clearer
)]

pub mod adapters;
pub mod config;
pub mod encode;
pub mod engine;
pub mod error;
pub mod model;
pub mod schema;
pub mod service;
pub mod state;
pub mod store;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::adapters::{InMemoryCatalog, InMemoryRunHistory, MachineCatalog, RunHistory};
    pub use crate::config::{ConfigPatch, OptimizerConfig};
    pub use crate::engine::clock::{Clock, ManualClock, SystemClock};
    pub use crate::engine::rng::BrewRng;
    pub use crate::error::{BrewError, BrewResult};
    pub use crate::schema::{MachineSchema, ParamSpec, ParamValue, ParameterSchema, RunRecord};
    pub use crate::service::{BrewAdvisor, CurveOptions, InitOutcome, PredictionCurve, Suggestion};
    pub use crate::store::{FileStore, MemoryStore, StateStore};
}

/// Re-export for public API
pub use error::{BrewError, BrewResult};
