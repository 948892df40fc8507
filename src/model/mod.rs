//! Gaussian-Process surrogate model.
//!
//! The pieces, leaves first:
//! - RBF kernel over vectors in the unit hypercube
//! - GP regressor with a cached Cholesky factorization
//! - UCB acquisition scoring over a random candidate set

pub mod acquisition;
pub mod gp;
pub mod kernel;

pub use acquisition::{sample_candidates, select_best, ucb};
pub use gp::GaussianProcess;
pub use kernel::RbfKernel;
