//! Isotropic squared-exponential (RBF) kernel.
//!
//! k(x, y) = sigma^2 * exp(-0.5 * ||x - y||^2 / l^2)
//!
//! The only kernel the advisor uses; hyperparameters are fixed from
//! configuration at state creation, never learned.

use serde::{Deserialize, Serialize};

use crate::error::{BrewError, BrewResult};

/// Squared-exponential kernel with scalar hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RbfKernel {
    /// Length scale (l).
    pub length_scale: f64,
    /// Output scale (signal variance, sigma^2).
    pub output_scale: f64,
}

impl RbfKernel {
    /// Create a kernel with the given hyperparameters.
    #[must_use]
    pub const fn new(length_scale: f64, output_scale: f64) -> Self {
        Self {
            length_scale,
            output_scale,
        }
    }

    /// Evaluate the kernel at a pair of points.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the vectors differ in length.
    pub fn eval(&self, x: &[f64], y: &[f64]) -> BrewResult<f64> {
        if x.len() != y.len() {
            return Err(BrewError::DimensionMismatch {
                expected: x.len(),
                actual: y.len(),
            });
        }

        let sq_dist: f64 = x.iter().zip(y.iter()).map(|(a, b)| (a - b).powi(2)).sum();

        Ok(self.output_scale * (-0.5 * sq_dist / self.length_scale.powi(2)).exp())
    }
}

impl Default for RbfKernel {
    fn default() -> Self {
        Self::new(0.3, 1.0)
    }
}
