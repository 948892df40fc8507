//! Gaussian Process regressor.
//!
//! Fits a GP to training pairs and predicts mean/variance at arbitrary
//! test points. The kernel matrix is factorized once per fit (Cholesky,
//! with a single jitter retry when the matrix is not numerically positive
//! definite) and the factor is cached, so each prediction costs two
//! triangular solves.

use crate::error::{BrewError, BrewResult};
use crate::model::kernel::RbfKernel;

/// Diagonal jitter applied on a failed Cholesky before the single retry.
const CHOLESKY_JITTER: f64 = 1e-2;

/// Lower-triangular Cholesky factor of a symmetric matrix.
///
/// Entries are stored row-major in a flat dim*dim buffer; the strict upper
/// half stays zero. Both triangular solves substitute in place over a copy
/// of the right-hand side.
#[derive(Debug, Clone)]
struct CholeskyFactor {
    entries: Vec<f64>,
    dim: usize,
}

impl CholeskyFactor {
    /// Factor a symmetric positive-definite matrix given row-major.
    ///
    /// Proceeds column by column: the diagonal pivot is settled first and
    /// then scales every entry beneath it.
    fn decompose(matrix: &[f64], dim: usize) -> BrewResult<Self> {
        let mut entries = vec![0.0; dim * dim];
        for col in 0..dim {
            let mut pivot = matrix[col * dim + col];
            for k in 0..col {
                pivot -= entries[col * dim + k] * entries[col * dim + k];
            }
            if pivot <= 0.0 {
                return Err(BrewError::numerical(format!(
                    "kernel matrix lost positive definiteness at pivot {col}"
                )));
            }
            let pivot = pivot.sqrt();
            entries[col * dim + col] = pivot;

            for row in (col + 1)..dim {
                let mut below = matrix[row * dim + col];
                for k in 0..col {
                    below -= entries[row * dim + k] * entries[col * dim + k];
                }
                entries[row * dim + col] = below / pivot;
            }
        }
        Ok(Self { entries, dim })
    }

    /// Substitute forward through L, solving L w = rhs.
    fn forward(&self, rhs: &[f64]) -> Vec<f64> {
        let mut w = rhs.to_vec();
        for row in 0..self.dim {
            for k in 0..row {
                w[row] -= self.entries[row * self.dim + k] * w[k];
            }
            w[row] /= self.entries[row * self.dim + row];
        }
        w
    }

    /// Substitute backward through the transpose, solving L^T w = rhs.
    ///
    /// Reads column `row` of L, which is row `row` of the transpose.
    fn backward(&self, rhs: &[f64]) -> Vec<f64> {
        let mut w = rhs.to_vec();
        for row in (0..self.dim).rev() {
            for k in (row + 1)..self.dim {
                w[row] -= self.entries[k * self.dim + row] * w[k];
            }
            w[row] /= self.entries[row * self.dim + row];
        }
        w
    }
}

/// Gaussian Process surrogate over the unit hypercube.
#[derive(Debug, Clone)]
pub struct GaussianProcess {
    /// Covariance kernel.
    kernel: RbfKernel,
    /// Observation-noise variance added to the kernel diagonal.
    noise: f64,
    /// Training inputs.
    x_train: Vec<Vec<f64>>,
    /// Training outputs.
    y_train: Vec<f64>,
    /// Cached Cholesky factor of K + noise*I.
    factor: Option<CholeskyFactor>,
    /// Cached alpha = (K + noise*I)^-1 y.
    alpha: Option<Vec<f64>>,
}

impl GaussianProcess {
    /// Create an unfitted GP.
    #[must_use]
    pub const fn new(kernel: RbfKernel, noise: f64) -> Self {
        Self {
            kernel,
            noise,
            x_train: Vec::new(),
            y_train: Vec::new(),
            factor: None,
            alpha: None,
        }
    }

    /// Fit the GP to training data, replacing any previous fit.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an empty training set, mismatched input/output
    ///   lengths, or ragged input rows.
    /// - `Numerical` if the Cholesky decomposition fails even after the
    ///   jitter retry.
    pub fn fit(&mut self, x: Vec<Vec<f64>>, y: Vec<f64>) -> BrewResult<()> {
        if x.is_empty() {
            return Err(BrewError::invalid_input("empty training set"));
        }
        if x.len() != y.len() {
            return Err(BrewError::invalid_input(format!(
                "training size mismatch: {} inputs vs {} outputs",
                x.len(),
                y.len()
            )));
        }
        let dim = x[0].len();
        if x.iter().any(|row| row.len() != dim) {
            return Err(BrewError::invalid_input(
                "training inputs must share one dimension",
            ));
        }

        let n = x.len();
        let mut k_matrix = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                k_matrix[i * n + j] = self.kernel.eval(&x[i], &x[j])?;
            }
            k_matrix[i * n + i] += self.noise;
        }

        // Cholesky with one jitter retry on a non-PD residual
        let factor = match CholeskyFactor::decompose(&k_matrix, n) {
            Ok(factor) => factor,
            Err(_) => {
                for i in 0..n {
                    k_matrix[i * n + i] += CHOLESKY_JITTER;
                }
                CholeskyFactor::decompose(&k_matrix, n)?
            }
        };

        // alpha = K^-1 y via the two triangular solves
        let alpha = factor.backward(&factor.forward(&y));

        self.x_train = x;
        self.y_train = y;
        self.factor = Some(factor);
        self.alpha = Some(alpha);

        Ok(())
    }

    /// Predict mean and variance at each test point.
    ///
    /// Variances are clamped to be non-negative.
    ///
    /// # Errors
    ///
    /// - `State` if called before `fit`.
    /// - `DimensionMismatch` if a test point differs from the training
    ///   dimension.
    pub fn predict(&self, xs: &[Vec<f64>]) -> BrewResult<(Vec<f64>, Vec<f64>)> {
        let mut means = Vec::with_capacity(xs.len());
        let mut variances = Vec::with_capacity(xs.len());
        for x in xs {
            let (mu, var) = self.predict_one(x)?;
            means.push(mu);
            variances.push(var);
        }
        Ok((means, variances))
    }

    /// Predict mean and variance at a single point.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::predict`].
    pub fn predict_one(&self, x: &[f64]) -> BrewResult<(f64, f64)> {
        let (Some(factor), Some(alpha)) = (&self.factor, &self.alpha) else {
            return Err(BrewError::state("predict called before fit"));
        };

        // k* = kernel between x and training points
        let mut k_star = Vec::with_capacity(self.x_train.len());
        for xi in &self.x_train {
            k_star.push(self.kernel.eval(xi, x)?);
        }

        // Mean: mu = k*^T alpha
        let mu: f64 = k_star.iter().zip(alpha.iter()).map(|(k, a)| k * a).sum();

        // Variance: sigma^2 = k(x, x) - ||L^-1 k*||^2
        let k_xx = self.kernel.eval(x, x)?;
        let v = factor.forward(&k_star);
        let variance = k_xx - v.iter().map(|vi| vi * vi).sum::<f64>();

        Ok((mu, variance.max(0.0)))
    }

    /// Number of training points in the current fit.
    #[must_use]
    pub fn n_observations(&self) -> usize {
        self.x_train.len()
    }

    /// True once `fit` has succeeded.
    #[must_use]
    pub const fn is_fitted(&self) -> bool {
        self.factor.is_some()
    }
}
