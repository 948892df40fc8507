//! Error types for brewopt.
//!
//! All fallible operations return `Result<T, BrewError>` instead of
//! panicking. The variants map the advisor's failure taxonomy: invalid
//! input, numerical breakdown, state misuse, and storage faults.

use thiserror::Error;

/// Result type alias for brewopt operations.
pub type BrewResult<T> = Result<T, BrewError>;

/// Unified error type for all brewopt operations.
#[derive(Debug, Error)]
pub enum BrewError {
    // ===== Invalid input =====
    /// Caller-supplied data violated an operation precondition.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of the violated precondition.
        message: String,
    },

    /// Two vectors of unequal dimension were passed to the kernel.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension of the first operand.
        expected: usize,
        /// Dimension of the second operand.
        actual: usize,
    },

    // ===== Numerical =====
    /// Dense linear algebra broke down (Cholesky failed even after jitter).
    #[error("Numerical error: {0}")]
    Numerical(String),

    // ===== State =====
    /// An operation was called against missing or unfitted state.
    #[error("State error: {0}")]
    State(String),

    // ===== Storage =====
    /// The durable-store adapter failed.
    #[error("Storage error: {0}")]
    Storage(String),

    // ===== Configuration =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== I/O =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BrewError {
    /// Create an invalid-input error with a message.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a numerical error.
    #[must_use]
    pub fn numerical(message: impl Into<String>) -> Self {
        Self::Numerical(message.into())
    }

    /// Create a state error.
    #[must_use]
    pub fn state(message: impl Into<String>) -> Self {
        Self::State(message.into())
    }

    /// Create a storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Check if this error came from the durable store.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Io(_))
    }
}
