//! Error types for the adapter.

use thiserror::Error;

/// Errors that can occur while preparing, running, or normalizing a solve.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The caller's evaluation function failed.
    #[error("evaluation function failed: {0:#}")]
    Evaluation(anyhow::Error),

    /// The evaluation function switched result form mid-solve.
    #[error(
        "evaluation function returned a {found}-element result but a {expected}-element \
         result was detected on the first call"
    )]
    ArityChanged { expected: usize, found: usize },

    /// A returned vector or derivative block does not match the detected sizes.
    #[error("`{group}` has size {found}, expected {expected}")]
    ShapeChanged {
        group: &'static str,
        expected: usize,
        found: usize,
    },

    /// Inputs are inconsistent with the design vector length.
    #[error("{what}: expected {expected} entries, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// The gradient entry point was called while no gradients are supplied.
    #[error("gradient requested but the evaluation function does not supply gradients")]
    GradientsUnavailable,

    /// The solver returned a solution the quirk table does not allow.
    #[error("malformed solution from backend {backend}: {message}")]
    MalformedSolution { backend: String, message: String },

    /// The population file could not be parsed.
    #[error("population file line {line}: {reason}")]
    PopulationParse { line: usize, reason: String },

    /// Configuration could not be parsed or written.
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The solver capability failed for reasons of its own.
    #[error("solver failed: {0:#}")]
    Solver(anyhow::Error),
}

impl From<toml::de::Error> for AdapterError {
    fn from(e: toml::de::Error) -> Self {
        AdapterError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for AdapterError {
    fn from(e: toml::ser::Error) -> Self {
        AdapterError::Config(e.to_string())
    }
}

impl AdapterError {
    /// Recover an adapter error that travelled through a solver as `anyhow::Error`.
    ///
    /// Callback failures are raised as [`AdapterError`] and usually come back
    /// wrapped by the solver; anything else is reported as [`AdapterError::Solver`].
    pub fn from_solver(err: anyhow::Error) -> Self {
        match err.downcast::<AdapterError>() {
            Ok(adapter) => adapter,
            Err(other) => AdapterError::Solver(other),
        }
    }
}

/// Result type alias for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;
