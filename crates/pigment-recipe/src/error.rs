//! Error types for recipe optimization and search.

use pigment_mixing::MixingError;
use thiserror::Error;

/// Failure to optimize one pigment subset.
///
/// The search logs these and leaves the subset out of the ranking.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecipeError {
    /// The forward model rejected a mixture.
    #[error("mixing failed: {0}")]
    Mixing(#[from] MixingError),

    /// No pigments to optimize.
    #[error("pigment subset is empty")]
    EmptySubset,

    /// Weight bounds are not a valid interval.
    #[error("invalid weight bounds [{lower}, {upper}]")]
    InvalidBounds {
        /// Lower bound.
        lower: f64,
        /// Upper bound.
        upper: f64,
    },

    /// The objective evaluated to NaN or infinity.
    #[error("objective is not finite at weights {0:?}")]
    NonFiniteObjective(Vec<f64>),

    /// The optimizer hit its iteration limit.
    #[error("optimizer did not converge in {iterations} iterations (error {error:.3e})")]
    NotConverged {
        /// Iterations performed.
        iterations: usize,
        /// Objective value when stopping.
        error: f64,
    },
}

/// Result type for single-subset optimization.
pub type RecipeResult<T> = Result<T, RecipeError>;

/// Failure of a whole subset sweep.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SearchError {
    /// The search was cancelled through its token.
    #[error("search cancelled")]
    Cancelled,

    /// The candidate pool is empty.
    #[error("no candidate pigments")]
    EmptyPool,

    /// A candidate is not in the model.
    #[error("unknown candidate pigment '{0}'")]
    UnknownPigment(String),

    /// Search limits are unusable.
    #[error("invalid search config: {0}")]
    InvalidConfig(String),
}
