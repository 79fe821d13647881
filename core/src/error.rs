//! Error types for the unscented Kalman filter.
//!
//! Configuration and dimension errors are raised before the filter mutates any state.
//! Numerical errors abort the update that raised them and leave the previous estimate
//! in place.
use thiserror::Error;

/// Errors raised while constructing or updating a filter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("invalid filter parameters: {0}")]
    InvalidParameters(String),

    #[error("measurement is empty; the measurement dimension cannot be inferred")]
    EmptyMeasurement,

    #[error("measurement dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("measurement value at index {index} is not finite")]
    NonFiniteMeasurement { index: usize },

    #[error("observation model cannot map a {state}-dimensional state to a {measurement}-dimensional measurement")]
    UnsupportedObservation { state: usize, measurement: usize },

    #[error("{model} model returned {found} values, expected {expected}")]
    ModelOutput {
        model: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid estimate: {0}")]
    InvalidEstimate(String),

    #[error("filter has not been initialized by a measurement yet")]
    NotInitialized,

    #[error("state covariance is not positive definite")]
    NotPositiveDefinite,

    #[error("innovation covariance is singular")]
    SingularInnovation,

    #[error("update produced a non-finite state or covariance")]
    NonFiniteEstimate,
}

impl FilterError {
    /// True for failures of the numerical recursion itself (as opposed to bad input).
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            FilterError::NotPositiveDefinite
                | FilterError::SingularInnovation
                | FilterError::NonFiniteEstimate
        )
    }
}

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;
