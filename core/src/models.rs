//! Transition and observation models, and initial state strategies
//!
//! The filter propagates every sigma point through a [`ProcessModel`] and maps the
//! propagated points into measurement space through an [`ObservationModel`]. Both default to
//! [`IdentityModel`], which leaves the state unchanged between steps and observes the
//! leading state components directly.
use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};

/// State transition applied to each sigma point during the predict step.
pub trait ProcessModel {
    /// Propagate a single state vector. The output must keep the state dimension.
    fn propagate(&self, state: &DVector<f64>) -> DVector<f64>;
}

/// Measurement function applied to each propagated sigma point during the update step.
pub trait ObservationModel {
    /// Map a state vector to its expected `dimension`-length measurement.
    fn observe(&self, state: &DVector<f64>, dimension: usize) -> DVector<f64>;
    /// Whether this model can map a `state`-dimensional state to a `measurement`-dimensional
    /// measurement. Checked once, when the filter initializes.
    fn supports(&self, _state: usize, _measurement: usize) -> bool {
        true
    }
}

/// Identity transition and direct observation of the leading state components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdentityModel;

impl ProcessModel for IdentityModel {
    fn propagate(&self, state: &DVector<f64>) -> DVector<f64> {
        state.clone()
    }
}

impl ObservationModel for IdentityModel {
    fn observe(&self, state: &DVector<f64>, dimension: usize) -> DVector<f64> {
        state.rows(0, dimension).clone_owned()
    }
    fn supports(&self, state: usize, measurement: usize) -> bool {
        measurement <= state
    }
}

/// Closure-backed process model.
///
/// ```
/// use nalgebra::DVector;
/// use ukf::models::{FnProcess, ProcessModel};
///
/// let drift = FnProcess(|x: &DVector<f64>| x.add_scalar(1.0));
/// assert_eq!(drift.propagate(&DVector::from_vec(vec![1.0]))[0], 2.0);
/// ```
#[derive(Clone, Copy)]
pub struct FnProcess<F>(pub F);

impl<F> ProcessModel for FnProcess<F>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    fn propagate(&self, state: &DVector<f64>) -> DVector<f64> {
        (self.0)(state)
    }
}

/// Closure-backed observation model. The closure receives the state and the measurement
/// dimension fixed at initialization.
#[derive(Clone, Copy)]
pub struct FnObservation<H>(pub H);

impl<H> ObservationModel for FnObservation<H>
where
    H: Fn(&DVector<f64>, usize) -> DVector<f64>,
{
    fn observe(&self, state: &DVector<f64>, dimension: usize) -> DVector<f64> {
        (self.0)(state, dimension)
    }
}

/// How the state estimate is seeded when the filter initializes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialStateStrategy {
    /// Every component drawn uniformly from `[0, q)`. Unseeded draws use OS entropy.
    Uniform {
        #[serde(default)]
        seed: Option<u64>,
    },
    /// A fixed initial vector; its length must equal the state dimension.
    Fixed(Vec<f64>),
}

impl Default for InitialStateStrategy {
    fn default() -> Self {
        InitialStateStrategy::Uniform { seed: None }
    }
}

impl InitialStateStrategy {
    /// Produce the initial state for a `dimension`-length state and process-noise
    /// standard deviation `q`.
    pub fn initial_state(&self, dimension: usize, q: f64) -> FilterResult<DVector<f64>> {
        match self {
            InitialStateStrategy::Uniform { seed } => {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(*seed),
                    None => StdRng::from_os_rng(),
                };
                Ok(DVector::from_fn(dimension, |_, _| rng.random::<f64>() * q))
            }
            InitialStateStrategy::Fixed(values) => {
                if values.len() != dimension {
                    return Err(FilterError::InvalidEstimate(format!(
                        "fixed initial state has {} values, state dimension is {}",
                        values.len(),
                        dimension
                    )));
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(FilterError::InvalidEstimate(
                        "fixed initial state contains a non-finite value".to_string(),
                    ));
                }
                Ok(DVector::from_column_slice(values))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_process_is_a_copy() {
        let x = DVector::from_vec(vec![1.0, -2.0, 3.5]);
        assert_eq!(IdentityModel.propagate(&x), x);
    }

    #[test]
    fn identity_observes_leading_components() {
        let x = DVector::from_vec(vec![1.0, -2.0, 3.5]);
        let z = IdentityModel.observe(&x, 2);
        assert_eq!(z, DVector::from_vec(vec![1.0, -2.0]));
        assert!(IdentityModel.supports(3, 3));
        assert!(IdentityModel.supports(3, 1));
        assert!(!IdentityModel.supports(1, 2));
    }

    #[test]
    fn closure_observation() {
        let h = FnObservation(|x: &DVector<f64>, m: usize| DVector::from_element(m, x.sum()));
        let z = h.observe(&DVector::from_vec(vec![1.0, 2.0]), 3);
        assert_eq!(z, DVector::from_element(3, 3.0));
        assert!(h.supports(1, 5));
    }

    #[test]
    fn uniform_initial_state_is_bounded() {
        let q = 0.05;
        let x = InitialStateStrategy::default()
            .initial_state(100, q)
            .unwrap();
        assert_eq!(x.len(), 100);
        assert!(x.iter().all(|v| (0.0..q).contains(v)));
    }

    #[test]
    fn seeded_initial_state_is_reproducible() {
        let strategy = InitialStateStrategy::Uniform { seed: Some(42) };
        let a = strategy.initial_state(4, 0.05).unwrap();
        let b = strategy.initial_state(4, 0.05).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fixed_initial_state() {
        let strategy = InitialStateStrategy::Fixed(vec![0.5, 1.5]);
        assert_eq!(
            strategy.initial_state(2, 0.05).unwrap(),
            DVector::from_vec(vec![0.5, 1.5])
        );
        assert!(matches!(
            strategy.initial_state(3, 0.05),
            Err(FilterError::InvalidEstimate(_))
        ));
        assert!(
            InitialStateStrategy::Fixed(vec![f64::NAN])
                .initial_state(1, 0.05)
                .is_err()
        );
    }
}
