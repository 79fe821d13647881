//! Unscented Kalman filter engine
//!
//! The filter is dimensioned lazily: the measurement dimension `m` is always taken from the
//! first non-empty measurement, and a state dimension of zero is inferred as `L = m`. All
//! derived quantities (weights, noise covariances, initial estimate) are created exactly
//! once, on that first measurement.
//!
//! Each call to [`UnscentedKalmanFilter::update`] runs one predict/correct cycle:
//!
//! $$
//! \begin{aligned}
//! \mathcal{X} &= \text{sigma}(x, P) \\\\
//! (x^-, \mathcal{X}^-, P^-, \tilde{\mathcal{X}}) &= UT_f(\mathcal{X}, Q) \\\\
//! (\hat{z}, \mathcal{Z}, S, \tilde{\mathcal{Z}}) &= UT_h(\mathcal{X}^-, R) \\\\
//! P_{xz} &= \tilde{\mathcal{X}} \, \text{diag}(W^c) \, \tilde{\mathcal{Z}}^T \\\\
//! K &= P_{xz} S^{-1} \\\\
//! x^+ &= x^- + K (z - \hat{z}) \\\\
//! P^+ &= P^- - K P_{xz}^T
//! \end{aligned}
//! $$
//!
//! The new estimate is computed in full before it replaces the old one; a failed update
//! leaves the previous `x` and `P` untouched.
use std::fmt::{self, Debug, Display};

use log::{debug, trace, warn};
use nalgebra::{DMatrix, DVector};

use crate::error::{FilterError, FilterResult};
use crate::linalg::{constant, diagonal, invert, is_finite, symmetrize, weighted_product};
use crate::models::{IdentityModel, InitialStateStrategy, ObservationModel, ProcessModel};
use crate::params::FilterParameters;
use crate::sigma::{SigmaWeights, sigma_points};
use crate::transform::unscented_transform;

/// Everything the filter derives on its first measurement.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterState {
    /// Number of hidden state variables, `L`
    pub state_dimension: usize,
    /// Number of measured variables per update, `m`
    pub measurement_dimension: usize,
    pub weights: SigmaWeights,
    /// State estimate `x` (L)
    pub state: DVector<f64>,
    /// State covariance `P` (L × L)
    pub covariance: DMatrix<f64>,
    /// Process noise `Q = diag(q²)` (L × L)
    pub process_noise: DMatrix<f64>,
    /// Measurement noise `R`, every entry `r²` (m × m)
    pub measurement_noise: DMatrix<f64>,
}

#[derive(Clone, Debug, PartialEq)]
enum Lifecycle {
    Uninitialized,
    Initialized(FilterState),
}

/// Unscented Kalman filter over a process model `F` and an observation model `H`.
///
/// Both models default to [`IdentityModel`]: the state carries over unchanged between
/// steps apart from the additive process noise, and the measurement observes the leading
/// `m` state components.
///
/// # Example
///
/// ```
/// use ukf::kalman::UnscentedKalmanFilter;
/// use ukf::params::FilterParameters;
///
/// let mut ukf = UnscentedKalmanFilter::new(0, FilterParameters::default()).unwrap();
/// for z in [0.1, 0.2, 0.15, 0.3] {
///     ukf.update(&[z]).unwrap();
/// }
/// let x = ukf.get_state().unwrap();
/// assert_eq!(x.len(), 1);
/// assert_eq!(ukf.get_covariance().unwrap().shape(), (1, 1));
/// ```
#[derive(Clone)]
pub struct UnscentedKalmanFilter<F = IdentityModel, H = IdentityModel> {
    parameters: FilterParameters,
    declared_dimension: usize,
    initial_state: InitialStateStrategy,
    process: F,
    observation: H,
    lifecycle: Lifecycle,
}

impl<F, H> Debug for UnscentedKalmanFilter<F, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UKF")
            .field("parameters", &self.parameters)
            .field("declared_dimension", &self.declared_dimension)
            .field("initial_state", &self.initial_state)
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}

impl<F, H> Display for UnscentedKalmanFilter<F, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lifecycle {
            Lifecycle::Uninitialized => write!(
                f,
                "UnscentedKalmanFilter(uninitialized, L = {})",
                self.declared_dimension
            ),
            Lifecycle::Initialized(state) => write!(
                f,
                "UnscentedKalmanFilter(L = {}, m = {}, x = {:?})",
                state.state_dimension,
                state.measurement_dimension,
                state.state.as_slice()
            ),
        }
    }
}

impl UnscentedKalmanFilter {
    /// Filter with identity dynamics and observation.
    ///
    /// `state_dimension = 0` infers the state dimension from the first measurement.
    ///
    /// # Errors
    /// [`FilterError::InvalidParameters`] for non-finite parameters, a zero `alpha`, or (when
    /// the state dimension is given) a degenerate sigma-point scale.
    pub fn new(state_dimension: usize, parameters: FilterParameters) -> FilterResult<Self> {
        Self::with_models(state_dimension, parameters, IdentityModel, IdentityModel)
    }
}

impl<F: ProcessModel, H: ObservationModel> UnscentedKalmanFilter<F, H> {
    /// Filter with caller-supplied transition and observation models.
    pub fn with_models(
        state_dimension: usize,
        parameters: FilterParameters,
        process: F,
        observation: H,
    ) -> FilterResult<Self> {
        parameters.validate()?;
        if state_dimension > 0 {
            SigmaWeights::new(state_dimension, &parameters)?;
        }
        Ok(UnscentedKalmanFilter {
            parameters,
            declared_dimension: state_dimension,
            initial_state: InitialStateStrategy::default(),
            process,
            observation,
            lifecycle: Lifecycle::Uninitialized,
        })
    }
    /// Replace the strategy used to seed the state estimate on initialization.
    pub fn with_initial_state(mut self, strategy: InitialStateStrategy) -> Self {
        self.initial_state = strategy;
        self
    }
    /// Fuse one measurement into the estimate.
    ///
    /// The first non-empty measurement fixes the measurement dimension and initializes the
    /// filter. Every later measurement must have the same length.
    ///
    /// # Errors
    /// * [`FilterError::EmptyMeasurement`] - empty measurement before initialization
    /// * [`FilterError::DimensionMismatch`] - length differs from the fixed dimension
    /// * [`FilterError::NonFiniteMeasurement`] - NaN or infinite component
    /// * [`FilterError::InvalidParameters`], [`FilterError::UnsupportedObservation`] -
    ///   initialization rejected; the filter stays uninitialized
    /// * [`FilterError::NotPositiveDefinite`], [`FilterError::SingularInnovation`],
    ///   [`FilterError::NonFiniteEstimate`], [`FilterError::ModelOutput`] - the update is
    ///   abandoned and the previous estimate kept
    pub fn update(&mut self, measurement: &[f64]) -> FilterResult<()> {
        if let Some(index) = measurement.iter().position(|v| !v.is_finite()) {
            return Err(FilterError::NonFiniteMeasurement { index });
        }
        if let Lifecycle::Uninitialized = self.lifecycle {
            if measurement.is_empty() {
                return Err(FilterError::EmptyMeasurement);
            }
            let state = self.initialize(measurement.len())?;
            self.lifecycle = Lifecycle::Initialized(state);
        }
        let Lifecycle::Initialized(state) = &self.lifecycle else {
            return Err(FilterError::NotInitialized);
        };
        if measurement.len() != state.measurement_dimension {
            return Err(FilterError::DimensionMismatch {
                expected: state.measurement_dimension,
                found: measurement.len(),
            });
        }
        let z = DVector::from_column_slice(measurement);
        let (x_new, p_new) = match self.correct(state, &z) {
            Ok(estimate) => estimate,
            Err(e) => {
                warn!("UKF update rejected: {e}");
                return Err(e);
            }
        };
        trace!("UKF update: z = {:?}, x = {:?}", measurement, x_new.as_slice());
        if let Lifecycle::Initialized(state) = &mut self.lifecycle {
            state.state = x_new;
            state.covariance = p_new;
        }
        Ok(())
    }
    fn initialize(&self, measurement_dimension: usize) -> FilterResult<FilterState> {
        let state_dimension = if self.declared_dimension == 0 {
            measurement_dimension
        } else {
            self.declared_dimension
        };
        if !self
            .observation
            .supports(state_dimension, measurement_dimension)
        {
            return Err(FilterError::UnsupportedObservation {
                state: state_dimension,
                measurement: measurement_dimension,
            });
        }
        let weights = SigmaWeights::new(state_dimension, &self.parameters)?;
        let state = self
            .initial_state
            .initial_state(state_dimension, self.parameters.q)?;
        debug!(
            "Initialized UKF: L = {}, m = {}, lambda = {}, scale = {}",
            state_dimension, measurement_dimension, weights.lambda, weights.scale
        );
        Ok(FilterState {
            state_dimension,
            measurement_dimension,
            weights,
            state,
            covariance: diagonal(state_dimension, 1.0),
            process_noise: diagonal(state_dimension, self.parameters.process_variance()),
            measurement_noise: constant(
                measurement_dimension,
                measurement_dimension,
                self.parameters.measurement_variance(),
            ),
        })
    }
    /// One predict/correct cycle on `state`; returns the new `(x, P)` without committing it.
    fn correct(
        &self,
        state: &FilterState,
        z: &DVector<f64>,
    ) -> FilterResult<(DVector<f64>, DMatrix<f64>)> {
        let l = state.state_dimension;
        let m = state.measurement_dimension;
        let weights = &state.weights;

        let sigma = sigma_points(&state.state, &state.covariance, weights.scale)?;
        let predicted = unscented_transform(
            &sigma,
            weights,
            l,
            &state.process_noise,
            "process",
            |p| self.process.propagate(p),
        )?;
        let expected = unscented_transform(
            &predicted.points,
            weights,
            m,
            &state.measurement_noise,
            "observation",
            |p| self.observation.observe(p, m),
        )?;
        let cross_covariance =
            weighted_product(&predicted.deviations, &weights.covariance, &expected.deviations);
        let gain = &cross_covariance * invert(&expected.covariance)?;

        let x_new = &predicted.mean + &gain * (z - &expected.mean);
        let p_new = symmetrize(&(&predicted.covariance - &gain * cross_covariance.transpose()));
        if !x_new.iter().all(|v| v.is_finite()) || !is_finite(&p_new) {
            return Err(FilterError::NonFiniteEstimate);
        }
        Ok((x_new, p_new))
    }
}

impl<F, H> UnscentedKalmanFilter<F, H> {
    fn filter_state(&self) -> Option<&FilterState> {
        match &self.lifecycle {
            Lifecycle::Initialized(state) => Some(state),
            Lifecycle::Uninitialized => None,
        }
    }
    /// Current state estimate `x`, `None` before the first measurement
    pub fn get_state(&self) -> Option<DVector<f64>> {
        self.filter_state().map(|s| s.state.clone())
    }
    /// Current state covariance `P`, `None` before the first measurement
    pub fn get_covariance(&self) -> Option<DMatrix<f64>> {
        self.filter_state().map(|s| s.covariance.clone())
    }
    pub fn is_initialized(&self) -> bool {
        self.filter_state().is_some()
    }
    /// The state dimension in effect: the inferred `L` once initialized, otherwise the
    /// declared one (zero when it is left to inference).
    pub fn state_dimension(&self) -> usize {
        self.filter_state()
            .map_or(self.declared_dimension, |s| s.state_dimension)
    }
    pub fn measurement_dimension(&self) -> Option<usize> {
        self.filter_state().map(|s| s.measurement_dimension)
    }
    pub fn weights(&self) -> Option<&SigmaWeights> {
        self.filter_state().map(|s| &s.weights)
    }
    pub fn process_noise(&self) -> Option<&DMatrix<f64>> {
        self.filter_state().map(|s| &s.process_noise)
    }
    pub fn measurement_noise(&self) -> Option<&DMatrix<f64>> {
        self.filter_state().map(|s| &s.measurement_noise)
    }
    pub fn parameters(&self) -> &FilterParameters {
        &self.parameters
    }
    /// Drop every derived quantity and return to the uninitialized state. The next
    /// measurement initializes the filter again with the originally declared dimension.
    pub fn reset(&mut self) {
        debug!("UKF reset");
        self.lifecycle = Lifecycle::Uninitialized;
    }
    /// Overwrite the estimate of an initialized filter.
    ///
    /// Only shapes and finiteness are checked; a covariance that is not positive definite
    /// is reported by the next [`update`](Self::update).
    pub fn restore(&mut self, state: DVector<f64>, covariance: DMatrix<f64>) -> FilterResult<()> {
        let Lifecycle::Initialized(current) = &mut self.lifecycle else {
            return Err(FilterError::NotInitialized);
        };
        let l = current.state_dimension;
        if state.len() != l || covariance.shape() != (l, l) {
            return Err(FilterError::InvalidEstimate(format!(
                "expected a {l}-state and a {l}x{l} covariance, got {} and {}x{}",
                state.len(),
                covariance.nrows(),
                covariance.ncols()
            )));
        }
        if !state.iter().all(|v| v.is_finite()) || !is_finite(&covariance) {
            return Err(FilterError::InvalidEstimate(
                "estimate contains non-finite values".to_string(),
            ));
        }
        current.state = state;
        current.covariance = covariance;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::is_symmetric;
    use crate::models::{FnObservation, FnProcess};
    use assert_approx_eq::assert_approx_eq;

    fn seeded(state_dimension: usize) -> UnscentedKalmanFilter {
        UnscentedKalmanFilter::new(state_dimension, FilterParameters::default())
            .unwrap()
            .with_initial_state(InitialStateStrategy::Uniform { seed: Some(1) })
    }

    #[test]
    fn construction_is_lazy() {
        let ukf = UnscentedKalmanFilter::new(0, FilterParameters::default()).unwrap();
        assert!(!ukf.is_initialized());
        assert_eq!(ukf.state_dimension(), 0);
        assert_eq!(ukf.measurement_dimension(), None);
        assert!(ukf.get_state().is_none());
        assert!(ukf.get_covariance().is_none());
        assert!(ukf.weights().is_none());
    }

    #[test]
    fn construction_rejects_bad_parameters() {
        let zero_alpha = FilterParameters::default().with_alpha(0.0);
        assert!(matches!(
            UnscentedKalmanFilter::new(0, zero_alpha),
            Err(FilterError::InvalidParameters(_))
        ));
        let nan_q = FilterParameters::default().with_q(f64::NAN);
        assert!(UnscentedKalmanFilter::new(2, nan_q).is_err());
        // alpha² (L + ki) = 0 with L known up front
        let degenerate = FilterParameters::default().with_ki(-2.0);
        assert!(matches!(
            UnscentedKalmanFilter::new(2, degenerate),
            Err(FilterError::InvalidParameters(_))
        ));
    }

    #[test]
    fn degenerate_scale_with_inferred_dimension_leaves_filter_uninitialized() {
        let degenerate = FilterParameters::default().with_ki(-1.0);
        let mut ukf = UnscentedKalmanFilter::new(0, degenerate).unwrap();
        assert!(matches!(
            ukf.update(&[1.0]),
            Err(FilterError::InvalidParameters(_))
        ));
        assert!(!ukf.is_initialized());
    }

    #[test]
    fn first_measurement_infers_dimensions() {
        let mut ukf = seeded(0);
        ukf.update(&[0.5, 1.0]).unwrap();
        assert!(ukf.is_initialized());
        assert_eq!(ukf.state_dimension(), 2);
        assert_eq!(ukf.measurement_dimension(), Some(2));
        assert_eq!(ukf.get_state().unwrap().len(), 2);
        assert_eq!(ukf.get_covariance().unwrap().shape(), (2, 2));
        assert_eq!(ukf.weights().unwrap().len(), 5);
    }

    #[test]
    fn declared_dimension_is_kept() {
        let mut ukf = seeded(3);
        ukf.update(&[0.5]).unwrap();
        assert_eq!(ukf.state_dimension(), 3);
        assert_eq!(ukf.measurement_dimension(), Some(1));
        assert_eq!(ukf.get_state().unwrap().len(), 3);
        assert_eq!(ukf.process_noise().unwrap().shape(), (3, 3));
        assert_eq!(ukf.measurement_noise().unwrap().shape(), (1, 1));
    }

    #[test]
    fn noise_matrices() {
        let mut ukf = seeded(0);
        ukf.update(&[0.1, 0.2]).unwrap();
        let q = ukf.process_noise().unwrap();
        assert_approx_eq!(q[(0, 0)], 0.0025, 1e-15);
        assert_eq!(q[(0, 1)], 0.0);
        let r = ukf.measurement_noise().unwrap();
        assert!(r.iter().all(|v| (v - 0.09).abs() < 1e-15));
    }

    #[test]
    fn identity_observation_cannot_exceed_state() {
        let mut ukf = seeded(1);
        assert_eq!(
            ukf.update(&[1.0, 2.0]),
            Err(FilterError::UnsupportedObservation {
                state: 1,
                measurement: 2
            })
        );
        assert!(!ukf.is_initialized());
    }

    #[test]
    fn empty_first_measurement_is_rejected() {
        let mut ukf = seeded(0);
        assert_eq!(ukf.update(&[]), Err(FilterError::EmptyMeasurement));
        assert!(!ukf.is_initialized());
    }

    #[test]
    fn non_finite_measurement_is_rejected() {
        let mut ukf = seeded(0);
        assert_eq!(
            ukf.update(&[1.0, f64::NAN]),
            Err(FilterError::NonFiniteMeasurement { index: 1 })
        );
        assert!(!ukf.is_initialized());
    }

    #[test]
    fn dimension_mismatch_leaves_estimate_untouched() {
        let mut ukf = seeded(0);
        ukf.update(&[0.3]).unwrap();
        let x = ukf.get_state().unwrap();
        let p = ukf.get_covariance().unwrap();
        assert_eq!(
            ukf.update(&[0.3, 0.4]),
            Err(FilterError::DimensionMismatch {
                expected: 1,
                found: 2
            })
        );
        assert_eq!(ukf.update(&[]), Err(FilterError::DimensionMismatch { expected: 1, found: 0 }));
        assert_eq!(ukf.get_state().unwrap(), x);
        assert_eq!(ukf.get_covariance().unwrap(), p);
        assert_eq!(ukf.state_dimension(), 1);
    }

    #[test]
    fn scalar_update_matches_closed_form() {
        // Identity maps reduce the recursion to
        //   K = P / (P + R),  x⁺ = x + K (z - x),  P⁺ = P + Q - P² / (P + R)
        let params = FilterParameters::default();
        let (q2, r2) = (params.process_variance(), params.measurement_variance());
        let mut ukf = UnscentedKalmanFilter::new(0, params)
            .unwrap()
            .with_initial_state(InitialStateStrategy::Fixed(vec![0.02]));
        let mut x = 0.02;
        let mut p = 1.0;
        for z in [1.0, 0.8, 1.3, 0.9, 1.1] {
            ukf.update(&[z]).unwrap();
            let k = p / (p + r2);
            x += k * (z - x);
            p = p + q2 - p * p / (p + r2);
            assert_approx_eq!(ukf.get_state().unwrap()[0], x, 1e-8);
            assert_approx_eq!(ukf.get_covariance().unwrap()[(0, 0)], p, 1e-8);
        }
    }

    #[test]
    fn vector_update_uses_constant_measurement_noise() {
        let params = FilterParameters::default();
        let mut ukf = UnscentedKalmanFilter::new(0, params)
            .unwrap()
            .with_initial_state(InitialStateStrategy::Fixed(vec![0.0, 0.0]));
        ukf.update(&[1.0, -1.0]).unwrap();

        let p = DMatrix::<f64>::identity(2, 2);
        let r = DMatrix::from_element(2, 2, params.measurement_variance());
        let q = DMatrix::from_diagonal_element(2, 2, params.process_variance());
        let s_inv = (&p + &r).try_inverse().unwrap();
        let k = &p * &s_inv;
        let x_expected = &k * DVector::from_vec(vec![1.0, -1.0]);
        let p_expected = &p + &q - &k * &p;

        let x = ukf.get_state().unwrap();
        let cov = ukf.get_covariance().unwrap();
        for i in 0..2 {
            assert_approx_eq!(x[i], x_expected[i], 1e-8);
            for j in 0..2 {
                assert_approx_eq!(cov[(i, j)], p_expected[(i, j)], 1e-8);
            }
        }
        assert!(is_symmetric(&cov, 0.0));
    }

    #[test]
    fn partial_observation_updates_unobserved_state_only_through_noise() {
        let mut ukf = UnscentedKalmanFilter::new(2, FilterParameters::default())
            .unwrap()
            .with_initial_state(InitialStateStrategy::Fixed(vec![0.0, 5.0]));
        ukf.update(&[1.0]).unwrap();
        let x = ukf.get_state().unwrap();
        assert!(x[0] > 0.5);
        // P starts diagonal, so the unobserved component is uncorrelated and unchanged
        assert_approx_eq!(x[1], 5.0, 1e-8);
        let p = ukf.get_covariance().unwrap();
        assert_approx_eq!(p[(1, 1)], 1.0 + 0.0025, 1e-8);
    }

    #[test]
    fn weights_are_fixed_after_initialization() {
        let mut ukf = seeded(0);
        ukf.update(&[0.1]).unwrap();
        let weights = ukf.weights().unwrap().clone();
        let q = ukf.process_noise().unwrap().clone();
        let r = ukf.measurement_noise().unwrap().clone();
        for z in [0.2, 0.4, -0.1, 0.0, 0.3] {
            ukf.update(&[z]).unwrap();
        }
        assert_eq!(ukf.weights().unwrap(), &weights);
        assert_eq!(ukf.process_noise().unwrap(), &q);
        assert_eq!(ukf.measurement_noise().unwrap(), &r);
    }

    #[test]
    fn covariance_stays_symmetric() {
        let mut ukf = seeded(3);
        for k in 0..50 {
            let t = k as f64 * 0.1;
            ukf.update(&[t.sin(), t.cos()]).unwrap();
            let p = ukf.get_covariance().unwrap();
            assert_eq!(p.shape(), (3, 3));
            assert!(is_symmetric(&p, 1e-12));
        }
    }

    #[test]
    fn non_positive_definite_covariance_is_reported() {
        let mut ukf = seeded(0);
        ukf.update(&[0.1, 0.2]).unwrap();
        let x = DVector::from_vec(vec![0.1, 0.2]);
        let p = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        ukf.restore(x.clone(), p.clone()).unwrap();
        assert_eq!(ukf.update(&[0.1, 0.2]), Err(FilterError::NotPositiveDefinite));
        assert_eq!(ukf.get_state().unwrap(), x);
        assert_eq!(ukf.get_covariance().unwrap(), p);
    }

    #[test]
    fn collapsing_dynamics_surface_numerical_failures() {
        // Every sigma point collapses onto the origin: with no process or measurement noise
        // the innovation covariance is zero.
        let params = FilterParameters::default().with_q(0.0).with_r(0.0);
        let collapse = FnProcess(|x: &DVector<f64>| DVector::<f64>::zeros(x.len()));
        let mut ukf =
            UnscentedKalmanFilter::with_models(1, params, collapse, IdentityModel).unwrap();
        assert_eq!(ukf.update(&[1.0]), Err(FilterError::SingularInnovation));
        assert!(ukf.get_state().unwrap().iter().all(|v| v.is_finite()));
        assert_eq!(ukf.get_covariance().unwrap(), DMatrix::identity(1, 1));

        // With measurement noise the update goes through but P collapses to zero, which the
        // next update reports instead of producing NaN.
        let params = FilterParameters::default().with_q(0.0);
        let mut ukf =
            UnscentedKalmanFilter::with_models(1, params, collapse, IdentityModel).unwrap();
        ukf.update(&[1.0]).unwrap();
        assert_eq!(ukf.update(&[1.0]), Err(FilterError::NotPositiveDefinite));
        assert!(ukf.get_state().unwrap().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn model_output_length_is_checked() {
        let wrong = FnObservation(|_: &DVector<f64>, m: usize| DVector::<f64>::zeros(m + 1));
        let mut ukf =
            UnscentedKalmanFilter::with_models(0, FilterParameters::default(), IdentityModel, wrong)
                .unwrap();
        assert_eq!(
            ukf.update(&[1.0]),
            Err(FilterError::ModelOutput {
                model: "observation",
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn nonlinear_observation() {
        // Observe the squared range of a 2D position. The mean settles where
        // |x|² + tr(P) matches the measurement, short of 8 by the unobservable spread.
        let range2 = FnObservation(|x: &DVector<f64>, _: usize| {
            DVector::from_element(1, x.norm_squared())
        });
        let params = FilterParameters::default().with_alpha(1.0).with_r(0.1);
        let mut ukf = UnscentedKalmanFilter::with_models(2, params, IdentityModel, range2)
            .unwrap()
            .with_initial_state(InitialStateStrategy::Fixed(vec![1.0, 1.0]));
        for _ in 0..20 {
            ukf.update(&[8.0]).unwrap();
        }
        let x = ukf.get_state().unwrap();
        assert!(x.norm_squared() > 6.0 && x.norm_squared() < 8.0);
        assert_approx_eq!(x[0], x[1], 1e-9);
    }

    #[test]
    fn reset_returns_to_uninitialized() {
        let mut ukf = seeded(0);
        ukf.update(&[0.1]).unwrap();
        ukf.reset();
        assert!(!ukf.is_initialized());
        assert_eq!(ukf.state_dimension(), 0);
        ukf.update(&[0.1, 0.2, 0.3]).unwrap();
        assert_eq!(ukf.state_dimension(), 3);
    }

    #[test]
    fn restore_validates_shapes() {
        let mut ukf = seeded(0);
        assert_eq!(
            ukf.restore(DVector::zeros(1), DMatrix::identity(1, 1)),
            Err(FilterError::NotInitialized)
        );
        ukf.update(&[0.1]).unwrap();
        assert!(matches!(
            ukf.restore(DVector::zeros(2), DMatrix::identity(2, 2)),
            Err(FilterError::InvalidEstimate(_))
        ));
        assert!(matches!(
            ukf.restore(DVector::from_element(1, f64::NAN), DMatrix::identity(1, 1)),
            Err(FilterError::InvalidEstimate(_))
        ));
        ukf.restore(DVector::from_element(1, 2.0), DMatrix::identity(1, 1) * 0.5)
            .unwrap();
        assert_eq!(ukf.get_state().unwrap()[0], 2.0);
    }

    #[test]
    fn display_and_debug() {
        let mut ukf = seeded(0);
        assert!(format!("{ukf}").contains("uninitialized"));
        ukf.update(&[0.1]).unwrap();
        assert!(format!("{ukf}").contains("m = 1"));
        assert!(format!("{ukf:?}").starts_with("UKF"));
    }
}
