//! Unscented Kalman filter for tracking hidden state from noisy measurements
//!
//! This crate provides a reusable Unscented Kalman Filter (UKF): a recursive estimator for the
//! hidden state of a (possibly nonlinear) dynamic system that needs no Jacobians. Callers push
//! raw scalar or vector measurements in and read the current state estimate and its covariance
//! out. The filter is meant to be embedded into larger signal-processing or robotics pipelines.
//!
//! This crate is primarily built off of two additional dependencies:
//! - [`nalgebra`](https://crates.io/crates/nalgebra): Provides the dense matrix algebra (including
//!   the Cholesky factorization and matrix inverse) the filter is built on.
//! - [`rand`](https://crates.io/crates/rand) and [`rand_distr`](https://crates.io/crates/rand_distr):
//!   Provides random initial states and noise for synthetic test signals.
//!
//! ## Crate overview
//!
//! - [params]: Filter tuning parameters, their defaults, and configuration files.
//! - [error]: The error taxonomy of the filter.
//! - [linalg]: Matrix algebra helpers wrapping the fallible `nalgebra` operations.
//! - [sigma]: Sigma-point weights and generation.
//! - [transform]: The unscented transform.
//! - [models]: Transition and observation models and initial state strategies.
//! - [kalman]: The filter engine itself.
//! - [sim]: Synthetic signals, batch runs, CSV I/O, and error metrics.
//!
//! ## The filter
//!
//! With the tuning parameters $\alpha$, $\kappa$ (`ki`), $\beta$, the process-noise standard
//! deviation $q$ and the measurement-noise standard deviation $r$, an $L$-state filter fed
//! $m$-dimensional measurements keeps
//!
//! - the state estimate $x$ ($L$) and covariance $P$ ($L \times L$, initially $I$),
//! - the process noise $Q = q^2 I_L$,
//! - the measurement noise $R$, an $m \times m$ matrix with every entry $r^2$,
//! - $2L + 1$ mean weights $W^m$ and covariance weights $W^c$.
//!
//! Every update draws sigma points around $(x, P)$, pushes them through the process model and
//! then the observation model, and corrects the prediction with the Kalman gain
//! $K = P_{xz} S^{-1}$. See [kalman] for the full recursion.
//!
//! The state dimension may be left at zero, in which case it is inferred from the first
//! measurement ($L = m$). Everything the filter derives is created once, on that first
//! measurement; later measurements must keep the same length.
//!
//! ## Example
//!
//! ```
//! use ukf::{FilterParameters, UnscentedKalmanFilter};
//!
//! let mut ukf = UnscentedKalmanFilter::new(0, FilterParameters::default()).unwrap();
//! for k in 0..100 {
//!     let z = (k as f64 * 0.01).sin();
//!     ukf.update(&[z]).unwrap();
//! }
//! let x = ukf.get_state().unwrap();
//! let p = ukf.get_covariance().unwrap();
//! assert_eq!(x.len(), 1);
//! assert!(p[(0, 0)] > 0.0 && p[(0, 0)] < 1.0);
//! ```
pub mod error;
pub mod kalman;
pub mod linalg;
pub mod models;
pub mod params;
pub mod sigma;
pub mod sim;
pub mod transform;

pub use error::{FilterError, FilterResult};
pub use kalman::UnscentedKalmanFilter;
pub use models::{FnObservation, FnProcess, IdentityModel, InitialStateStrategy};
pub use params::{FilterConfig, FilterParameters};
