//! Sigma-point weights and generation
//!
//! Scaled (Van der Merwe) sigma points: for an `n`-dimensional state the set has `2n + 1`
//! points, the mean itself plus a symmetric pair along each column of the scaled Cholesky
//! factor of the covariance.
//!
//! $$
//! \begin{aligned}
//! \lambda &= \alpha^2 (n + \kappa) - n \\\\
//! W^m_0 &= \frac{\lambda}{n + \lambda}, \quad W^c_0 = W^m_0 + 1 - \alpha^2 + \beta \\\\
//! W^m_i &= W^c_i = \frac{1}{2 (n + \lambda)}, \quad i = 1 \dots 2n
//! \end{aligned}
//! $$
use nalgebra::{DMatrix, DVector};

use crate::error::{FilterError, FilterResult};
use crate::linalg::cholesky_lower;
use crate::params::FilterParameters;

/// Mean and covariance weights for a fixed state dimension, plus the sigma-point scale
/// factor `sqrt(n + λ)`.
#[derive(Clone, Debug, PartialEq)]
pub struct SigmaWeights {
    pub lambda: f64,
    pub scale: f64,
    pub mean: DVector<f64>,
    pub covariance: DVector<f64>,
}

impl SigmaWeights {
    /// Derive the weights for an `n`-dimensional state.
    ///
    /// # Errors
    /// [`FilterError::InvalidParameters`] when the parameters are invalid, `n` is zero, or
    /// `n + λ` is not a finite positive number (degenerate scale factor).
    pub fn new(n: usize, params: &FilterParameters) -> FilterResult<Self> {
        params.validate()?;
        if n == 0 {
            return Err(FilterError::InvalidParameters(
                "state dimension must be positive".to_string(),
            ));
        }
        let nf = n as f64;
        let lambda = params.alpha * params.alpha * (nf + params.ki) - nf;
        let c = nf + lambda;
        if !(c.is_finite() && c > 0.0) {
            return Err(FilterError::InvalidParameters(format!(
                "degenerate sigma-point scale: n + lambda = {c} (alpha = {}, ki = {})",
                params.alpha, params.ki
            )));
        }
        let mut mean = DVector::from_element(2 * n + 1, 0.5 / c);
        mean[0] = lambda / c;
        let mut covariance = mean.clone();
        covariance[0] = mean[0] + (1.0 - params.alpha * params.alpha + params.beta);
        Ok(SigmaWeights {
            lambda,
            scale: c.sqrt(),
            mean,
            covariance,
        })
    }
    /// Number of sigma points, `2n + 1`
    pub fn len(&self) -> usize {
        self.mean.len()
    }
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

/// Sigma points around `x` with covariance `p`, spread by `scale`.
///
/// Column 0 is `x`, columns `1..=n` are `x + scale·Lᵢ` and columns `n+1..=2n` are
/// `x − scale·Lᵢ`, where `Lᵢ` is the i-th column of the lower Cholesky factor of `p`.
///
/// # Errors
/// [`FilterError::NotPositiveDefinite`] if `p` cannot be Cholesky-factored.
pub fn sigma_points(x: &DVector<f64>, p: &DMatrix<f64>, scale: f64) -> FilterResult<DMatrix<f64>> {
    let n = x.len();
    if p.shape() != (n, n) {
        return Err(FilterError::NotPositiveDefinite);
    }
    let a = cholesky_lower(p)? * scale;
    let mut pts = DMatrix::<f64>::zeros(n, 2 * n + 1);
    pts.column_mut(0).copy_from(x);
    for i in 0..n {
        pts.column_mut(i + 1).copy_from(&(x + a.column(i)));
        pts.column_mut(i + 1 + n).copy_from(&(x - a.column(i)));
    }
    Ok(pts)
}
