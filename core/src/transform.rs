//! The unscented transform
//!
//! Each sigma point is pushed through a map into the output space, and the weighted
//! points are recombined into a mean and covariance:
//!
//! $$
//! \begin{aligned}
//! y &= \sum_k W^m_k \, Y_k \\\\
//! P_y &= \sum_k W^c_k (Y_k - y)(Y_k - y)^T + R
//! \end{aligned}
//! $$
//!
//! The deviations `Y - y·1ᵀ` are returned alongside the moments so the caller can build
//! the state/measurement cross-covariance without recomputing them.
use nalgebra::{DMatrix, DVector};

use crate::error::{FilterError, FilterResult};
use crate::linalg::weighted_product;
use crate::sigma::SigmaWeights;

/// Output of [`unscented_transform`]
#[derive(Clone, Debug, PartialEq)]
pub struct UnscentedTransform {
    /// Weighted mean of the transformed points (n_out)
    pub mean: DVector<f64>,
    /// Transformed points, one column per sigma point (n_out × k)
    pub points: DMatrix<f64>,
    /// Weighted covariance of the transformed points plus the additive noise (n_out × n_out)
    pub covariance: DMatrix<f64>,
    /// Transformed points minus the mean (n_out × k)
    pub deviations: DMatrix<f64>,
}

/// Propagate `points` through `map` and recombine them with `weights`.
///
/// # Arguments
/// * `points` - sigma points, one per column
/// * `weights` - mean and covariance weights, one per column of `points`
/// * `n_out` - dimension of the output space
/// * `noise` - additive `n_out × n_out` noise covariance
/// * `model` - name of the map, used in error messages
/// * `map` - applied to every sigma point; must return `n_out` values
///
/// # Errors
/// [`FilterError::ModelOutput`] if the map returns a vector of the wrong length.
pub fn unscented_transform<F>(
    points: &DMatrix<f64>,
    weights: &SigmaWeights,
    n_out: usize,
    noise: &DMatrix<f64>,
    model: &'static str,
    map: F,
) -> FilterResult<UnscentedTransform>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    let k = points.ncols();
    debug_assert_eq!(k, weights.len());
    debug_assert_eq!(noise.shape(), (n_out, n_out));

    let mut transformed = DMatrix::<f64>::zeros(n_out, k);
    let mut mean = DVector::<f64>::zeros(n_out);
    for (i, point) in points.column_iter().enumerate() {
        let y = map(&point.clone_owned());
        if y.len() != n_out {
            return Err(FilterError::ModelOutput {
                model,
                expected: n_out,
                found: y.len(),
            });
        }
        mean += weights.mean[i] * &y;
        transformed.set_column(i, &y);
    }
    let mut deviations = transformed.clone();
    for mut column in deviations.column_iter_mut() {
        column -= &mean;
    }
    let covariance = weighted_product(&deviations, &weights.covariance, &deviations) + noise;
    Ok(UnscentedTransform {
        mean,
        points: transformed,
        covariance,
        deviations,
    })
}
