//! Matrix algebra used by the filter.
//!
//! Public API:
//!     pub fn cholesky_lower(matrix: &DMatrix<f64>) -> FilterResult<DMatrix<f64>>
//!     pub fn invert(matrix: &DMatrix<f64>) -> FilterResult<DMatrix<f64>>
//!     pub fn weighted_product(a, weights, b) -> DMatrix<f64>
//!     pub fn symmetrize(), is_symmetric(), diagonal(), constant(), is_finite()
//!
//! Dense storage, slicing, block insertion, transpose, and arithmetic come straight from
//! `nalgebra`. This module only wraps the operations that can fail, so that a failure
//! reaches the caller as a [`FilterError`] instead of a panic or a NaN.
//!
//! Cholesky has no jitter or eigenvalue fallback: a covariance that is not positive
//! definite is reported, not repaired.

use nalgebra::linalg::Cholesky;
use nalgebra::{DMatrix, DVector};

use crate::error::{FilterError, FilterResult};

/// Symmetrize a matrix: P ← 0.5 (P + Pᵀ)
///
/// Removes the round-off asymmetry that accumulates in covariance updates.
#[inline]
pub fn symmetrize(m: &DMatrix<f64>) -> DMatrix<f64> {
    0.5 * (m + m.transpose())
}

/// True when `m` is square and `|m_ij - m_ji| <= tol` for every pair.
pub fn is_symmetric(m: &DMatrix<f64>, tol: f64) -> bool {
    if !m.is_square() {
        return false;
    }
    let n = m.nrows();
    (0..n).all(|i| (0..i).all(|j| (m[(i, j)] - m[(j, i)]).abs() <= tol))
}

/// True when every entry is finite.
#[inline]
pub fn is_finite(m: &DMatrix<f64>) -> bool {
    m.iter().all(|v| v.is_finite())
}

/// Square diagonal matrix with `value` on the diagonal.
pub fn diagonal(n: usize, value: f64) -> DMatrix<f64> {
    DMatrix::from_diagonal_element(n, n, value)
}

/// Matrix with every entry equal to `value`.
pub fn constant(rows: usize, cols: usize, value: f64) -> DMatrix<f64> {
    DMatrix::from_element(rows, cols, value)
}

/// Lower-triangular Cholesky factor L with `matrix = L Lᵀ`.
///
/// # Errors
/// [`FilterError::NotPositiveDefinite`] if the matrix is not square, contains non-finite
/// values, or is not positive definite.
pub fn cholesky_lower(matrix: &DMatrix<f64>) -> FilterResult<DMatrix<f64>> {
    if !matrix.is_square() || !is_finite(matrix) {
        return Err(FilterError::NotPositiveDefinite);
    }
    Cholesky::new(matrix.clone())
        .map(|ch| ch.l())
        .filter(|l| is_finite(l) && l.diagonal().iter().all(|d| *d > 0.0))
        .ok_or(FilterError::NotPositiveDefinite)
}

/// General matrix inverse (LU with partial pivoting).
///
/// # Errors
/// [`FilterError::SingularInnovation`] if the matrix is not square, not invertible, or the
/// inverse is not finite.
pub fn invert(matrix: &DMatrix<f64>) -> FilterResult<DMatrix<f64>> {
    if !matrix.is_square() || !is_finite(matrix) {
        return Err(FilterError::SingularInnovation);
    }
    match matrix.clone().try_inverse() {
        Some(inv) if is_finite(&inv) => Ok(inv),
        _ => Err(FilterError::SingularInnovation),
    }
}

/// Weighted product `a · diag(weights) · bᵀ`.
///
/// `a` and `b` must have one column per weight.
pub fn weighted_product(a: &DMatrix<f64>, weights: &DVector<f64>, b: &DMatrix<f64>) -> DMatrix<f64> {
    debug_assert_eq!(a.ncols(), weights.len());
    debug_assert_eq!(b.ncols(), weights.len());
    a * DMatrix::from_diagonal(weights) * b.transpose()
}

/* =============================== Tests ==================================== */
