//! Small dense linear algebra helpers

use nalgebra::{DMatrix, DVector};

/// Ordinary least squares fit of `y = intercept + slope * x`
///
/// Returns `(NaN, NaN)` when the normal equations are singular.
pub(crate) fn linear_fit(x: &[f64], y: &[f64]) -> (f64, f64) {
    let n = x.len().min(y.len());
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }

    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { x[i] });
    let target = DVector::from_column_slice(&y[..n]);

    // β = (XᵀX)⁻¹ Xᵀy
    let xtx = design.transpose() * &design;
    let xty = design.transpose() * &target;
    match xtx.try_inverse() {
        Some(inv) => {
            let beta = inv * xty;
            (beta[0], beta[1])
        }
        None => (f64::NAN, f64::NAN),
    }
}

/// Singular values of a row-major `rows × cols` matrix, descending
pub(crate) fn singular_values(data: &[f64], rows: usize, cols: usize) -> Vec<f64> {
    let matrix = DMatrix::from_row_slice(rows, cols, data);
    let mut sv: Vec<f64> = matrix.singular_values().iter().copied().collect();
    sv.sort_by(|a, b| b.total_cmp(a));
    sv
}
