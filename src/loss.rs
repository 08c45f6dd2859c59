//! Loss functions for training neural networks.
use crate::error::Result;
use crate::matrix::Matrix;

/// Per-row half squared error: `0.5 * Σ_j (target[i,j] - pred[i,j])²`.
///
/// Returns an N x 1 column, one cost per example.
pub fn half_squared_error(target: &Matrix, pred: &Matrix) -> Result<Matrix> {
    let diff = target.subtract(pred)?;
    let per_row: Vec<f64> = diff
        .as_slice()
        .chunks(diff.cols())
        .map(|row| 0.5 * row.iter().map(|d| d * d).sum::<f64>())
        .collect();
    Matrix::from_vec(diff.rows(), 1, per_row)
}

/// Derivative of the half squared error with respect to `pred`: `-(target - pred)`.
pub fn half_squared_error_deriv(target: &Matrix, pred: &Matrix) -> Result<Matrix> {
    Ok(target.subtract(pred)?.scalar_multiply(-1.0))
}
