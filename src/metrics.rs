//! Metrics for evaluating network outputs against one-hot labels.
use crate::error::{Error, Result};
use crate::matrix::Matrix;

/// Index of the largest value; the first one wins on ties.
pub fn argmax(row: &[f64]) -> usize {
    row.iter()
        .enumerate()
        .fold(0usize, |max_i, (i, &v)| if v > row[max_i] { i } else { max_i })
}

/// Fraction of rows whose predicted class equals the labelled class.
pub fn accuracy(predictions: &Matrix, labels: &Matrix) -> Result<f64> {
    check_shapes("metrics::accuracy", predictions, labels)?;
    let correct = predictions
        .as_slice()
        .chunks(predictions.cols())
        .zip(labels.as_slice().chunks(labels.cols()))
        .filter(|(pred, target)| argmax(pred) == argmax(target))
        .count();
    Ok(correct as f64 / predictions.rows() as f64)
}

/// Percentage of rows whose labelled class scores at least `threshold`.
///
/// The class of a row is its first column equal to 1; rows without one
/// are never counted as correct.
pub fn threshold_accuracy(outputs: &Matrix, labels: &Matrix, threshold: f64) -> Result<f64> {
    check_shapes("metrics::threshold_accuracy", outputs, labels)?;
    let num_correct = outputs
        .as_slice()
        .chunks(outputs.cols())
        .zip(labels.as_slice().chunks(labels.cols()))
        .filter(|(out, target)| match target.iter().position(|&v| v == 1.0) {
            Some(j) => out[j] >= threshold,
            None => false,
        })
        .count();
    Ok(100.0 * num_correct as f64 / outputs.rows() as f64)
}

/// Confusion counts indexed `[true class][predicted class]`.
pub fn confusion_matrix(predictions: &Matrix, labels: &Matrix) -> Result<Vec<Vec<usize>>> {
    check_shapes("metrics::confusion_matrix", predictions, labels)?;
    let num_classes = labels.cols();
    let mut cm = vec![vec![0; num_classes]; num_classes];
    for (pred, target) in predictions
        .as_slice()
        .chunks(predictions.cols())
        .zip(labels.as_slice().chunks(num_classes))
    {
        cm[argmax(target)][argmax(pred)] += 1;
    }
    Ok(cm)
}

fn check_shapes(op: &'static str, predictions: &Matrix, labels: &Matrix) -> Result<()> {
    if predictions.shape() != labels.shape() {
        return Err(Error::dimension(op, labels.shape(), predictions.shape()));
    }
    Ok(())
}
