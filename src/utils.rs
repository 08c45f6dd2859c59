//! Utility functions for training reports and synthetic data.
use crate::datasets::{one_hot, Batch};
use crate::error::Error;
use crate::matrix::Matrix;
use crate::network::Network;
use log::info;
use rand::Rng;

/// Generate a synthetic batch: uniform inputs in [0, 1) and random one-hot labels.
pub fn generate_synthetic_batch<R: Rng + ?Sized>(
    rng: &mut R,
    n_samples: usize,
    input_size: usize,
    num_classes: usize,
) -> crate::Result<Batch> {
    if num_classes == 0 {
        return Err(Error::dimension(
            "generate_synthetic_batch",
            (n_samples, 1),
            (n_samples, num_classes),
        ));
    }
    let inputs: Vec<f64> = (0..n_samples * input_size)
        .map(|_| rng.gen_range(0.0..1.0))
        .collect();
    let labels: Vec<f64> = (0..n_samples)
        .flat_map(|_| one_hot(rng.gen_range(0..num_classes), num_classes))
        .collect();
    Batch::new(
        Matrix::from_vec(n_samples, input_size, inputs)?,
        Matrix::from_vec(n_samples, num_classes, labels)?,
    )
}

/// Log model summary
pub fn print_model_summary(nn: &Network) {
    let (w1, w2) = nn.weights();
    info!(
        "Model Summary: {} ({} weights)",
        nn,
        w1.as_slice().len() + w2.as_slice().len()
    );
}

/// Renders a table of per-epoch values with their average.
pub fn summary_table(values: &[f64], title: &str) -> String {
    let mut out = format!("{} Summary Table:\n", title);
    out.push_str("+-------+------------+\n");
    out.push_str("| Epoch |      Value |\n");
    out.push_str("+-------+------------+\n");
    for (i, v) in values.iter().enumerate() {
        out.push_str(&format!("| {:>5} | {:>10.6} |\n", i + 1, v));
    }
    if !values.is_empty() {
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        out.push_str("+-------+------------+\n");
        out.push_str(&format!("|  Avg  | {:>10.6} |\n", avg));
    }
    out.push_str("+-------+------------+");
    out
}

/// Log simple table for losses
pub fn print_summary_table(values: &[f64], title: &str) {
    for line in summary_table(values, title).lines() {
        info!("{}", line);
    }
}
