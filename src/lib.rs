//! A small digit-recognition crate: a dense matrix engine and a
//! single-hidden-layer sigmoid network trained by batch gradient descent.
//!
//! - `Matrix` with checked element access and linear-algebra operators
//! - `Network` with evaluate/cost/train, reset and text persistence
//! - MNIST loader for raw or gzipped IDX files, batched into matrices
//! - JSON run configuration and small reporting helpers

pub mod activations;
pub mod config;
pub mod datasets;
pub mod error;
pub mod loss;
pub mod matrix;
pub mod metrics;
pub mod network;
pub mod utils;

pub use activations::{sigmoid, Activation, Sigmoid};
pub use config::{load_config, Config};
pub use datasets::{load_all, load_batches, Batch, IdxImages, IdxLabels, MnistSplit, NUM_CLASSES};
pub use error::{Error, Result};
pub use loss::half_squared_error;
pub use matrix::Matrix;
pub use metrics::{accuracy, argmax, confusion_matrix, threshold_accuracy};
pub use network::{normalize_rows, Gradients, Network};
pub use utils::{generate_synthetic_batch, print_model_summary, print_summary_table};
