//! Activation functions.
use crate::matrix::Matrix;
use std::fmt;

/// Trait for activation functions.
pub trait Activation: fmt::Debug + Send + Sync {
    fn apply(&self, x: f64) -> f64;
    /// Derivative with respect to the pre-activation `x`.
    fn derivative(&self, x: f64) -> f64;
    fn apply_matrix(&self, m: &Matrix) -> Matrix {
        m.map(|x| self.apply(x))
    }
    fn derivative_matrix(&self, m: &Matrix) -> Matrix {
        m.map(|x| self.derivative(x))
    }
}

/// Sigmoid: 1 / (1 + exp(-x))
#[derive(Debug, Clone, Copy, Default)]
pub struct Sigmoid;

impl Activation for Sigmoid {
    fn apply(&self, x: f64) -> f64 {
        sigmoid(x)
    }
    fn derivative(&self, x: f64) -> f64 {
        let s = sigmoid(x);
        s * (1.0 - s)
    }
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
