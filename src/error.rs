//! Error type shared by the matrix engine and the network.
use thiserror::Error;

/// Errors raised by matrix and network operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Two operands do not conform for `op`.
    #[error("{op}: dimension mismatch, expected {expected:?}, got {actual:?}")]
    Dimension {
        op: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("index ({row}, {col}) out of bounds for {rows}x{cols} matrix")]
    Bounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// The operation needs a particular shape, e.g. a single column.
    #[error("{op}: {requirement}, got {rows}x{cols}")]
    Shape {
        op: &'static str,
        requirement: &'static str,
        rows: usize,
        cols: usize,
    },

    /// Persisted architecture differs from the live network.
    #[error("stored network is {found:?} but this network is {expected:?}")]
    Compatibility {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn dimension(
        op: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    ) -> Self {
        Error::Dimension {
            op,
            expected,
            actual,
        }
    }

    /// Malformed persisted data is reported as an I/O failure.
    pub(crate) fn invalid_data(msg: impl Into<String>) -> Self {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            msg.into(),
        ))
    }
}
