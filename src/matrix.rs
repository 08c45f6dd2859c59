//! Dense row-major matrix of `f64` with checked linear-algebra operators.
//!
//! Every operator that produces a matrix returns a freshly allocated value;
//! only `set`, `set_row`, `set_column`, `add_assign`, `sub_assign` and
//! `randomize` mutate in place. Preconditions are checked before any write.
use crate::error::{Error, Result};
use rand::Rng;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Zero-filled `rows x cols` matrix. Both dimensions must be at least one.
    pub fn new(rows: usize, cols: usize) -> Result<Matrix> {
        if rows < 1 || cols < 1 {
            return Err(Error::dimension("Matrix::new", (1, 1), (rows, cols)));
        }
        Ok(Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        })
    }

    /// Builds a matrix from row-major values.
    pub fn from_vec(rows: usize, cols: usize, values: Vec<f64>) -> Result<Matrix> {
        if rows < 1 || cols < 1 {
            return Err(Error::dimension("Matrix::from_vec", (1, 1), (rows, cols)));
        }
        if values.len() != rows * cols {
            return Err(Error::dimension(
                "Matrix::from_vec",
                (rows, cols),
                (values.len(), 1),
            ));
        }
        Ok(Matrix {
            rows,
            cols,
            data: values,
        })
    }

    /// Square matrix from a flat list whose length is a perfect square.
    pub fn square(values: Vec<f64>) -> Result<Matrix> {
        let len = values.len();
        let side = (len as f64).sqrt().round() as usize;
        if side * side != len {
            return Err(Error::dimension("Matrix::square", (side, side), (len, 1)));
        }
        Matrix::from_vec(side, side, values)
    }

    pub fn identity(n: usize) -> Result<Matrix> {
        let mut m = Matrix::new(n, n)?;
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        Ok(m)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Row-major backing storage.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn row(&self, i: usize) -> Result<&[f64]> {
        if i >= self.rows {
            return Err(self.out_of_bounds(i, 0));
        }
        Ok(&self.data[i * self.cols..(i + 1) * self.cols])
    }

    pub fn get(&self, i: usize, j: usize) -> Result<f64> {
        let index = self.index(i, j)?;
        Ok(self.data[index])
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) -> Result<()> {
        let index = self.index(i, j)?;
        self.data[index] = value;
        Ok(())
    }

    /// Overwrites row `i` with `values`.
    pub fn set_row(&mut self, i: usize, values: &[f64]) -> Result<()> {
        if i >= self.rows {
            return Err(self.out_of_bounds(i, 0));
        }
        if values.len() != self.cols {
            return Err(Error::dimension(
                "Matrix::set_row",
                (1, self.cols),
                (1, values.len()),
            ));
        }
        self.data[i * self.cols..(i + 1) * self.cols].copy_from_slice(values);
        Ok(())
    }

    /// Overwrites column `j` with `values`.
    pub fn set_column(&mut self, j: usize, values: &[f64]) -> Result<()> {
        if j >= self.cols {
            return Err(self.out_of_bounds(0, j));
        }
        if values.len() != self.rows {
            return Err(Error::dimension(
                "Matrix::set_column",
                (self.rows, 1),
                (values.len(), 1),
            ));
        }
        self.data
            .chunks_mut(self.cols)
            .zip(values)
            .for_each(|(row, &v)| row[j] = v);
        Ok(())
    }

    pub fn transpose(&self) -> Matrix {
        let mut data = vec![0.0; self.data.len()];
        for i in 0..self.rows {
            for j in 0..self.cols {
                data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        Matrix {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    /// Matrix product `self · b`.
    ///
    /// Each output cell accumulates over `k` in increasing order, so results
    /// are reproducible down to the last bit.
    pub fn multiply(&self, b: &Matrix) -> Result<Matrix> {
        if self.cols != b.rows {
            return Err(Error::dimension(
                "Matrix::multiply",
                (self.cols, b.cols),
                (b.rows, b.cols),
            ));
        }
        let mut data = vec![0.0; self.rows * b.cols];
        for i in 0..self.rows {
            let a_row = &self.data[i * self.cols..(i + 1) * self.cols];
            for j in 0..b.cols {
                let mut s = 0.0;
                for (k, &a_ik) in a_row.iter().enumerate() {
                    s += a_ik * b.data[k * b.cols + j];
                }
                data[i * b.cols + j] = s;
            }
        }
        Ok(Matrix {
            rows: self.rows,
            cols: b.cols,
            data,
        })
    }

    pub fn add(&self, b: &Matrix) -> Result<Matrix> {
        self.zip_with("Matrix::add", b, |x, y| x + y)
    }

    pub fn subtract(&self, b: &Matrix) -> Result<Matrix> {
        self.zip_with("Matrix::subtract", b, |x, y| x - y)
    }

    /// Element-wise (Hadamard) product.
    pub fn hadamard(&self, b: &Matrix) -> Result<Matrix> {
        self.zip_with("Matrix::hadamard", b, |x, y| x * y)
    }

    pub fn scalar_multiply(&self, s: f64) -> Matrix {
        self.map(|x| x * s)
    }

    /// In-place `self += b`.
    pub fn add_assign(&mut self, b: &Matrix) -> Result<()> {
        self.check_same_shape("Matrix::add_assign", b)?;
        self.data
            .iter_mut()
            .zip(&b.data)
            .for_each(|(a, &b)| *a += b);
        Ok(())
    }

    /// In-place `self -= b`.
    pub fn sub_assign(&mut self, b: &Matrix) -> Result<()> {
        self.check_same_shape("Matrix::sub_assign", b)?;
        self.data
            .iter_mut()
            .zip(&b.data)
            .for_each(|(a, &b)| *a -= b);
        Ok(())
    }

    /// Applies `f` to every element, returning a new matrix.
    pub fn map<F>(&self, f: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// Applies `f` to each row of a copy of the matrix.
    pub fn map_rows<F>(&self, mut f: F) -> Matrix
    where
        F: FnMut(&mut [f64]),
    {
        let mut out = self.clone();
        out.data.chunks_mut(self.cols).for_each(|row| f(row));
        out
    }

    /// Fills the matrix with independent uniform values in [-1, 1].
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.data
            .iter_mut()
            .for_each(|v| *v = rng.gen_range(-1.0..=1.0));
    }

    /// Euclidean norm of a single-column matrix.
    pub fn vector_length(&self) -> Result<f64> {
        if self.cols != 1 {
            return Err(Error::Shape {
                op: "Matrix::vector_length",
                requirement: "expected a single column",
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(self.data.iter().map(|x| x * x).sum::<f64>().sqrt())
    }

    fn index(&self, i: usize, j: usize) -> Result<usize> {
        if i >= self.rows || j >= self.cols {
            return Err(self.out_of_bounds(i, j));
        }
        Ok(i * self.cols + j)
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> Error {
        Error::Bounds {
            row,
            col,
            rows: self.rows,
            cols: self.cols,
        }
    }

    fn check_same_shape(&self, op: &'static str, b: &Matrix) -> Result<()> {
        if self.shape() != b.shape() {
            return Err(Error::dimension(op, self.shape(), b.shape()));
        }
        Ok(())
    }

    fn zip_with<F>(&self, op: &'static str, b: &Matrix, f: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.check_same_shape(op, b)?;
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&b.data)
                .map(|(&x, &y)| f(x, y))
                .collect(),
        })
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, row) in self.data.chunks(self.cols).enumerate() {
            if i > 0 {
                write!(f, "\n ")?;
            }
            for v in row {
                write!(f, " {:>10.6}", v)?;
            }
        }
        write!(f, " ]")
    }
}
