//! Three-layer sigmoid network trained by batch gradient descent, with
//! plain-text persistence.
use crate::activations::{Activation, Sigmoid};
use crate::error::{Error, Result};
use crate::loss::{half_squared_error, half_squared_error_deriv};
use crate::matrix::Matrix;
use crate::metrics::{argmax, threshold_accuracy};
use log::{debug, info, log_enabled, warn, Level};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// Feed-forward network with one hidden layer and no biases.
///
/// `w1` maps inputs to the hidden layer (`num_in x num_hidden`), `w2` maps
/// the hidden layer to the outputs (`num_hidden x num_out`).
#[derive(Debug, Clone)]
pub struct Network {
    num_in: usize,
    num_hidden: usize,
    num_out: usize,
    learning_rate: f64,
    w1: Matrix,
    w2: Matrix,
    rng: StdRng,
}

/// Weight gradients for one batch.
#[derive(Debug, Clone)]
pub struct Gradients {
    pub d_w1: Matrix,
    pub d_w2: Matrix,
}

/// Intermediate values of a forward pass, kept for backpropagation.
struct ForwardPass {
    z2: Matrix,
    a2: Matrix,
    z3: Matrix,
    y_hat: Matrix,
}

impl Network {
    /// Create a network with weights drawn from an entropy-seeded generator.
    pub fn new(
        num_in: usize,
        num_hidden: usize,
        num_out: usize,
        learning_rate: f64,
    ) -> Result<Self> {
        Self::with_rng(
            num_in,
            num_hidden,
            num_out,
            learning_rate,
            StdRng::from_entropy(),
        )
    }

    /// Create a network whose initial and reset weights are reproducible.
    pub fn with_seed(
        num_in: usize,
        num_hidden: usize,
        num_out: usize,
        learning_rate: f64,
        seed: u64,
    ) -> Result<Self> {
        Self::with_rng(
            num_in,
            num_hidden,
            num_out,
            learning_rate,
            StdRng::seed_from_u64(seed),
        )
    }

    pub fn with_rng(
        num_in: usize,
        num_hidden: usize,
        num_out: usize,
        learning_rate: f64,
        mut rng: StdRng,
    ) -> Result<Self> {
        if num_in < 1 || num_hidden < 1 || num_out < 1 {
            return Err(Error::Config(format!(
                "layer sizes must be positive, got {}-{}-{}",
                num_in, num_hidden, num_out
            )));
        }
        if !(learning_rate > 0.0 && learning_rate.is_finite()) {
            return Err(Error::Config(format!(
                "learning rate must be positive, got {}",
                learning_rate
            )));
        }
        let mut w1 = Matrix::new(num_in, num_hidden)?;
        let mut w2 = Matrix::new(num_hidden, num_out)?;
        w1.randomize(&mut rng);
        w2.randomize(&mut rng);
        Ok(Self {
            num_in,
            num_hidden,
            num_out,
            learning_rate,
            w1,
            w2,
            rng,
        })
    }

    pub fn num_in(&self) -> usize {
        self.num_in
    }

    pub fn num_hidden(&self) -> usize {
        self.num_hidden
    }

    pub fn num_out(&self) -> usize {
        self.num_out
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// The input-to-hidden and hidden-to-output weights.
    pub fn weights(&self) -> (&Matrix, &Matrix) {
        (&self.w1, &self.w2)
    }

    /// Network output for each row of `data`, one row per example.
    ///
    /// With more than one output the rows are scaled to sum to one.
    pub fn evaluate(&self, data: &Matrix) -> Result<Matrix> {
        self.check_input(data, "Network::evaluate")?;
        let hidden = Sigmoid.apply_matrix(&data.multiply(&self.w1)?);
        let out = Sigmoid.apply_matrix(&hidden.multiply(&self.w2)?);
        Ok(self.normalize_output(out))
    }

    /// Per-example cost `0.5 * Σ (label - output)²` as an N x 1 column.
    pub fn cost(&self, data: &Matrix, labels: &Matrix) -> Result<Matrix> {
        check_batch("Network::cost", data, labels)?;
        half_squared_error(labels, &self.evaluate(data)?)
    }

    /// Percentage of rows whose labelled class scores at least `threshold`.
    ///
    /// The class of a row is its first column equal to 1; rows without one
    /// are never counted as correct.
    pub fn percent_correct(&self, data: &Matrix, labels: &Matrix, threshold: f64) -> Result<f64> {
        check_batch("Network::percent_correct", data, labels)?;
        if labels.cols() != self.num_out {
            return Err(Error::dimension(
                "Network::percent_correct",
                (labels.rows(), self.num_out),
                labels.shape(),
            ));
        }
        threshold_accuracy(&self.evaluate(data)?, labels, threshold)
    }

    /// One gradient-descent step over the whole batch.
    pub fn train(&mut self, data: &Matrix, labels: &Matrix) -> Result<()> {
        check_batch("Network::train", data, labels)?;
        let grads = self.compute_gradients(data, labels)?;
        self.apply_gradients(&grads)
    }

    /// Backpropagation for one batch without touching the weights.
    pub fn compute_gradients(&self, data: &Matrix, labels: &Matrix) -> Result<Gradients> {
        check_batch("Network::compute_gradients", data, labels)?;
        let fwd = self.forward(data)?;
        if log_enabled!(Level::Debug) {
            let cost = half_squared_error(labels, &fwd.y_hat)?;
            let mean = cost.as_slice().iter().sum::<f64>() / cost.rows() as f64;
            debug!("batch of {}: mean cost {:.6}", data.rows(), mean);
        }

        // The output derivative ignores the row normalisation.
        let delta3 = half_squared_error_deriv(labels, &fwd.y_hat)?
            .hadamard(&Sigmoid.derivative_matrix(&fwd.z3))?;
        let d_w2 = fwd.a2.transpose().multiply(&delta3)?;

        let delta2 = delta3
            .multiply(&self.w2.transpose())?
            .hadamard(&Sigmoid.derivative_matrix(&fwd.z2))?;
        let d_w1 = data.transpose().multiply(&delta2)?;

        Ok(Gradients { d_w1, d_w2 })
    }

    /// SGD step: `W -= learning_rate * dW` for both weight matrices.
    pub fn apply_gradients(&mut self, grads: &Gradients) -> Result<()> {
        let step1 = grads.d_w1.scalar_multiply(self.learning_rate);
        let step2 = grads.d_w2.scalar_multiply(self.learning_rate);
        if step1.shape() != self.w1.shape() {
            return Err(Error::dimension(
                "Network::apply_gradients",
                self.w1.shape(),
                step1.shape(),
            ));
        }
        if step2.shape() != self.w2.shape() {
            return Err(Error::dimension(
                "Network::apply_gradients",
                self.w2.shape(),
                step2.shape(),
            ));
        }
        self.w1.sub_assign(&step1)?;
        self.w2.sub_assign(&step2)
    }

    /// Re-randomizes both weight matrices, discarding all training.
    pub fn reset(&mut self) {
        self.w1.randomize(&mut self.rng);
        self.w2.randomize(&mut self.rng);
        info!("network weights reset");
    }

    /// Predicted class of one example and the full output row.
    pub fn classify(&self, example: &[f64]) -> Result<(usize, Vec<f64>)> {
        if example.len() != self.num_in {
            return Err(Error::Shape {
                op: "Network::classify",
                requirement: "example length must equal the input size",
                rows: 1,
                cols: example.len(),
            });
        }
        let input = Matrix::from_vec(1, self.num_in, example.to_vec())?;
        let out = self.evaluate(&input)?;
        let row = out.row(0)?.to_vec();
        Ok((argmax(&row), row))
    }

    /// Save state as text: the layer sizes, then `w1` and `w2` row by row.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = BufWriter::new(File::create(path)?);
        self.save_to(&mut writer)?;
        writer.flush()?;
        info!("network state saved to {}", path.display());
        Ok(())
    }

    pub fn save_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "{} {} {}", self.num_in, self.num_hidden, self.num_out)?;
        for m in [&self.w1, &self.w2] {
            for row in m.as_slice().chunks(m.cols()) {
                let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                writeln!(writer, "{}", line.join(" "))?;
            }
        }
        Ok(())
    }

    /// Restore weights saved by [`Network::save`].
    ///
    /// The stored layer sizes must match this network. Nothing is modified
    /// unless the whole file parses.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path)?;
        self.load_from(file)?;
        info!("network state read from {}", path.display());
        Ok(())
    }

    pub fn load_from<R: Read>(&mut self, mut reader: R) -> Result<()> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        let mut tokens = contents.split_whitespace();

        let mut header = [0usize; 3];
        for slot in header.iter_mut() {
            let token = tokens
                .next()
                .ok_or_else(|| Error::invalid_data("state file is missing its header"))?;
            *slot = token
                .parse()
                .map_err(|_| Error::invalid_data(format!("bad layer size '{}'", token)))?;
        }
        let found = (header[0], header[1], header[2]);
        let expected = (self.num_in, self.num_hidden, self.num_out);
        if found != expected {
            return Err(Error::Compatibility { expected, found });
        }

        let w1 = read_matrix(&mut tokens, self.num_in, self.num_hidden)?;
        let w2 = read_matrix(&mut tokens, self.num_hidden, self.num_out)?;
        if tokens.next().is_some() {
            warn!("ignoring trailing data after network state");
        }
        self.w1 = w1;
        self.w2 = w2;
        Ok(())
    }

    fn forward(&self, data: &Matrix) -> Result<ForwardPass> {
        self.check_input(data, "Network::forward")?;
        let z2 = data.multiply(&self.w1)?;
        let a2 = Sigmoid.apply_matrix(&z2);
        let z3 = a2.multiply(&self.w2)?;
        let y_hat = self.normalize_output(Sigmoid.apply_matrix(&z3));
        Ok(ForwardPass { z2, a2, z3, y_hat })
    }

    fn normalize_output(&self, out: Matrix) -> Matrix {
        if self.num_out == 1 {
            out
        } else {
            normalize_rows(&out)
        }
    }

    fn check_input(&self, data: &Matrix, op: &'static str) -> Result<()> {
        if data.cols() != self.num_in {
            return Err(Error::Shape {
                op,
                requirement: "data columns must equal the input size",
                rows: data.rows(),
                cols: data.cols(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Network: [{}, {}, {}] (lr = {})",
            self.num_in, self.num_hidden, self.num_out, self.learning_rate
        )
    }
}

/// Divides each row by its sum. Rows summing to exactly zero are left as is.
pub fn normalize_rows(m: &Matrix) -> Matrix {
    m.map_rows(|row| {
        let total: f64 = row.iter().sum();
        if total != 0.0 {
            row.iter_mut().for_each(|v| *v /= total);
        }
    })
}

fn check_batch(op: &'static str, data: &Matrix, labels: &Matrix) -> Result<()> {
    if data.rows() != labels.rows() {
        return Err(Error::dimension(
            op,
            (data.rows(), labels.cols()),
            labels.shape(),
        ));
    }
    Ok(())
}

fn read_matrix<'a, I>(tokens: &mut I, rows: usize, cols: usize) -> Result<Matrix>
where
    I: Iterator<Item = &'a str>,
{
    let mut values = Vec::with_capacity(rows * cols);
    for _ in 0..rows * cols {
        let token = tokens
            .next()
            .ok_or_else(|| Error::invalid_data("state file ended before all weights were read"))?;
        let v: f64 = token
            .parse()
            .map_err(|_| Error::invalid_data(format!("bad weight '{}'", token)))?;
        values.push(v);
    }
    Matrix::from_vec(rows, cols, values)
}
