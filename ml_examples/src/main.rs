// ml_examples/src/main.rs
use anyhow::Result;
use digit_net::{
    accuracy, argmax, load_all, load_batches, load_config, print_model_summary,
    print_summary_table, threshold_accuracy, Batch, Config, MnistSplit, Network,
};
use log::{debug, error, info, warn, LevelFilter};
use std::io::{self, BufRead, Write};
use std::time::Instant;

const MENU: &str = "1: Train Network | 2: Evaluate Test Set | 3: Save State | \
                    4: Read State | 5: Reset Network | 6: Classify Example | 7: Exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Train,
    Evaluate,
    Save,
    Load,
    Reset,
    Classify,
    Exit,
}

impl Action {
    fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim().parse::<u32>().ok()? {
            1 => Some(Action::Train),
            2 => Some(Action::Evaluate),
            3 => Some(Action::Save),
            4 => Some(Action::Load),
            5 => Some(Action::Reset),
            6 => Some(Action::Classify),
            7 => Some(Action::Exit),
            _ => None,
        }
    }
}

struct Session {
    config: Config,
    nn: Network,
    training: Vec<Batch>,
    test: Batch,
    next_example: usize,
}

fn main() -> Result<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => load_config(&path)?,
        None => Config::default(),
    };

    info!("Parsing MNIST data set from {}...", config.data_dir.display());
    let before = Instant::now();
    let training = load_batches(
        &config.data_dir,
        MnistSplit::Training,
        config.batch_size,
        config.num_batches,
    )?;
    let test = load_all(&config.data_dir, MnistSplit::Test)?;
    info!("Time to parse MNIST data: {:.2?}", before.elapsed());

    let num_in = test.data.cols();
    let num_out = test.labels.cols();
    let nn = match config.seed {
        Some(seed) => Network::with_seed(
            num_in,
            config.num_hidden,
            num_out,
            config.learning_rate,
            seed,
        )?,
        None => Network::new(num_in, config.num_hidden, num_out, config.learning_rate)?,
    };
    print_model_summary(&nn);

    let mut session = Session {
        config,
        nn,
        training,
        test,
        next_example: 0,
    };

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\n{}\nEnter a number to choose an action: ", MENU);
        io::stdout().flush()?;
        let line = match lines.next() {
            Some(line) => line?,
            None => {
                info!("Input closed, Neural Network exits.");
                return Ok(());
            }
        };
        let action = match Action::from_choice(&line) {
            Some(action) => action,
            None => {
                warn!("Not a valid choice: '{}'", line.trim());
                continue;
            }
        };
        if action == Action::Exit {
            info!("Neural Network exits.");
            return Ok(());
        }
        if let Err(e) = session.run(action) {
            error!("{:#}", e);
        }
    }
}

impl Session {
    fn run(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Train => self.train(),
            Action::Evaluate => self.evaluate(),
            Action::Save => {
                self.nn.save(&self.config.state_path)?;
                info!("Neural Network state successfully saved to file!");
                Ok(())
            }
            Action::Load => {
                self.nn.load(&self.config.state_path)?;
                info!("Neural Network state successfully read from file!");
                Ok(())
            }
            Action::Reset => {
                self.nn.reset();
                info!("Neural Network has been reset!");
                Ok(())
            }
            Action::Classify => self.classify(),
            Action::Exit => Ok(()),
        }
    }

    fn train(&mut self) -> Result<()> {
        let before = Instant::now();
        let total = self.training.len();
        let percent_size = (total / 100).max(1);
        let mut history = Vec::with_capacity(self.config.epochs);
        for epoch in 0..self.config.epochs {
            for (i, batch) in self.training.iter().enumerate() {
                self.nn.train(&batch.data, &batch.labels)?;
                if i % percent_size == 0 {
                    debug!("Training epoch {}: {}%", epoch + 1, 100 * i / total);
                }
            }
            let cost = mean_cost(&self.nn, &self.training)?;
            info!("Epoch {}: mean cost = {:.6}", epoch + 1, cost);
            history.push(cost);
        }
        info!("Time to train: {:.2?}", before.elapsed());
        print_summary_table(&history, "Training Cost");
        Ok(())
    }

    fn evaluate(&self) -> Result<()> {
        let before = Instant::now();
        let outputs = self.nn.evaluate(&self.test.data)?;
        let percent_correct =
            threshold_accuracy(&outputs, &self.test.labels, self.config.threshold)?;
        let acc = accuracy(&outputs, &self.test.labels)?;
        info!(
            "Percent of test set correctly identified: {:.2}% (threshold {})",
            percent_correct, self.config.threshold
        );
        info!("Arg-max accuracy: {:.2}%", acc * 100.0);
        info!("Time to evaluate: {:.2?}", before.elapsed());
        Ok(())
    }

    /// Classifies the next test image, cycling through the set.
    fn classify(&mut self) -> Result<()> {
        let i = self.next_example % self.test.len();
        self.next_example += 1;
        let (predicted, outputs) = self.nn.classify(self.test.data.row(i)?)?;
        let actual = argmax(self.test.labels.row(i)?);
        info!(
            "Test image {}: predicted {} ({:.1}%), labelled {}",
            i,
            predicted,
            outputs[predicted] * 100.0,
            actual
        );
        Ok(())
    }
}

fn mean_cost(nn: &Network, batches: &[Batch]) -> Result<f64> {
    let mut total = 0.0;
    let mut count = 0usize;
    for batch in batches {
        let cost = nn.cost(&batch.data, &batch.labels)?;
        total += cost.as_slice().iter().sum::<f64>();
        count += cost.rows();
    }
    Ok(total / count.max(1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_choices() {
        assert_eq!(Action::from_choice("1"), Some(Action::Train));
        assert_eq!(Action::from_choice(" 6\n"), Some(Action::Classify));
        assert_eq!(Action::from_choice("7"), Some(Action::Exit));
        assert_eq!(Action::from_choice("0"), None);
        assert_eq!(Action::from_choice("eight"), None);
        assert_eq!(Action::from_choice(""), None);
    }
}
