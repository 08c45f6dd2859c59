// End-to-end tests for the network: training trend, evaluation, scoring and
// persistence through real files.

use approx::assert_relative_eq;
use digit_net::{generate_synthetic_batch, Error, Matrix, Network};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

fn small_batch() -> (Matrix, Matrix) {
    let data = Matrix::from_vec(3, 2, vec![0.3, 0.5, 0.5, 0.1, 1.0, 0.2]).unwrap();
    let labels = Matrix::from_vec(3, 1, vec![0.75, 0.82, 0.93]).unwrap();
    (data, labels)
}

fn total_cost(nn: &Network, data: &Matrix, labels: &Matrix) -> f64 {
    nn.cost(data, labels).unwrap().vector_length().unwrap()
}

#[test]
fn test_training_reduces_cost_for_many_seeds() {
    let (data, labels) = small_batch();
    for seed in 0..5 {
        let mut nn = Network::with_seed(2, 3, 1, 0.5, seed).unwrap();
        let initial = total_cost(&nn, &data, &labels);
        for _ in 0..500 {
            nn.train(&data, &labels).unwrap();
        }
        let trained = total_cost(&nn, &data, &labels);
        assert!(
            trained < initial,
            "seed {}: cost {} -> {}",
            seed,
            initial,
            trained
        );
    }
}

#[test]
fn test_training_multi_class_lowers_cost() {
    let mut rng = StdRng::seed_from_u64(9);
    let batch = generate_synthetic_batch(&mut rng, 12, 6, 3).unwrap();
    let mut nn = Network::with_seed(6, 8, 3, 0.5, 9).unwrap();
    let initial = total_cost(&nn, &batch.data, &batch.labels);
    for _ in 0..1000 {
        nn.train(&batch.data, &batch.labels).unwrap();
    }
    assert!(total_cost(&nn, &batch.data, &batch.labels) < initial);
}

#[test]
fn test_single_output_in_open_unit_interval() {
    let nn = Network::with_seed(3, 5, 1, 0.1, 17).unwrap();
    let data = Matrix::from_vec(2, 3, vec![10.0, -4.0, 0.0, -20.0, 3.5, 1e3]).unwrap();
    let out = nn.evaluate(&data).unwrap();
    assert!(out.as_slice().iter().all(|&v| v > 0.0 && v < 1.0));
}

#[test]
fn test_cost_matches_manual_formula() {
    let nn = Network::with_seed(2, 3, 1, 0.1, 4).unwrap();
    let (data, labels) = small_batch();
    let out = nn.evaluate(&data).unwrap();
    let cost = nn.cost(&data, &labels).unwrap();
    for i in 0..3 {
        let diff = labels.get(i, 0).unwrap() - out.get(i, 0).unwrap();
        assert_relative_eq!(cost.get(i, 0).unwrap(), 0.5 * diff * diff);
    }
}

#[test]
fn test_percent_correct_all_hits() {
    let nn = Network::with_seed(4, 3, 2, 0.1, 6).unwrap();
    let data = Matrix::from_vec(2, 4, vec![0.1, 0.2, 0.3, 0.4, 0.9, 0.8, 0.7, 0.6]).unwrap();
    let out = nn.evaluate(&data).unwrap();

    // Label each row with the class the network currently favours and use a
    // threshold every favoured output clears.
    let mut labels = Matrix::new(2, 2).unwrap();
    let mut threshold: f64 = 1.0;
    for i in 0..2 {
        let row = out.row(i).unwrap();
        let j = if row[0] >= row[1] { 0 } else { 1 };
        labels.set(i, j, 1.0).unwrap();
        threshold = threshold.min(row[j]);
    }
    assert_eq!(nn.percent_correct(&data, &labels, threshold).unwrap(), 100.0);
}

#[test]
fn test_percent_correct_ignores_rows_without_label() {
    let nn = Network::with_seed(2, 3, 2, 0.1, 6).unwrap();
    let data = Matrix::from_vec(2, 2, vec![0.1, 0.2, 0.3, 0.4]).unwrap();
    let mut labels = Matrix::new(2, 2).unwrap();
    labels.set(0, 0, 1.0).unwrap();
    // Threshold 0 accepts any labelled row; the unlabelled row still misses.
    assert_eq!(nn.percent_correct(&data, &labels, 0.0).unwrap(), 50.0);
}

#[test]
fn test_percent_correct_row_mismatch() {
    let nn = Network::with_seed(2, 3, 2, 0.1, 6).unwrap();
    let data = Matrix::new(3, 2).unwrap();
    let labels = Matrix::new(2, 2).unwrap();
    assert!(matches!(
        nn.percent_correct(&data, &labels, 0.5),
        Err(Error::Dimension { .. })
    ));
}

#[test]
fn test_save_load_round_trip_bit_exact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state").join("network.state");

    let mut trained = Network::with_seed(4, 6, 3, 0.3, 31).unwrap();
    let mut rng = StdRng::seed_from_u64(31);
    let batch = generate_synthetic_batch(&mut rng, 8, 4, 3).unwrap();
    for _ in 0..50 {
        trained.train(&batch.data, &batch.labels).unwrap();
    }
    trained.save(&path).unwrap();

    let mut fresh = Network::with_seed(4, 6, 3, 0.3, 99).unwrap();
    fresh.load(&path).unwrap();

    let probe = batch.data.clone();
    assert_eq!(
        fresh.evaluate(&probe).unwrap(),
        trained.evaluate(&probe).unwrap()
    );
}

#[test]
fn test_state_file_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("network.state");
    let nn = Network::with_seed(2, 3, 1, 0.1, 1).unwrap();
    nn.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("2 3 1"));
    let tokens: Vec<f64> = lines
        .flat_map(|l| l.split_whitespace())
        .map(|t| t.parse().unwrap())
        .collect();
    assert_eq!(tokens.len(), 2 * 3 + 3 * 1);
    let (w1, w2) = nn.weights();
    assert_eq!(&tokens[..6], w1.as_slice());
    assert_eq!(&tokens[6..], w2.as_slice());
}

#[test]
fn test_load_incompatible_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("network.state");
    Network::with_seed(2, 3, 1, 0.1, 1).unwrap().save(&path).unwrap();

    let mut other = Network::with_seed(2, 4, 1, 0.1, 1).unwrap();
    assert!(matches!(
        other.load(&path),
        Err(Error::Compatibility { .. })
    ));
}

#[test]
fn test_load_missing_file() {
    let dir = tempdir().unwrap();
    let mut nn = Network::with_seed(2, 3, 1, 0.1, 1).unwrap();
    assert!(matches!(
        nn.load(dir.path().join("nope.state")),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_load_rejects_non_numeric_weight() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("network.state");
    std::fs::write(&path, "1 1 1\n0.5\nabc\n").unwrap();
    let mut nn = Network::with_seed(1, 1, 1, 0.1, 1).unwrap();
    assert!(matches!(nn.load(&path), Err(Error::Io(_))));
}
