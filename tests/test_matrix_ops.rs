// Tests for the dense matrix engine: products, transposes, element-wise
// arithmetic and their error cases.

use approx::assert_relative_eq;
use digit_net::{Error, Matrix};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> Matrix {
    let mut m = Matrix::new(rows, cols).unwrap();
    m.randomize(rng);
    m
}

#[test]
fn test_multiply_by_identity() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..20 {
        let rows = rng.gen_range(1..6);
        let cols = rng.gen_range(1..6);
        let a = random_matrix(&mut rng, rows, cols);
        let i = Matrix::identity(cols).unwrap();
        assert_eq!(a.multiply(&i).unwrap(), a);
    }
}

#[test]
fn test_double_transpose() {
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..20 {
        let rows = rng.gen_range(1..8);
        let cols = rng.gen_range(1..8);
        let a = random_matrix(&mut rng, rows, cols);
        assert_eq!(a.transpose().transpose(), a);
    }
}

#[test]
fn test_mismatched_multiply_always_fails() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..50 {
        let m = rng.gen_range(1..6);
        let n = rng.gen_range(1..6);
        let mut k = rng.gen_range(1..6);
        if k == n {
            k += 1;
        }
        let a = Matrix::new(m, n).unwrap();
        let b = Matrix::new(k, m).unwrap();
        assert!(matches!(a.multiply(&b), Err(Error::Dimension { .. })));
    }
}

#[test]
fn test_add_then_subtract() {
    let mut rng = StdRng::seed_from_u64(4);
    let a = random_matrix(&mut rng, 4, 3);
    let b = random_matrix(&mut rng, 4, 3);
    let back = a.add(&b).unwrap().subtract(&b).unwrap();
    for (x, y) in back.as_slice().iter().zip(a.as_slice()) {
        assert_relative_eq!(*x, *y, epsilon = 1e-12);
    }
}

#[test]
fn test_add_dimension_mismatch() {
    let a = Matrix::new(2, 3).unwrap();
    let b = Matrix::new(3, 2).unwrap();
    assert!(matches!(a.add(&b), Err(Error::Dimension { .. })));
    assert!(matches!(a.subtract(&b), Err(Error::Dimension { .. })));
}

#[test]
fn test_known_product() {
    let mut a = Matrix::new(3, 2).unwrap();
    a.set(0, 0, 5.0).unwrap();
    a.set(0, 1, 6.0).unwrap();
    a.set(1, 0, 7.0).unwrap();
    a.set(1, 1, 8.0).unwrap();
    a.set(2, 0, 9.0).unwrap();
    a.set(2, 1, 10.0).unwrap();
    let b = Matrix::square(vec![1.0, 2.0, 3.0, 4.0]).unwrap();

    let c = a.multiply(&b).unwrap();
    let expected = [[23.0, 34.0], [31.0, 46.0], [39.0, 58.0]];
    for (i, row) in expected.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            assert_eq!(c.get(i, j).unwrap(), v);
        }
    }
}

#[test]
fn test_product_summation_order() {
    // 1e16 + 1 - 1e16 loses the 1 when summed left to right
    let a = Matrix::from_vec(1, 3, vec![1e16, 1.0, -1e16]).unwrap();
    let b = Matrix::from_vec(3, 1, vec![1.0, 1.0, 1.0]).unwrap();
    assert_eq!(a.multiply(&b).unwrap().get(0, 0).unwrap(), 0.0);
}

#[test]
fn test_operators_do_not_alias() {
    let a = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let mut t = a.transpose();
    t.set(0, 1, 100.0).unwrap();
    assert_eq!(a.get(1, 0).unwrap(), 3.0);

    let mut scaled = a.scalar_multiply(1.0);
    scaled.set(0, 0, -1.0).unwrap();
    assert_eq!(a.get(0, 0).unwrap(), 1.0);
}

#[test]
fn test_vector_length_of_cost_column() {
    let v = Matrix::from_vec(4, 1, vec![1.0, 1.0, 1.0, 1.0]).unwrap();
    assert_relative_eq!(v.vector_length().unwrap(), 2.0);
    assert!(matches!(
        Matrix::new(2, 2).unwrap().vector_length(),
        Err(Error::Shape { .. })
    ));
}
