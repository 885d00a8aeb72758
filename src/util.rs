use na::{DMatrix, DVector};

use crate::types::Float;

/// Assert two scalars are within tol of each other
#[macro_export]
macro_rules! assert_close {
    ($a:expr, $b:expr, $tol:expr) => {{
        let (a, b, tol) = ($a, $b, $tol);
        assert!(
            (a - b).abs() < tol,
            "{} != {} (tolerance {})",
            a,
            b,
            tol
        );
    }};
}

/// Assert two vectors/matrices are componentwise within tol of each other
#[macro_export]
macro_rules! assert_vec_close {
    ($a:expr, $b:expr, $tol:expr) => {{
        let (a, b, tol) = (&$a, &$b, $tol);
        assert_eq!(a.len(), b.len(), "lengths differ: {} vs {}", a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < tol, "{} != {} (tolerance {})", x, y, tol);
        }
    }};
}

/// Flatten a |V| x dim matrix into a vector ordered x0, x1, ..., y0, y1, ...
/// (column-major, matching the Jacobian row layout).
pub fn flatten(m: &DMatrix<Float>) -> DVector<Float> {
    DVector::from_column_slice(m.as_slice())
}

#[cfg(test)]
pub mod test_utils {
    use na::DVector;
    use rand::rngs::ThreadRng;
    use rand::Rng;

    use crate::types::Float;

    pub fn random_vector(rng: &mut ThreadRng, dim: usize, scale: Float) -> DVector<Float> {
        DVector::from_fn(dim, |_, _| rng.random_range(-scale..scale))
    }
}
