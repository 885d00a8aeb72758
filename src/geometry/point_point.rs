use na::DVector;

use crate::types::SimScalar;

/// Euclidean distance between two points
pub fn point_point_distance<T: SimScalar>(p: &DVector<T>, q: &DVector<T>) -> T {
    let d = p - q;
    d.dot(&d).sqrt()
}

#[cfg(test)]
mod point_point_tests {
    use na::dvector;

    use super::*;
    use crate::assert_close;
    use crate::types::Float;

    #[test]
    fn distance_along_axis_and_diagonal() {
        for dim in [2usize, 3] {
            for expected in [-10.0, -1.0, -1e-12, 0.0, 1e-12, 1.0, 10.0] {
                // aligned with the x-axis
                let p0: DVector<Float> = DVector::zeros(dim);
                let mut p1: DVector<Float> = DVector::zeros(dim);
                p1[0] = expected;
                assert_close!(
                    point_point_distance(&p0, &p1),
                    Float::abs(expected),
                    1e-12
                );

                // along the unit diagonal
                let diag = DVector::from_element(dim, 1.0).normalize() * expected;
                assert_close!(
                    point_point_distance(&p0, &diag),
                    Float::abs(expected),
                    1e-12
                );
            }
        }
    }

    #[test]
    fn interval_distance_contains_float_distance() {
        use crate::interval::Interval;

        let p = dvector![Interval::point(0.0), Interval::point(0.0)];
        let q = dvector![
            Interval::new(1.0, 1.1).unwrap(),
            Interval::new(2.0, 2.1).unwrap()
        ];
        let d = point_point_distance(&p, &q);
        assert!(d.contains((1.0f64 * 1.0 + 2.0 * 2.0).sqrt()));
        assert!(d.contains((1.1f64 * 1.1 + 2.1 * 2.1).sqrt()));
    }
}
