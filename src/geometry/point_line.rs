use na::DVector;

use crate::geometry::cross2;
use crate::types::SimScalar;

/// Signed distance from a 2D point to the infinite line through s0 and s1.
/// The sign follows the orientation of (s1 − s0): positive on the
/// counterclockwise side.
pub fn point_line_signed_distance<T: SimScalar>(
    p: &DVector<T>,
    s0: &DVector<T>,
    s1: &DVector<T>,
) -> T {
    let e = s1 - s0;
    cross2(&e, &(p - s0)) / e.dot(&e).sqrt()
}
