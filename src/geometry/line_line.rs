use na::DVector;

use crate::geometry::cross3;
use crate::types::SimScalar;

/// Signed distance between two 3D lines along their common normal
/// n = (a1 − a0) × (b1 − b0): positive when line A sits on the side of
/// line B the normal points into.
pub fn line_line_signed_distance<T: SimScalar>(
    a0: &DVector<T>,
    a1: &DVector<T>,
    b0: &DVector<T>,
    b1: &DVector<T>,
) -> T {
    let n = cross3(&(a1 - a0), &(b1 - b0));
    (a0 - b0).dot(&n) / n.dot(&n).sqrt()
}
