use na::DVector;

use crate::geometry::point_point_distance;
use crate::types::SimScalar;

/// Distance from a point to a segment: the projection onto the segment is
/// clamped to [0, 1] before measuring.
pub fn point_segment_distance<T: SimScalar>(
    p: &DVector<T>,
    s0: &DVector<T>,
    s1: &DVector<T>,
) -> T {
    let e = s1 - s0;
    let len2 = e.dot(&e);
    if len2.le(T::zero()) {
        // degenerate segment
        return point_point_distance(p, s0);
    }

    let mut alpha = (p - s0).dot(&e) / len2;
    if alpha.lt(T::zero()) {
        alpha = T::zero();
    } else if T::one().lt(alpha) {
        alpha = T::one();
    }

    let closest = s0 + e * alpha;
    point_point_distance(p, &closest)
}
