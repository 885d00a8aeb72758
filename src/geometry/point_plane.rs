use na::DVector;

use crate::geometry::triangle_normal;
use crate::types::SimScalar;

/// Signed distance from a point to the plane through `origin` with the given
/// (not necessarily unit) normal: (p − origin)·n / ‖n‖
pub fn point_plane_signed_distance<T: SimScalar>(
    p: &DVector<T>,
    origin: &DVector<T>,
    normal: &DVector<T>,
) -> T {
    (p - origin).dot(normal) / normal.dot(normal).sqrt()
}

/// Signed distance to the plane spanned by a triangle; positive on the side
/// the right-handed normal (t1 − t0) × (t2 − t0) points into
pub fn point_plane_signed_distance_to_triangle<T: SimScalar>(
    p: &DVector<T>,
    t0: &DVector<T>,
    t1: &DVector<T>,
    t2: &DVector<T>,
) -> T {
    let n = triangle_normal(t0, t1, t2);
    point_plane_signed_distance(p, t0, &n)
}
