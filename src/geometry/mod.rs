use na::{DVector, Vector2};

use crate::types::{Float, SimScalar};

pub mod line_line;
pub mod point_line;
pub mod point_plane;
pub mod point_point;
pub mod point_segment;
pub mod point_triangle;

pub use line_line::line_line_signed_distance;
pub use point_line::point_line_signed_distance;
pub use point_plane::{point_plane_signed_distance, point_plane_signed_distance_to_triangle};
pub use point_point::point_point_distance;
pub use point_segment::point_segment_distance;
pub use point_triangle::{point_triangle_closest_point, point_triangle_distance};

/// z-component of the 2D cross product a × b
pub(crate) fn cross2<T: SimScalar>(a: &DVector<T>, b: &DVector<T>) -> T {
    a[0] * b[1] - a[1] * b[0]
}

pub(crate) fn cross3<T: SimScalar>(a: &DVector<T>, b: &DVector<T>) -> DVector<T> {
    DVector::from_vec(vec![
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ])
}

/// Unnormalized triangle normal (t1 − t0) × (t2 − t0)
pub fn triangle_normal<T: SimScalar>(
    t0: &DVector<T>,
    t1: &DVector<T>,
    t2: &DVector<T>,
) -> DVector<T> {
    cross3(&(t1 - t0), &(t2 - t0))
}

/// Unit normal of a 2D segment: (s1 − s0) rotated 90° counterclockwise
pub fn segment_normal(s0: &Vector2<Float>, s1: &Vector2<Float>) -> Vector2<Float> {
    let e = s1 - s0;
    Vector2::new(-e.y, e.x).normalize()
}
