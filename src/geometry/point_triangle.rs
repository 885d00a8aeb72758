use na::DVector;

use crate::geometry::point_point_distance;
use crate::types::SimScalar;

/// Distance from a point to a triangle via the classical seven-region
/// classification (three vertex regions, three edge regions, interior).
/// The regional formulas agree on region boundaries, so the result does not
/// depend on which side of a tie-break a boundary point falls.
pub fn point_triangle_distance<T: SimScalar>(
    p: &DVector<T>,
    t0: &DVector<T>,
    t1: &DVector<T>,
    t2: &DVector<T>,
) -> T {
    point_point_distance(p, &point_triangle_closest_point(p, t0, t1, t2))
}

/// Closest point on a triangle to p.
/// ref: Ericson, Real-Time Collision Detection, 5.1.5
pub fn point_triangle_closest_point<T: SimScalar>(
    p: &DVector<T>,
    t0: &DVector<T>,
    t1: &DVector<T>,
    t2: &DVector<T>,
) -> DVector<T> {
    let z = T::zero();

    let ab = t1 - t0;
    let ac = t2 - t0;
    let ap = p - t0;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1.le(z) && d2.le(z) {
        return t0.clone(); // vertex region t0
    }

    let bp = p - t1;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3.ge(z) && d4.le(d3) {
        return t1.clone(); // vertex region t1
    }

    let vc = d1 * d4 - d3 * d2;
    if vc.le(z) && d1.ge(z) && d3.le(z) {
        let v = d1 / (d1 - d3);
        return t0 + ab * v; // edge region t0t1
    }

    let cp = p - t2;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6.ge(z) && d5.le(d6) {
        return t2.clone(); // vertex region t2
    }

    let vb = d5 * d2 - d1 * d6;
    if vb.le(z) && d2.ge(z) && d6.le(z) {
        let w = d2 / (d2 - d6);
        return t0 + ac * w; // edge region t0t2
    }

    let va = d3 * d6 - d5 * d4;
    if va.le(z) && (d4 - d3).ge(z) && (d5 - d6).ge(z) {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return t1 + (t2 - t1) * w; // edge region t1t2
    }

    // interior: barycentric combination
    let denom = T::one() / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    t0 + ab * v + ac * w
}
