use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_traits::{One, Zero};

use crate::error::{SimError, SimResult};
use crate::types::{Float, SimScalar};
use crate::TWO_PI;

/// A closed real interval [lo, hi] of f64 with outward-conservative
/// arithmetic: every operation returns an interval containing the exact
/// mathematical image of every point of its inputs.
///
/// Instead of switching the hardware rounding mode per operation, results are
/// computed in the default round-to-nearest mode and then widened outward by
/// one ULP per side (a few ULPs for the transcendental functions, whose
/// library implementations are not correctly rounded).
///
/// Division by an interval containing zero and square roots of negative
/// intervals are observable through [`Interval::checked_div`] and
/// [`Interval::checked_sqrt`]. The corresponding `std::ops` impls poison the
/// result with NaN instead, so interval vectors and matrices still compose
/// with the generic nalgebra operators; callers check [`Interval::has_nan`]
/// at their boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    lo: Float,
    hi: Float,
}

pub type Vector2I = na::Vector2<Interval>;
pub type Vector3I = na::Vector3<Interval>;
pub type VectorDI = na::DVector<Interval>;
pub type MatrixDI = na::DMatrix<Interval>;

impl Interval {
    pub const NAN: Interval = Interval {
        lo: Float::NAN,
        hi: Float::NAN,
    };

    /// The unit interval [0, 1]
    pub const UNIT: Interval = Interval { lo: 0.0, hi: 1.0 };

    pub fn new(lo: Float, hi: Float) -> SimResult<Interval> {
        if lo.is_nan() || hi.is_nan() {
            return Err(SimError::NaNInInterval);
        }
        if lo > hi {
            return Err(SimError::BadArithmetic("inverted interval bounds"));
        }
        Ok(Interval { lo, hi })
    }

    /// The degenerate interval [x, x]
    pub fn point(x: Float) -> Interval {
        Interval { lo: x, hi: x }
    }

    pub(crate) fn from_bounds(lo: Float, hi: Float) -> Interval {
        debug_assert!(!(lo > hi));
        Interval { lo, hi }
    }

    pub fn lower(&self) -> Float {
        self.lo
    }

    pub fn upper(&self) -> Float {
        self.hi
    }

    pub fn width(&self) -> Float {
        self.hi - self.lo
    }

    pub fn midpoint(&self) -> Float {
        0.5 * (self.lo + self.hi)
    }

    /// Split at the midpoint
    pub fn bisect(&self) -> (Interval, Interval) {
        let m = self.midpoint();
        (
            Interval::from_bounds(self.lo, m),
            Interval::from_bounds(m, self.hi),
        )
    }

    pub fn has_nan(&self) -> bool {
        self.lo.is_nan() || self.hi.is_nan()
    }

    pub fn contains(&self, x: Float) -> bool {
        self.lo <= x && x <= self.hi
    }

    pub fn contains_zero(&self) -> bool {
        self.contains(0.0)
    }

    pub fn overlap(&self, other: &Interval) -> bool {
        self.lo.max(other.lo) <= self.hi.min(other.hi)
    }

    pub fn intersect(&self, other: &Interval) -> SimResult<Interval> {
        if self.has_nan() || other.has_nan() {
            return Err(SimError::NaNInInterval);
        }
        if !self.overlap(other) {
            return Err(SimError::BadArithmetic("empty interval intersection"));
        }
        Ok(Interval::from_bounds(
            self.lo.max(other.lo),
            self.hi.min(other.hi),
        ))
    }

    /// One-ULP outward widening, the substitute for directed rounding
    fn widen(lo: Float, hi: Float) -> Interval {
        Interval {
            lo: lo.next_down(),
            hi: hi.next_up(),
        }
    }

    pub fn checked_div(self, rhs: Interval) -> SimResult<Interval> {
        if self.has_nan() || rhs.has_nan() {
            return Err(SimError::NaNInInterval);
        }
        if rhs.contains_zero() {
            return Err(SimError::BadArithmetic(
                "interval division by an interval containing zero",
            ));
        }
        let candidates = [
            self.lo / rhs.lo,
            self.lo / rhs.hi,
            self.hi / rhs.lo,
            self.hi / rhs.hi,
        ];
        if candidates.iter().any(|c| c.is_nan()) {
            return Err(SimError::NaNInInterval);
        }
        let lo = candidates.iter().fold(Float::INFINITY, |a, &b| a.min(b));
        let hi = candidates.iter().fold(Float::NEG_INFINITY, |a, &b| a.max(b));
        Ok(Interval::widen(lo, hi))
    }

    pub fn checked_sqrt(self) -> SimResult<Interval> {
        if self.has_nan() {
            return Err(SimError::NaNInInterval);
        }
        if self.hi < 0.0 {
            return Err(SimError::BadArithmetic("sqrt of a negative interval"));
        }
        let lo = self.lo.max(0.0).sqrt();
        let hi = self.hi.sqrt();
        let w = Interval::widen(lo, hi);
        Ok(Interval::from_bounds(w.lo.max(0.0), w.hi))
    }

    /// True when at + 2kπ ∈ [lo, hi] for some integer k. Biased toward
    /// inclusion so a borderline extremum still widens the result.
    fn contains_angle(&self, at: Float) -> bool {
        let k = ((self.lo - at) / TWO_PI).ceil();
        at + k * TWO_PI <= self.hi + 1e-9
    }

    pub fn sin(self) -> Interval {
        if self.has_nan() {
            return Interval::NAN;
        }
        if self.width() >= TWO_PI {
            return Interval::from_bounds(-1.0, 1.0);
        }
        let (sl, sh) = (self.lo.sin(), self.hi.sin());
        let mut lo = sl.min(sh);
        let mut hi = sl.max(sh);
        if self.contains_angle(std::f64::consts::FRAC_PI_2) {
            hi = 1.0;
        }
        if self.contains_angle(-std::f64::consts::FRAC_PI_2) {
            lo = -1.0;
        }
        // std sin is not correctly rounded, widen a little extra
        let w = Interval::widen(lo, hi);
        let w = Interval::widen(w.lo, w.hi);
        Interval::from_bounds(w.lo.max(-1.0), w.hi.min(1.0))
    }

    pub fn cos(self) -> Interval {
        if self.has_nan() {
            return Interval::NAN;
        }
        if self.width() >= TWO_PI {
            return Interval::from_bounds(-1.0, 1.0);
        }
        let (cl, ch) = (self.lo.cos(), self.hi.cos());
        let mut lo = cl.min(ch);
        let mut hi = cl.max(ch);
        if self.contains_angle(0.0) {
            hi = 1.0;
        }
        if self.contains_angle(crate::PI) {
            lo = -1.0;
        }
        let w = Interval::widen(lo, hi);
        let w = Interval::widen(w.lo, w.hi);
        Interval::from_bounds(w.lo.max(-1.0), w.hi.min(1.0))
    }
}

impl Add for Interval {
    type Output = Interval;

    fn add(self, rhs: Interval) -> Interval {
        Interval::widen(self.lo + rhs.lo, self.hi + rhs.hi)
    }
}

impl Sub for Interval {
    type Output = Interval;

    fn sub(self, rhs: Interval) -> Interval {
        Interval::widen(self.lo - rhs.hi, self.hi - rhs.lo)
    }
}

impl Neg for Interval {
    type Output = Interval;

    // negation is exact, no widening
    fn neg(self) -> Interval {
        Interval {
            lo: -self.hi,
            hi: -self.lo,
        }
    }
}

impl Mul for Interval {
    type Output = Interval;

    fn mul(self, rhs: Interval) -> Interval {
        if self.has_nan() || rhs.has_nan() {
            return Interval::NAN;
        }
        let candidates = [
            self.lo * rhs.lo,
            self.lo * rhs.hi,
            self.hi * rhs.lo,
            self.hi * rhs.hi,
        ];
        if candidates.iter().any(|c| c.is_nan()) {
            return Interval::NAN;
        }
        let lo = candidates.iter().fold(Float::INFINITY, |a, &b| a.min(b));
        let hi = candidates.iter().fold(Float::NEG_INFINITY, |a, &b| a.max(b));
        Interval::widen(lo, hi)
    }
}

impl Div for Interval {
    type Output = Interval;

    fn div(self, rhs: Interval) -> Interval {
        self.checked_div(rhs).unwrap_or(Interval::NAN)
    }
}

impl AddAssign for Interval {
    fn add_assign(&mut self, rhs: Interval) {
        *self = *self + rhs;
    }
}

impl SubAssign for Interval {
    fn sub_assign(&mut self, rhs: Interval) {
        *self = *self - rhs;
    }
}

impl MulAssign for Interval {
    fn mul_assign(&mut self, rhs: Interval) {
        *self = *self * rhs;
    }
}

impl DivAssign for Interval {
    fn div_assign(&mut self, rhs: Interval) {
        *self = *self / rhs;
    }
}

impl Zero for Interval {
    fn zero() -> Interval {
        Interval::point(0.0)
    }

    fn is_zero(&self) -> bool {
        self.lo == 0.0 && self.hi == 0.0
    }
}

impl One for Interval {
    fn one() -> Interval {
        Interval::point(1.0)
    }
}

impl SimScalar for Interval {
    fn from_float(x: Float) -> Interval {
        Interval::point(x)
    }

    fn sin(self) -> Interval {
        Interval::sin(self)
    }

    fn cos(self) -> Interval {
        Interval::cos(self)
    }

    fn sqrt(self) -> Interval {
        self.checked_sqrt().unwrap_or(Interval::NAN)
    }

    fn abs(self) -> Interval {
        if self.lo >= 0.0 {
            self
        } else if self.hi <= 0.0 {
            -self
        } else {
            Interval::from_bounds(0.0, (-self.lo).max(self.hi))
        }
    }

    // certain comparisons: true only when they hold for every point pair
    fn lt(self, rhs: Interval) -> bool {
        self.hi < rhs.lo
    }

    fn le(self, rhs: Interval) -> bool {
        self.hi <= rhs.lo
    }
}

/// True when every component of the vector contains zero
pub fn zero_in(x: &VectorDI) -> bool {
    x.iter().all(|xi| xi.contains_zero())
}

/// Componentwise interval overlap of two vectors of the same length
pub fn overlap_componentwise(a: &VectorDI, b: &VectorDI) -> bool {
    a.iter().zip(b.iter()).all(|(ai, bi)| ai.overlap(bi))
}

#[cfg(test)]
mod interval_tests {
    use rand::{rng, Rng};

    use super::*;
    use crate::error::SimError;

    #[test]
    fn arithmetic_contains_point_evaluations() {
        // Arrange
        let mut rng = rng();

        for _ in 0..1000 {
            let a = rng.random_range(-10.0..10.0);
            let b = a + rng.random_range(0.0..2.0);
            let c = rng.random_range(-10.0..10.0);
            let d = c + rng.random_range(0.0..2.0);
            let x = Interval::new(a, b).unwrap();
            let y = Interval::new(c, d).unwrap();

            // Act: sample point evaluations inside the operand intervals
            let t = rng.random_range(0.0..=1.0);
            let s = rng.random_range(0.0..=1.0);
            let px = a + t * (b - a);
            let py = c + s * (d - c);

            // Assert
            assert!((x + y).contains(px + py));
            assert!((x - y).contains(px - py));
            assert!((x * y).contains(px * py));
            assert!(x.sin().contains(px.sin()));
            assert!(x.cos().contains(px.cos()));
            if !y.contains_zero() {
                assert!(y.checked_div(y).unwrap().contains(1.0));
                assert!((x / y).contains(px / py));
            }
        }
    }

    #[test]
    fn division_by_interval_containing_zero_fails() {
        let x = Interval::new(1.0, 2.0).unwrap();
        let y = Interval::new(-1.0, 1.0).unwrap();
        assert!(matches!(
            x.checked_div(y),
            Err(SimError::BadArithmetic(_))
        ));
        // the operator form poisons instead
        assert!((x / y).has_nan());
    }

    #[test]
    fn sqrt_of_negative_interval_fails() {
        let x = Interval::new(-4.0, -1.0).unwrap();
        assert!(matches!(x.checked_sqrt(), Err(SimError::BadArithmetic(_))));

        // an interval straddling zero clamps instead of failing
        let y = Interval::new(-1e-12, 4.0).unwrap();
        let r = y.checked_sqrt().unwrap();
        assert!(r.lower() >= 0.0);
        assert!(r.contains(2.0));
    }

    #[test]
    fn nan_input_is_rejected() {
        assert!(matches!(
            Interval::new(Float::NAN, 1.0),
            Err(SimError::NaNInInterval)
        ));
        assert!(matches!(
            Interval::point(Float::NAN).checked_sqrt(),
            Err(SimError::NaNInInterval)
        ));
    }

    #[test]
    fn sin_enclosure_includes_interior_extrema() {
        // [0, π] crosses the maximum of sin at π/2
        let x = Interval::new(0.0, crate::PI).unwrap();
        let s = x.sin();
        assert!(s.contains(1.0));
        assert!(s.lower() <= 1e-9);

        // [π/4, π/3] has no extremum, enclosure stays tight
        let y = Interval::new(crate::PI / 4.0, crate::PI / 3.0).unwrap();
        let sy = y.sin();
        assert!(sy.contains((crate::PI / 4.0).sin()));
        assert!(sy.contains((crate::PI / 3.0).sin()));
        assert!(sy.width() < 0.2);
    }

    #[test]
    fn cos_enclosure_includes_interior_extrema() {
        // [-π/4, π/4] crosses the maximum of cos at 0
        let x = Interval::new(-crate::PI / 4.0, crate::PI / 4.0).unwrap();
        let c = x.cos();
        assert!(c.contains(1.0));

        // [π/2, 3π/2] crosses the minimum at π
        let y = Interval::new(crate::PI / 2.0, 3.0 * crate::PI / 2.0).unwrap();
        assert!(y.cos().contains(-1.0));
    }

    #[test]
    fn overlap_and_intersect() {
        let x = Interval::new(0.0, 1.0).unwrap();
        let y = Interval::new(0.5, 2.0).unwrap();
        let z = Interval::new(1.5, 2.0).unwrap();

        assert!(x.overlap(&y));
        assert!(!x.overlap(&z));

        let xy = x.intersect(&y).unwrap();
        assert_eq!(xy.lower(), 0.5);
        assert_eq!(xy.upper(), 1.0);
        assert!(x.intersect(&z).is_err());

        // touching at a point still counts as overlap
        let w = Interval::new(1.0, 3.0).unwrap();
        assert!(x.overlap(&w));
    }

    #[test]
    fn certain_ordering() {
        let x = Interval::new(0.0, 1.0).unwrap();
        let y = Interval::new(2.0, 3.0).unwrap();
        let z = Interval::new(0.5, 2.5).unwrap();

        assert!(x.lt(y));
        assert!(!y.lt(x));
        // overlapping intervals compare as neither
        assert!(!x.lt(z));
        assert!(!z.lt(x));
    }

    #[test]
    fn interval_vectors_compose_with_nalgebra() {
        // Arrange: a rotation-like interval matrix times a vector
        let v = VectorDI::from_vec(vec![
            Interval::point(1.0),
            Interval::point(2.0),
        ]);

        // Act
        let d = v.dot(&v);

        // Assert
        assert!(d.contains(5.0));
        assert!(zero_in(&(v.clone() - v)));
    }
}
