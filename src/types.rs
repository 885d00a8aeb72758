use simba::scalar::{ClosedAddAssign, ClosedDivAssign, ClosedMulAssign, ClosedNeg, ClosedSubAssign};
use num_traits::{One, Zero};

pub type Float = f64;

/// Scalar the geometry and pose routines are generic over, so the same code
/// evaluates with `Float` (production), `Interval` (conservative enclosures
/// for the root finder) and `Dual` (forward-mode derivative checks).
///
/// The comparison methods are *certain* comparisons: for intervals they hold
/// only when every point of one operand relates to every point of the other.
pub trait SimScalar:
    na::Scalar
    + Copy
    + ClosedAddAssign
    + ClosedSubAssign
    + ClosedMulAssign
    + ClosedDivAssign
    + ClosedNeg
    + Zero
    + One
{
    fn from_float(x: Float) -> Self;

    fn sin(self) -> Self;
    fn cos(self) -> Self;
    fn sqrt(self) -> Self;
    fn abs(self) -> Self;

    fn lt(self, rhs: Self) -> bool;
    fn le(self, rhs: Self) -> bool;

    fn gt(self, rhs: Self) -> bool {
        rhs.lt(self)
    }
    fn ge(self, rhs: Self) -> bool {
        rhs.le(self)
    }
}

impl SimScalar for Float {
    fn from_float(x: Float) -> Self {
        x
    }

    fn sin(self) -> Self {
        f64::sin(self)
    }

    fn cos(self) -> Self {
        f64::cos(self)
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn abs(self) -> Self {
        f64::abs(self)
    }

    fn lt(self, rhs: Self) -> bool {
        self < rhs
    }

    fn le(self, rhs: Self) -> bool {
        self <= rhs
    }
}
