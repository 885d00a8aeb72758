use thiserror::Error;

pub type SimResult<T> = Result<T, SimError>;

/// Error kinds surfaced by the collision core.
///
/// Numerical errors (`BadArithmetic`, `NaNInInterval`) raised inside
/// time-of-impact closures are caught at the root-finder boundary and turned
/// into further bisection; validation errors propagate to the caller.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SimError {
    /// Degenerate or misaligned input rejected at construction.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Interval division by an interval containing zero, or square root of a
    /// negative interval.
    #[error("bad arithmetic: {0}")]
    BadArithmetic(&'static str),

    /// A NaN entered interval arithmetic.
    #[error("NaN in interval arithmetic")]
    NaNInInterval,

    /// Zero-length edge or zero-area face at a point in time, so the contact
    /// predicates cannot be evaluated at all.
    #[error("degenerate topology: {0}")]
    DegenerateTopology(String),

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}
