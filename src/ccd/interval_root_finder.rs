use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use tracing::warn;

use crate::error::{SimError, SimResult};
use crate::interval::Interval;
use crate::types::Float;

/// Tolerances and work limits for the conservative bisection search
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootFinderOptions {
    /// Accept a candidate once its time width is below this
    pub tol_t: Float,
    /// Accept a candidate once the distance enclosure is this thin
    pub tol_d: Float,
    /// Bisection depth cap; a candidate that reaches it is accepted as-is
    pub max_depth: usize,
}

impl Default for RootFinderOptions {
    fn default() -> Self {
        RootFinderOptions {
            tol_t: 1e-6,
            tol_d: 10.0 * Float::EPSILON,
            max_depth: 64,
        }
    }
}

/// Candidate sub-interval ordered so the earliest lower bound pops first
struct Candidate {
    interval: Interval,
    depth: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed: BinaryHeap is a max-heap, we want the smallest lower bound
        let key = |c: &Candidate| {
            (
                OrderedFloat(c.interval.lower()),
                OrderedFloat(c.interval.upper()),
            )
        };
        key(other).cmp(&key(self))
    }
}

/// Conservative earliest-root search over an interval of time.
///
/// `distance` must enclose the signed distance over any sub-interval of
/// time; `constraint` is the parametric containment witness that must also
/// hold at a true impact. Returns the first sub-interval (by lower bound)
/// that cannot be excluded and is thinner than the tolerances, or `None`
/// when the whole span is excluded. Because a sub-interval is only discarded
/// when its distance enclosure excludes zero entirely, no root is missed;
/// ties at the boundary are kept, so the answer errs toward reporting an
/// impact.
///
/// Numerical failures inside the closures (`BadArithmetic`,
/// `NaNInInterval`) mark the sub-interval inconclusive: it is kept and
/// bisected further. A failure on a point interval cannot be refined any
/// more and surfaces as `DegenerateTopology`.
pub fn interval_root_finder<D, C>(
    mut distance: D,
    mut constraint: C,
    t_span: Interval,
    options: &RootFinderOptions,
) -> SimResult<Option<Interval>>
where
    D: FnMut(Interval) -> SimResult<Interval>,
    C: FnMut(Interval) -> SimResult<bool>,
{
    let mut queue = BinaryHeap::new();
    queue.push(Candidate {
        interval: t_span,
        depth: 0,
    });

    while let Some(Candidate { interval: ti, depth }) = queue.pop() {
        match evaluate(&mut distance, &mut constraint, ti, options) {
            Ok(Evaluation::Excluded) => continue,
            Ok(Evaluation::Converged) => return Ok(Some(ti)),
            // still a possible root: bisect below
            Ok(Evaluation::Refine) => {}
            // inconclusive arithmetic: keep the sub-interval and refine it,
            // unless it cannot be refined any further
            Err(SimError::BadArithmetic(_)) | Err(SimError::NaNInInterval) => {
                if ti.width() == 0.0 {
                    return Err(SimError::DegenerateTopology(format!(
                        "contact predicates are undefined at t = {}",
                        ti.lower()
                    )));
                }
            }
            Err(e) => return Err(e),
        }

        if depth >= options.max_depth {
            warn!(
                toi = ti.lower(),
                depth, "bisection depth cap reached, returning unresolved candidate"
            );
            return Ok(Some(ti));
        }

        let (left, right) = ti.bisect();
        queue.push(Candidate {
            interval: left,
            depth: depth + 1,
        });
        queue.push(Candidate {
            interval: right,
            depth: depth + 1,
        });
    }

    Ok(None)
}

enum Evaluation {
    /// The distance enclosure excludes zero, or the containment witness
    /// certainly fails: no root in this sub-interval
    Excluded,
    /// Possible root and the sub-interval is within tolerance
    Converged,
    /// Possible root but still too wide
    Refine,
}

fn evaluate<D, C>(
    distance: &mut D,
    constraint: &mut C,
    ti: Interval,
    options: &RootFinderOptions,
) -> SimResult<Evaluation>
where
    D: FnMut(Interval) -> SimResult<Interval>,
    C: FnMut(Interval) -> SimResult<bool>,
{
    let d = distance(ti)?;
    if d.has_nan() {
        return Err(SimError::NaNInInterval);
    }
    if !d.contains_zero() {
        return Ok(Evaluation::Excluded);
    }
    if !constraint(ti)? {
        return Ok(Evaluation::Excluded);
    }
    if ti.width() <= options.tol_t || d.width() <= options.tol_d {
        return Ok(Evaluation::Converged);
    }
    Ok(Evaluation::Refine)
}
