//! Decision function (omega)
//!
//! `omega(v) = sum_h gamma[h] * v[h]`: a single scalar estimate of how
//! likely a holder is to eventually deliver to a destination. With all
//! `gamma[h] >= 0` (enforced by configuration) it is monotone
//! non-decreasing in every component of `v`.

use crate::hop_vector::HopVector;

/// Weighted sum of a hop vector
///
/// A missing entry is the zero vector, so callers pass `None` for
/// destinations they have never tracked.
pub fn omega(entry: Option<&HopVector>, gamma: &HopVector) -> f64 {
    entry.map(|v| v.dot(gamma)).unwrap_or(0.0)
}
