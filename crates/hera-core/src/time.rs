//! Simulated time

/// Simulated time, in seconds since the start of a run.
///
/// The host scheduler owns the clock; routers only ever receive `now`
/// as an argument.
pub type SimTime = f64;
