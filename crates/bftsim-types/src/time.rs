//! # bftsim-types::time
//!
//! Defines the representation of time within the simulation.
//! Simulation time is continuous, measured in abstract units, and advances
//! strictly as events are popped from the master queue.

use crate::errors::RuntimeInvariantError;
use ordered_float::NotNan;

/// The fundamental unit of time in the simulation.
///
/// A plain `f64` wrapped in `NotNan` so that `SimTime` is totally ordered and
/// can live in a `BinaryHeap` key without a fallible comparison at every
/// pop. Service times, network delays, and round-trip budgets are all
/// naturally continuous quantities (exponential draws, rate-based
/// processing times), which is why this crate does not follow an
/// integer-nanosecond convention.
pub type SimTime = NotNan<f64>;

/// The start of simulation time.
pub fn sim_epoch() -> SimTime {
    st(0.0)
}

/// Constructs a `SimTime` from a plain `f64`.
///
/// # Panics
/// Panics if `value` is NaN. Every caller in this workspace derives times
/// from clock reads, rate samples, or configuration constants, none of which
/// can legitimately produce NaN.
pub fn st(value: f64) -> SimTime {
    NotNan::new(value).expect("simulation time must not be NaN")
}

/// Performs a checked addition on `SimTime`, returning an error on overflow
/// (i.e. the result becoming non-finite).
pub fn checked_add(base: SimTime, offset: SimTime) -> Result<SimTime, RuntimeInvariantError> {
    let sum = base.into_inner() + offset.into_inner();
    if !sum.is_finite() {
        return Err(RuntimeInvariantError::TimeOverflow {
            base: base.into_inner(),
            offset: offset.into_inner(),
        });
    }
    Ok(NotNan::new(sum).expect("finite sum cannot be NaN"))
}
