//! Single-flight gate: at most one mutating operation per session at a time.

use crate::error::{StudioError, StudioResult};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct SingleFlight {
    busy: AtomicBool,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the gate for `operation`, or fails with [`StudioError::Busy`] if taken.
    /// The gate reopens when the returned permit drops.
    pub fn try_begin(&self, operation: &str) -> StudioResult<FlightPermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                tracing::debug!(target: "fitroom::session", operation, "rejected: another operation is in flight");
                StudioError::Busy(operation.to_string())
            })?;
        Ok(FlightPermit { gate: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

#[must_use = "the gate reopens as soon as the permit is dropped"]
#[derive(Debug)]
pub struct FlightPermit<'a> {
    gate: &'a SingleFlight,
}

impl Drop for FlightPermit<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}
