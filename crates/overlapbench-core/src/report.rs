//! Timing capture and reporting.

use std::fmt;
use std::time::Duration;

/// Wall-clock durations for the four measured phases of one benchmark run.
///
/// Timestamps are captured with a monotonic clock immediately around each
/// blocking wait. `host_work` spans transfer 1's wait returning to transfer
/// 2 being submitted, so it includes queue-submission overhead but no
/// device-side wait.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimingReport {
    /// Submit-to-wait-complete for pipeline 1's transfer.
    pub copy1: Duration,
    /// The host-side mutation window between the two transfers.
    pub host_work: Duration,
    /// Submit-to-wait-complete for pipeline 2's transfer.
    pub copy2: Duration,
    /// First timestamp to both computes complete.
    pub total: Duration,
}

impl TimingReport {
    /// Copy 1 duration in whole milliseconds.
    #[must_use]
    pub fn copy1_ms(&self) -> u64 {
        self.copy1.as_millis() as u64
    }

    /// Host mutation window in whole milliseconds.
    #[must_use]
    pub fn host_work_ms(&self) -> u64 {
        self.host_work.as_millis() as u64
    }

    /// Copy 2 duration in whole milliseconds.
    #[must_use]
    pub fn copy2_ms(&self) -> u64 {
        self.copy2.as_millis() as u64
    }

    /// Total execution in whole milliseconds.
    #[must_use]
    pub fn total_ms(&self) -> u64 {
        self.total.as_millis() as u64
    }

    /// Time the two copies left unaccounted for in the total.
    ///
    /// Non-zero slack is the compute tail (and host work) that the copies
    /// did not cover; the total is never less than the sum of the copies.
    #[must_use]
    pub fn slack(&self) -> Duration {
        self.total.saturating_sub(self.copy1 + self.copy2)
    }
}

impl fmt::Display for TimingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Timing Results ---")?;
        writeln!(f, "Copy 1: {} ms", self.copy1_ms())?;
        writeln!(f, "CPU stuff: {} ms", self.host_work_ms())?;
        writeln!(f, "Copy 2: {} ms", self.copy2_ms())?;
        write!(f, "Total execution: {} ms", self.total_ms())
    }
}
