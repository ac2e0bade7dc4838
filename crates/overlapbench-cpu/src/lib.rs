//! CPU-simulated device backend.
//!
//! Executes submitted operations on blocking worker tasks, honoring declared
//! dependencies. Primarily used for testing the asynchronous ordering
//! protocol deterministically and as a fallback when no accelerator is
//! available: every submission is recorded in an [`OpLog`], so tests can
//! assert that a compute never started before the transfer that populated
//! its buffer had finished.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod device;
mod oplog;

pub use device::{CpuBuffer, CpuDevice};
pub use oplog::{OpLog, OpPhase, OpRecord};
