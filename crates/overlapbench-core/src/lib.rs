//! # OverlapBench Core
//!
//! Backend-agnostic abstractions for measuring host-to-device transfer and
//! device-side compute overlap.
//!
//! The benchmark submits two independent copy+compute pipelines into an
//! asynchronous device queue. Each compute declares a dependency on the
//! transfer that populates its buffer, so the caller can join the transfer
//! alone and keep working on the host while the compute is still running.
//!
//! ## Execution Model
//!
//! ```text
//! Time →
//! Host:     [fill][wait copy 1][mutate host buf][wait copy 2][wait computes]
//! Transfer: [Copy 1          ]                 [Copy 2     ]
//! Compute:                   [Kernel over buf A...........]
//!                                                         [Kernel over buf B]
//! ```
//!
//! ## Core Abstractions
//!
//! - [`OpHandle`] - Completion handle for one asynchronous device operation
//! - [`DeviceQueue`] - Trait for backends that accept asynchronous submissions
//! - [`PinnedBuffer`] - Page-locked-semantics host allocation
//! - [`run_pipeline`] - The copy-then-dependent-compute submission protocol
//! - [`TimingReport`] - The four measured phase durations

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod device;
pub mod error;
pub mod event;
pub mod kernel;
pub mod memory;
pub mod pipeline;
pub mod report;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::device::{DeviceBuffer, DeviceQueue};
    pub use crate::error::{OverlapError, Result};
    pub use crate::event::{Completion, OpHandle, OpId, OpKind};
    pub use crate::kernel::ElementwiseKernel;
    pub use crate::memory::{HostView, PinnedBuffer};
    pub use crate::pipeline::{run_pipeline, PipelineHandles};
    pub use crate::report::TimingReport;
}

pub use device::{DeviceBuffer, DeviceQueue};
pub use error::{OverlapError, Result};
pub use event::{Completion, OpHandle, OpId, OpKind};
pub use kernel::ElementwiseKernel;
pub use memory::{HostView, PinnedBuffer};
pub use pipeline::{run_pipeline, PipelineHandles};
pub use report::TimingReport;
