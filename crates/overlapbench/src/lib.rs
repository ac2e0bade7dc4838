//! # OverlapBench
//!
//! Micro-benchmark measuring overlap between host-to-device transfer and
//! device-side compute, using asynchronous operations with explicit
//! dependency chaining.
//!
//! Two independent copy+compute pipelines are issued into one device queue.
//! Each compute declares a dependency on the transfer that populates its
//! buffer; the controlling task joins only the transfers, so pipeline 1's
//! compute keeps running on the device while the host mutates its buffer and
//! feeds pipeline 2. The four phase timings are printed once.
//!
//! ```ignore
//! use overlapbench::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let queue = DeviceBuilder::new().backend(Backend::Auto).build().await?;
//!     println!("Running on {}", queue.device_name());
//!
//!     let run = run_benchmark(queue.as_ref(), DATA_SIZE, ElementwiseKernel::new(1.0, KERNEL_ITERS)).await?;
//!     println!("{}", run.report);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bench;

pub use bench::{run_benchmark, BenchRun, DATA_SIZE, KERNEL_ITERS, MUTATION_STRIDE};

// Re-export core types
pub use overlapbench_core::{
    run_pipeline, DeviceBuffer, DeviceQueue, ElementwiseKernel, HostView, OpHandle, OpId, OpKind,
    OverlapError, PinnedBuffer, PipelineHandles, Result, TimingReport,
};

// Re-export the CPU backend (always available)
pub use overlapbench_cpu::CpuDevice;

use std::sync::Arc;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bench::{run_benchmark, BenchRun, DATA_SIZE, KERNEL_ITERS, MUTATION_STRIDE};
    pub use crate::{Backend, DeviceBuilder};
    pub use overlapbench_core::prelude::*;
    pub use overlapbench_cpu::CpuDevice;
}

/// Device backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Prefer the highest-throughput parallel device available.
    Auto,
    /// The CPU-simulated device (always available).
    Cpu,
    /// NVIDIA GPUs (requires the `cuda` feature; not built in this version).
    Cuda,
}

/// Builder that selects an accelerator and produces its execution queue.
///
/// Selection is fatal-on-failure: if the requested backend is not available
/// the build returns [`OverlapError::DeviceUnavailable`] and nothing is
/// allocated.
#[derive(Debug, Clone)]
pub struct DeviceBuilder {
    backend: Backend,
}

impl DeviceBuilder {
    /// Create a builder with automatic backend selection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            backend: Backend::Auto,
        }
    }

    /// Set the backend.
    #[must_use]
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Build the device queue.
    pub async fn build(self) -> Result<Arc<dyn DeviceQueue>> {
        match self.backend {
            Backend::Auto => {
                // No accelerator backend is compiled in, so auto-selection
                // lands on the simulator.
                tracing::info!("auto-selected CPU-simulated device");
                Ok(Arc::new(CpuDevice::new().await?))
            }
            Backend::Cpu => Ok(Arc::new(CpuDevice::new().await?)),
            Backend::Cuda => Err(OverlapError::DeviceUnavailable(
                "CUDA backend not enabled in this build".to_string(),
            )),
        }
    }
}

impl Default for DeviceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
