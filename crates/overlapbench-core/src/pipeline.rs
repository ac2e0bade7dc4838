//! The copy-then-dependent-compute submission protocol.

use std::sync::Arc;

use tracing::debug;

use crate::device::{DeviceBuffer, DeviceQueue};
use crate::error::Result;
use crate::event::OpHandle;
use crate::kernel::ElementwiseKernel;
use crate::memory::HostView;

/// Handles for one pipeline's two operations.
///
/// The split is the point of the exercise: joining `transfer` alone lets the
/// caller reuse the host buffer (or feed a second pipeline) while `compute`
/// is still running on the device.
#[derive(Debug, Clone)]
pub struct PipelineHandles {
    /// The host-to-device copy.
    pub transfer: OpHandle,
    /// The kernel that depends on the copy.
    pub compute: OpHandle,
}

impl PipelineHandles {
    /// Join both operations, transfer first.
    pub async fn join(&self) -> Result<()> {
        self.transfer.wait().await?;
        self.compute.wait().await
    }
}

/// Submit one copy+compute pipeline without blocking on either operation.
///
/// Submits an asynchronous transfer of `src` into `dst`, then submits the
/// kernel over `dst` with an explicit dependency on the transfer handle.
/// The dependency registration is what guarantees the kernel reads only
/// fully-transferred data; nothing here waits.
pub fn run_pipeline(
    queue: &dyn DeviceQueue,
    dst: &Arc<dyn DeviceBuffer>,
    src: HostView<f64>,
    kernel: ElementwiseKernel,
) -> Result<PipelineHandles> {
    let transfer = queue.copy_to_device(dst, src, &[])?;
    let compute = queue.launch(dst, kernel, std::slice::from_ref(&transfer))?;

    debug!(
        transfer = %transfer.id(),
        compute = %compute.id(),
        elements = src.len(),
        "pipeline submitted"
    );

    Ok(PipelineHandles { transfer, compute })
}
