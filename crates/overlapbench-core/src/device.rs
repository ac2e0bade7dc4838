//! Device and queue abstractions.
//!
//! A [`DeviceQueue`] accepts asynchronous submissions and hands back an
//! [`OpHandle`] immediately. Operations are issued in submission order;
//! completion order is governed by declared dependencies and backend
//! scheduling, not issue order.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::event::OpHandle;
use crate::kernel::ElementwiseKernel;
use crate::memory::HostView;

/// A device-resident flat buffer of `f64` values.
pub trait DeviceBuffer: Send + Sync {
    /// Number of elements.
    fn len(&self) -> usize;

    /// Check if empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size in bytes.
    fn size_bytes(&self) -> usize {
        self.len() * std::mem::size_of::<f64>()
    }

    /// Synchronously read the buffer back into host memory.
    ///
    /// Used for verification; callers should synchronize the queue first.
    fn copy_to_host(&self, out: &mut [f64]) -> Result<()>;

    /// Downcast support for backends.
    fn as_any(&self) -> &dyn Any;
}

/// An execution queue on a selected accelerator.
///
/// Submission methods never block: they enqueue the operation and return a
/// handle the caller can wait on or pass as a dependency. They must be
/// called from within a Tokio runtime.
#[async_trait]
pub trait DeviceQueue: Send + Sync {
    /// Human-readable identity of the underlying device.
    fn device_name(&self) -> &str;

    /// Allocate an uninitialized device buffer of `len` elements.
    fn alloc(&self, len: usize) -> Result<Arc<dyn DeviceBuffer>>;

    /// Submit an asynchronous host-to-device copy of `src` into `dst`.
    ///
    /// The copy begins only after every handle in `deps` has completed.
    fn copy_to_device(
        &self,
        dst: &Arc<dyn DeviceBuffer>,
        src: HostView<f64>,
        deps: &[OpHandle],
    ) -> Result<OpHandle>;

    /// Submit an asynchronous elementwise kernel over `buf`.
    ///
    /// The kernel begins only after every handle in `deps` has completed.
    /// This is the dependency edge that guarantees a compute reads only
    /// fully-transferred data without forcing the caller to block.
    fn launch(
        &self,
        buf: &Arc<dyn DeviceBuffer>,
        kernel: ElementwiseKernel,
        deps: &[OpHandle],
    ) -> Result<OpHandle>;

    /// Wait for every operation submitted so far to complete.
    async fn synchronize(&self) -> Result<()>;
}
