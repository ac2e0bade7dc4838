//! Simulated device, queue, and buffers.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use overlapbench_core::device::{DeviceBuffer, DeviceQueue};
use overlapbench_core::error::{OverlapError, Result};
use overlapbench_core::event::{OpHandle, OpKind};
use overlapbench_core::kernel::ElementwiseKernel;
use overlapbench_core::memory::HostView;

use crate::oplog::{OpLog, OpPhase};

type Shared = Arc<RwLock<Box<[f64]>>>;

/// Device-resident buffer of the simulated device.
///
/// "Device-resident" here is ordinary host memory behind a lock; transfers
/// into it are real memcpys so their duration is measurable.
pub struct CpuBuffer {
    len: usize,
    data: Shared,
}

impl DeviceBuffer for CpuBuffer {
    fn len(&self) -> usize {
        self.len
    }

    fn copy_to_host(&self, out: &mut [f64]) -> Result<()> {
        let data = self.data.read();
        if out.len() != data.len() {
            return Err(OverlapError::InvalidConfig(format!(
                "readback slice has {} elements, device buffer {}",
                out.len(),
                data.len()
            )));
        }
        out.copy_from_slice(&data);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// CPU-simulated accelerator with one asynchronous execution queue.
///
/// Each submission spawns a task that first awaits every declared
/// dependency, then runs the actual work on the blocking thread pool, then
/// resolves the operation's handle. The lifecycle of every operation is
/// appended to an [`OpLog`] so ordering is testable deterministically.
pub struct CpuDevice {
    name: String,
    log: Arc<OpLog>,
    pending: Mutex<Vec<OpHandle>>,
    runtime: tokio::runtime::Handle,
}

impl CpuDevice {
    /// Create a new simulated device.
    ///
    /// Must be called from within a Tokio runtime; submitted work runs on
    /// that runtime's blocking pool.
    pub async fn new() -> Result<Self> {
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let name = format!("Simulated CPU accelerator ({threads} threads)");

        info!(device = %name, "initializing CPU device");

        Ok(Self {
            name,
            log: Arc::new(OpLog::new()),
            pending: Mutex::new(Vec::new()),
            runtime: tokio::runtime::Handle::current(),
        })
    }

    /// The device's operation log.
    pub fn op_log(&self) -> Arc<OpLog> {
        Arc::clone(&self.log)
    }

    fn cpu_data(&self, buf: &Arc<dyn DeviceBuffer>) -> Result<Shared> {
        buf.as_any()
            .downcast_ref::<CpuBuffer>()
            .map(|b| Arc::clone(&b.data))
            .ok_or_else(|| {
                OverlapError::InvalidConfig(
                    "device buffer was not allocated by this backend".to_string(),
                )
            })
    }

    /// Enqueue one operation: await `deps`, run `work` on the blocking
    /// pool, resolve the handle. Returns immediately.
    fn submit<F>(&self, kind: OpKind, deps: &[OpHandle], work: F) -> OpHandle
    where
        F: FnOnce() -> std::result::Result<(), String> + Send + 'static,
    {
        let (handle, completion) = OpHandle::channel(kind);
        let id = handle.id();

        self.log.record(
            id,
            kind,
            OpPhase::Submitted {
                deps: deps.iter().map(OpHandle::id).collect(),
            },
        );
        debug!(op = %id, kind = ?kind, deps = deps.len(), "operation submitted");

        let deps: Vec<OpHandle> = deps.to_vec();
        let log = Arc::clone(&self.log);
        self.runtime.spawn(async move {
            for dep in &deps {
                if dep.wait().await.is_err() {
                    debug!(op = %id, dep = %dep.id(), "dependency failed, skipping operation");
                    log.record(id, kind, OpPhase::Failed);
                    completion.fail_dependency(dep.id());
                    return;
                }
            }

            log.record(id, kind, OpPhase::Started);
            match tokio::task::spawn_blocking(work).await {
                Ok(Ok(())) => {
                    log.record(id, kind, OpPhase::Finished);
                    debug!(op = %id, "operation finished");
                    completion.finish();
                }
                Ok(Err(reason)) => {
                    log.record(id, kind, OpPhase::Failed);
                    completion.fail(reason);
                }
                Err(join_err) => {
                    log.record(id, kind, OpPhase::Failed);
                    completion.fail(format!("worker panicked: {join_err}"));
                }
            }
        });

        self.pending.lock().push(handle.clone());
        handle
    }
}

#[async_trait]
impl DeviceQueue for CpuDevice {
    fn device_name(&self) -> &str {
        &self.name
    }

    fn alloc(&self, len: usize) -> Result<Arc<dyn DeviceBuffer>> {
        if len == 0 {
            return Err(OverlapError::InvalidConfig(
                "cannot allocate zero-sized device buffer".to_string(),
            ));
        }
        let requested = len
            .checked_mul(std::mem::size_of::<f64>())
            .ok_or(OverlapError::OutOfMemory {
                requested: usize::MAX,
            })?;

        debug!(elements = len, bytes = requested, "allocating device buffer");

        Ok(Arc::new(CpuBuffer {
            len,
            data: Arc::new(RwLock::new(vec![0.0; len].into_boxed_slice())),
        }))
    }

    fn copy_to_device(
        &self,
        dst: &Arc<dyn DeviceBuffer>,
        src: HostView<f64>,
        deps: &[OpHandle],
    ) -> Result<OpHandle> {
        let data = self.cpu_data(dst)?;
        Ok(self.submit(OpKind::Transfer, deps, move || {
            let mut guard = data.write();
            if guard.len() != src.len() {
                return Err(format!(
                    "length mismatch: host has {} elements, device buffer {}",
                    src.len(),
                    guard.len()
                ));
            }
            guard.copy_from_slice(src.as_slice());
            Ok(())
        }))
    }

    fn launch(
        &self,
        buf: &Arc<dyn DeviceBuffer>,
        kernel: ElementwiseKernel,
        deps: &[OpHandle],
    ) -> Result<OpHandle> {
        let data = self.cpu_data(buf)?;
        Ok(self.submit(OpKind::Compute, deps, move || {
            kernel.apply_slice(&mut data.write());
            Ok(())
        }))
    }

    async fn synchronize(&self) -> Result<()> {
        let pending: Vec<OpHandle> = self.pending.lock().drain(..).collect();
        for op in pending {
            op.wait().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlapbench_core::memory::PinnedBuffer;
    use overlapbench_core::pipeline::run_pipeline;

    fn host_counting(n: usize) -> PinnedBuffer<f64> {
        let mut host = PinnedBuffer::new(n).unwrap();
        host.fill_with(|i| i as f64);
        host
    }

    #[tokio::test]
    async fn test_transfer_roundtrip() {
        let device = CpuDevice::new().await.unwrap();
        let host = host_counting(256);
        let buf = device.alloc(256).unwrap();

        // SAFETY: host outlives the transfer, which is waited on below.
        let view = unsafe { host.view() };
        let transfer = device.copy_to_device(&buf, view, &[]).unwrap();
        transfer.wait().await.unwrap();

        let mut out = vec![0.0; 256];
        buf.copy_to_host(&mut out).unwrap();
        assert_eq!(out[0], 0.0);
        assert_eq!(out[255], 255.0);
    }

    #[tokio::test]
    async fn test_compute_never_starts_before_transfer_finishes() {
        let device = CpuDevice::new().await.unwrap();
        let host = host_counting(4096);
        let buf = device.alloc(4096).unwrap();

        // SAFETY: host outlives the transfer, which is joined below.
        let view = unsafe { host.view() };
        let pipeline = run_pipeline(&device, &buf, view, ElementwiseKernel::new(1.0, 4)).unwrap();
        pipeline.join().await.unwrap();

        let log = device.op_log();
        assert!(log.finished_before_started(pipeline.transfer.id(), pipeline.compute.id()));
    }

    #[tokio::test]
    async fn test_kernel_applies_to_transferred_data() {
        let device = CpuDevice::new().await.unwrap();
        let host = host_counting(128);
        let buf = device.alloc(128).unwrap();

        // SAFETY: host outlives the transfer, which is joined below.
        let view = unsafe { host.view() };
        let pipeline = run_pipeline(&device, &buf, view, ElementwiseKernel::new(0.5, 2)).unwrap();
        pipeline.join().await.unwrap();

        let mut out = vec![0.0; 128];
        buf.copy_to_host(&mut out).unwrap();
        assert_eq!(out[10], 11.0);
    }

    #[tokio::test]
    async fn test_length_mismatch_fails_at_wait_and_poisons_dependents() {
        let device = CpuDevice::new().await.unwrap();
        let host = host_counting(1024);
        let small = device.alloc(512).unwrap();

        // SAFETY: host outlives the transfer, which is waited on below.
        let view = unsafe { host.view() };
        let pipeline =
            run_pipeline(&device, &small, view, ElementwiseKernel::default()).unwrap();

        // Submission succeeded; the failure surfaces at wait time.
        assert!(matches!(
            pipeline.transfer.wait().await,
            Err(OverlapError::TransferFailed(_))
        ));
        assert!(matches!(
            pipeline.compute.wait().await,
            Err(OverlapError::DependencyFailed { dep, .. }) if dep == pipeline.transfer.id()
        ));
    }

    #[tokio::test]
    async fn test_synchronize_joins_everything() {
        let device = CpuDevice::new().await.unwrap();
        let host = host_counting(512);
        let buf_a = device.alloc(512).unwrap();
        let buf_b = device.alloc(512).unwrap();

        // SAFETY: host outlives both transfers; synchronize joins them.
        let view = unsafe { host.view() };
        let p1 = run_pipeline(&device, &buf_a, view, ElementwiseKernel::default()).unwrap();
        let p2 = run_pipeline(&device, &buf_b, view, ElementwiseKernel::default()).unwrap();

        device.synchronize().await.unwrap();
        assert!(p1.compute.is_complete());
        assert!(p2.compute.is_complete());
    }

    #[tokio::test]
    async fn test_zero_sized_alloc_rejected() {
        let device = CpuDevice::new().await.unwrap();
        assert!(matches!(
            device.alloc(0),
            Err(OverlapError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_foreign_buffer_rejected() {
        struct ForeignBuffer;

        impl DeviceBuffer for ForeignBuffer {
            fn len(&self) -> usize {
                1
            }
            fn copy_to_host(&self, _out: &mut [f64]) -> Result<()> {
                Ok(())
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        let device = CpuDevice::new().await.unwrap();
        let host = host_counting(1);
        let foreign: Arc<dyn DeviceBuffer> = Arc::new(ForeignBuffer);

        // SAFETY: submission is rejected synchronously; nothing reads the view.
        let view = unsafe { host.view() };
        assert!(matches!(
            device.copy_to_device(&foreign, view, &[]),
            Err(OverlapError::InvalidConfig(_))
        ));
    }
}
