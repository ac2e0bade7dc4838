//! The benchmark driver.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use overlapbench_core::device::{DeviceBuffer, DeviceQueue};
use overlapbench_core::error::Result;
use overlapbench_core::kernel::ElementwiseKernel;
use overlapbench_core::memory::PinnedBuffer;
use overlapbench_core::pipeline::run_pipeline;
use overlapbench_core::report::TimingReport;

/// Elements per buffer. Sized so that a memcpy-speed transfer and the
/// kernel each take tens to hundreds of milliseconds on the simulated
/// device; a hardware backend would use a few orders of magnitude more.
pub const DATA_SIZE: usize = 1 << 24;

/// Inner iteration count of the placeholder kernel.
pub const KERNEL_ITERS: u32 = 64;

/// Every `MUTATION_STRIDE`-th host element is doubled between the two
/// pipelines.
pub const MUTATION_STRIDE: usize = 512;

/// Result of one benchmark run.
pub struct BenchRun {
    /// The four measured phase durations.
    pub report: TimingReport,
    /// Device buffer populated by pipeline 1 (pre-mutation host data).
    pub buffer_a: Arc<dyn DeviceBuffer>,
    /// Device buffer populated by pipeline 2 (post-mutation host data).
    pub buffer_b: Arc<dyn DeviceBuffer>,
}

/// Run the full two-pipeline overlap measurement, single shot.
///
/// Control flow: fill the host buffer, issue pipeline 1 into buffer A and
/// wait on its transfer only, mutate the host buffer while pipeline 1's
/// compute may still be running, issue pipeline 2 into buffer B, wait on its
/// transfer, then wait on both computes. Timestamps are captured
/// immediately around each blocking wait.
///
/// The mutation window is permitted to race with pipeline 1's compute; that
/// race is the transfer/compute overlap being measured. It must never race
/// with an in-flight transfer, which is why each transfer is waited on
/// before the host buffer is touched again.
pub async fn run_benchmark(
    queue: &dyn DeviceQueue,
    elements: usize,
    kernel: ElementwiseKernel,
) -> Result<BenchRun> {
    let mut host = PinnedBuffer::<f64>::new(elements)?;
    host.fill_with(|i| i as f64);

    let buffer_a = queue.alloc(elements)?;
    let buffer_b = queue.alloc(elements)?;

    debug!(elements, ?kernel, "starting overlap measurement");

    let t0 = Instant::now();

    // First async copy and compute using buffer A.
    // SAFETY: the view is read only by transfer 1, which is waited on before
    // the host buffer is mutated or viewed again.
    let view = unsafe { host.view() };
    let copy1_start = Instant::now();
    let pipeline1 = run_pipeline(queue, &buffer_a, view, kernel)?;
    pipeline1.transfer.wait().await?;
    let copy1_end = Instant::now();

    // Overwrite the host buffer with new "data". Compute 1 already consumed
    // its input via the completed transfer and does not re-read host memory.
    for slot in host.as_mut_slice().iter_mut().step_by(MUTATION_STRIDE) {
        *slot *= 2.0;
    }

    // Second async copy and compute using buffer B.
    // SAFETY: as above, for transfer 2.
    let view = unsafe { host.view() };
    let copy2_start = Instant::now();
    let pipeline2 = run_pipeline(queue, &buffer_b, view, kernel)?;
    pipeline2.transfer.wait().await?;
    let copy2_end = Instant::now();

    pipeline1.compute.wait().await?;
    pipeline2.compute.wait().await?;
    let total_end = Instant::now();

    Ok(BenchRun {
        report: TimingReport {
            copy1: copy1_end - copy1_start,
            host_work: copy2_start - copy1_end,
            copy2: copy2_end - copy2_start,
            total: total_end - t0,
        },
        buffer_a,
        buffer_b,
    })
}
