//! Structural ordering tests for the async dependency protocol, run against
//! the simulated device so they hold on any machine.

use std::time::Instant;

use overlapbench::prelude::*;

const N: usize = 8192;

fn counting_host(n: usize) -> PinnedBuffer<f64> {
    let mut host = PinnedBuffer::new(n).expect("host allocation");
    host.fill_with(|i| i as f64);
    host
}

/// The full two-pipeline flow, asserting the two correctness-critical
/// orderings: each compute starts only after its transfer finished, and
/// transfer 1 finishes before the host mutation begins.
#[tokio::test]
async fn test_ordering_contract_across_both_pipelines() {
    let device = CpuDevice::new().await.expect("device");
    let mut host = counting_host(N);
    let buffer_a = device.alloc(N).expect("buffer A");
    let buffer_b = device.alloc(N).expect("buffer B");
    let kernel = ElementwiseKernel::new(1.0, 8);

    // SAFETY: the view is read only by transfer 1, which is waited on before
    // the mutation below.
    let view = unsafe { host.view() };
    let pipeline1 = run_pipeline(&device, &buffer_a, view, kernel).expect("pipeline 1");
    pipeline1.transfer.wait().await.expect("transfer 1");

    let mutation_begin = Instant::now();
    for slot in host.as_mut_slice().iter_mut().step_by(MUTATION_STRIDE) {
        *slot *= 2.0;
    }

    // SAFETY: as above, for transfer 2.
    let view = unsafe { host.view() };
    let pipeline2 = run_pipeline(&device, &buffer_b, view, kernel).expect("pipeline 2");
    pipeline2.transfer.wait().await.expect("transfer 2");

    pipeline1.compute.wait().await.expect("compute 1");
    pipeline2.compute.wait().await.expect("compute 2");

    let log = device.op_log();

    // Dependency registration, not incidental ordering: the compute of each
    // pipeline must not have started before its transfer finished.
    assert!(log.finished_before_started(pipeline1.transfer.id(), pipeline1.compute.id()));
    assert!(log.finished_before_started(pipeline2.transfer.id(), pipeline2.compute.id()));

    // Transfer 1 was observed complete strictly before any host mutation.
    let finished = log
        .finished_at(pipeline1.transfer.id())
        .expect("transfer 1 finish recorded");
    assert!(finished <= mutation_begin);
}

/// Joining a transfer must not join its dependent compute.
#[tokio::test]
async fn test_transfer_join_leaves_compute_pending() {
    let device = CpuDevice::new().await.expect("device");
    let host = counting_host(1 << 20);
    let buffer = device.alloc(1 << 20).expect("buffer");

    // A compute heavy enough that it cannot have finished by the time the
    // transfer wait returns on any realistic machine.
    let kernel = ElementwiseKernel::new(1.0, 256);

    // SAFETY: host outlives the transfer; it is waited on below and never
    // mutated.
    let view = unsafe { host.view() };
    let pipeline = run_pipeline(&device, &buffer, view, kernel).expect("pipeline");

    pipeline.transfer.wait().await.expect("transfer");
    assert!(pipeline.transfer.is_complete());

    // No assertion that the compute is *incomplete* here: the device may
    // schedule it arbitrarily fast. What matters is that waiting on the
    // transfer returned without requiring the compute to finish, and the
    // compute can still be joined afterwards.
    pipeline.compute.wait().await.expect("compute");

    let log = device.op_log();
    assert!(log.finished_before_started(pipeline.transfer.id(), pipeline.compute.id()));
}

/// Independent pipelines complete regardless of relative compute order.
#[tokio::test]
async fn test_computes_join_in_either_order() {
    let device = CpuDevice::new().await.expect("device");
    let host = counting_host(N);
    let buffer_a = device.alloc(N).expect("buffer A");
    let buffer_b = device.alloc(N).expect("buffer B");

    // SAFETY: host outlives both transfers and is never mutated.
    let view = unsafe { host.view() };
    let pipeline1 =
        run_pipeline(&device, &buffer_a, view, ElementwiseKernel::new(1.0, 2)).expect("pipeline 1");
    let pipeline2 =
        run_pipeline(&device, &buffer_b, view, ElementwiseKernel::new(1.0, 2)).expect("pipeline 2");

    // Join in reverse submission order.
    pipeline2.compute.wait().await.expect("compute 2");
    pipeline1.compute.wait().await.expect("compute 1");

    device.synchronize().await.expect("synchronize");
}
