//! Benchmark entry point. Takes no arguments; prints the device identity
//! and the timing block, and exits non-zero if no device can be selected or
//! an allocation fails.

use overlapbench::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let queue = DeviceBuilder::new().backend(Backend::Auto).build().await?;
    println!("Running on {}", queue.device_name());

    let kernel = ElementwiseKernel::new(1.0, KERNEL_ITERS);
    let run = run_benchmark(queue.as_ref(), DATA_SIZE, kernel).await?;

    println!();
    println!("{}", run.report);

    Ok(())
}
