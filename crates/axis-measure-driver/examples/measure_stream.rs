//! Measure stream throughput
//!
//! Runs the counter for half a second and prints the derived metrics.
//! Uses the UIO device named by the first argument, or the simulated IP
//! when no argument is given.
//!
//!   cargo run --example measure_stream -- axis_measure_0

use axis_measure_driver::{AxisMeasureKernel, BackendSelection, MeasureConfig, Result};
use std::time::Duration;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("axis_measure_driver=info")
        .init();

    let selection = std::env::args().nth(1).map_or(BackendSelection::Software, |name| {
        BackendSelection::Uio { name }
    });

    let mut ip = AxisMeasureKernel::open(&selection, MeasureConfig::from_env()?)?;
    println!("📡 {selection:?} on {} backend\n", ip.backend().backend_type());

    let width = ip.axis_width_bytes()?;
    let m = ip.run_for(Duration::from_millis(500))?;
    println!("Data width   : {width} bytes");
    println!("Assertions   : {}", m.assertions);
    println!("Cycles       : {}", m.cycles);
    println!("Latency      : {} cycles", m.latency);

    // Destructive unless AXIS_MEASURE_CLOCK_MHZ is set
    let mhz = ip.clock_mhz()?;
    println!("Clock        : {mhz:.2} MHz");

    match m.mbps(mhz, width) {
        Ok(mbps) => println!("\n✅ {mbps:.1} MB/s ({:.1}% busy)", m.utilization()?),
        Err(e) => println!("\nℹ️  No traffic: {e}"),
    }

    Ok(())
}
