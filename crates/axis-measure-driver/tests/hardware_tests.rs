//! Tests against a real IP instance
//!
//! Set `AXIS_MEASURE_UIO` to the IP's UIO name, then run with `--ignored`.

use axis_measure_driver::{AxisMeasureKernel, BackendSelection, MeasureConfig};
use std::time::Duration;

fn open() -> AxisMeasureKernel {
    let name = std::env::var("AXIS_MEASURE_UIO").unwrap_or_else(|_| "axis_measure_0".into());
    let config = MeasureConfig::from_env().expect("config");
    AxisMeasureKernel::open(&BackendSelection::Uio { name }, config).expect("UIO backend")
}

#[test]
#[ignore] // Requires hardware
fn test_control_register_round_trip() {
    let mut ip = open();
    ip.start_measurement().unwrap();
    assert!(ip.is_active().unwrap());
    ip.stop_measurement().unwrap();
    assert!(!ip.is_active().unwrap());
    ip.clear_and_stop_measurement().unwrap();
    assert_eq!(ip.cycles().unwrap(), 0);
}

#[test]
#[ignore] // Requires hardware
fn test_clock_estimate_is_plausible() {
    let mut ip = open();
    let mhz = ip.estimate_clock_mhz().unwrap();
    println!("Estimated clock: {mhz:.2} MHz");
    assert!(mhz > 10.0 && mhz < 1000.0, "clock out of range");
}

#[test]
#[ignore] // Requires hardware and traffic on the stream
fn test_throughput() {
    let mut ip = open();
    let width = ip.axis_width_bytes().unwrap();
    let m = ip.run_for(Duration::from_millis(500)).unwrap();
    println!("Width {width} B, {m:?}");
    match ip.mbps() {
        Ok(mbps) => println!("Throughput: {mbps:.1} MB/s"),
        Err(e) => println!("ℹ️  Throughput unavailable: {e}"),
    }
}
