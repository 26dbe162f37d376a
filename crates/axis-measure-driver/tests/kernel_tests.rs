//! Measurement wrapper against the simulated IP
//!
//! Every operation runs through the same register map the FPGA exposes.

use axis_measure_driver::prelude::*;
use axis_measure_driver::regs;
use std::time::Duration;

fn within(actual: f64, expected: f64, tolerance: f64) -> bool {
    (actual - expected).abs() <= expected.abs() * tolerance
}

fn fast_estimate() -> MeasureConfig {
    MeasureConfig::default()
        .with_estimate_window(Duration::from_millis(50))
        .expect("valid window")
}

#[test]
fn open_software_selection() {
    let mut ip = AxisMeasureKernel::open(&BackendSelection::Software, MeasureConfig::default())
        .expect("software backend");
    assert_eq!(ip.axis_width_bytes().unwrap(), 64);
    ip.clear_and_stop_measurement().unwrap();
    assert!(!ip.is_active().unwrap());
    assert_eq!(ip.snapshot().unwrap(), Measurement::default());
}

#[test]
fn estimate_clock_tracks_simulated_clock() {
    let mut ip = AxisMeasureKernel::with_config(SoftwareIp::new(200.0, 8, 0.25), fast_estimate());
    ip.backend_mut().set_counters(1234, 5678, 9);

    let mhz = ip.estimate_clock_mhz().expect("estimate");
    assert!(within(mhz, 200.0, 0.05), "estimated {mhz} MHz");

    // Previous counts are gone and the counter is left stopped
    assert!(!ip.is_active().unwrap());
    assert_eq!(ip.latency().unwrap(), 0);
    let m = ip.snapshot().unwrap();
    assert!(within(m.assertions_per_cycle().unwrap(), 0.25, 0.01));
}

#[test]
fn estimate_fails_without_clock() {
    let mut ip = AxisMeasureKernel::with_config(SoftwareIp::manual(8), fast_estimate());
    assert!(matches!(
        ip.estimate_clock_mhz(),
        Err(MeasureError::EmptyMeasurement { .. })
    ));
}

#[test]
fn mbps_with_known_clock_and_width() {
    let mut backend = SoftwareIp::manual(64);
    backend.advance(1_000_000, 250_000);
    let ip = AxisMeasureKernel::new(backend);

    // 16 MB in 4 ms
    let mbps = ip.mbps_with(250.0, 64).unwrap();
    assert!(within(mbps, 4000.0, 1e-9), "{mbps}");
}

#[test]
fn mbps_uses_configured_clock_without_clearing() {
    let config = MeasureConfig::default().with_clock_mhz(250.0).unwrap();
    let mut backend = SoftwareIp::manual(64);
    backend.advance(1_000_000, 250_000);
    let mut ip = AxisMeasureKernel::with_config(backend, config);

    let mbps = ip.mbps().unwrap();
    assert!(within(mbps, 4000.0, 1e-9), "{mbps}");
    assert_eq!(ip.cycles().unwrap(), 1_000_000);
}

#[test]
fn mbps_reads_counters_before_estimating() {
    let mut backend = SoftwareIp::new(100.0, 32, 1.0);
    backend.set_counters(50_000_000, 100_000_000, 0);
    let mut ip = AxisMeasureKernel::with_config(backend, fast_estimate());

    // 1600 MB over one second at 100 MHz
    let mbps = ip.mbps().unwrap();
    assert!(within(mbps, 1600.0, 0.05), "{mbps}");

    // The estimate replaced the counters
    assert!(ip.cycles().unwrap() < 100_000_000);
}

#[test]
fn passed_seconds_with_configured_clock() {
    let config = MeasureConfig::default().with_clock_mhz(300.0).unwrap();
    let mut backend = SoftwareIp::manual(4);
    backend.advance(600_000_000, 1);
    let mut ip = AxisMeasureKernel::with_config(backend, config);

    assert!(within(ip.estimate_passed_seconds().unwrap(), 2.0, 1e-12));
    assert!(within(ip.estimate_passed_seconds_for(150_000).unwrap(), 0.0005, 1e-12));
    assert_eq!(ip.cycles().unwrap(), 600_000_000);
}

#[test]
fn passed_seconds_with_estimated_clock() {
    let mut backend = SoftwareIp::new(100.0, 4, 0.5);
    backend.set_counters(0, 50_000_000, 0);
    let mut ip = AxisMeasureKernel::with_config(backend, fast_estimate());

    let seconds = ip.estimate_passed_seconds().unwrap();
    assert!(within(seconds, 0.5, 0.05), "{seconds}");
}

#[test]
fn rates_from_counters() {
    let mut backend = SoftwareIp::manual(4);
    backend.advance(4000, 1000);
    let ip = AxisMeasureKernel::new(backend);

    assert!(within(ip.assertions_per_cycle().unwrap(), 0.25, 1e-12));
    assert!(within(ip.cycles_between_assertions().unwrap(), 4.0, 1e-12));
}

#[test]
fn counters_cross_32_bit_boundary() {
    let mut backend = SoftwareIp::manual(4);
    backend.set_counters(u64::from(u32::MAX), u64::from(u32::MAX), 0);
    backend.advance(1, 2);
    let ip = AxisMeasureKernel::new(backend);

    assert_eq!(ip.cycles().unwrap(), 1 << 32);
    assert_eq!(ip.assertions().unwrap(), (1 << 32) + 1);
    assert_eq!(ip.read(regs::CYCLES + 4).unwrap(), 1);
    assert_eq!(ip.read(regs::CYCLES).unwrap(), 0);
}

#[test]
fn last_frame_words_in_register_order() {
    let mut backend = SoftwareIp::manual(10);
    backend.set_last_frame(&[0x10, 0x11, 0x12, 0x13, 0x20, 0x21, 0x22, 0x23, 0x30, 0x31]);
    let ip = AxisMeasureKernel::new(backend);

    let words = ip.last_frame(10).unwrap();
    assert_eq!(words, vec![0x1312_1110, 0x2322_2120, 0x0000_3130]);
    assert!(ip.last_frame(0).unwrap().is_empty());
}

#[cfg(target_endian = "little")]
#[test]
fn last_frame_bytes_truncated_to_width() {
    let data: Vec<u8> = (0..10).collect();
    let mut backend = SoftwareIp::manual(10);
    backend.set_last_frame(&data);
    let ip = AxisMeasureKernel::new(backend);

    assert_eq!(ip.last_frame_bytes(10).unwrap(), data);
    assert_eq!(ip.last_frame_bytes(3).unwrap(), vec![0, 1, 2]);
}

#[test]
fn sampling_records_cumulative_rate() {
    let mut backend = SoftwareIp::manual(4);
    backend.advance(1000, 500);
    let ip = AxisMeasureKernel::new(backend);

    let samples = ip.asserts_in_interval(Duration::from_micros(100), 5).unwrap();
    assert_eq!(samples.len(), 5);
    assert!(samples.iter().all(|&s| within(s, 0.5, 1e-12)));
}

#[test]
fn sampling_empty_counter_is_zero() {
    let ip = AxisMeasureKernel::new(SoftwareIp::manual(4));
    let samples = ip.asserts_in_interval(Duration::from_micros(10), 3).unwrap();
    assert_eq!(samples, vec![0.0, 0.0, 0.0]);
    assert!(ip.asserts_in_interval(Duration::ZERO, 0).unwrap().is_empty());
}

#[test]
fn run_for_leaves_counter_stopped() {
    let mut ip = AxisMeasureKernel::new(SoftwareIp::new(50.0, 16, 0.5));
    let m = ip.run_for(Duration::from_millis(10)).unwrap();

    assert!(!ip.is_active().unwrap());
    assert!(m.cycles >= 500_000, "10 ms at 50 MHz is at least 500k cycles");
    assert!(within(m.assertions_per_cycle().unwrap(), 0.5, 0.01));
    assert_eq!(ip.snapshot().unwrap(), m);
}

#[test]
fn boxed_backend_behaves_like_concrete() {
    let backend: Box<dyn RegisterAccess> = Box::new(SoftwareIp::manual(32));
    let mut ip = AxisMeasureKernel::new(backend);
    ip.start_measurement().unwrap();
    assert_eq!(ip.control_state().unwrap(), ControlState::Running);
    assert!(ip.read(0x13).is_err());
}
