//! Throughput and rate metrics derived from raw counter values
//!
//! Units: one megabyte is 10^6 bytes, frequencies are in MHz. Every
//! function rejects a zero denominator with `EmptyMeasurement` instead of
//! returning infinity or NaN.

#![allow(clippy::cast_precision_loss)]

use crate::error::{MeasureError, Result};

/// Bytes per megabyte
pub const BYTES_PER_MB: f64 = 1_000_000.0;
/// Hz per MHz
pub const HZ_PER_MHZ: f64 = 1_000_000.0;

/// One read of the three counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Measurement {
    /// Transferred beats
    pub assertions: u64,
    /// Clock cycles counted
    pub cycles: u64,
    /// Cycles from start to first beat
    pub latency: u64,
}

impl Measurement {
    /// Bytes moved for a stream `width_bytes` wide
    pub const fn bytes_transferred(&self, width_bytes: u32) -> u64 {
        self.assertions.saturating_mul(width_bytes as u64)
    }

    /// Beats per cycle
    ///
    /// # Errors
    ///
    /// Returns `EmptyMeasurement` if no cycles were counted.
    pub fn assertions_per_cycle(&self) -> Result<f64> {
        assertions_per_cycle(self.assertions, self.cycles)
    }

    /// Cycles per beat
    ///
    /// # Errors
    ///
    /// Returns `EmptyMeasurement` if no beats were counted.
    pub fn cycles_between_assertions(&self) -> Result<f64> {
        cycles_between_assertions(self.cycles, self.assertions)
    }

    /// Bus utilization in percent
    ///
    /// # Errors
    ///
    /// Returns `EmptyMeasurement` if no cycles were counted.
    pub fn utilization(&self) -> Result<f64> {
        Ok(self.assertions_per_cycle()? * 100.0)
    }

    /// Elapsed time at `mhz`
    ///
    /// # Errors
    ///
    /// Returns `EmptyMeasurement` if `mhz` is zero.
    pub fn seconds(&self, mhz: f64) -> Result<f64> {
        seconds(self.cycles, mhz)
    }

    /// First-beat latency in nanoseconds at `mhz`
    ///
    /// # Errors
    ///
    /// Returns `EmptyMeasurement` if `mhz` is zero.
    pub fn latency_ns(&self, mhz: f64) -> Result<f64> {
        Ok(seconds(self.latency, mhz)? * 1e9)
    }

    /// Throughput in MB/s
    ///
    /// # Errors
    ///
    /// Returns `EmptyMeasurement` if no cycles were counted or `mhz` is zero.
    pub fn mbps(&self, mhz: f64, width_bytes: u32) -> Result<f64> {
        throughput_mbps(width_bytes, self.assertions, self.cycles, mhz)
    }
}

/// Bytes to megabytes
pub fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Cycles to seconds at `mhz`
///
/// # Errors
///
/// Returns `EmptyMeasurement` if `mhz` is not positive.
pub fn seconds(cycles: u64, mhz: f64) -> Result<f64> {
    if mhz <= 0.0 || !mhz.is_finite() {
        return Err(MeasureError::empty("clock frequency"));
    }
    Ok(cycles as f64 / (mhz * HZ_PER_MHZ))
}

/// Throughput: `(width × assertions / 1e6) / (cycles / (mhz × 1e6))`
///
/// # Errors
///
/// Returns `EmptyMeasurement` if `cycles` is zero or `mhz` is not positive.
pub fn throughput_mbps(width_bytes: u32, assertions: u64, cycles: u64, mhz: f64) -> Result<f64> {
    if cycles == 0 {
        return Err(MeasureError::empty("cycle count"));
    }
    let data_mb = f64::from(width_bytes) * assertions as f64 / BYTES_PER_MB;
    Ok(data_mb / seconds(cycles, mhz)?)
}

/// Beats per cycle
///
/// # Errors
///
/// Returns `EmptyMeasurement` if `cycles` is zero.
pub fn assertions_per_cycle(assertions: u64, cycles: u64) -> Result<f64> {
    if cycles == 0 {
        return Err(MeasureError::empty("cycle count"));
    }
    Ok(assertions as f64 / cycles as f64)
}

/// Cycles per beat
///
/// # Errors
///
/// Returns `EmptyMeasurement` if `assertions` is zero.
pub fn cycles_between_assertions(cycles: u64, assertions: u64) -> Result<f64> {
    if assertions == 0 {
        return Err(MeasureError::empty("assertion count"));
    }
    Ok(cycles as f64 / assertions as f64)
}

/// Cycles counted over a known window to MHz
///
/// # Errors
///
/// Returns `EmptyMeasurement` if the window is zero.
pub fn clock_mhz(cycles: u64, window: std::time::Duration) -> Result<f64> {
    let micros = window.as_secs_f64() * 1e6;
    if micros <= 0.0 {
        return Err(MeasureError::empty("estimate window"));
    }
    Ok(cycles as f64 / micros)
}
