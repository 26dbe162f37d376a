//! Software (simulated IP) backend
//!
//! Implements `RegisterAccess` over an in-process model of the measurement
//! IP. This enables:
//!
//! 1. **CI without hardware**: every wrapper operation runs against the same
//!    register map the FPGA exposes.
//! 2. **Examples**: the CLI's `--software` target.
//!
//! ## Counter model
//!
//! ```text
//! running:  cycles     += elapsed_wall_time × clock
//!           assertions += cycles_advanced × assertion_ratio
//! always:   advance(cycles, assertions) adds exact amounts
//! ```
//!
//! With a clock of 0 MHz the model never advances on its own, which gives
//! tests full control over the counter values.

use crate::backend::{BackendType, RegisterAccess};
use crate::error::{MeasureError, Result};
use axis_measure_ip::frame::{word_count, MAX_FRAME_BYTES};
use axis_measure_ip::regs::{self, control, Counter};
use std::time::Instant;

/// Size of the simulated AXI4-Lite window.
pub const WINDOW_BYTES: u32 = 0x1000;

/// Simulated measurement IP
#[derive(Debug, Clone)]
pub struct SoftwareIp {
    /// Simulated stream clock (0 = manual only)
    clock_mhz: f64,
    /// Beats per cycle while running
    assertion_ratio: f64,
    /// Value of the data width register
    width_bytes: u32,

    control: u32,
    cycles: u64,
    assertions: u64,
    latency: u64,
    frame: Vec<u32>,

    /// Set while the counter runs on wall-clock time
    running_since: Option<Instant>,
}

impl Default for SoftwareIp {
    /// 300 MHz, 64-byte stream, half the cycles carry a beat.
    fn default() -> Self {
        Self::new(300.0, 64, 0.5)
    }
}

impl SoftwareIp {
    /// Create a simulated IP with a free-running clock.
    pub fn new(clock_mhz: f64, width_bytes: u32, assertion_ratio: f64) -> Self {
        Self {
            clock_mhz: clock_mhz.max(0.0),
            assertion_ratio: assertion_ratio.clamp(0.0, 1.0),
            width_bytes,
            control: control::STOP,
            cycles: 0,
            assertions: 0,
            latency: 0,
            frame: vec![0; word_count(MAX_FRAME_BYTES) as usize],
            running_since: None,
        }
    }

    /// Create a simulated IP whose counters only move through [`advance`](Self::advance).
    pub fn manual(width_bytes: u32) -> Self {
        Self::new(0.0, width_bytes, 0.0)
    }

    /// Add exact amounts to the cycle and assertion counters.
    pub fn advance(&mut self, cycles: u64, assertions: u64) {
        self.cycles = self.cycles.wrapping_add(cycles);
        self.assertions = self.assertions.wrapping_add(assertions);
    }

    /// Force every counter to a value, e.g. to exercise carries across the
    /// 32-bit boundary.
    pub fn set_counters(&mut self, assertions: u64, cycles: u64, latency: u64) {
        self.fold_elapsed();
        self.assertions = assertions;
        self.cycles = cycles;
        self.latency = latency;
    }

    /// Set the first-beat latency counter.
    pub fn set_latency(&mut self, cycles: u64) {
        self.latency = cycles;
    }

    /// Latch `data` as the last captured beat, packed into little-endian words.
    ///
    /// Bytes beyond the window are dropped; unused words are zeroed.
    pub fn set_last_frame(&mut self, data: &[u8]) {
        self.frame.fill(0);
        for (word, chunk) in self.frame.iter_mut().zip(data.chunks(4)) {
            let mut bytes = [0u8; 4];
            bytes[..chunk.len()].copy_from_slice(chunk);
            *word = u32::from_le_bytes(bytes);
        }
    }

    /// Simulated clock frequency.
    pub const fn clock_mhz(&self) -> f64 {
        self.clock_mhz
    }

    /// Cycles accrued since the counter was started on wall-clock time.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn elapsed_cycles(&self) -> u64 {
        self.running_since.map_or(0, |since| {
            (since.elapsed().as_secs_f64() * self.clock_mhz * 1_000_000.0) as u64
        })
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn elapsed_assertions(elapsed_cycles: u64, ratio: f64) -> u64 {
        (elapsed_cycles as f64 * ratio) as u64
    }

    fn fold_elapsed(&mut self) {
        let elapsed = self.elapsed_cycles();
        self.cycles = self.cycles.wrapping_add(elapsed);
        self.assertions = self
            .assertions
            .wrapping_add(Self::elapsed_assertions(elapsed, self.assertion_ratio));
        self.running_since = None;
    }

    fn counter_value(&self, counter: Counter) -> u64 {
        let elapsed = self.elapsed_cycles();
        match counter {
            Counter::Cycles => self.cycles.wrapping_add(elapsed),
            Counter::Assertions => self
                .assertions
                .wrapping_add(Self::elapsed_assertions(elapsed, self.assertion_ratio)),
            Counter::Latency => self.latency,
        }
    }

    fn apply_control(&mut self, value: u32) {
        match value {
            control::START => {
                if self.running_since.is_none() {
                    self.running_since = Some(Instant::now());
                }
            }
            control::CLEAR => {
                self.running_since = None;
                self.cycles = 0;
                self.assertions = 0;
                self.latency = 0;
            }
            _ => self.fold_elapsed(),
        }
        self.control = value;
    }

    fn check(offset: u32) -> Result<()> {
        if offset % regs::REGISTER_BYTES != 0 {
            return Err(MeasureError::Misaligned {
                offset: offset as usize,
            });
        }
        if offset >= WINDOW_BYTES {
            return Err(MeasureError::OutOfBounds {
                offset: offset as usize,
                limit: WINDOW_BYTES as usize,
            });
        }
        Ok(())
    }
}

impl RegisterAccess for SoftwareIp {
    #[allow(clippy::cast_possible_truncation)]
    fn read_register(&self, offset: u32) -> Result<u32> {
        Self::check(offset)?;

        let value = match offset {
            regs::CONTROL => self.control,
            regs::AXIS_DATA_WIDTH => self.width_bytes,
            o if o >= regs::LAST_FRAME => {
                let index = ((o - regs::LAST_FRAME) / regs::REGISTER_BYTES) as usize;
                self.frame.get(index).copied().unwrap_or(0)
            }
            o => Counter::ALL
                .into_iter()
                .find_map(|c| {
                    let (hi, lo) = regs::split(self.counter_value(c));
                    if o == c.lo() {
                        Some(lo)
                    } else if o == c.hi() {
                        Some(hi)
                    } else {
                        None
                    }
                })
                .unwrap_or(0),
        };

        tracing::trace!("Read u32 @ {offset:#x} = {value:#x} (software)");
        Ok(value)
    }

    fn write_register(&mut self, offset: u32, value: u32) -> Result<()> {
        Self::check(offset)?;
        tracing::trace!("Write u32 @ {offset:#x} = {value:#x} (software)");

        if offset == regs::CONTROL {
            self.apply_control(value);
        } else {
            // Counters, width and frame are read-only on the real IP
            tracing::debug!("Ignoring write to read-only register {offset:#x}");
        }
        Ok(())
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Software
    }
}
