//! Measurement IP handle
//!
//! `AxisMeasureKernel` wraps one register backend and exposes every
//! operation of the IP: counter control, 64-bit counter reads, the last
//! frame window, and the derived throughput metrics.
//!
//! # Destructive operations
//!
//! The IP has a single counter set. Clock estimation clears it, runs it for
//! [`MeasureConfig::estimate_window`] and stops it, so any counts collected
//! before are lost. `estimate_clock_mhz`, `estimate_passed_seconds*` and
//! `mbps` (without a configured clock) are destructive; read what you need
//! first, or configure `clock_mhz`.

use crate::backend::{select_backend, BackendSelection, RegisterAccess};
use crate::config::MeasureConfig;
use crate::error::{MeasureError, Result};
use crate::metrics::{self, Measurement};
use axis_measure_ip::frame;
use axis_measure_ip::regs::{self, ControlCode, ControlState, Counter};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Handle to one AXIS measurement IP instance
#[derive(Debug)]
pub struct AxisMeasureKernel<B: RegisterAccess = Box<dyn RegisterAccess>> {
    backend: B,
    config: MeasureConfig,
}

impl AxisMeasureKernel {
    /// Open the IP described by `selection`
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be opened.
    pub fn open(selection: &BackendSelection, config: MeasureConfig) -> Result<Self> {
        let backend = select_backend(selection)?;
        Ok(Self::with_config(backend, config))
    }
}

impl<B: RegisterAccess> AxisMeasureKernel<B> {
    /// Wrap a backend with the default configuration
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, MeasureConfig::default())
    }

    /// Wrap a backend
    pub fn with_config(backend: B, config: MeasureConfig) -> Self {
        info!("AXIS measure kernel on {} backend", backend.backend_type());
        Self { backend, config }
    }

    /// Get the backend
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Get the backend mutably
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Get the configuration
    pub const fn config(&self) -> &MeasureConfig {
        &self.config
    }

    /// Replace the configuration
    pub fn set_config(&mut self, config: MeasureConfig) {
        self.config = config;
    }

    /// Release the backend
    pub fn into_inner(self) -> B {
        self.backend
    }

    // ── Control ──────────────────────────────────────────────────────────────

    fn command(&mut self, code: ControlCode) -> Result<()> {
        debug!("Control <- {code:?}");
        self.backend.write_register(regs::CONTROL, code.bits())
    }

    /// Start counting
    ///
    /// # Errors
    ///
    /// Returns error if the register write fails.
    pub fn start_measurement(&mut self) -> Result<()> {
        self.command(ControlCode::Start)
    }

    /// Stop counting, keep values
    ///
    /// # Errors
    ///
    /// Returns error if the register write fails.
    pub fn stop_measurement(&mut self) -> Result<()> {
        self.command(ControlCode::Stop)
    }

    /// Zero all counters; the IP is stopped afterwards
    ///
    /// # Errors
    ///
    /// Returns error if the register write fails.
    pub fn clear_and_stop_measurement(&mut self) -> Result<()> {
        self.command(ControlCode::Clear)
    }

    /// Alias of [`clear_and_stop_measurement`](Self::clear_and_stop_measurement)
    ///
    /// # Errors
    ///
    /// Returns error if the register write fails.
    pub fn clear_measurement(&mut self) -> Result<()> {
        self.clear_and_stop_measurement()
    }

    /// Write a raw value to the control register
    ///
    /// # Errors
    ///
    /// Returns error if the register write fails.
    pub fn set_control_register(&mut self, value: u32) -> Result<()> {
        debug!("Control <- {value:#x}");
        self.backend.write_register(regs::CONTROL, value)
    }

    /// Decoded control register
    ///
    /// # Errors
    ///
    /// Returns error if the register read fails.
    pub fn control_state(&self) -> Result<ControlState> {
        Ok(ControlState::from_bits(self.backend.read_register(regs::CONTROL)?))
    }

    /// Whether the control register reads exactly START
    ///
    /// # Errors
    ///
    /// Returns error if the register read fails.
    pub fn is_active(&self) -> Result<bool> {
        Ok(self.control_state()?.is_active())
    }

    // ── Raw access ───────────────────────────────────────────────────────────

    /// Read any register
    ///
    /// # Errors
    ///
    /// Returns error if the offset is invalid for the backend.
    pub fn read(&self, offset: u32) -> Result<u32> {
        self.backend.read_register(offset)
    }

    /// Write any register
    ///
    /// # Errors
    ///
    /// Returns error if the offset is invalid for the backend.
    pub fn write(&mut self, offset: u32, value: u32) -> Result<()> {
        self.backend.write_register(offset, value)
    }

    /// Stream data width from the IP, in bytes
    ///
    /// # Errors
    ///
    /// Returns error if the register read fails.
    pub fn axis_width_bytes(&self) -> Result<u32> {
        self.backend.read_register(regs::AXIS_DATA_WIDTH)
    }

    /// Configured width if set, else the IP's width register
    ///
    /// # Errors
    ///
    /// Returns error if the register read fails.
    pub fn effective_width_bytes(&self) -> Result<u32> {
        match self.config.axis_width_bytes {
            Some(width) => Ok(width),
            None => self.axis_width_bytes(),
        }
    }

    // ── Counters ─────────────────────────────────────────────────────────────

    /// Read a 64-bit counter
    ///
    /// The high word is read before and after the low word; if a running
    /// counter carried in between, the pair is re-read.
    ///
    /// # Errors
    ///
    /// Returns error if a register read fails.
    pub fn read_counter(&self, counter: Counter) -> Result<u64> {
        let mut hi = self.backend.read_register(counter.hi())?;
        for attempt in 0..=self.config.max_counter_retries {
            let lo = self.backend.read_register(counter.lo())?;
            let hi_again = self.backend.read_register(counter.hi())?;
            if hi_again == hi {
                return Ok(regs::join(hi, lo));
            }
            debug!(
                "{} carried during read (attempt {attempt}): hi {hi:#x} -> {hi_again:#x}",
                counter.name()
            );
            hi = hi_again;
        }

        warn!(
            "{} kept carrying after {} retries, using last pair",
            counter.name(),
            self.config.max_counter_retries
        );
        let lo = self.backend.read_register(counter.lo())?;
        Ok(regs::join(hi, lo))
    }

    /// Transferred beats
    ///
    /// # Errors
    ///
    /// Returns error if a register read fails.
    pub fn assertions(&self) -> Result<u64> {
        self.read_counter(Counter::Assertions)
    }

    /// Counted clock cycles
    ///
    /// # Errors
    ///
    /// Returns error if a register read fails.
    pub fn cycles(&self) -> Result<u64> {
        self.read_counter(Counter::Cycles)
    }

    /// Cycles from start to the first beat
    ///
    /// # Errors
    ///
    /// Returns error if a register read fails.
    pub fn latency(&self) -> Result<u64> {
        self.read_counter(Counter::Latency)
    }

    /// All three counters
    ///
    /// # Errors
    ///
    /// Returns error if a register read fails.
    pub fn snapshot(&self) -> Result<Measurement> {
        Ok(Measurement {
            assertions: self.assertions()?,
            cycles: self.cycles()?,
            latency: self.latency()?,
        })
    }

    /// Beats per cycle
    ///
    /// # Errors
    ///
    /// Returns error if a read fails or no cycles were counted.
    pub fn assertions_per_cycle(&self) -> Result<f64> {
        metrics::assertions_per_cycle(self.assertions()?, self.cycles()?)
    }

    /// Cycles per beat
    ///
    /// # Errors
    ///
    /// Returns error if a read fails or no beats were counted.
    pub fn cycles_between_assertions(&self) -> Result<f64> {
        metrics::cycles_between_assertions(self.cycles()?, self.assertions()?)
    }

    // ── Last frame ───────────────────────────────────────────────────────────

    /// Raw words of the last captured beat, in register order
    ///
    /// Reads `ceil(width_bytes / 4)` words; byte order inside each word is
    /// the IP's little-endian layout.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `width_bytes` exceeds the capture window,
    /// or error if a register read fails.
    pub fn last_frame(&self, width_bytes: u32) -> Result<Vec<u32>> {
        let offsets = frame::word_offsets(width_bytes).ok_or_else(|| {
            MeasureError::invalid_config(format!(
                "frame width {width_bytes} bytes exceeds the {} byte capture window",
                frame::MAX_FRAME_BYTES
            ))
        })?;
        offsets
            .map(|offset| self.backend.read_register(offset))
            .collect()
    }

    /// Last captured beat as `width_bytes` bytes
    ///
    /// # Errors
    ///
    /// Returns error if a register read fails.
    pub fn last_frame_bytes(&self, width_bytes: u32) -> Result<Vec<u8>> {
        let words = self.last_frame(width_bytes)?;
        let mut bytes = bytemuck::cast_slice::<u32, u8>(&words).to_vec();
        bytes.truncate(width_bytes as usize);
        Ok(bytes)
    }

    // ── Clock and throughput ─────────────────────────────────────────────────

    /// Estimate the stream clock by counting cycles over the estimate window
    ///
    /// Only an estimate: expect a few MHz of error from sleep jitter and
    /// register latency. **Clears the counters** and leaves the IP stopped.
    ///
    /// # Errors
    ///
    /// Returns error if a register access fails or no cycles were counted.
    pub fn estimate_clock_mhz(&mut self) -> Result<f64> {
        let window = self.config.estimate_window;
        info!("Estimating clock over {window:?} (clears counters)");

        self.clear_and_stop_measurement()?;
        self.start_measurement()?;
        let started = Instant::now();
        std::thread::sleep(window);
        let elapsed = started.elapsed();
        self.stop_measurement()?;

        let cycles = self.cycles()?;
        if cycles == 0 {
            return Err(MeasureError::empty("cycle count"));
        }
        let mhz = metrics::clock_mhz(cycles, elapsed)?;
        info!("Estimated clock: {mhz:.2} MHz ({cycles} cycles in {elapsed:?})");
        Ok(mhz)
    }

    /// Configured clock if set, else [`estimate_clock_mhz`](Self::estimate_clock_mhz)
    ///
    /// # Errors
    ///
    /// Returns error if estimation fails.
    pub fn clock_mhz(&mut self) -> Result<f64> {
        match self.config.clock_mhz {
            Some(mhz) => Ok(mhz),
            None => self.estimate_clock_mhz(),
        }
    }

    /// Elapsed time of the current measurement
    ///
    /// Cycles are read before the clock is estimated. **Destructive** unless
    /// a clock is configured.
    ///
    /// # Errors
    ///
    /// Returns error if a read or the estimate fails.
    pub fn estimate_passed_seconds(&mut self) -> Result<f64> {
        let cycles = self.cycles()?;
        self.estimate_passed_seconds_for(cycles)
    }

    /// Elapsed time for a given cycle count
    ///
    /// **Destructive** unless a clock is configured.
    ///
    /// # Errors
    ///
    /// Returns error if the estimate fails.
    pub fn estimate_passed_seconds_for(&mut self, cycles: u64) -> Result<f64> {
        let mhz = self.clock_mhz()?;
        metrics::seconds(cycles, mhz)
    }

    /// Throughput in MB/s using the configured or estimated clock and the
    /// configured or reported data width
    ///
    /// Counters are read first, then the clock is estimated. **Destructive**
    /// unless a clock is configured.
    ///
    /// # Errors
    ///
    /// Returns error if a read or the estimate fails, or no cycles were counted.
    pub fn mbps(&mut self) -> Result<f64> {
        let assertions = self.assertions()?;
        let cycles = self.cycles()?;
        let mhz = self.clock_mhz()?;
        let width = self.effective_width_bytes()?;
        metrics::throughput_mbps(width, assertions, cycles, mhz)
    }

    /// Throughput in MB/s with a known clock and data width
    ///
    /// # Errors
    ///
    /// Returns error if a read fails or no cycles were counted.
    pub fn mbps_with(&self, mhz: f64, width_bytes: u32) -> Result<f64> {
        metrics::throughput_mbps(width_bytes, self.assertions()?, self.cycles()?, mhz)
    }

    // ── Sampling ─────────────────────────────────────────────────────────────

    /// Sample beats-per-cycle `intervals` times, sleeping `interval` before
    /// each sample
    ///
    /// Values are cumulative since the last clear. A sample taken before any
    /// cycle was counted is 0.0.
    ///
    /// # Errors
    ///
    /// Returns error if a register read fails.
    pub fn asserts_in_interval(&self, interval: Duration, intervals: usize) -> Result<Vec<f64>> {
        debug!("Sampling {intervals} × {interval:?}");
        let mut samples = Vec::with_capacity(intervals);
        for _ in 0..intervals {
            std::thread::sleep(interval);
            let assertions = self.assertions()?;
            let cycles = self.cycles()?;
            samples.push(metrics::assertions_per_cycle(assertions, cycles).unwrap_or(0.0));
        }
        Ok(samples)
    }

    /// Clear, run for `duration`, stop, and return the counters
    ///
    /// # Errors
    ///
    /// Returns error if a register access fails.
    pub fn run_for(&mut self, duration: Duration) -> Result<Measurement> {
        self.clear_and_stop_measurement()?;
        self.start_measurement()?;
        std::thread::sleep(duration);
        self.stop_measurement()?;
        let measurement = self.snapshot()?;
        info!("Measured {measurement:?} over {duration:?}");
        Ok(measurement)
    }
}
