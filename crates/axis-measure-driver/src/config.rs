//! Measurement configuration
//!
//! Defaults match the hardware's documented behavior. Every knob can be
//! overridden from the environment or, in the CLI, from flags.

use crate::error::{MeasureError, Result};
use std::time::Duration;

/// Environment variable: known stream clock in MHz.
pub const ENV_CLOCK_MHZ: &str = "AXIS_MEASURE_CLOCK_MHZ";
/// Environment variable: stream data width in bytes.
pub const ENV_WIDTH_BYTES: &str = "AXIS_MEASURE_WIDTH_BYTES";
/// Environment variable: clock estimation window in milliseconds.
pub const ENV_ESTIMATE_MS: &str = "AXIS_MEASURE_ESTIMATE_MS";

/// Default sleep during clock estimation.
pub const DEFAULT_ESTIMATE_WINDOW: Duration = Duration::from_secs(1);
/// Default bound on hi/lo/hi re-reads of a running counter.
pub const DEFAULT_MAX_COUNTER_RETRIES: u32 = 4;

/// Measurement configuration
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureConfig {
    /// Sleep between start and stop while estimating the clock
    pub estimate_window: Duration,

    /// Known stream clock; skips the destructive estimate when set
    pub clock_mhz: Option<f64>,

    /// Known data width; skips the width register when set
    pub axis_width_bytes: Option<u32>,

    /// Extra attempts for a consistent 64-bit counter read
    pub max_counter_retries: u32,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            estimate_window: DEFAULT_ESTIMATE_WINDOW,
            clock_mhz: None,
            axis_width_bytes: None,
            max_counter_retries: DEFAULT_MAX_COUNTER_RETRIES,
        }
    }
}

impl MeasureConfig {
    /// Defaults overlaid with `AXIS_MEASURE_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a variable is set but cannot be parsed or
    /// is out of range.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on unparsable or out-of-range values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_CLOCK_MHZ) {
            let mhz = parse_value::<f64>(ENV_CLOCK_MHZ, &raw)?;
            config = config.with_clock_mhz(mhz)?;
        }
        if let Some(raw) = lookup(ENV_WIDTH_BYTES) {
            let width = parse_value::<u32>(ENV_WIDTH_BYTES, &raw)?;
            config = config.with_axis_width_bytes(width)?;
        }
        if let Some(raw) = lookup(ENV_ESTIMATE_MS) {
            let ms = parse_value::<u64>(ENV_ESTIMATE_MS, &raw)?;
            config = config.with_estimate_window(Duration::from_millis(ms))?;
        }

        tracing::debug!("Measurement config: {config:?}");
        Ok(config)
    }

    /// Use a known clock frequency.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` unless `mhz` is finite and positive.
    pub fn with_clock_mhz(mut self, mhz: f64) -> Result<Self> {
        if !mhz.is_finite() || mhz <= 0.0 {
            return Err(MeasureError::invalid_config(format!(
                "clock must be a positive frequency, got {mhz} MHz"
            )));
        }
        self.clock_mhz = Some(mhz);
        Ok(self)
    }

    /// Use a known stream data width.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `bytes` is zero.
    pub fn with_axis_width_bytes(mut self, bytes: u32) -> Result<Self> {
        if bytes == 0 {
            return Err(MeasureError::invalid_config("data width must be non-zero"));
        }
        self.axis_width_bytes = Some(bytes);
        Ok(self)
    }

    /// Change the clock estimation window.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a zero window.
    pub fn with_estimate_window(mut self, window: Duration) -> Result<Self> {
        if window.is_zero() {
            return Err(MeasureError::invalid_config(
                "estimate window must be non-zero",
            ));
        }
        self.estimate_window = window;
        Ok(self)
    }

    /// Change the retry bound for running-counter reads.
    #[must_use]
    pub const fn with_max_counter_retries(mut self, retries: u32) -> Self {
        self.max_counter_retries = retries;
        self
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| MeasureError::invalid_config(format!("{key}={raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = MeasureConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, MeasureConfig::default());
        assert_eq!(config.estimate_window, Duration::from_secs(1));
        assert!(config.clock_mhz.is_none());
    }

    #[test]
    fn env_overrides() {
        let config = MeasureConfig::from_lookup(lookup(&[
            (ENV_CLOCK_MHZ, "250"),
            (ENV_WIDTH_BYTES, " 64 "),
            (ENV_ESTIMATE_MS, "100"),
        ]))
        .unwrap();
        assert_eq!(config.clock_mhz, Some(250.0));
        assert_eq!(config.axis_width_bytes, Some(64));
        assert_eq!(config.estimate_window, Duration::from_millis(100));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(MeasureConfig::from_lookup(lookup(&[(ENV_CLOCK_MHZ, "fast")])).is_err());
        assert!(MeasureConfig::from_lookup(lookup(&[(ENV_CLOCK_MHZ, "-1")])).is_err());
        assert!(MeasureConfig::from_lookup(lookup(&[(ENV_WIDTH_BYTES, "0")])).is_err());
        assert!(MeasureConfig::from_lookup(lookup(&[(ENV_ESTIMATE_MS, "0")])).is_err());
    }
}
