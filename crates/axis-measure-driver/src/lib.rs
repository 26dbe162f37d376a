//! Host driver for the AXIS measurement IP.
//!
//! The IP counts AXI4-Stream beats and clock cycles on an FPGA and exposes
//! them over AXI4-Lite. This crate opens the IP, controls the counter and
//! turns raw counts into throughput and rate figures.
//!
//! # Backend hierarchy
//!
//! ```text
//! Hardware:
//!   UioBackend        /dev/uioN found by IP name (platform designs)
//!   PcieBarBackend    window inside a PCIe BAR (accelerator cards)
//!
//! Development:
//!   SoftwareIp        simulated register file and counter model
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use axis_measure_driver::{AxisMeasureKernel, BackendSelection, MeasureConfig};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let selection = BackendSelection::Uio { name: "axis_measure_0".into() };
//! let config = MeasureConfig::from_env()?.with_clock_mhz(300.0)?;
//! let mut ip = AxisMeasureKernel::open(&selection, config)?;
//!
//! let m = ip.run_for(Duration::from_millis(100))?;
//! let width = ip.axis_width_bytes()?;
//! println!("{:.1} MB/s, {:.1}% busy", m.mbps(300.0, width)?, m.utilization()?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

mod backend;
pub mod backends;
pub mod config;
pub mod discovery;
mod error;
mod kernel;
pub mod metrics;

/// Register model (re-exported from axis-measure-ip).
pub mod regs {
    pub use axis_measure_ip::frame;
    pub use axis_measure_ip::regs::*;
}

pub use backend::{select_backend, BackendSelection, BackendType, RegisterAccess};
pub use backends::{PcieBarBackend, SoftwareIp, UioBackend};
pub use config::MeasureConfig;
pub use discovery::{find_uio_by_name, list_uio, UioDevice};
pub use error::{MeasureError, Result};
pub use kernel::AxisMeasureKernel;
pub use metrics::Measurement;

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        AxisMeasureKernel, BackendSelection, MeasureConfig, MeasureError, Measurement,
        RegisterAccess, Result, SoftwareIp,
    };
    pub use axis_measure_ip::{ControlCode, ControlState, Counter};
}
