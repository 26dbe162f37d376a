//! Register access abstraction
//!
//! The measurement wrapper only needs 32-bit register reads and writes at
//! byte offsets from the IP base. Each backend provides that over a
//! different transport.

use crate::error::Result;
use std::fmt::Debug;

/// 32-bit register access to one IP instance
pub trait RegisterAccess: Debug + Send {
    /// Read the register at byte `offset` from the IP base
    ///
    /// # Errors
    ///
    /// Returns error if the offset is outside the window or misaligned.
    fn read_register(&self, offset: u32) -> Result<u32>;

    /// Write the register at byte `offset` from the IP base
    ///
    /// # Errors
    ///
    /// Returns error if the offset is outside the window or misaligned.
    fn write_register(&mut self, offset: u32, value: u32) -> Result<()>;

    /// Get backend type for logs and status output
    fn backend_type(&self) -> BackendType;
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for Box<T> {
    fn read_register(&self, offset: u32) -> Result<u32> {
        (**self).read_register(offset)
    }

    fn write_register(&mut self, offset: u32, value: u32) -> Result<()> {
        (**self).write_register(offset, value)
    }

    fn backend_type(&self) -> BackendType {
        (**self).backend_type()
    }
}

/// Backend type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Linux UIO device (`/dev/uioN`)
    Uio,

    /// PCIe BAR resource file in sysfs
    PcieBar,

    /// Simulated IP, no hardware required
    Software,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uio => write!(f, "UIO"),
            Self::PcieBar => write!(f, "PCIe BAR"),
            Self::Software => write!(f, "Software (simulated IP)"),
        }
    }
}

/// Where to find the IP
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSelection {
    /// UIO device whose sysfs `name` matches
    Uio {
        /// IP instance name as exported by the device tree / platform driver
        name: String,
    },

    /// Window inside a PCIe BAR
    PcieBar {
        /// PCIe address (e.g. `0000:65:00.1`)
        address: String,
        /// BAR index
        bar: usize,
        /// Byte offset of the IP inside the BAR
        base: usize,
    },

    /// In-process simulated IP
    Software,
}

/// Open the backend described by `selection`
///
/// # Errors
///
/// Returns error if the device cannot be found or mapped.
pub fn select_backend(selection: &BackendSelection) -> Result<Box<dyn RegisterAccess>> {
    use crate::backends::{PcieBarBackend, SoftwareIp, UioBackend};

    match selection {
        BackendSelection::Uio { name } => {
            let backend = UioBackend::open_by_name(name)?;
            tracing::info!("Using UIO backend for {name}");
            Ok(Box::new(backend))
        }

        BackendSelection::PcieBar { address, bar, base } => {
            let backend = PcieBarBackend::open(address, *bar, *base)?;
            tracing::info!("Using PCIe BAR{bar} backend for {address} @ {base:#x}");
            Ok(Box::new(backend))
        }

        BackendSelection::Software => {
            tracing::info!("Using software backend");
            Ok(Box::new(SoftwareIp::default()))
        }
    }
}
