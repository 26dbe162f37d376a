//! PCIe BAR backend
//!
//! Maps `/sys/bus/pci/devices/{addr}/resource{bar}` and addresses the IP at
//! a fixed base offset inside the BAR.

use crate::backend::{BackendType, RegisterAccess};
use crate::backends::mmap::{MmapRegion, RegisterWindow};
use crate::error::{MeasureError, Result};
use std::path::PathBuf;

/// IP inside a PCIe BAR
#[derive(Debug)]
pub struct PcieBarBackend {
    pcie_address: String,
    bar_index: usize,
    window: RegisterWindow,
}

impl PcieBarBackend {
    /// Map BAR `bar_index` of the device at `pcie_address`
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - the resource file doesn't exist (device absent or BAR unused)
    /// - the BAR is zero-sized (device not enabled)
    /// - `base` lies outside the BAR
    pub fn open(pcie_address: &str, bar_index: usize, base: usize) -> Result<Self> {
        let path = PathBuf::from(format!(
            "/sys/bus/pci/devices/{pcie_address}/resource{bar_index}"
        ));
        if !path.exists() {
            return Err(MeasureError::device_not_found(path));
        }

        // Truncation acceptable: BAR sizes fit in usize on 64-bit hosts
        #[allow(clippy::cast_possible_truncation)]
        let size = std::fs::metadata(&path)?.len() as usize;
        if size == 0 {
            return Err(MeasureError::map_failed(format!(
                "BAR{bar_index} of {pcie_address} is zero-sized (device not enabled?)"
            )));
        }

        let region = MmapRegion::map(&path, size, 0)?;
        let window = RegisterWindow::new(region, base)?;

        tracing::info!("Opened {pcie_address} BAR{bar_index}, IP at {base:#x}");

        Ok(Self {
            pcie_address: pcie_address.to_string(),
            bar_index,
            window,
        })
    }

    /// Get PCIe address
    #[must_use]
    pub fn pcie_address(&self) -> &str {
        &self.pcie_address
    }

    /// Get BAR index
    #[must_use]
    pub const fn bar_index(&self) -> usize {
        self.bar_index
    }

    /// Get IP base offset inside the BAR
    #[must_use]
    pub const fn base(&self) -> usize {
        self.window.base()
    }
}

impl RegisterAccess for PcieBarBackend {
    fn read_register(&self, offset: u32) -> Result<u32> {
        self.window.read_u32(offset)
    }

    fn write_register(&mut self, offset: u32, value: u32) -> Result<()> {
        self.window.write_u32(offset, value)
    }

    fn backend_type(&self) -> BackendType {
        BackendType::PcieBar
    }
}
