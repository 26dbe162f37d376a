//! UIO backend
//!
//! Maps map0 of a `/dev/uioN` node. The node is found by the IP instance
//! name, the same name the host application would hand to the vendor
//! runtime when opening the kernel.

use crate::backend::{BackendType, RegisterAccess};
use crate::backends::mmap::MmapRegion;
use crate::discovery::{find_uio_by_name, UioDevice, UIO_DEV_ROOT, UIO_SYSFS_ROOT};
use crate::error::Result;
use std::path::Path;

/// IP exported through Linux UIO
#[derive(Debug)]
pub struct UioBackend {
    device: UioDevice,
    region: MmapRegion,
}

impl UioBackend {
    /// Find the UIO device named `name` in the default sysfs tree and map it
    ///
    /// # Errors
    ///
    /// Returns error if no device has the name or mapping fails.
    pub fn open_by_name(name: &str) -> Result<Self> {
        let device = find_uio_by_name(Path::new(UIO_SYSFS_ROOT), Path::new(UIO_DEV_ROOT), name)?;
        Self::open(device)
    }

    /// Map a discovered UIO device
    ///
    /// # Errors
    ///
    /// Returns error if the node cannot be opened or mapped.
    pub fn open(device: UioDevice) -> Result<Self> {
        // map0 is selected with mmap offset 0
        let region = MmapRegion::map(&device.path, device.map_size, 0)?;
        tracing::info!(
            "Opened UIO device uio{} ({}) with {:#x} byte window",
            device.index,
            device.name,
            device.map_size
        );
        Ok(Self { device, region })
    }

    /// Get the discovered device description
    #[must_use]
    pub const fn device(&self) -> &UioDevice {
        &self.device
    }
}

impl RegisterAccess for UioBackend {
    fn read_register(&self, offset: u32) -> Result<u32> {
        self.region.read_u32(offset as usize)
    }

    fn write_register(&mut self, offset: u32, value: u32) -> Result<()> {
        self.region.write_u32(offset as usize, value)
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Uio
    }
}
