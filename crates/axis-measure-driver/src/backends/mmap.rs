//! Memory-mapped register window
//!
//! Maps a device file (UIO node or PCIe resource file) with `rustix` and
//! provides bounds-checked, aligned, volatile 32-bit access.

use crate::error::{MeasureError, Result};
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};
use std::fs::{File, OpenOptions};
use std::os::unix::io::AsFd;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

/// Memory-mapped register window
#[derive(Debug)]
pub struct MmapRegion {
    ptr: NonNull<u8>,
    size: usize,
    _file: File,
    path: PathBuf,
}

impl MmapRegion {
    /// Map `size` bytes of `path` starting at `file_offset`
    ///
    /// `file_offset` must be page aligned; UIO selects map N with offset
    /// `N * page_size`, PCIe resource files always use 0.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - the file doesn't exist
    /// - `size` is zero
    /// - mmap fails
    pub fn map(path: &Path, size: usize, file_offset: u64) -> Result<Self> {
        if !path.exists() {
            return Err(MeasureError::device_not_found(path));
        }
        if size == 0 {
            return Err(MeasureError::map_failed(format!(
                "{} has a zero-sized register window",
                path.display()
            )));
        }

        tracing::debug!("Mapping {} ({size:#x} bytes @ {file_offset:#x})", path.display());

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| MeasureError::map_failed(format!("Cannot open {}: {e}", path.display())))?;

        // SAFETY: mmap of a device file for MMIO.
        // - fd is valid (just opened) and kept open in `_file` for the mapping's lifetime
        // - size is non-zero (checked above)
        // - MAP_SHARED so writes reach the device
        // - the mapping is released exactly once in Drop
        let addr = unsafe {
            mmap(
                std::ptr::null_mut(),
                size,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                file.as_fd(),
                file_offset,
            )
        }
        .map_err(|e| MeasureError::map_failed(format!("mmap {} failed: {e}", path.display())))?;

        let ptr = NonNull::new(addr.cast::<u8>())
            .ok_or_else(|| MeasureError::map_failed("mmap returned a null pointer"))?;

        tracing::info!("Mapped {} ({size:#x} bytes at {ptr:p})", path.display());

        Ok(Self {
            ptr,
            size,
            _file: file,
            path: path.to_path_buf(),
        })
    }

    fn check(&self, offset: usize) -> Result<()> {
        if offset % 4 != 0 {
            return Err(MeasureError::Misaligned { offset });
        }
        if offset.checked_add(4).is_none_or(|end| end > self.size) {
            return Err(MeasureError::OutOfBounds {
                offset,
                limit: self.size,
            });
        }
        Ok(())
    }

    /// Read 32-bit register at offset
    ///
    /// # Errors
    ///
    /// Returns error if offset is misaligned or out of bounds
    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        self.check(offset)?;

        // SAFETY: volatile read of a device register.
        // - offset + 4 <= size and offset is 4-byte aligned (checked above)
        // - ptr is the page-aligned base of a live mapping
        // - volatile: the hardware changes these values between reads
        #[allow(clippy::cast_ptr_alignment)]
        let value = unsafe { self.ptr.as_ptr().add(offset).cast::<u32>().read_volatile() };

        tracing::trace!("Read u32 @ {offset:#x} = {value:#x}");
        Ok(value)
    }

    /// Write 32-bit register at offset
    ///
    /// # Errors
    ///
    /// Returns error if offset is misaligned or out of bounds
    pub fn write_u32(&mut self, offset: usize, value: u32) -> Result<()> {
        self.check(offset)?;

        tracing::trace!("Write u32 @ {offset:#x} = {value:#x}");

        // SAFETY: volatile write of a device register.
        // - offset + 4 <= size and offset is 4-byte aligned (checked above)
        // - ptr is the page-aligned base of a live mapping
        // - volatile: writes trigger hardware side effects and must not be elided
        #[allow(clippy::cast_ptr_alignment)]
        unsafe {
            self.ptr.as_ptr().add(offset).cast::<u32>().write_volatile(value);
        }

        Ok(())
    }

    /// Get mapping size
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Get mapped file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MmapRegion {
    fn drop(&mut self) {
        tracing::debug!("Unmapping {} ({:#x} bytes)", self.path.display(), self.size);

        // SAFETY: ptr and size are exactly what mmap returned/was given in map();
        // Drop runs once and no references into the mapping outlive self.
        unsafe {
            if let Err(e) = munmap(self.ptr.as_ptr().cast(), self.size) {
                tracing::error!("munmap failed during drop: {e}");
            }
        }
    }
}

// SAFETY: the mapping is owned exclusively by this value; moving it to another
// thread does not invalidate a process-wide mapping.
unsafe impl Send for MmapRegion {}

// SAFETY: reads take &self and are bounds-checked volatile loads; writes
// require &mut self. No interior mutability.
unsafe impl Sync for MmapRegion {}

/// Window of a mapping starting at `base`, used when the IP sits inside a
/// larger BAR.
#[derive(Debug)]
pub struct RegisterWindow {
    region: MmapRegion,
    base: usize,
}

impl RegisterWindow {
    /// Restrict `region` to offsets relative to `base`
    ///
    /// # Errors
    ///
    /// Returns error if `base` is misaligned or beyond the mapping.
    pub fn new(region: MmapRegion, base: usize) -> Result<Self> {
        if base % 4 != 0 {
            return Err(MeasureError::Misaligned { offset: base });
        }
        if base >= region.size() {
            return Err(MeasureError::OutOfBounds {
                offset: base,
                limit: region.size(),
            });
        }
        Ok(Self { region, base })
    }

    /// Read a register relative to the window base
    ///
    /// # Errors
    ///
    /// Returns error if the absolute offset is misaligned or out of bounds.
    pub fn read_u32(&self, offset: u32) -> Result<u32> {
        self.region.read_u32(self.base + offset as usize)
    }

    /// Write a register relative to the window base
    ///
    /// # Errors
    ///
    /// Returns error if the absolute offset is misaligned or out of bounds.
    pub fn write_u32(&mut self, offset: u32, value: u32) -> Result<()> {
        self.region.write_u32(self.base + offset as usize, value)
    }

    /// Byte offset of the window inside the mapping
    #[must_use]
    pub const fn base(&self) -> usize {
        self.base
    }

    /// Underlying mapping
    #[must_use]
    pub const fn region(&self) -> &MmapRegion {
        &self.region
    }
}
