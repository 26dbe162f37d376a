//! UIO device discovery
//!
//! Platform designs expose each AXI4-Lite slave as a UIO device. The IP is
//! located by the `name` attribute in `/sys/class/uio/uio*/`, the same
//! instance name the hardware design gives the kernel.

use crate::error::{MeasureError, Result};
use std::path::{Path, PathBuf};

/// Default sysfs class directory for UIO devices
pub const UIO_SYSFS_ROOT: &str = "/sys/class/uio";

/// Default directory holding `uioN` device nodes
pub const UIO_DEV_ROOT: &str = "/dev";

/// A discovered UIO device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UioDevice {
    /// Device index (N in uioN)
    pub index: u32,

    /// IP instance name from sysfs
    pub name: String,

    /// Device node (/dev/uioN)
    pub path: PathBuf,

    /// Physical address of map0, if reported
    pub addr: Option<u64>,

    /// Size of map0 in bytes
    pub map_size: usize,
}

/// List all UIO devices under `sysfs_root`, sorted by index
///
/// Entries without a readable `name` or `maps/map0/size` are skipped.
///
/// # Errors
///
/// Returns error if `sysfs_root` cannot be read.
pub fn list_uio(sysfs_root: &Path, dev_root: &Path) -> Result<Vec<UioDevice>> {
    let mut devices = Vec::new();

    for entry in std::fs::read_dir(sysfs_root)?.flatten() {
        let file_name = entry.file_name();
        let Some(index) = file_name
            .to_str()
            .and_then(|s| s.strip_prefix("uio"))
            .and_then(|s| s.parse::<u32>().ok())
        else {
            continue;
        };

        let dir = entry.path();
        let Ok(name) = std::fs::read_to_string(dir.join("name")) else {
            tracing::debug!("Skipping uio{index}: no name attribute");
            continue;
        };
        let map_dir = dir.join("maps").join("map0");
        let Some(map_size) = read_hex(&map_dir.join("size")) else {
            tracing::debug!("Skipping uio{index}: no map0");
            continue;
        };
        let addr = read_hex(&map_dir.join("addr"));

        #[allow(clippy::cast_possible_truncation)]
        let device = UioDevice {
            index,
            name: name.trim().to_string(),
            path: dev_root.join(format!("uio{index}")),
            addr,
            map_size: map_size as usize,
        };
        tracing::debug!("Found {device:?}");
        devices.push(device);
    }

    devices.sort_by_key(|d| d.index);
    Ok(devices)
}

/// Find the UIO device whose name equals `name`
///
/// # Errors
///
/// Returns `IpNotFound` if no device carries the name.
pub fn find_uio_by_name(sysfs_root: &Path, dev_root: &Path, name: &str) -> Result<UioDevice> {
    list_uio(sysfs_root, dev_root)?
        .into_iter()
        .find(|d| d.name == name)
        .ok_or_else(|| MeasureError::ip_not_found(name))
}

fn read_hex(path: &Path) -> Option<u64> {
    let content = std::fs::read_to_string(path).ok()?;
    let trimmed = content.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u64::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fake_uio(root: &Path, index: u32, name: &str, size: &str) {
        let dir = root.join(format!("uio{index}"));
        fs::create_dir_all(dir.join("maps/map0")).unwrap();
        fs::write(dir.join("name"), format!("{name}\n")).unwrap();
        fs::write(dir.join("maps/map0/size"), format!("{size}\n")).unwrap();
        fs::write(dir.join("maps/map0/addr"), "0xa0010000\n").unwrap();
    }

    #[test]
    fn finds_device_by_name() {
        let sysfs = tempfile::tempdir().unwrap();
        fake_uio(sysfs.path(), 0, "axi_dma", "0x00010000");
        fake_uio(sysfs.path(), 3, "axis_measure_0", "0x00001000");

        let dev = find_uio_by_name(sysfs.path(), Path::new("/dev"), "axis_measure_0").unwrap();
        assert_eq!(dev.index, 3);
        assert_eq!(dev.path, PathBuf::from("/dev/uio3"));
        assert_eq!(dev.map_size, 0x1000);
        assert_eq!(dev.addr, Some(0xa001_0000));
    }

    #[test]
    fn listing_is_sorted_and_skips_incomplete() {
        let sysfs = tempfile::tempdir().unwrap();
        fake_uio(sysfs.path(), 10, "b", "0x1000");
        fake_uio(sysfs.path(), 2, "a", "0x1000");
        fs::create_dir_all(sysfs.path().join("uio5")).unwrap();
        fs::create_dir_all(sysfs.path().join("not_uio")).unwrap();

        let devices = list_uio(sysfs.path(), Path::new("/dev")).unwrap();
        let indices: Vec<u32> = devices.iter().map(|d| d.index).collect();
        assert_eq!(indices, vec![2, 10]);
    }

    #[test]
    fn unknown_name() {
        let sysfs = tempfile::tempdir().unwrap();
        fake_uio(sysfs.path(), 0, "axi_dma", "0x1000");
        let err = find_uio_by_name(sysfs.path(), Path::new("/dev"), "axis_measure_0").unwrap_err();
        assert!(matches!(err, MeasureError::IpNotFound { .. }));
    }
}
