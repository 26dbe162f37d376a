//! Register access backends
//!
//! Three backends available:
//! - **Uio**: platform designs, IP exported as `/dev/uioN` (found by name)
//! - **PcieBar**: PCIe cards, IP at a fixed offset inside a BAR
//! - **Software**: simulated IP for CI and development

pub mod mmap;
pub mod pcie;
pub mod software;
pub mod uio;

pub use mmap::{MmapRegion, RegisterWindow};
pub use pcie::PcieBarBackend;
pub use software::SoftwareIp;
pub use uio::UioBackend;
