//! NVML abstraction layer
//!
//! Trait-based access to NVML plus the NVML side of attribute dispatch.

pub mod attributes;
pub mod device;
pub mod reconcile;
pub mod traits;
pub mod wrapper;

pub use attributes::NvmlAttributes;
pub use device::NvmlDevice;
pub use reconcile::IdTable;
pub use traits::{GpuDevice, GpuManager};
pub use wrapper::{NvmlLibrary, DEFAULT_LIBRARY};
