//! NVML library loading
//!
//! The library is opened at runtime, so a host without the driver's NVML
//! keeps working with the X backends alone.

use crate::error::NvmlError;
use crate::nvml::device::NvmlDevice;
use crate::nvml::traits::{GpuDevice, GpuManager};

use nvml_wrapper::error::NvmlError as RawError;
use nvml_wrapper::Nvml;

/// Soname of the NVML library shipped with the driver
pub const DEFAULT_LIBRARY: &str = "libnvidia-ml.so.1";

fn init_error(err: RawError) -> NvmlError {
    match err {
        RawError::LibloadingError(_) | RawError::LibraryNotFound => NvmlError::LibraryNotFound,
        RawError::DriverNotLoaded => {
            NvmlError::InitializationFailed("NVIDIA kernel module not loaded".to_string())
        }
        RawError::NoPermission => NvmlError::InsufficientPermissions("nvmlInit".to_string()),
        other => NvmlError::InitializationFailed(other.to_string()),
    }
}

fn query_error(err: RawError) -> NvmlError {
    NvmlError::Unknown(err.to_string())
}

/// An initialized NVML library
pub struct NvmlLibrary {
    nvml: Nvml,
    path: String,
}

impl NvmlLibrary {
    /// Open `path`, or [`DEFAULT_LIBRARY`] when `None`
    pub fn open(path: Option<&str>) -> Result<Self, NvmlError> {
        let path = path.unwrap_or(DEFAULT_LIBRARY);
        let nvml = Nvml::builder()
            .lib_path(path.as_ref())
            .init()
            .map_err(init_error)?;

        let library = Self {
            nvml,
            path: path.to_string(),
        };
        match library.nvml_version() {
            Ok(version) => log::debug!("NVML {} loaded from {}", version, library.path),
            Err(e) => log::debug!("NVML loaded from {} (version unknown: {})", library.path, e),
        }
        Ok(library)
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl GpuManager for NvmlLibrary {
    fn device_count(&self) -> Result<u32, NvmlError> {
        self.nvml.device_count().map_err(query_error)
    }

    fn device_by_index(&self, index: u32) -> Result<Box<dyn GpuDevice + '_>, NvmlError> {
        match self.nvml.device_by_index(index) {
            Ok(device) => Ok(Box::new(NvmlDevice::new(device, index, &self.path))),
            Err(RawError::NotFound | RawError::InvalidArg) => Err(NvmlError::DeviceNotFound(index)),
            Err(other) => Err(query_error(other)),
        }
    }

    fn driver_version(&self) -> Result<String, NvmlError> {
        self.nvml.sys_driver_version().map_err(query_error)
    }

    fn nvml_version(&self) -> Result<String, NvmlError> {
        self.nvml.sys_nvml_version().map_err(query_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_library_reported() {
        let result = NvmlLibrary::open(Some("/nonexistent/libnvidia-ml.so.1"));
        assert!(matches!(result, Err(NvmlError::LibraryNotFound)));
    }

    #[test]
    fn test_init_error_mapping() {
        assert!(matches!(
            init_error(RawError::DriverNotLoaded),
            NvmlError::InitializationFailed(_)
        ));
        assert!(matches!(
            init_error(RawError::NoPermission),
            NvmlError::InsufficientPermissions(_)
        ));
    }

    #[test]
    #[ignore = "Requires NVIDIA GPU"]
    fn test_driver_version_matches_devices() {
        let library = NvmlLibrary::open(None).unwrap();
        assert!(library.device_count().unwrap() > 0);
        assert!(!library.driver_version().unwrap().is_empty());
    }
}
