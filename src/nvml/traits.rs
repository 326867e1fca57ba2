//! Trait definitions for GPU operations
//!
//! These traits abstract over NVML to enable testing with mocks.

use crate::domain::{
    ClockFrequencies, CoolerLevel, CoolerTarget, EccState, FanPolicy, MemoryInfo, PciInfo, PcieLink,
    Temperature, Utilization,
};
use crate::error::NvmlError;

/// Trait for GPU device operations
///
/// Implemented by the real NVML device and by the test mock. Fan methods
/// take the device-local fan index.
pub trait GpuDevice {
    /// NVML index of this device
    fn index(&self) -> u32;

    fn name(&self) -> Result<String, NvmlError>;

    fn uuid(&self) -> Result<String, NvmlError>;

    fn vbios_version(&self) -> Result<String, NvmlError>;

    /// Current GPU core temperature
    fn temperature(&self) -> Result<Temperature, NvmlError>;

    // Fan operations
    fn fan_count(&self) -> Result<u32, NvmlError>;

    /// Target fan speed in percent
    fn fan_speed(&self, fan_idx: u32) -> Result<CoolerLevel, NvmlError>;

    fn fan_speed_rpm(&self, fan_idx: u32) -> Result<u32, NvmlError>;

    fn set_fan_speed(&mut self, fan_idx: u32, speed: CoolerLevel) -> Result<(), NvmlError>;

    /// Hand the fan back to the driver's default curve
    fn set_default_fan_speed(&mut self, fan_idx: u32) -> Result<(), NvmlError>;

    fn fan_policy(&self, fan_idx: u32) -> Result<FanPolicy, NvmlError>;

    fn set_fan_policy(&mut self, fan_idx: u32, policy: FanPolicy) -> Result<(), NvmlError>;

    /// Get what component a fan/cooler is designed to cool
    fn cooler_target(&self, fan_idx: u32) -> Result<CoolerTarget, NvmlError>;

    // Board
    fn memory_info(&self) -> Result<MemoryInfo, NvmlError>;

    fn pci_info(&self) -> Result<PciInfo, NvmlError>;

    fn pcie_link(&self) -> Result<PcieLink, NvmlError>;

    fn clocks(&self) -> Result<ClockFrequencies, NvmlError>;

    fn utilization(&self) -> Result<Utilization, NvmlError>;

    /// `Ok(None)` if the GPU has no ECC memory
    fn ecc_state(&self) -> Result<Option<EccState>, NvmlError>;
}

/// Trait for managing multiple GPUs
///
/// Devices borrow from the manager, so they are handed out boxed and
/// re-fetched per operation.
pub trait GpuManager {
    fn device_count(&self) -> Result<u32, NvmlError>;

    fn device_by_index(&self, index: u32) -> Result<Box<dyn GpuDevice + '_>, NvmlError>;

    fn driver_version(&self) -> Result<String, NvmlError>;

    fn nvml_version(&self) -> Result<String, NvmlError>;

    /// UUID of every device, `None` where the query failed
    fn device_uuids(&self) -> Result<Vec<Option<String>>, NvmlError> {
        let count = self.device_count()?;
        Ok((0..count)
            .map(|i| self.device_by_index(i).and_then(|d| d.uuid()).ok())
            .collect())
    }

    /// Fan count of every device, 0 where the query failed
    fn fan_counts(&self) -> Result<Vec<u32>, NvmlError> {
        let count = self.device_count()?;
        Ok((0..count)
            .map(|i| {
                self.device_by_index(i)
                    .and_then(|d| d.fan_count())
                    .unwrap_or(0)
            })
            .collect())
    }
}
