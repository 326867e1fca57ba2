//! NVML device access
//!
//! [`GpuDevice`] over an nvml-wrapper device. Cooler info and the current
//! PCIe link width are not wrapped, so those go through the raw symbols.

use crate::domain::{
    ClockFrequencies, CoolerLevel, CoolerTarget, EccState, FanPolicy, MemoryInfo, PciInfo, PcieLink,
    Temperature, Utilization,
};
use crate::error::NvmlError;
use crate::nvml::traits::GpuDevice;

use libloading::{Library, Symbol};
use nvml_wrapper::enum_wrappers::device::{Clock, TemperatureSensor};
use nvml_wrapper::enums::device::FanControlPolicy;
use nvml_wrapper::error::NvmlError as RawError;
use nvml_wrapper::Device;
use nvml_wrapper_sys::bindings::nvmlDevice_t;
use std::os::raw::c_uint;

/// `NVML_ERROR_NOT_SUPPORTED`
const NVML_ERROR_NOT_SUPPORTED: c_uint = 3;

/// One GPU as seen by NVML
pub struct NvmlDevice<'a> {
    device: Device<'a>,
    index: u32,
    library: &'a str,
}

impl<'a> NvmlDevice<'a> {
    /// `library` is reopened for the raw entry points
    pub fn new(device: Device<'a>, index: u32, library: &'a str) -> Self {
        Self {
            device,
            index,
            library,
        }
    }

    fn convert_error(&self, err: RawError) -> NvmlError {
        match err {
            RawError::NotSupported => NvmlError::NotSupported(format!("GPU {}", self.index)),
            RawError::NoPermission => NvmlError::InsufficientPermissions(format!("GPU {}", self.index)),
            RawError::NotFound => NvmlError::DeviceNotFound(self.index),
            RawError::GpuLost => NvmlError::GpuLost,
            RawError::InvalidArg => NvmlError::InvalidArgument(err.to_string()),
            other => NvmlError::Unknown(other.to_string()),
        }
    }

    fn handle(&self) -> nvmlDevice_t {
        // SAFETY: the handle is only passed to NVML calls made while
        // `self.device` is alive
        unsafe { self.device.handle() }
    }
}

/// Function number from a bus id such as `00000000:01:00.0`
fn pci_function(bus_id: &str) -> u32 {
    bus_id
        .rsplit_once('.')
        .and_then(|(_, f)| u32::from_str_radix(f.trim_end_matches('\0'), 16).ok())
        .unwrap_or(0)
}

impl GpuDevice for NvmlDevice<'_> {
    fn index(&self) -> u32 {
        self.index
    }

    fn name(&self) -> Result<String, NvmlError> {
        self.device.name().map_err(|e| self.convert_error(e))
    }

    fn uuid(&self) -> Result<String, NvmlError> {
        self.device.uuid().map_err(|e| self.convert_error(e))
    }

    fn vbios_version(&self) -> Result<String, NvmlError> {
        self.device.vbios_version().map_err(|e| self.convert_error(e))
    }

    fn temperature(&self) -> Result<Temperature, NvmlError> {
        let temp = self
            .device
            .temperature(TemperatureSensor::Gpu)
            .map_err(|e| self.convert_error(e))?;
        Ok(Temperature::from(temp))
    }

    fn fan_count(&self) -> Result<u32, NvmlError> {
        self.device.num_fans().map_err(|e| self.convert_error(e))
    }

    fn fan_speed(&self, fan_idx: u32) -> Result<CoolerLevel, NvmlError> {
        let speed = self
            .device
            .fan_speed(fan_idx)
            .map_err(|e| self.convert_error(e))?;

        Ok(CoolerLevel::saturating(speed))
    }

    fn fan_speed_rpm(&self, fan_idx: u32) -> Result<u32, NvmlError> {
        self.device
            .fan_speed_rpm(fan_idx)
            .map_err(|e| self.convert_error(e))
    }

    fn set_fan_speed(&mut self, fan_idx: u32, speed: CoolerLevel) -> Result<(), NvmlError> {
        self.device
            .set_fan_speed(fan_idx, u32::from(speed.percent()))
            .map_err(|e| self.convert_error(e))
    }

    fn set_default_fan_speed(&mut self, fan_idx: u32) -> Result<(), NvmlError> {
        self.device
            .set_default_fan_speed(fan_idx)
            .map_err(|e| self.convert_error(e))
    }

    fn fan_policy(&self, fan_idx: u32) -> Result<FanPolicy, NvmlError> {
        let policy = self
            .device
            .fan_control_policy(fan_idx)
            .map_err(|e| self.convert_error(e))?;

        Ok(match policy {
            FanControlPolicy::TemperatureContinousSw => FanPolicy::Auto,
            FanControlPolicy::Manual => FanPolicy::Manual,
        })
    }

    fn set_fan_policy(&mut self, fan_idx: u32, policy: FanPolicy) -> Result<(), NvmlError> {
        let nvml_policy = match policy {
            FanPolicy::Auto => FanControlPolicy::TemperatureContinousSw,
            FanPolicy::Manual => FanControlPolicy::Manual,
        };

        self.device
            .set_fan_control_policy(fan_idx, nvml_policy)
            .map_err(|e| self.convert_error(e))
    }

    fn cooler_target(&self, _fan_idx: u32) -> Result<CoolerTarget, NvmlError> {
        // nvmlDeviceGetCoolerInfo reports one target for all coolers
        cooler_target_raw(self.library, self.handle())
    }

    fn memory_info(&self) -> Result<MemoryInfo, NvmlError> {
        let mem = self.device.memory_info().map_err(|e| self.convert_error(e))?;

        Ok(MemoryInfo::new(mem.total, mem.used, mem.free))
    }

    fn pci_info(&self) -> Result<PciInfo, NvmlError> {
        let pci = self.device.pci_info().map_err(|e| self.convert_error(e))?;

        // pci_device_id is `device << 16 | vendor`
        Ok(PciInfo {
            domain: pci.domain,
            bus: pci.bus,
            device: pci.device,
            function: pci_function(&pci.bus_id),
            vendor_id: (pci.pci_device_id & 0xffff) as u16,
            device_id: (pci.pci_device_id >> 16) as u16,
        })
    }

    fn pcie_link(&self) -> Result<PcieLink, NvmlError> {
        let max_generation = self
            .device
            .max_pcie_link_gen()
            .map_err(|e| self.convert_error(e))?;
        let max_width = self
            .device
            .max_pcie_link_width()
            .map_err(|e| self.convert_error(e))?;
        let current_width = current_link_width_raw(self.library, self.handle())?;

        Ok(PcieLink {
            max_generation,
            max_width,
            current_width,
        })
    }

    fn clocks(&self) -> Result<ClockFrequencies, NvmlError> {
        let graphics_mhz = self
            .device
            .clock_info(Clock::Graphics)
            .map_err(|e| self.convert_error(e))?;
        let memory_mhz = self
            .device
            .clock_info(Clock::Memory)
            .map_err(|e| self.convert_error(e))?;

        Ok(ClockFrequencies {
            graphics_mhz,
            memory_mhz,
        })
    }

    fn utilization(&self) -> Result<Utilization, NvmlError> {
        let util = self
            .device
            .utilization_rates()
            .map_err(|e| self.convert_error(e))?;

        Ok(Utilization::new(util.gpu as u8, util.memory as u8))
    }

    fn ecc_state(&self) -> Result<Option<EccState>, NvmlError> {
        match self.device.is_ecc_enabled() {
            Ok(state) => Ok(Some(EccState {
                enabled: state.currently_enabled,
                pending: state.pending_enabled,
            })),
            Err(RawError::NotSupported) => Ok(None),
            Err(e) => Err(self.convert_error(e)),
        }
    }
}

fn check_return(result: c_uint, call: &str) -> Result<(), NvmlError> {
    use nvml_wrapper_sys::bindings::nvmlReturn_enum_NVML_SUCCESS;

    match result {
        nvmlReturn_enum_NVML_SUCCESS => Ok(()),
        NVML_ERROR_NOT_SUPPORTED => Err(NvmlError::NotSupported(call.to_string())),
        code => Err(NvmlError::Unknown(format!("{} returned {}", call, code))),
    }
}

/// Call `symbol(handle, out)` for an entry point nvml-wrapper lacks
///
/// # Safety
/// `symbol` must name a function taking a device handle and a pointer to `T`.
unsafe fn device_query<T>(
    library: &str,
    symbol: &str,
    handle: nvmlDevice_t,
    out: &mut T,
) -> Result<(), NvmlError> {
    type QueryFn<T> = unsafe extern "C" fn(nvmlDevice_t, *mut T) -> c_uint;

    // SAFETY: nvml-wrapper already holds the library open
    let lib = unsafe { Library::new(library) }
        .map_err(|e| NvmlError::Unknown(format!("reopening {}: {}", library, e)))?;
    let name = format!("{}\0", symbol);
    // SAFETY: the caller guarantees the signature
    let func: Symbol<QueryFn<T>> = unsafe { lib.get(name.as_bytes()) }
        .map_err(|_| NvmlError::NotSupported(symbol.to_string()))?;

    // SAFETY: `out` is a valid out-parameter for the duration of the call
    check_return(unsafe { func(handle, out) }, symbol)
}

/// `nvmlCoolerInfo_t`
#[repr(C)]
#[derive(Default)]
struct CoolerInfo {
    version: c_uint,
    index: c_uint,
    signal_type: c_uint,
    target: c_uint,
}

/// `nvmlCoolerInfo_v1`: struct size | 1 << 24
const COOLER_INFO_V1: c_uint = std::mem::size_of::<CoolerInfo>() as c_uint | (1 << 24);

fn cooler_target_raw(library: &str, handle: nvmlDevice_t) -> Result<CoolerTarget, NvmlError> {
    let mut info = CoolerInfo {
        version: COOLER_INFO_V1,
        ..Default::default()
    };
    // SAFETY: nvmlDeviceGetCoolerInfo(nvmlDevice_t, nvmlCoolerInfo_t *)
    unsafe { device_query(library, "nvmlDeviceGetCoolerInfo", handle, &mut info)? };
    Ok(CoolerTarget::from_nvml(info.target))
}

fn current_link_width_raw(library: &str, handle: nvmlDevice_t) -> Result<u32, NvmlError> {
    let mut width: c_uint = 0;
    // SAFETY: nvmlDeviceGetCurrPcieLinkWidth(nvmlDevice_t, unsigned int *)
    unsafe { device_query(library, "nvmlDeviceGetCurrPcieLinkWidth", handle, &mut width)? };
    Ok(width)
}
