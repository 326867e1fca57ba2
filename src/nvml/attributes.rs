//! NVML answers for NV-CONTROL attributes
//!
//! GPU, cooler and thermal-sensor targets can be served from NVML. Every
//! attribute NVML cannot answer yields `NotSupported`, which tells the
//! dispatcher to ask the X server instead.

use super::reconcile::IdTable;
use super::traits::{GpuDevice, GpuManager};
use crate::attributes::ids;
use crate::domain::{
    CoolerLevel, FanPolicy, Permissions, SensorProvider, SensorTarget, Target, TargetType,
    ValidValues, ValueType,
};
use crate::error::{CtrlError, CtrlResult, NvmlError};
use std::rc::Rc;

/// `NV_CTRL_THERMAL_COOLER_CONTROL_TYPE_VARIABLE`
const COOLER_CONTROL_TYPE_VARIABLE: i64 = 2;

/// NVML state of one target
pub struct NvmlAttributes {
    manager: Rc<dyn GpuManager>,
    target: Target,
    device: u32,
    /// Fan index for coolers, sensor index for thermal sensors
    local: u32,
}

/// Log and fold an NVML failure into the attribute status set
fn status(err: NvmlError) -> CtrlError {
    match &err {
        NvmlError::NotSupported(_) => log::debug!("NVML: {}", err),
        _ => log::warn!("NVML: {}", err),
    }
    CtrlError::from(&err)
}

impl NvmlAttributes {
    /// Bind `target` to its NVML device
    ///
    /// `None` for target types NVML does not serve, or when the target has
    /// no NVML counterpart.
    pub fn init(manager: Rc<dyn GpuManager>, table: &IdTable, target: Target) -> Option<Self> {
        let (device, local) = match target.kind {
            TargetType::Gpu => (table.nvml_index(target.id)?, 0),
            TargetType::Cooler => table.cooler(target.id)?,
            TargetType::ThermalSensor => table.sensor(target.id)?,
            _ => return None,
        };
        if let Err(e) = manager.device_by_index(device) {
            log::debug!("NVML device {} for {} unavailable: {}", device, target, e);
            return None;
        }
        log::debug!("NVML device {} bound to {}", device, target);
        Some(Self {
            manager,
            target,
            device,
            local,
        })
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn device_index(&self) -> u32 {
        self.device
    }

    fn with_device<T>(
        &self,
        f: impl FnOnce(&mut dyn GpuDevice) -> Result<T, NvmlError>,
    ) -> CtrlResult<T> {
        let mut device = self.manager.device_by_index(self.device).map_err(status)?;
        f(device.as_mut()).map_err(status)
    }

    fn fan_count(&self) -> CtrlResult<u32> {
        self.with_device(|d| d.fan_count())
    }

    pub fn get_attribute(&self, attr: u32) -> CtrlResult<i64> {
        match self.target.kind {
            TargetType::Gpu => self.get_gpu_attribute(attr),
            TargetType::Cooler => self.get_cooler_attribute(attr),
            TargetType::ThermalSensor => self.get_sensor_attribute(attr),
            _ => Err(CtrlError::NotSupported),
        }
    }

    fn get_gpu_attribute(&self, attr: u32) -> CtrlResult<i64> {
        match attr {
            ids::TOTAL_DEDICATED_GPU_MEMORY => {
                self.with_device(|d| Ok(d.memory_info()?.total_mb() as i64))
            }
            ids::USED_DEDICATED_GPU_MEMORY => {
                self.with_device(|d| Ok(d.memory_info()?.used_mb() as i64))
            }
            ids::TOTAL_GPU_MEMORY => self.with_device(|d| Ok(d.memory_info()?.total_kb() as i64)),
            ids::PCI_DOMAIN => self.with_device(|d| Ok(d.pci_info()?.domain.into())),
            ids::PCI_BUS => self.with_device(|d| Ok(d.pci_info()?.bus.into())),
            ids::PCI_DEVICE => self.with_device(|d| Ok(d.pci_info()?.device.into())),
            ids::PCI_FUNCTION => self.with_device(|d| Ok(d.pci_info()?.function.into())),
            ids::PCI_ID => self.with_device(|d| Ok(d.pci_info()?.packed_id())),
            ids::GPU_PCIE_GENERATION => {
                self.with_device(|d| Ok(d.pcie_link()?.max_generation.into()))
            }
            ids::GPU_PCIE_MAX_LINK_WIDTH => {
                self.with_device(|d| Ok(d.pcie_link()?.max_width.into()))
            }
            ids::GPU_PCIE_CURRENT_LINK_WIDTH => {
                self.with_device(|d| Ok(d.pcie_link()?.current_width.into()))
            }
            ids::GPU_CORE_TEMPERATURE => {
                self.with_device(|d| Ok(d.temperature()?.as_attribute()))
            }
            ids::GPU_CURRENT_CLOCK_FREQS => self.with_device(|d| Ok(d.clocks()?.packed())),
            ids::GPU_ECC_SUPPORTED => {
                self.with_device(|d| Ok(i64::from(d.ecc_state()?.is_some())))
            }
            ids::GPU_ECC_STATUS => self.with_device(|d| match d.ecc_state()? {
                Some(ecc) => Ok(i64::from(ecc.enabled)),
                None => Err(NvmlError::NotSupported("ECC".into())),
            }),
            ids::GPU_ECC_CONFIGURATION => self.with_device(|d| match d.ecc_state()? {
                Some(ecc) => Ok(i64::from(ecc.pending)),
                None => Err(NvmlError::NotSupported("ECC".into())),
            }),
            ids::GPU_COOLER_MANUAL_CONTROL => self.with_device(|d| {
                let mut manual = false;
                for fan in 0..d.fan_count()? {
                    manual |= d.fan_policy(fan)? == FanPolicy::Manual;
                }
                Ok(i64::from(manual))
            }),
            _ => Err(CtrlError::NotSupported),
        }
    }

    fn get_cooler_attribute(&self, attr: u32) -> CtrlResult<i64> {
        let fan = self.local;
        match attr {
            ids::THERMAL_COOLER_LEVEL | ids::THERMAL_COOLER_CURRENT_LEVEL => {
                self.with_device(|d| Ok(d.fan_speed(fan)?.as_attribute()))
            }
            ids::THERMAL_COOLER_SPEED => self.with_device(|d| Ok(d.fan_speed_rpm(fan)?.into())),
            ids::THERMAL_COOLER_CONTROL_TYPE => Ok(COOLER_CONTROL_TYPE_VARIABLE),
            ids::THERMAL_COOLER_TARGET => {
                self.with_device(|d| Ok(d.cooler_target(fan)?.as_attribute()))
            }
            ids::THERMAL_COOLER_LEVEL_SET_DEFAULT => Err(CtrlError::WriteOnlyAttribute),
            _ => Err(CtrlError::NotSupported),
        }
    }

    fn get_sensor_attribute(&self, attr: u32) -> CtrlResult<i64> {
        match attr {
            ids::THERMAL_SENSOR_READING => {
                self.with_device(|d| Ok(d.temperature()?.as_attribute()))
            }
            ids::THERMAL_SENSOR_PROVIDER => Ok(SensorProvider::GpuInternal.as_attribute()),
            ids::THERMAL_SENSOR_TARGET => Ok(SensorTarget::Gpu.as_attribute()),
            _ => Err(CtrlError::NotSupported),
        }
    }

    /// Cooler writes; everything else is left to NV-CONTROL
    pub fn set_attribute(&self, attr: u32, value: i64) -> CtrlResult<()> {
        match (self.target.kind, attr) {
            (TargetType::Cooler, ids::THERMAL_COOLER_LEVEL) => {
                let speed = CoolerLevel::new(value).map_err(|_| CtrlError::BadArgument)?;
                let fan = self.local;
                self.with_device(|d| d.set_fan_speed(fan, speed))
            }
            (TargetType::Cooler, ids::THERMAL_COOLER_LEVEL_SET_DEFAULT) => {
                let fan = self.local;
                self.with_device(|d| d.set_default_fan_speed(fan))
            }
            (TargetType::Gpu, ids::GPU_COOLER_MANUAL_CONTROL) => {
                let policy = FanPolicy::from_attribute(value).ok_or(CtrlError::BadArgument)?;
                let fans = self.fan_count()?;
                self.with_device(|d| {
                    for fan in 0..fans {
                        d.set_fan_policy(fan, policy)?;
                    }
                    Ok(())
                })
            }
            _ => Err(CtrlError::NotSupported),
        }
    }

    pub fn valid_values(&self, attr: u32) -> CtrlResult<ValidValues> {
        let scope = self.target.kind.permission();
        let read = Permissions::READ | scope;
        let value_type = match (self.target.kind, attr) {
            (TargetType::Cooler, ids::THERMAL_COOLER_LEVEL) => {
                return Ok(ValidValues::new(
                    ValueType::Range {
                        min: CoolerLevel::MIN,
                        max: CoolerLevel::MAX,
                    },
                    Permissions::READ_WRITE | scope,
                ))
            }
            (TargetType::Cooler, ids::THERMAL_COOLER_LEVEL_SET_DEFAULT) => {
                return Ok(ValidValues::new(
                    ValueType::Integer,
                    Permissions::WRITE | scope,
                ))
            }
            (TargetType::Gpu, ids::GPU_COOLER_MANUAL_CONTROL) => {
                return Ok(ValidValues::new(
                    ValueType::Bool,
                    Permissions::READ_WRITE | scope,
                ))
            }
            (TargetType::Gpu, ids::GPU_ECC_SUPPORTED)
            | (TargetType::Gpu, ids::GPU_ECC_STATUS)
            | (TargetType::Gpu, ids::GPU_ECC_CONFIGURATION) => ValueType::Bool,
            (TargetType::Cooler, ids::THERMAL_COOLER_CURRENT_LEVEL) => ValueType::Range {
                min: CoolerLevel::MIN,
                max: CoolerLevel::MAX,
            },
            (TargetType::Gpu, _) | (TargetType::Cooler, _) | (TargetType::ThermalSensor, _) => {
                // Integer attributes NVML can read
                self.get_attribute(attr)?;
                ValueType::Integer
            }
            _ => return Err(CtrlError::NotSupported),
        };
        Ok(ValidValues::new(value_type, read))
    }

    pub fn get_string(&self, attr: u32) -> CtrlResult<String> {
        if self.target.kind != TargetType::Gpu {
            return Err(CtrlError::NotSupported);
        }
        match attr {
            ids::STRING_PRODUCT_NAME => self.with_device(|d| d.name()),
            ids::STRING_VBIOS_VERSION => self.with_device(|d| d.vbios_version()),
            ids::STRING_GPU_UUID => self.with_device(|d| d.uuid()),
            ids::STRING_NVIDIA_DRIVER_VERSION => self.manager.driver_version().map_err(status),
            ids::STRING_GPU_UTILIZATION => self.with_device(|d| {
                let util = d.utilization()?;
                Ok(format!("graphics={}, memory={}", util.gpu, util.memory))
            }),
            _ => Err(CtrlError::NotSupported),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDevice, MockManager};

    fn setup(target: Target) -> (Rc<MockManager>, NvmlAttributes) {
        let manager = Rc::new(MockManager::with_devices(vec![
            MockDevice::new(0).with_fan_count(2),
            MockDevice::new(1).with_fan_count(1),
        ]));
        let table = IdTable::identity(2).with_fan_counts(&[2, 1]);
        let attrs = NvmlAttributes::init(manager.clone(), &table, target).unwrap();
        (manager, attrs)
    }

    #[test]
    fn test_gpu_integers() {
        let (_, attrs) = setup(Target::gpu(1));
        assert_eq!(attrs.get_attribute(ids::GPU_CORE_TEMPERATURE), Ok(45));
        assert_eq!(attrs.get_attribute(ids::TOTAL_DEDICATED_GPU_MEMORY), Ok(8192));
        assert_eq!(attrs.get_attribute(ids::PCI_BUS), Ok(2));
        assert_eq!(attrs.get_attribute(ids::PCI_ID), Ok(0x10de_2204));
        assert_eq!(
            attrs.get_attribute(ids::DIGITAL_VIBRANCE),
            Err(CtrlError::NotSupported)
        );
    }

    #[test]
    fn test_gpu_strings() {
        let (_, attrs) = setup(Target::gpu(0));
        assert_eq!(attrs.get_string(ids::STRING_PRODUCT_NAME).unwrap(), "Mock GPU 0");
        assert_eq!(attrs.get_string(ids::STRING_GPU_UUID).unwrap(), "GPU-MOCK-0000");
        assert_eq!(
            attrs.get_string(ids::STRING_NVIDIA_DRIVER_VERSION).unwrap(),
            "535.154.05"
        );
        assert_eq!(
            attrs.get_string(ids::STRING_GPU_UTILIZATION).unwrap(),
            "graphics=30, memory=10"
        );
        assert_eq!(
            attrs.get_string(ids::STRING_DISPLAY_DEVICE_NAME),
            Err(CtrlError::NotSupported)
        );
    }

    #[test]
    fn test_cooler_level_round_trip() {
        // Cooler 2 is the only fan of GPU 1
        let (manager, attrs) = setup(Target::new(TargetType::Cooler, 2));
        assert_eq!(attrs.device_index(), 1);

        attrs.set_attribute(ids::THERMAL_COOLER_LEVEL, 80).unwrap();
        assert_eq!(attrs.get_attribute(ids::THERMAL_COOLER_LEVEL), Ok(80));
        assert_eq!(manager.device(1).unwrap().fan_speed_value(0), 80);

        assert_eq!(
            attrs.set_attribute(ids::THERMAL_COOLER_LEVEL, 101),
            Err(CtrlError::BadArgument)
        );

        attrs
            .set_attribute(ids::THERMAL_COOLER_LEVEL_SET_DEFAULT, 1)
            .unwrap();
        assert_eq!(manager.device(1).unwrap().fan_speed_value(0), 50);
        assert_eq!(
            attrs.get_attribute(ids::THERMAL_COOLER_LEVEL_SET_DEFAULT),
            Err(CtrlError::WriteOnlyAttribute)
        );
    }

    #[test]
    fn test_manual_control_sets_every_fan() {
        let (manager, attrs) = setup(Target::gpu(0));
        assert_eq!(attrs.get_attribute(ids::GPU_COOLER_MANUAL_CONTROL), Ok(0));

        attrs.set_attribute(ids::GPU_COOLER_MANUAL_CONTROL, 1).unwrap();
        assert_eq!(attrs.get_attribute(ids::GPU_COOLER_MANUAL_CONTROL), Ok(1));
        let device = manager.device(0).unwrap();
        assert_eq!(device.fan_policy_value(0), FanPolicy::Manual);
        assert_eq!(device.fan_policy_value(1), FanPolicy::Manual);

        assert_eq!(
            attrs.set_attribute(ids::GPU_COOLER_MANUAL_CONTROL, 2),
            Err(CtrlError::BadArgument)
        );
    }

    #[test]
    fn test_sensor_attributes() {
        let (_, attrs) = setup(Target::new(TargetType::ThermalSensor, 0));
        assert_eq!(attrs.get_attribute(ids::THERMAL_SENSOR_READING), Ok(45));
        assert_eq!(attrs.get_attribute(ids::THERMAL_SENSOR_PROVIDER), Ok(1));
        assert_eq!(attrs.get_attribute(ids::THERMAL_SENSOR_TARGET), Ok(1));
    }

    #[test]
    fn test_valid_values() {
        let (_, attrs) = setup(Target::new(TargetType::Cooler, 0));
        let level = attrs.valid_values(ids::THERMAL_COOLER_LEVEL).unwrap();
        assert_eq!(level.value_type, ValueType::Range { min: 0, max: 100 });
        assert!(level.permissions.writable());
        assert!(level.permissions.contains(Permissions::COOLER));

        let rpm = attrs.valid_values(ids::THERMAL_COOLER_SPEED).unwrap();
        assert_eq!(rpm.value_type, ValueType::Integer);
        assert!(!rpm.permissions.writable());

        assert_eq!(
            attrs.valid_values(ids::FSAA_MODE),
            Err(CtrlError::NotSupported)
        );
    }

    #[test]
    fn test_unserved_targets() {
        let manager: Rc<dyn GpuManager> = Rc::new(MockManager::new(1));
        let table = IdTable::identity(1);
        assert!(NvmlAttributes::init(manager.clone(), &table, Target::x_screen(0)).is_none());
        assert!(NvmlAttributes::init(manager.clone(), &table, Target::gpu(1)).is_none());
        assert!(
            NvmlAttributes::init(manager, &table, Target::new(TargetType::Cooler, 0)).is_none()
        );
    }

    #[test]
    fn test_ecc_unsupported() {
        let (_, attrs) = setup(Target::gpu(0));
        assert_eq!(attrs.get_attribute(ids::GPU_ECC_SUPPORTED), Ok(0));
        assert_eq!(
            attrs.get_attribute(ids::GPU_ECC_STATUS),
            Err(CtrlError::NotSupported)
        );
    }
}
