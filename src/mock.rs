//! Mock implementations for testing
//!
//! Provides a recording NV-CONTROL server, mock NVML devices and a mock
//! gamma device, so the dispatcher can be exercised without an X server or
//! NVIDIA hardware.

use crate::domain::{
    ClockFrequencies, CoolerLevel, CoolerTarget, EccState, FanPolicy, GammaRamp, MemoryInfo,
    Permissions, PciInfo, PcieLink, ProtocolVersion, Target, TargetType, Temperature,
    Utilization, ValidValues, ValueType,
};
use crate::error::{CtrlError, CtrlResult, NvmlError};
use crate::nvcontrol::{NotifyKind, NvControlEvent, NvControlProtocol, Opcode};
use crate::nvml::{GpuDevice, GpuManager};
use crate::xext::GammaDevice;

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

type Key = (Target, u32);

/// Recording NV-CONTROL server
///
/// Every request is logged by opcode. Attributes that were never set
/// answer `AttributeNotAvailable`.
pub struct MockNvControl {
    version: ProtocolVersion,
    requests: RefCell<Vec<Opcode>>,
    values: RefCell<HashMap<Key, i64>>,
    strings: RefCell<HashMap<Key, String>>,
    binaries: RefCell<HashMap<Key, Vec<u8>>>,
    valid: RefCell<HashMap<Key, ValidValues>>,
    target_counts: RefCell<HashMap<TargetType, u32>>,
    non_nv_screens: RefCell<HashSet<u32>>,
    selected: RefCell<Vec<NotifyKind>>,
    events: RefCell<VecDeque<NvControlEvent>>,
    reject_sets: Cell<bool>,
}

impl MockNvControl {
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            version,
            requests: RefCell::new(Vec::new()),
            values: RefCell::new(HashMap::new()),
            strings: RefCell::new(HashMap::new()),
            binaries: RefCell::new(HashMap::new()),
            valid: RefCell::new(HashMap::new()),
            target_counts: RefCell::new(HashMap::new()),
            non_nv_screens: RefCell::new(HashSet::new()),
            selected: RefCell::new(Vec::new()),
            events: RefCell::new(VecDeque::new()),
            reject_sets: Cell::new(false),
        }
    }

    fn record(&self, opcode: Opcode) {
        self.requests.borrow_mut().push(opcode);
    }

    /// Opcodes of every request since the last clear
    pub fn requests(&self) -> Vec<Opcode> {
        self.requests.borrow().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.borrow_mut().clear();
    }

    pub fn set_attribute_value(&self, target: Target, attr: u32, value: i64) {
        self.values.borrow_mut().insert((target, attr), value);
    }

    pub fn attribute_value(&self, target: Target, attr: u32) -> Option<i64> {
        self.values.borrow().get(&(target, attr)).copied()
    }

    pub fn set_string_value(&self, target: Target, attr: u32, value: impl Into<String>) {
        self.strings.borrow_mut().insert((target, attr), value.into());
    }

    pub fn string_value(&self, target: Target, attr: u32) -> Option<String> {
        self.strings.borrow().get(&(target, attr)).cloned()
    }

    pub fn set_binary_value(&self, target: Target, attr: u32, data: Vec<u8>) {
        self.binaries.borrow_mut().insert((target, attr), data);
    }

    pub fn set_valid_values(&self, target: Target, attr: u32, valid: ValidValues) {
        self.valid.borrow_mut().insert((target, attr), valid);
    }

    pub fn set_target_count(&self, kind: TargetType, count: u32) {
        self.target_counts.borrow_mut().insert(kind, count);
    }

    pub fn set_nv_screen(&self, screen: u32, is_nv: bool) {
        let mut screens = self.non_nv_screens.borrow_mut();
        if is_nv {
            screens.remove(&screen);
        } else {
            screens.insert(screen);
        }
    }

    /// Event kinds selected so far, in selection order
    pub fn selected_events(&self) -> Vec<NotifyKind> {
        self.selected.borrow().clone()
    }

    pub fn push_event(&self, event: NvControlEvent) {
        self.events.borrow_mut().push_back(event);
    }

    /// Make every set request report failure
    pub fn reject_sets(&self, reject: bool) {
        self.reject_sets.set(reject);
    }
}

impl NvControlProtocol for MockNvControl {
    fn query_version(&self) -> CtrlResult<ProtocolVersion> {
        self.record(Opcode::QueryExtension);
        Ok(self.version)
    }

    fn is_nv(&self, screen: u32) -> CtrlResult<bool> {
        self.record(Opcode::IsNv);
        Ok(!self.non_nv_screens.borrow().contains(&screen))
    }

    fn select_notify(&self, _screen: u32, kind: NotifyKind, enable: bool) -> CtrlResult<()> {
        self.record(Opcode::SelectNotify);
        if enable {
            self.selected.borrow_mut().push(kind);
        }
        Ok(())
    }

    fn select_target_notify(
        &self,
        _target: Target,
        kind: NotifyKind,
        enable: bool,
    ) -> CtrlResult<()> {
        self.record(Opcode::SelectTargetNotify);
        if enable {
            self.selected.borrow_mut().push(kind);
        }
        Ok(())
    }

    fn query_target_count(&self, kind: TargetType) -> CtrlResult<u32> {
        self.record(Opcode::QueryTargetCount);
        Ok(self.target_counts.borrow().get(&kind).copied().unwrap_or(0))
    }

    fn query_attribute(&self, target: Target, _display_mask: u32, attr: u32) -> CtrlResult<i32> {
        self.record(Opcode::QueryAttribute);
        self.attribute_value(target, attr)
            .map(|v| v as i32)
            .ok_or(CtrlError::AttributeNotAvailable)
    }

    fn query_attribute64(&self, target: Target, _display_mask: u32, attr: u32) -> CtrlResult<i64> {
        self.record(Opcode::QueryAttribute64);
        self.attribute_value(target, attr)
            .ok_or(CtrlError::AttributeNotAvailable)
    }

    fn set_attribute_and_get_status(
        &self,
        target: Target,
        _display_mask: u32,
        attr: u32,
        value: i32,
    ) -> CtrlResult<bool> {
        self.record(Opcode::SetAttributeAndGetStatus);
        if self.reject_sets.get() {
            return Ok(false);
        }
        self.set_attribute_value(target, attr, value.into());
        Ok(true)
    }

    fn query_valid_values(
        &self,
        target: Target,
        _display_mask: u32,
        attr: u32,
    ) -> CtrlResult<ValidValues> {
        self.record(Opcode::QueryValidAttributeValues);
        Ok(self.valid_or_default(target, attr, ValueType::Integer))
    }

    fn query_valid_values64(
        &self,
        target: Target,
        _display_mask: u32,
        attr: u32,
    ) -> CtrlResult<ValidValues> {
        self.record(Opcode::QueryValidAttributeValues64);
        Ok(self.valid_or_default(target, attr, ValueType::Integer))
    }

    fn query_valid_string_values(
        &self,
        target: Target,
        _display_mask: u32,
        attr: u32,
    ) -> CtrlResult<ValidValues> {
        self.record(Opcode::QueryValidStringAttributeValues);
        Ok(self.valid_or_default(target, attr, ValueType::String))
    }

    fn query_string(&self, target: Target, _display_mask: u32, attr: u32) -> CtrlResult<String> {
        self.record(Opcode::QueryStringAttribute);
        self.string_value(target, attr)
            .ok_or(CtrlError::AttributeNotAvailable)
    }

    fn set_string(
        &self,
        target: Target,
        _display_mask: u32,
        attr: u32,
        value: &str,
    ) -> CtrlResult<bool> {
        self.record(Opcode::SetStringAttribute);
        if self.reject_sets.get() {
            return Ok(false);
        }
        self.set_string_value(target, attr, value);
        Ok(true)
    }

    fn query_binary(&self, target: Target, _display_mask: u32, attr: u32) -> CtrlResult<Vec<u8>> {
        self.record(Opcode::QueryBinaryData);
        self.binaries
            .borrow()
            .get(&(target, attr))
            .cloned()
            .ok_or(CtrlError::AttributeNotAvailable)
    }

    fn string_operation(
        &self,
        target: Target,
        _display_mask: u32,
        attr: u32,
        input: &str,
    ) -> CtrlResult<String> {
        self.record(Opcode::StringOperation);
        // Canned result if one was set, otherwise echo
        Ok(self
            .string_value(target, attr)
            .unwrap_or_else(|| input.to_string()))
    }

    fn next_event(&self) -> CtrlResult<Option<NvControlEvent>> {
        Ok(self.events.borrow_mut().pop_front())
    }
}

impl MockNvControl {
    fn valid_or_default(&self, target: Target, attr: u32, value_type: ValueType) -> ValidValues {
        self.valid
            .borrow()
            .get(&(target, attr))
            .copied()
            .unwrap_or_else(|| {
                let permissions = match value_type {
                    ValueType::String => Permissions::READ,
                    _ => Permissions::READ_WRITE,
                };
                ValidValues::new(value_type, permissions | target.kind.permission())
            })
    }
}

/// Mock GPU device for testing
///
/// State lives behind `Cell`/`RefCell` so handles borrowed from a
/// [`MockManager`] can mutate it.
#[derive(Debug)]
pub struct MockDevice {
    index: u32,
    name: String,
    uuid: String,
    temperature: Cell<Temperature>,
    fan_speeds: RefCell<Vec<CoolerLevel>>,
    fan_policies: RefCell<Vec<FanPolicy>>,
    memory: MemoryInfo,
    pci: PciInfo,
    ecc: Option<EccState>,
    unsupported: bool,
}

impl MockDevice {
    /// Create a new mock device with default values
    pub fn new(index: u32) -> Self {
        const MIB: u64 = 1024 * 1024;
        Self {
            index,
            name: format!("Mock GPU {}", index),
            uuid: format!("GPU-MOCK-{:04}", index),
            temperature: Cell::new(Temperature::new(45)),
            fan_speeds: RefCell::new(vec![CoolerLevel::saturating(50); 2]),
            fan_policies: RefCell::new(vec![FanPolicy::Auto; 2]),
            memory: MemoryInfo::new(8192 * MIB, 1024 * MIB, 7168 * MIB),
            pci: PciInfo {
                domain: 0,
                bus: index + 1,
                device: 0,
                function: 0,
                vendor_id: 0x10de,
                device_id: 0x2204,
            },
            ecc: None,
            unsupported: false,
        }
    }

    pub fn set_temperature(&self, temp: Temperature) {
        self.temperature.set(temp);
    }

    /// Builder: set UUID
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = uuid.into();
        self
    }

    /// Builder: set fan count
    pub fn with_fan_count(self, count: u32) -> Self {
        self.fan_speeds
            .borrow_mut()
            .resize(count as usize, CoolerLevel::saturating(50));
        self.fan_policies
            .borrow_mut()
            .resize(count as usize, FanPolicy::Auto);
        self
    }

    /// Builder: enable ECC memory
    pub fn with_ecc(mut self, ecc: EccState) -> Self {
        self.ecc = Some(ecc);
        self
    }

    /// Builder: every query answers `NotSupported`
    pub fn unsupported(mut self) -> Self {
        self.unsupported = true;
        self
    }

    pub fn fan_speed_value(&self, fan: u32) -> u8 {
        self.fan_speeds.borrow()[fan as usize].percent()
    }

    pub fn fan_policy_value(&self, fan: u32) -> FanPolicy {
        self.fan_policies.borrow()[fan as usize]
    }

    fn supported(&self) -> Result<(), NvmlError> {
        if self.unsupported {
            return Err(NvmlError::NotSupported("mock".to_string()));
        }
        Ok(())
    }

    fn fan(&self, fan: u32) -> Result<usize, NvmlError> {
        self.supported()?;
        if fan as usize >= self.fan_speeds.borrow().len() {
            return Err(NvmlError::InvalidArgument(format!("Fan {} not found", fan)));
        }
        Ok(fan as usize)
    }
}

/// Borrowed view of a [`MockDevice`] handed out by [`MockManager`]
pub struct MockDeviceHandle<'a>(&'a MockDevice);

impl GpuDevice for MockDeviceHandle<'_> {
    fn index(&self) -> u32 {
        self.0.index
    }

    fn name(&self) -> Result<String, NvmlError> {
        self.0.supported()?;
        Ok(self.0.name.clone())
    }

    fn uuid(&self) -> Result<String, NvmlError> {
        Ok(self.0.uuid.clone())
    }

    fn vbios_version(&self) -> Result<String, NvmlError> {
        self.0.supported()?;
        Ok("94.02.42.00.a1".to_string())
    }

    fn temperature(&self) -> Result<Temperature, NvmlError> {
        self.0.supported()?;
        Ok(self.0.temperature.get())
    }

    fn fan_count(&self) -> Result<u32, NvmlError> {
        Ok(self.0.fan_speeds.borrow().len() as u32)
    }

    fn fan_speed(&self, fan_idx: u32) -> Result<CoolerLevel, NvmlError> {
        let fan = self.0.fan(fan_idx)?;
        Ok(self.0.fan_speeds.borrow()[fan])
    }

    fn fan_speed_rpm(&self, fan_idx: u32) -> Result<u32, NvmlError> {
        let fan = self.0.fan(fan_idx)?;
        Ok(u32::from(self.0.fan_speeds.borrow()[fan].percent()) * 30)
    }

    fn set_fan_speed(&mut self, fan_idx: u32, speed: CoolerLevel) -> Result<(), NvmlError> {
        let fan = self.0.fan(fan_idx)?;
        self.0.fan_speeds.borrow_mut()[fan] = speed;
        self.0.fan_policies.borrow_mut()[fan] = FanPolicy::Manual;
        Ok(())
    }

    fn set_default_fan_speed(&mut self, fan_idx: u32) -> Result<(), NvmlError> {
        let fan = self.0.fan(fan_idx)?;
        self.0.fan_speeds.borrow_mut()[fan] = CoolerLevel::saturating(50);
        self.0.fan_policies.borrow_mut()[fan] = FanPolicy::Auto;
        Ok(())
    }

    fn fan_policy(&self, fan_idx: u32) -> Result<FanPolicy, NvmlError> {
        let fan = self.0.fan(fan_idx)?;
        Ok(self.0.fan_policies.borrow()[fan])
    }

    fn set_fan_policy(&mut self, fan_idx: u32, policy: FanPolicy) -> Result<(), NvmlError> {
        let fan = self.0.fan(fan_idx)?;
        self.0.fan_policies.borrow_mut()[fan] = policy;
        Ok(())
    }

    fn cooler_target(&self, fan_idx: u32) -> Result<CoolerTarget, NvmlError> {
        self.0.fan(fan_idx)?;
        Ok(CoolerTarget::All)
    }

    fn memory_info(&self) -> Result<MemoryInfo, NvmlError> {
        self.0.supported()?;
        Ok(self.0.memory)
    }

    fn pci_info(&self) -> Result<PciInfo, NvmlError> {
        self.0.supported()?;
        Ok(self.0.pci)
    }

    fn pcie_link(&self) -> Result<PcieLink, NvmlError> {
        self.0.supported()?;
        Ok(PcieLink {
            max_generation: 4,
            max_width: 16,
            current_width: 16,
        })
    }

    fn clocks(&self) -> Result<ClockFrequencies, NvmlError> {
        self.0.supported()?;
        Ok(ClockFrequencies {
            graphics_mhz: 1695,
            memory_mhz: 9751,
        })
    }

    fn utilization(&self) -> Result<Utilization, NvmlError> {
        self.0.supported()?;
        Ok(Utilization::new(30, 10))
    }

    fn ecc_state(&self) -> Result<Option<EccState>, NvmlError> {
        self.0.supported()?;
        Ok(self.0.ecc)
    }
}

/// Mock GPU manager for testing
pub struct MockManager {
    devices: Vec<MockDevice>,
    driver_version: String,
    nvml_version: String,
}

impl MockManager {
    /// Create a new mock manager with the specified number of devices
    pub fn new(device_count: u32) -> Self {
        Self::with_devices((0..device_count).map(MockDevice::new).collect())
    }

    /// Create a mock manager with custom devices
    pub fn with_devices(devices: Vec<MockDevice>) -> Self {
        Self {
            devices,
            driver_version: "535.154.05".to_string(),
            nvml_version: "12.535.154.05".to_string(),
        }
    }

    pub fn device(&self, index: u32) -> Option<&MockDevice> {
        self.devices.get(index as usize)
    }
}

impl GpuManager for MockManager {
    fn device_count(&self) -> Result<u32, NvmlError> {
        Ok(self.devices.len() as u32)
    }

    fn device_by_index(&self, index: u32) -> Result<Box<dyn GpuDevice + '_>, NvmlError> {
        self.devices
            .get(index as usize)
            .map(|d| Box::new(MockDeviceHandle(d)) as Box<dyn GpuDevice + '_>)
            .ok_or(NvmlError::DeviceNotFound(index))
    }

    fn driver_version(&self) -> Result<String, NvmlError> {
        Ok(self.driver_version.clone())
    }

    fn nvml_version(&self) -> Result<String, NvmlError> {
        Ok(self.nvml_version.clone())
    }
}

#[derive(Debug)]
struct GammaState {
    size: usize,
    ramp: Option<GammaRamp>,
    writes: usize,
}

/// In-memory gamma ramp
///
/// Clones share state, so a test can keep one clone while the color state
/// owns another.
#[derive(Debug, Clone)]
pub struct MockGammaDevice {
    state: Rc<RefCell<GammaState>>,
}

impl MockGammaDevice {
    /// Device reporting `size` entries and an identity ramp
    pub fn new(size: usize) -> Self {
        Self {
            state: Rc::new(RefCell::new(GammaState {
                size,
                ramp: None,
                writes: 0,
            })),
        }
    }

    pub fn write_count(&self) -> usize {
        self.state.borrow().writes
    }

    /// Last written ramp, or the identity ramp
    pub fn ramp(&self) -> GammaRamp {
        let state = self.state.borrow();
        match &state.ramp {
            Some(ramp) => ramp.clone(),
            None => GammaRamp::identity(state.size).unwrap(),
        }
    }

    /// Forget written ramps, as if another client restored identity
    pub fn reset(&self) {
        self.state.borrow_mut().ramp = None;
    }
}

impl GammaDevice for MockGammaDevice {
    fn ramp_size(&self) -> CtrlResult<usize> {
        Ok(self.state.borrow().size)
    }

    fn read_ramp(&self, size: usize) -> CtrlResult<GammaRamp> {
        let state = self.state.borrow();
        match &state.ramp {
            Some(ramp) => Ok(ramp.clone()),
            None => GammaRamp::identity(size),
        }
    }

    fn write_ramp(&self, ramp: &GammaRamp) -> CtrlResult<()> {
        let mut state = self.state.borrow_mut();
        state.ramp = Some(ramp.clone());
        state.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_device_fan_speed() {
        let manager = MockManager::new(1);
        let mut device = manager.device_by_index(0).unwrap();
        assert_eq!(device.fan_speed(0).unwrap().percent(), 50);

        device.set_fan_speed(1, CoolerLevel::new(80).unwrap()).unwrap();
        assert_eq!(manager.device(0).unwrap().fan_speed_value(1), 80);
        assert!(device.set_fan_speed(2, CoolerLevel::new(80).unwrap()).is_err());
    }

    #[test]
    fn test_mock_manager_device_by_index() {
        let manager = MockManager::new(2);
        assert_eq!(manager.device_count().unwrap(), 2);
        assert_eq!(manager.device_by_index(1).unwrap().index(), 1);
        assert!(matches!(
            manager.device_by_index(5),
            Err(NvmlError::DeviceNotFound(5))
        ));
    }

    #[test]
    fn test_unsupported_device() {
        let manager = MockManager::with_devices(vec![MockDevice::new(0).unsupported()]);
        let device = manager.device_by_index(0).unwrap();
        assert!(matches!(device.temperature(), Err(NvmlError::NotSupported(_))));
        assert_eq!(device.uuid().unwrap(), "GPU-MOCK-0000");
    }

    #[test]
    fn test_mock_nvcontrol_records() {
        let mock = MockNvControl::new(ProtocolVersion::new(1, 29));
        mock.set_target_count(TargetType::Gpu, 2);
        assert_eq!(mock.query_target_count(TargetType::Gpu), Ok(2));
        assert_eq!(mock.query_target_count(TargetType::Cooler), Ok(0));
        assert_eq!(
            mock.query_string(Target::gpu(0), 0, 0),
            Err(CtrlError::AttributeNotAvailable)
        );
        assert_eq!(
            mock.requests(),
            vec![
                Opcode::QueryTargetCount,
                Opcode::QueryTargetCount,
                Opcode::QueryStringAttribute
            ]
        );
    }
}
