//! Attribute dispatcher
//!
//! An [`AttributeHandle`] binds one target to every backend that could
//! initialize on it and routes each attribute call to the backend owning
//! the attribute's ID range. Absent backends are `None`; a call into a
//! range whose owner is absent fails with `MissingExtension` and never
//! reaches another backend.

use crate::attributes::{ids, AttributeKind, AttributeRegistry, Backend};
use crate::domain::{
    Channel, ColorMask, GammaInput, Permissions, Target, TargetType, ValidValues,
};
use crate::error::{CtrlError, CtrlResult};
use crate::nvcontrol::{NvControlAttributes, NvControlProtocol};
use crate::nvml::{GpuManager, IdTable, NvmlAttributes};
use crate::vulkan::{VulkanAttributes, VulkanInfo};
use crate::xext::xv::Adaptor;
use crate::xext::{
    ColorState, FbConfig, GlxAttributes, VidModeAttributes, XDisplay, XRandRAttributes,
    XvAttributes,
};
use bitflags::bitflags;
use std::rc::Rc;

bitflags! {
    /// Backends a handle may probe
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Subsystems: u32 {
        const NV_CONTROL = 1 << 0;
        const VIDMODE = 1 << 1;
        const XV = 1 << 2;
        const GLX = 1 << 3;
        const XRANDR = 1 << 4;
        const NVML = 1 << 5;
        const VULKAN = 1 << 6;
    }
}

impl Subsystems {
    /// Backends that apply to targets of `kind`
    pub fn for_target(kind: TargetType) -> Self {
        match kind {
            TargetType::XScreen => {
                Self::NV_CONTROL
                    | Self::VIDMODE
                    | Self::XV
                    | Self::GLX
                    | Self::XRANDR
                    | Self::VULKAN
            }
            TargetType::Gpu | TargetType::Cooler | TargetType::ThermalSensor => {
                Self::NV_CONTROL | Self::NVML
            }
            TargetType::Display => Self::NV_CONTROL | Self::XRANDR,
            _ => Self::NV_CONTROL,
        }
    }

    /// Short backend names, for listings
    pub fn names(self) -> Vec<&'static str> {
        [
            (Self::NV_CONTROL, "nv-control"),
            (Self::VIDMODE, "vidmode"),
            (Self::XV, "xv"),
            (Self::GLX, "glx"),
            (Self::XRANDR, "xrandr"),
            (Self::NVML, "nvml"),
            (Self::VULKAN, "vulkan"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect()
    }
}

/// Core string attributes NVML may answer
const NVML_STRINGS: [u32; 5] = [
    ids::STRING_PRODUCT_NAME,
    ids::STRING_VBIOS_VERSION,
    ids::STRING_NVIDIA_DRIVER_VERSION,
    ids::STRING_GPU_UUID,
    ids::STRING_GPU_UTILIZATION,
];

/// Core integer attributes NVML may write
const NVML_SETTABLE: [u32; 3] = [
    ids::THERMAL_COOLER_LEVEL,
    ids::THERMAL_COOLER_LEVEL_SET_DEFAULT,
    ids::GPU_COOLER_MANUAL_CONTROL,
];

/// Run `nvml` first; on `NotSupported` run `fallback`
fn nvml_first<T>(
    nvml: Option<&NvmlAttributes>,
    offer: bool,
    query: impl FnOnce(&NvmlAttributes) -> CtrlResult<T>,
    fallback: impl FnOnce() -> CtrlResult<T>,
) -> CtrlResult<T> {
    if let Some(nvml) = nvml.filter(|_| offer) {
        match query(nvml) {
            Err(CtrlError::NotSupported) => {}
            answered => return answered,
        }
    }
    fallback()
}

/// Collects the shared backend connections and builds a handle
pub struct HandleBuilder {
    registry: &'static AttributeRegistry,
    target: Target,
    subsystems: Subsystems,
    nv_control: Option<Rc<dyn NvControlProtocol>>,
    display: Option<Rc<XDisplay>>,
    nvml: Option<(Rc<dyn GpuManager>, Rc<IdTable>)>,
    vulkan: Option<Rc<VulkanInfo>>,
    vidmode: Option<VidModeAttributes>,
    xrandr: Option<XRandRAttributes>,
    x_screen: Option<u32>,
}

impl HandleBuilder {
    pub fn new(registry: &'static AttributeRegistry, target: Target) -> Self {
        Self {
            registry,
            target,
            subsystems: Subsystems::all(),
            nv_control: None,
            display: None,
            nvml: None,
            vulkan: None,
            vidmode: None,
            xrandr: None,
            x_screen: None,
        }
    }

    /// Restrict the backends probed; the target type narrows further
    pub fn subsystems(mut self, subsystems: Subsystems) -> Self {
        self.subsystems = subsystems;
        self
    }

    pub fn nv_control(mut self, proto: Rc<dyn NvControlProtocol>) -> Self {
        self.nv_control = Some(proto);
        self
    }

    /// X display for the VidMode, Xv, GLX and XRandR probes
    pub fn display(mut self, display: Rc<XDisplay>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn nvml(mut self, manager: Rc<dyn GpuManager>, table: Rc<IdTable>) -> Self {
        self.nvml = Some((manager, table));
        self
    }

    pub fn vulkan(mut self, info: Rc<VulkanInfo>) -> Self {
        self.vulkan = Some(info);
        self
    }

    /// X screen a display target is assigned to
    ///
    /// XRandR looks the display's output up under this screen's root.
    pub fn x_screen(mut self, screen: u32) -> Self {
        self.x_screen = Some(screen);
        self
    }

    /// Use an already initialized VidMode state instead of probing
    pub fn with_vidmode(mut self, vidmode: VidModeAttributes) -> Self {
        self.vidmode = Some(vidmode);
        self
    }

    /// Use an already initialized XRandR state instead of probing
    pub fn with_xrandr(mut self, xrandr: XRandRAttributes) -> Self {
        self.xrandr = Some(xrandr);
        self
    }

    /// Probe every requested backend
    ///
    /// Optional backends that fail are left out. Fails with
    /// `MissingExtension` only when NV-CONTROL was requested and could not
    /// be initialized.
    pub fn build(self) -> CtrlResult<AttributeHandle> {
        let target = self.target;
        let wanted = self.subsystems & Subsystems::for_target(target.kind);
        let is_screen = target.kind == TargetType::XScreen;
        let x_screen = if is_screen {
            Some(target.id)
        } else {
            self.x_screen
        };

        let nv = if wanted.contains(Subsystems::NV_CONTROL) {
            let proto = self.nv_control.ok_or(CtrlError::MissingExtension)?;
            Some(NvControlAttributes::init(proto, target).ok_or(CtrlError::MissingExtension)?)
        } else {
            None
        };

        let display = self.display;
        let probe = |flag: Subsystems| {
            display.clone().filter(|_| wanted.contains(flag))
        };

        let vidmode = match self.vidmode {
            Some(v) => Some(v),
            None if is_screen => {
                probe(Subsystems::VIDMODE).and_then(|d| VidModeAttributes::init(d, target.id))
            }
            None => None,
        };

        let xv = probe(Subsystems::XV)
            .filter(|_| is_screen)
            .and_then(|d| XvAttributes::init(d, target.id));

        let glx = probe(Subsystems::GLX)
            .filter(|_| is_screen)
            .and_then(|d| GlxAttributes::init(d, target.id));

        let xrandr = match self.xrandr {
            Some(x) => Some(x),
            None => probe(Subsystems::XRANDR).and_then(|d| {
                let randr_name = nv
                    .as_ref()
                    .filter(|_| target.kind == TargetType::Display)
                    .and_then(|nv| nv.get_string(0, ids::STRING_DISPLAY_NAME_RANDR).ok());
                let screen = x_screen.unwrap_or_else(|| {
                    log::debug!("{} has no X screen; using the default screen", target);
                    d.default_screen() as u32
                });
                XRandRAttributes::init(d, target, screen, randr_name.as_deref())
            }),
        };

        let nvml = self
            .nvml
            .filter(|_| wanted.contains(Subsystems::NVML))
            .and_then(|(manager, table)| NvmlAttributes::init(manager, &table, target));

        let vulkan = self
            .vulkan
            .filter(|_| is_screen && wanted.contains(Subsystems::VULKAN))
            .map(VulkanAttributes::new);

        let handle = AttributeHandle {
            registry: self.registry,
            target,
            x_screen,
            nv,
            vidmode,
            xv,
            glx,
            xrandr,
            nvml,
            vulkan,
        };
        log::debug!(
            "Handle for {}: {}",
            target,
            handle.subsystems().names().join(", ")
        );
        Ok(handle)
    }
}

/// Per-target attribute dispatcher
pub struct AttributeHandle {
    registry: &'static AttributeRegistry,
    target: Target,
    x_screen: Option<u32>,
    nv: Option<NvControlAttributes>,
    vidmode: Option<VidModeAttributes>,
    xv: Option<XvAttributes>,
    glx: Option<GlxAttributes>,
    xrandr: Option<XRandRAttributes>,
    nvml: Option<NvmlAttributes>,
    vulkan: Option<VulkanAttributes>,
}

impl AttributeHandle {
    pub fn target(&self) -> Target {
        self.target
    }

    /// The X screen itself, or the screen a display is assigned to
    pub fn x_screen(&self) -> Option<u32> {
        self.x_screen
    }

    pub fn registry(&self) -> &'static AttributeRegistry {
        self.registry
    }

    /// Backends initialized on this handle
    pub fn subsystems(&self) -> Subsystems {
        let mut present = Subsystems::empty();
        present.set(Subsystems::NV_CONTROL, self.nv.is_some());
        present.set(Subsystems::VIDMODE, self.vidmode.is_some());
        present.set(Subsystems::XV, self.xv.is_some());
        present.set(Subsystems::GLX, self.glx.is_some());
        present.set(Subsystems::XRANDR, self.xrandr.is_some());
        present.set(Subsystems::NVML, self.nvml.is_some());
        present.set(Subsystems::VULKAN, self.vulkan.is_some());
        present
    }

    fn scope(&self) -> Permissions {
        self.target.kind.permission()
    }

    fn owner(&self, kind: AttributeKind, attr: u32) -> CtrlResult<Backend> {
        self.registry.owner(kind, attr).ok_or(CtrlError::NoAttribute)
    }

    fn nv(&self) -> CtrlResult<&NvControlAttributes> {
        self.nv.as_ref().ok_or(CtrlError::MissingExtension)
    }

    fn xv(&self) -> CtrlResult<&XvAttributes> {
        self.xv.as_ref().ok_or(CtrlError::MissingExtension)
    }

    fn glx(&self) -> CtrlResult<&GlxAttributes> {
        self.glx.as_ref().ok_or(CtrlError::MissingExtension)
    }

    fn xrandr(&self) -> CtrlResult<&XRandRAttributes> {
        self.xrandr.as_ref().ok_or(CtrlError::MissingExtension)
    }

    fn vulkan(&self) -> CtrlResult<&VulkanAttributes> {
        self.vulkan.as_ref().ok_or(CtrlError::MissingExtension)
    }

    fn present_flag(&self, attr: u32) -> CtrlResult<bool> {
        let xv_has = |adaptor| self.xv.as_ref().is_some_and(|xv| xv.has_adaptor(adaptor));
        Ok(match attr {
            ids::ATTR_EXT_NV_PRESENT => self.nv.is_some(),
            ids::ATTR_EXT_VM_PRESENT => self.vidmode.is_some(),
            ids::ATTR_EXT_XV_OVERLAY_PRESENT => xv_has(Adaptor::Overlay),
            ids::ATTR_EXT_XV_TEXTURE_PRESENT => xv_has(Adaptor::Texture),
            ids::ATTR_EXT_XV_BLITTER_PRESENT => xv_has(Adaptor::Blitter),
            ids::ATTR_EXT_GLX_PRESENT => self.glx.is_some(),
            ids::ATTR_EXT_XRANDR_PRESENT => self.xrandr.is_some(),
            ids::ATTR_EXT_NVML_PRESENT => self.nvml.is_some(),
            ids::ATTR_EXT_VK_PRESENT => self.vulkan.is_some(),
            _ => return Err(CtrlError::NoAttribute),
        })
    }

    // Integer attributes

    pub fn get_attribute64(&self, attr: u32) -> CtrlResult<i64> {
        self.get_display_attribute64(0, attr)
    }

    pub fn get_display_attribute64(&self, display_mask: u32, attr: u32) -> CtrlResult<i64> {
        match self.owner(AttributeKind::Integer, attr)? {
            Backend::Local => self.present_flag(attr).map(i64::from),
            Backend::NvControl => {
                let nv = self.nv()?;
                nvml_first(
                    self.nvml.as_ref(),
                    attr <= ids::LAST_ATTRIBUTE,
                    |nvml| nvml.get_attribute(attr),
                    || nv.get_attribute(display_mask, attr),
                )
            }
            Backend::Xv => self.xv()?.get_attribute(attr),
            Backend::XRandR => self.xrandr()?.get_attribute(attr),
            Backend::Vulkan => self.vulkan()?.get_attribute(attr),
            Backend::Glx => Err(CtrlError::NoAttribute),
        }
    }

    /// 32-bit read; wider values are truncated
    pub fn get_attribute(&self, attr: u32) -> CtrlResult<i32> {
        self.get_display_attribute(0, attr)
    }

    pub fn get_display_attribute(&self, display_mask: u32, attr: u32) -> CtrlResult<i32> {
        self.get_display_attribute64(display_mask, attr)
            .map(|value| value as i32)
    }

    pub fn set_attribute(&self, attr: u32, value: i64) -> CtrlResult<()> {
        self.set_display_attribute(0, attr, value)
    }

    pub fn set_display_attribute(&self, display_mask: u32, attr: u32, value: i64) -> CtrlResult<()> {
        match self.owner(AttributeKind::Integer, attr)? {
            Backend::Local => {
                self.present_flag(attr)?;
                Err(CtrlError::ReadOnlyAttribute)
            }
            Backend::NvControl => {
                let nv = self.nv()?;
                nvml_first(
                    self.nvml.as_ref(),
                    NVML_SETTABLE.contains(&attr),
                    |nvml| nvml.set_attribute(attr, value),
                    || nv.set_attribute(display_mask, attr, value),
                )
            }
            Backend::Xv => self.xv()?.set_attribute(attr, value),
            Backend::XRandR => {
                self.xrandr()?.get_attribute(attr)?;
                Err(CtrlError::ReadOnlyAttribute)
            }
            Backend::Vulkan => {
                self.vulkan()?.get_attribute(attr)?;
                Err(CtrlError::ReadOnlyAttribute)
            }
            Backend::Glx => Err(CtrlError::NoAttribute),
        }
    }

    pub fn valid_values(&self, attr: u32) -> CtrlResult<ValidValues> {
        self.valid_display_values(0, attr)
    }

    pub fn valid_display_values(&self, display_mask: u32, attr: u32) -> CtrlResult<ValidValues> {
        let scope = self.scope();
        match self.owner(AttributeKind::Integer, attr)? {
            Backend::Local => {
                self.present_flag(attr)?;
                Ok(ValidValues::read_only_bool(scope))
            }
            Backend::NvControl => {
                let nv = self.nv()?;
                nvml_first(
                    self.nvml.as_ref(),
                    attr <= ids::LAST_ATTRIBUTE,
                    |nvml| nvml.valid_values(attr),
                    || nv.valid_values(display_mask, attr),
                )
            }
            Backend::Xv => self.xv()?.valid_values(attr, scope),
            Backend::XRandR => self.xrandr()?.valid_values(attr, scope),
            Backend::Vulkan => self.vulkan()?.valid_values(attr, scope),
            Backend::Glx => Err(CtrlError::NoAttribute),
        }
    }

    // String attributes

    pub fn get_string_attribute(&self, attr: u32) -> CtrlResult<String> {
        self.get_string_display_attribute(0, attr)
    }

    pub fn get_string_display_attribute(&self, display_mask: u32, attr: u32) -> CtrlResult<String> {
        match self.owner(AttributeKind::String, attr)? {
            Backend::NvControl => {
                let nv = self.nv()?;
                nvml_first(
                    self.nvml.as_ref(),
                    NVML_STRINGS.contains(&attr),
                    |nvml| nvml.get_string(attr),
                    || nv.get_string(display_mask, attr),
                )
            }
            Backend::Xv => self.xv()?.get_string(attr),
            Backend::Glx => self.glx()?.get_string(attr),
            Backend::XRandR => self.xrandr()?.get_string(attr),
            Backend::Vulkan => self.vulkan()?.get_string(attr),
            Backend::Local => Err(CtrlError::NoAttribute),
        }
    }

    pub fn set_string_attribute(&self, attr: u32, value: &str) -> CtrlResult<()> {
        self.set_string_display_attribute(0, attr, value)
    }

    pub fn set_string_display_attribute(
        &self,
        display_mask: u32,
        attr: u32,
        value: &str,
    ) -> CtrlResult<()> {
        match self.owner(AttributeKind::String, attr)? {
            Backend::NvControl => self.nv()?.set_string(display_mask, attr, value),
            Backend::Local => Err(CtrlError::NoAttribute),
            _ => {
                self.get_string_display_attribute(display_mask, attr)?;
                Err(CtrlError::ReadOnlyAttribute)
            }
        }
    }

    pub fn valid_string_values(&self, attr: u32) -> CtrlResult<ValidValues> {
        self.valid_string_display_values(0, attr)
    }

    pub fn valid_string_display_values(
        &self,
        display_mask: u32,
        attr: u32,
    ) -> CtrlResult<ValidValues> {
        match self.owner(AttributeKind::String, attr)? {
            Backend::NvControl => self.nv()?.valid_string_values(display_mask, attr),
            Backend::Local => Err(CtrlError::NoAttribute),
            _ => {
                self.get_string_display_attribute(display_mask, attr)?;
                Ok(ValidValues::read_only_string(self.scope()))
            }
        }
    }

    // Binary data and string operations

    pub fn get_binary_attribute(&self, display_mask: u32, attr: u32) -> CtrlResult<Vec<u8>> {
        match self.owner(AttributeKind::Binary, attr)? {
            Backend::NvControl => self.nv()?.get_binary(display_mask, attr),
            Backend::Glx => self.glx()?.get_binary(attr),
            _ => Err(CtrlError::NoAttribute),
        }
    }

    pub fn string_operation(&self, display_mask: u32, attr: u32, input: &str) -> CtrlResult<String> {
        match self.owner(AttributeKind::StringOperation, attr)? {
            Backend::NvControl => self.nv()?.string_operation(display_mask, attr, input),
            _ => Err(CtrlError::NoAttribute),
        }
    }

    /// Framebuffer configurations of this X screen
    pub fn glx_fbconfigs(&self) -> CtrlResult<Vec<FbConfig>> {
        if self.target.kind != TargetType::XScreen {
            return Err(CtrlError::BadHandle);
        }
        self.glx()?.fbconfigs()
    }

    // Color correction

    fn color_state(&self) -> CtrlResult<&ColorState> {
        match self.target.kind {
            TargetType::XScreen => self
                .vidmode
                .as_ref()
                .map(VidModeAttributes::color)
                .ok_or(CtrlError::MissingExtension),
            TargetType::Display => self
                .xrandr()?
                .color()
                .ok_or(CtrlError::AttributeNotAvailable),
            _ => Err(CtrlError::BadHandle),
        }
    }

    fn color_state_mut(&mut self) -> CtrlResult<&mut ColorState> {
        match self.target.kind {
            TargetType::XScreen => self
                .vidmode
                .as_mut()
                .map(VidModeAttributes::color_mut)
                .ok_or(CtrlError::MissingExtension),
            TargetType::Display => self
                .xrandr
                .as_mut()
                .ok_or(CtrlError::MissingExtension)?
                .color_mut()
                .ok_or(CtrlError::AttributeNotAvailable),
            _ => Err(CtrlError::BadHandle),
        }
    }

    pub fn color_attributes(&self) -> CtrlResult<GammaInput> {
        Ok(self.color_state()?.attributes())
    }

    /// Apply the values and channels selected in `mask` and write the ramp
    pub fn set_color_attributes(
        &mut self,
        contrast: [f32; 3],
        brightness: [f32; 3],
        gamma: [f32; 3],
        mask: ColorMask,
    ) -> CtrlResult<()> {
        self.color_state_mut()?
            .set(contrast, brightness, gamma, mask)
    }

    pub fn color_ramp(&self, channel: Channel) -> CtrlResult<&[u16]> {
        Ok(self.color_state()?.ramp(channel))
    }

    pub fn reload_color_ramp(&mut self) -> CtrlResult<()> {
        self.color_state_mut()?.reload()
    }
}
