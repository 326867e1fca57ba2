//! Session and target enumeration
//!
//! [`CtrlSystem`] opens the shared backend connections once, reconciles
//! GPU identities, and builds an [`AttributeHandle`] for every target the
//! NV-CONTROL server reports.

use crate::attributes::{ids, AttributeRegistry};
use crate::config::Config;
use crate::domain::{Target, TargetType};
use crate::error::{AppError, Result};
use crate::handle::{AttributeHandle, HandleBuilder, Subsystems};
use crate::nvcontrol::{parse_id_list, NvControlEvent, NvControlProtocol, XNvControl};
use crate::nvml::{GpuManager, IdTable, NvmlLibrary};
use crate::vulkan::VulkanInfo;
use crate::xext::XDisplay;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Shared backend connections a session is built from
pub struct SystemParts {
    pub nv_control: Option<Rc<dyn NvControlProtocol>>,
    pub display: Option<Rc<XDisplay>>,
    pub nvml: Option<Rc<dyn GpuManager>>,
    pub vulkan: Option<Rc<VulkanInfo>>,
    pub subsystems: Subsystems,
}

impl Default for SystemParts {
    fn default() -> Self {
        Self {
            nv_control: None,
            display: None,
            nvml: None,
            vulkan: None,
            subsystems: Subsystems::all(),
        }
    }
}

/// Load NVML, or `None` when it is disabled or cannot be loaded
pub fn load_nvml(config: &Config) -> Option<Rc<dyn GpuManager>> {
    if !config.backends.nvml {
        return None;
    }
    match NvmlLibrary::open(config.nvml.library.as_deref()) {
        Ok(library) => {
            log::info!("Using NVML from {}", library.path());
            Some(Rc::new(library))
        }
        Err(e) => {
            log::warn!("NVML unavailable: {}", e);
            None
        }
    }
}

/// Probe Vulkan, or `None` when it is disabled or unavailable
pub fn load_vulkan(config: &Config) -> Option<Rc<VulkanInfo>> {
    if !config.backends.vulkan {
        return None;
    }
    match VulkanInfo::probe(&config.vulkan.library) {
        Ok(info) => Some(Rc::new(info)),
        Err(e) => {
            log::warn!("Vulkan unavailable: {}", e);
            None
        }
    }
}

/// X screen each display is assigned to, keyed by display ID
///
/// A display listed under several screens keeps the first one.
pub fn assigned_screens(nv: &dyn NvControlProtocol, screen_count: u32) -> HashMap<u32, u32> {
    let mut screens = HashMap::new();
    for screen in 0..screen_count {
        let target = Target::x_screen(screen);
        let displays = nv
            .query_binary(target, 0, ids::BINARY_DATA_DISPLAYS_ASSIGNED_TO_XSCREEN)
            .and_then(|data| parse_id_list(&data));
        match displays {
            Ok(displays) => {
                for display in displays {
                    screens.entry(display).or_insert(screen);
                }
            }
            Err(e) => log::debug!("Displays assigned to {} unknown: {}", target, e),
        }
    }
    screens
}

/// One attribute session over every target
pub struct CtrlSystem {
    registry: &'static AttributeRegistry,
    nv_control: Option<Rc<dyn NvControlProtocol>>,
    id_table: Option<Rc<IdTable>>,
    handles: BTreeMap<Target, AttributeHandle>,
}

impl CtrlSystem {
    /// Connect to the configured display and probe every backend
    pub fn open(config: &Config) -> Result<Self> {
        let display = Rc::new(XDisplay::connect(config.display.name.as_deref())?);

        let nv_control = match XNvControl::new(display.clone()) {
            Ok(nv) => Some(Rc::new(nv) as Rc<dyn NvControlProtocol>),
            Err(e) => {
                log::warn!("NV-CONTROL unavailable: {}", e);
                None
            }
        };

        Self::from_parts(SystemParts {
            nv_control,
            display: Some(display),
            nvml: load_nvml(config),
            vulkan: load_vulkan(config),
            subsystems: config.backends.subsystems(),
        })
    }

    /// Build a session over already opened backends
    pub fn from_parts(parts: SystemParts) -> Result<Self> {
        let registry = AttributeRegistry::standard()?;
        let nv_control = parts.nv_control;

        let counts: Vec<(TargetType, u32)> = match &nv_control {
            Some(nv) => TargetType::ALL
                .into_iter()
                .map(|kind| {
                    let count = nv.query_target_count(kind).unwrap_or_else(|e| {
                        log::debug!("Target count for {} failed: {}", kind, e);
                        0
                    });
                    (kind, count)
                })
                .collect(),
            None => {
                log::warn!("No NV-CONTROL server; no targets available");
                Vec::new()
            }
        };

        let count_of = |wanted: TargetType| {
            counts
                .iter()
                .find(|(kind, _)| *kind == wanted)
                .map_or(0, |(_, count)| *count)
        };
        let display_screens = nv_control
            .as_ref()
            .map(|nv| assigned_screens(&**nv, count_of(TargetType::XScreen)))
            .unwrap_or_default();

        let id_table = parts.nvml.as_ref().and_then(|manager| {
            let gpu_count = count_of(TargetType::Gpu);
            let nv_uuids: Option<Vec<Option<String>>> = nv_control.as_ref().map(|nv| {
                (0..gpu_count)
                    .map(|gpu| nv.query_string(Target::gpu(gpu), 0, ids::STRING_GPU_UUID).ok())
                    .collect()
            });
            match IdTable::build(&**manager, nv_uuids.as_deref()) {
                Ok(table) => Some(Rc::new(table)),
                Err(e) => {
                    log::warn!("NVML device mapping failed: {}", e);
                    None
                }
            }
        });

        let mut handles = BTreeMap::new();
        for (kind, count) in counts {
            for id in 0..count {
                let target = Target::new(kind, id);
                let mut builder = HandleBuilder::new(registry, target).subsystems(parts.subsystems);
                if let Some(nv) = &nv_control {
                    builder = builder.nv_control(nv.clone());
                }
                if let Some(display) = &parts.display {
                    builder = builder.display(display.clone());
                }
                if let (Some(manager), Some(table)) = (&parts.nvml, &id_table) {
                    builder = builder.nvml(manager.clone(), table.clone());
                }
                if let Some(vulkan) = &parts.vulkan {
                    builder = builder.vulkan(vulkan.clone());
                }
                if kind == TargetType::Display {
                    if let Some(&screen) = display_screens.get(&id) {
                        builder = builder.x_screen(screen);
                    }
                }
                match builder.build() {
                    Ok(handle) => {
                        handles.insert(target, handle);
                    }
                    Err(e) => log::warn!("Skipping {}: {}", target, e),
                }
            }
        }
        log::info!("{} targets available", handles.len());

        Ok(Self {
            registry,
            nv_control,
            id_table,
            handles,
        })
    }

    pub fn registry(&self) -> &'static AttributeRegistry {
        self.registry
    }

    /// GPU identity table, when NVML is loaded
    pub fn id_table(&self) -> Option<&IdTable> {
        self.id_table.as_deref()
    }

    pub fn has_nvml(&self) -> bool {
        self.id_table.is_some()
    }

    /// Handles of one target type, in ID order
    pub fn targets(&self, kind: TargetType) -> impl Iterator<Item = &AttributeHandle> {
        self.handles
            .range(Target::new(kind, 0)..=Target::new(kind, u32::MAX))
            .map(|(_, handle)| handle)
    }

    /// Every handle, X screens first
    pub fn handles(&self) -> impl Iterator<Item = &AttributeHandle> {
        self.handles.values()
    }

    pub fn target(&self, target: Target) -> Result<&AttributeHandle> {
        self.handles
            .get(&target)
            .ok_or_else(|| AppError::TargetNotFound(target.to_string()))
    }

    pub fn target_mut(&mut self, target: Target) -> Result<&mut AttributeHandle> {
        self.handles
            .get_mut(&target)
            .ok_or_else(|| AppError::TargetNotFound(target.to_string()))
    }

    /// The connection events are read from
    pub fn event_source(&self) -> Option<Rc<dyn NvControlProtocol>> {
        self.nv_control.clone()
    }

    /// Block for the next NV-CONTROL event
    pub fn next_event(&self) -> Result<Option<NvControlEvent>> {
        match &self.nv_control {
            Some(nv) => Ok(nv.next_event()?),
            None => Ok(None),
        }
    }
}
