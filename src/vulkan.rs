//! Vulkan backend
//!
//! The loader is opened through `ash::Entry`. A temporary instance answers
//! the device queries; `VulkanProbe` destroys it before the entry, and
//! with it the loader, is dropped.

use crate::attributes::ids;
use crate::domain::{Permissions, ValidValues, ValueType};
use crate::error::{CtrlError, CtrlResult, VulkanError};
use ash::{vk, Entry, Instance, LoadingError};
use serde::Serialize;
use std::ffi::{c_char, CStr};
use std::rc::Rc;

/// Soname of the Vulkan loader
pub const DEFAULT_LIBRARY: &str = "libvulkan.so.1";

/// Global commands every usable loader exports
const REQUIRED_COMMANDS: [&CStr; 3] = [
    c"vkCreateInstance",
    c"vkEnumerateInstanceExtensionProperties",
    c"vkEnumerateInstanceLayerProperties",
];

/// What the probe learned about the Vulkan installation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct VulkanInfo {
    /// Packed instance version, `VK_API_VERSION_1_0` for 1.0 loaders
    pub api_version: u32,
    pub instance_extensions: Vec<String>,
    pub instance_layers: Vec<String>,
    pub device_names: Vec<String>,
}

impl VulkanInfo {
    /// Load `library` and query it through a temporary instance
    pub fn probe(library: &str) -> Result<Self, VulkanError> {
        let entry = load_entry(library)?;

        // SAFETY: `entry` stays loaded for every call below
        let (api_version, extensions, layers) = unsafe {
            let api_version = entry
                .try_enumerate_instance_version()
                .map_err(|e| call_error("vkEnumerateInstanceVersion", e))?
                .unwrap_or(vk::API_VERSION_1_0);
            let extensions = entry
                .enumerate_instance_extension_properties(None)
                .map_err(|e| call_error("vkEnumerateInstanceExtensionProperties", e))?;
            let layers = entry
                .enumerate_instance_layer_properties()
                .map_err(|e| call_error("vkEnumerateInstanceLayerProperties", e))?;
            (api_version, extensions, layers)
        };

        let probe = VulkanProbe::new(&entry, api_version)?;
        let device_names = probe.device_names()?;
        drop(probe);

        log::debug!(
            "Vulkan {} loaded from {} ({} devices)",
            version_string(api_version),
            library,
            device_names.len()
        );
        Ok(Self {
            api_version,
            instance_extensions: extensions
                .iter()
                .map(|e| fixed_str(&e.extension_name))
                .collect(),
            instance_layers: layers.iter().map(|l| fixed_str(&l.layer_name)).collect(),
            device_names,
        })
    }

    pub fn api_version_string(&self) -> String {
        version_string(self.api_version)
    }
}

/// Open the loader and check its global commands
fn load_entry(library: &str) -> Result<Entry, VulkanError> {
    // SAFETY: the Vulkan loader has no initializers with preconditions
    let entry = unsafe { Entry::load_from(library) }.map_err(|e| match e {
        LoadingError::MissingEntryPoint(_) => VulkanError::MissingSymbol("vkGetInstanceProcAddr"),
        other => VulkanError::LibraryNotFound(format!("{}: {}", library, other)),
    })?;

    let get_instance_proc_addr = entry.static_fn().get_instance_proc_addr;
    for name in REQUIRED_COMMANDS {
        // SAFETY: global commands are resolved with a null instance
        let found = unsafe { get_instance_proc_addr(vk::Instance::null(), name.as_ptr()) };
        if found.is_none() {
            return Err(VulkanError::MissingSymbol(command_name(name)));
        }
    }
    Ok(entry)
}

fn command_name(name: &CStr) -> &'static str {
    REQUIRED_COMMANDS
        .iter()
        .find(|c| ***c == *name)
        .and_then(|c| c.to_str().ok())
        .unwrap_or("unknown command")
}

/// `major.minor.patch` of a packed Vulkan version
pub fn version_string(version: u32) -> String {
    format!(
        "{}.{}.{}",
        vk::api_version_major(version),
        vk::api_version_minor(version),
        vk::api_version_patch(version)
    )
}

/// Fixed-size, NUL-terminated C string field to `String`
fn fixed_str(field: &[c_char]) -> String {
    let bytes: Vec<u8> = field
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn call_error(call: &'static str, result: vk::Result) -> VulkanError {
    VulkanError::Call {
        call,
        code: result.as_raw(),
    }
}

/// A temporary instance, destroyed on drop
struct VulkanProbe<'a> {
    instance: Instance,
    _entry: &'a Entry,
}

impl<'a> VulkanProbe<'a> {
    fn new(entry: &'a Entry, api_version: u32) -> Result<Self, VulkanError> {
        let app_info = vk::ApplicationInfo::default()
            .application_name(c"nvsettings")
            .api_version(api_version);
        let create_info = vk::InstanceCreateInfo::default().application_info(&app_info);

        // SAFETY: `create_info` and `app_info` outlive the call
        let instance = unsafe { entry.create_instance(&create_info, None) }
            .map_err(|e| call_error("vkCreateInstance", e))?;
        Ok(Self {
            instance,
            _entry: entry,
        })
    }

    fn device_names(&self) -> Result<Vec<String>, VulkanError> {
        // SAFETY: `self.instance` is alive for every call
        unsafe {
            let devices = self
                .instance
                .enumerate_physical_devices()
                .map_err(|e| call_error("vkEnumeratePhysicalDevices", e))?;
            Ok(devices
                .into_iter()
                .map(|device| {
                    let properties = self.instance.get_physical_device_properties(device);
                    fixed_str(&properties.device_name)
                })
                .collect())
        }
    }
}

impl Drop for VulkanProbe<'_> {
    fn drop(&mut self) {
        // SAFETY: the instance was created by this probe and no child
        // objects exist
        unsafe { self.instance.destroy_instance(None) };
    }
}

/// Vulkan attributes of one X screen
pub struct VulkanAttributes {
    info: Rc<VulkanInfo>,
}

impl VulkanAttributes {
    pub fn new(info: Rc<VulkanInfo>) -> Self {
        Self { info }
    }

    pub fn info(&self) -> &VulkanInfo {
        &self.info
    }

    pub fn get_attribute(&self, attr: u32) -> CtrlResult<i64> {
        match attr {
            ids::ATTR_VK_PHYSICAL_DEVICE_COUNT => Ok(self.info.device_names.len() as i64),
            _ => Err(CtrlError::NoAttribute),
        }
    }

    pub fn valid_values(&self, attr: u32, targets: Permissions) -> CtrlResult<ValidValues> {
        match attr {
            ids::ATTR_VK_PHYSICAL_DEVICE_COUNT => {
                Ok(ValidValues::new(ValueType::Integer, Permissions::READ | targets))
            }
            _ => Err(CtrlError::NoAttribute),
        }
    }

    pub fn get_string(&self, attr: u32) -> CtrlResult<String> {
        match attr {
            ids::STRING_VK_API_VERSION => Ok(self.info.api_version_string()),
            ids::STRING_VK_INSTANCE_EXTENSIONS => Ok(self.info.instance_extensions.join(", ")),
            ids::STRING_VK_INSTANCE_LAYERS => Ok(self.info.instance_layers.join(", ")),
            ids::STRING_VK_DEVICE_NAMES => Ok(self.info.device_names.join(", ")),
            _ => Err(CtrlError::NoAttribute),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VulkanAttributes {
        VulkanAttributes::new(Rc::new(VulkanInfo {
            api_version: vk::make_api_version(0, 1, 3, 275),
            instance_extensions: vec!["VK_KHR_surface".into(), "VK_KHR_xlib_surface".into()],
            instance_layers: Vec::new(),
            device_names: vec!["NVIDIA GeForce RTX 3090".into()],
        }))
    }

    #[test]
    fn test_missing_loader() {
        let result = VulkanInfo::probe("/nonexistent/libvulkan.so.1");
        assert!(matches!(result, Err(VulkanError::LibraryNotFound(_))));
    }

    #[test]
    fn test_fixed_str() {
        let mut field = [0 as c_char; 8];
        for (slot, b) in field.iter_mut().zip(b"VK_x") {
            *slot = *b as c_char;
        }
        assert_eq!(fixed_str(&field), "VK_x");
        assert_eq!(fixed_str(&[0; 4]), "");
    }

    #[test]
    fn test_call_error() {
        assert!(matches!(
            call_error("vkCreateInstance", vk::Result::ERROR_INITIALIZATION_FAILED),
            VulkanError::Call {
                call: "vkCreateInstance",
                code: -3
            }
        ));
    }

    #[test]
    fn test_required_command_names() {
        assert_eq!(command_name(c"vkCreateInstance"), "vkCreateInstance");
        assert_eq!(command_name(c"vkNope"), "unknown command");
    }

    #[test]
    fn test_attributes() {
        let attrs = sample();
        assert_eq!(attrs.get_attribute(ids::ATTR_VK_PHYSICAL_DEVICE_COUNT), Ok(1));
        assert_eq!(attrs.get_string(ids::STRING_VK_API_VERSION).unwrap(), "1.3.275");
        assert_eq!(
            attrs.get_string(ids::STRING_VK_INSTANCE_EXTENSIONS).unwrap(),
            "VK_KHR_surface, VK_KHR_xlib_surface"
        );
        assert_eq!(attrs.get_string(ids::STRING_VK_INSTANCE_LAYERS).unwrap(), "");
        assert_eq!(
            attrs.get_attribute(ids::ATTR_VK_BASE + 7),
            Err(CtrlError::NoAttribute)
        );
    }
}
