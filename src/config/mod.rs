//! Configuration system
//!
//! Handles TOML config file parsing and CLI argument merging.

pub mod builder;
pub mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::handle::Subsystems;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// X display selection
    pub display: DisplayConfig,
    /// Which optional backends to probe
    pub backends: BackendsConfig,
    /// NVML library settings
    pub nvml: NvmlConfig,
    /// Vulkan loader settings
    pub vulkan: VulkanConfig,
}

/// General configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,
    /// Dry run mode
    pub dry_run: bool,
}

/// X display configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Display name such as `:0`; `$DISPLAY` when unset
    pub name: Option<String>,
}

/// Optional backend switches
///
/// NV-CONTROL is always probed and has no switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendsConfig {
    pub vidmode: bool,
    pub xv: bool,
    pub glx: bool,
    pub xrandr: bool,
    pub nvml: bool,
    pub vulkan: bool,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            vidmode: true,
            xv: true,
            glx: true,
            xrandr: true,
            nvml: true,
            vulkan: true,
        }
    }
}

impl BackendsConfig {
    /// Subsystems a handle should probe
    pub fn subsystems(&self) -> Subsystems {
        let mut subsystems = Subsystems::NV_CONTROL;
        subsystems.set(Subsystems::VIDMODE, self.vidmode);
        subsystems.set(Subsystems::XV, self.xv);
        subsystems.set(Subsystems::GLX, self.glx);
        subsystems.set(Subsystems::XRANDR, self.xrandr);
        subsystems.set(Subsystems::NVML, self.nvml);
        subsystems.set(Subsystems::VULKAN, self.vulkan);
        subsystems
    }
}

/// NVML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NvmlConfig {
    /// Path to `libnvidia-ml.so`; the system library when unset
    pub library: Option<String>,
}

/// Vulkan configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VulkanConfig {
    /// Loader library name or path
    pub library: String,
}

impl Default for VulkanConfig {
    fn default() -> Self {
        Self {
            library: crate::vulkan::DEFAULT_LIBRARY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.general.dry_run);
        assert!(config.backends.nvml);
        assert_eq!(config.vulkan.library, "libvulkan.so.1");
        assert_eq!(config.nvml.library, None);
    }

    #[test]
    fn test_backends_to_subsystems() {
        assert_eq!(BackendsConfig::default().subsystems(), Subsystems::all());

        let backends = BackendsConfig {
            xv: false,
            vulkan: false,
            ..Default::default()
        };
        let subsystems = backends.subsystems();
        assert!(subsystems.contains(Subsystems::NV_CONTROL | Subsystems::GLX));
        assert!(!subsystems.intersects(Subsystems::XV | Subsystems::VULKAN));
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [backends]
            vulkan = false

            [nvml]
            library = "/opt/nvidia/libnvidia-ml.so.1"
            "#,
        )
        .unwrap();
        assert!(!config.backends.vulkan);
        assert!(config.backends.xv);
        assert_eq!(
            config.nvml.library.as_deref(),
            Some("/opt/nvidia/libnvidia-ml.so.1")
        );
        assert_eq!(config.display, DisplayConfig::default());
    }
}
