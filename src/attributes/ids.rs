//! Attribute identifiers
//!
//! IDs up to the `*_LAST_ATTRIBUTE` constant of each kind belong to the
//! NV-CONTROL server. IDs above are answered locally by the X extension,
//! NVML and Vulkan backends and are laid out in consecutive blocks.

use super::registry::{AttributeKind, Backend, NamedAttribute, RangeEntry};

// Integer attributes served by NV-CONTROL

pub const BUS_TYPE: u32 = 5;
pub const TOTAL_GPU_MEMORY: u32 = 6;
pub const IRQ: u32 = 7;
pub const OPERATING_SYSTEM: u32 = 8;
pub const SYNC_TO_VBLANK: u32 = 9;
pub const LOG_ANISO: u32 = 10;
pub const FSAA_MODE: u32 = 11;
pub const GPU_CORE_TEMPERATURE: u32 = 60;
pub const GPU_CORE_THRESHOLD: u32 = 61;
pub const GPU_DEFAULT_CORE_THRESHOLD: u32 = 62;
pub const GPU_MAX_CORE_THRESHOLD: u32 = 63;
pub const AMBIENT_TEMPERATURE: u32 = 64;
pub const GPU_CURRENT_CLOCK_FREQS: u32 = 74;
pub const PCI_BUS: u32 = 116;
pub const PCI_DEVICE: u32 = 117;
pub const PCI_FUNCTION: u32 = 118;
pub const PCI_ID: u32 = 251;
pub const GPU_PCIE_MAX_LINK_WIDTH: u32 = 254;
pub const GPU_PCIE_CURRENT_LINK_WIDTH: u32 = 255;
pub const DIGITAL_VIBRANCE: u32 = 261;
pub const GPU_ECC_SUPPORTED: u32 = 299;
pub const GPU_ECC_STATUS: u32 = 300;
pub const GPU_ECC_CONFIGURATION_SUPPORTED: u32 = 301;
pub const GPU_ECC_CONFIGURATION: u32 = 302;
pub const PCI_DOMAIN: u32 = 306;
pub const GPU_COOLER_MANUAL_CONTROL: u32 = 319;
pub const THERMAL_COOLER_LEVEL: u32 = 320;
pub const THERMAL_COOLER_LEVEL_SET_DEFAULT: u32 = 321;
pub const THERMAL_COOLER_CONTROL_TYPE: u32 = 322;
pub const THERMAL_COOLER_TARGET: u32 = 323;
pub const GPU_PCIE_GENERATION: u32 = 341;
pub const TOTAL_DEDICATED_GPU_MEMORY: u32 = 393;
pub const USED_DEDICATED_GPU_MEMORY: u32 = 394;
pub const THERMAL_COOLER_SPEED: u32 = 405;
pub const THERMAL_SENSOR_READING: u32 = 414;
pub const THERMAL_SENSOR_PROVIDER: u32 = 415;
pub const THERMAL_SENSOR_TARGET: u32 = 416;
pub const THERMAL_COOLER_CURRENT_LEVEL: u32 = 417;

pub const LAST_ATTRIBUTE: u32 = 450;

// Presence flags, answered by the handle itself

pub const ATTR_EXT_BASE: u32 = LAST_ATTRIBUTE + 1;
pub const ATTR_EXT_NV_PRESENT: u32 = ATTR_EXT_BASE;
pub const ATTR_EXT_VM_PRESENT: u32 = ATTR_EXT_BASE + 1;
pub const ATTR_EXT_XV_OVERLAY_PRESENT: u32 = ATTR_EXT_BASE + 2;
pub const ATTR_EXT_XV_TEXTURE_PRESENT: u32 = ATTR_EXT_BASE + 3;
pub const ATTR_EXT_XV_BLITTER_PRESENT: u32 = ATTR_EXT_BASE + 4;
pub const ATTR_EXT_GLX_PRESENT: u32 = ATTR_EXT_BASE + 5;
pub const ATTR_EXT_XRANDR_PRESENT: u32 = ATTR_EXT_BASE + 6;
pub const ATTR_EXT_NVML_PRESENT: u32 = ATTR_EXT_BASE + 7;
pub const ATTR_EXT_VK_PRESENT: u32 = ATTR_EXT_BASE + 8;
pub const ATTR_EXT_LAST_ATTRIBUTE: u32 = ATTR_EXT_VK_PRESENT;

// NV-CONTROL facts known to the client

pub const ATTR_NV_BASE: u32 = ATTR_EXT_LAST_ATTRIBUTE + 1;
pub const ATTR_NV_MAJOR_VERSION: u32 = ATTR_NV_BASE;
pub const ATTR_NV_MINOR_VERSION: u32 = ATTR_NV_BASE + 1;
pub const ATTR_NV_LAST_ATTRIBUTE: u32 = ATTR_NV_MINOR_VERSION;

// Xv port attributes

pub const ATTR_XV_BASE: u32 = ATTR_NV_LAST_ATTRIBUTE + 1;
pub const ATTR_XV_OVERLAY_SATURATION: u32 = ATTR_XV_BASE;
pub const ATTR_XV_OVERLAY_CONTRAST: u32 = ATTR_XV_BASE + 1;
pub const ATTR_XV_OVERLAY_BRIGHTNESS: u32 = ATTR_XV_BASE + 2;
pub const ATTR_XV_OVERLAY_HUE: u32 = ATTR_XV_BASE + 3;
pub const ATTR_XV_OVERLAY_SET_DEFAULTS: u32 = ATTR_XV_BASE + 4;
pub const ATTR_XV_TEXTURE_SYNC_TO_VBLANK: u32 = ATTR_XV_BASE + 5;
pub const ATTR_XV_TEXTURE_CONTRAST: u32 = ATTR_XV_BASE + 6;
pub const ATTR_XV_TEXTURE_BRIGHTNESS: u32 = ATTR_XV_BASE + 7;
pub const ATTR_XV_TEXTURE_SATURATION: u32 = ATTR_XV_BASE + 8;
pub const ATTR_XV_TEXTURE_HUE: u32 = ATTR_XV_BASE + 9;
pub const ATTR_XV_TEXTURE_SET_DEFAULTS: u32 = ATTR_XV_BASE + 10;
pub const ATTR_XV_BLITTER_SYNC_TO_VBLANK: u32 = ATTR_XV_BASE + 11;
pub const ATTR_XV_BLITTER_SET_DEFAULTS: u32 = ATTR_XV_BASE + 12;
pub const ATTR_XV_LAST_ATTRIBUTE: u32 = ATTR_XV_BLITTER_SET_DEFAULTS;

// XRandR

pub const ATTR_RANDR_BASE: u32 = ATTR_XV_LAST_ATTRIBUTE + 1;
pub const ATTR_RANDR_GAMMA_AVAILABLE: u32 = ATTR_RANDR_BASE;
pub const ATTR_RANDR_LAST_ATTRIBUTE: u32 = ATTR_RANDR_GAMMA_AVAILABLE;

// Vulkan

pub const ATTR_VK_BASE: u32 = ATTR_RANDR_LAST_ATTRIBUTE + 1;
pub const ATTR_VK_PHYSICAL_DEVICE_COUNT: u32 = ATTR_VK_BASE;
pub const ATTR_VK_LAST_ATTRIBUTE: u32 = ATTR_VK_PHYSICAL_DEVICE_COUNT;

// String attributes served by NV-CONTROL

pub const STRING_PRODUCT_NAME: u32 = 0;
pub const STRING_VBIOS_VERSION: u32 = 1;
pub const STRING_NVIDIA_DRIVER_VERSION: u32 = 3;
pub const STRING_DISPLAY_DEVICE_NAME: u32 = 4;
pub const STRING_GPU_CURRENT_CLOCK_FREQS: u32 = 34;
pub const STRING_PERFORMANCE_MODES: u32 = 35;
pub const STRING_DISPLAY_NAME_RANDR: u32 = 50;
pub const STRING_GPU_UUID: u32 = 52;
pub const STRING_GPU_UTILIZATION: u32 = 53;

pub const STRING_LAST_ATTRIBUTE: u32 = 60;

pub const STRING_NV_CONTROL_BASE: u32 = STRING_LAST_ATTRIBUTE + 1;
pub const STRING_NV_CONTROL_VERSION: u32 = STRING_NV_CONTROL_BASE;
pub const STRING_NV_CONTROL_LAST_ATTRIBUTE: u32 = STRING_NV_CONTROL_VERSION;

pub const STRING_XV_BASE: u32 = STRING_NV_CONTROL_LAST_ATTRIBUTE + 1;
pub const STRING_XV_VERSION: u32 = STRING_XV_BASE;
pub const STRING_XV_LAST_ATTRIBUTE: u32 = STRING_XV_VERSION;

pub const STRING_GLX_BASE: u32 = STRING_XV_LAST_ATTRIBUTE + 1;
pub const STRING_GLX_SERVER_VENDOR: u32 = STRING_GLX_BASE;
pub const STRING_GLX_SERVER_VERSION: u32 = STRING_GLX_BASE + 1;
pub const STRING_GLX_SERVER_EXTENSIONS: u32 = STRING_GLX_BASE + 2;
pub const STRING_GLX_VERSION: u32 = STRING_GLX_BASE + 3;
pub const STRING_GLX_LAST_ATTRIBUTE: u32 = STRING_GLX_VERSION;

pub const STRING_XRANDR_BASE: u32 = STRING_GLX_LAST_ATTRIBUTE + 1;
pub const STRING_XRANDR_VERSION: u32 = STRING_XRANDR_BASE;
pub const STRING_XRANDR_LAST_ATTRIBUTE: u32 = STRING_XRANDR_VERSION;

pub const STRING_VK_BASE: u32 = STRING_XRANDR_LAST_ATTRIBUTE + 1;
pub const STRING_VK_API_VERSION: u32 = STRING_VK_BASE;
pub const STRING_VK_INSTANCE_EXTENSIONS: u32 = STRING_VK_BASE + 1;
pub const STRING_VK_INSTANCE_LAYERS: u32 = STRING_VK_BASE + 2;
pub const STRING_VK_DEVICE_NAMES: u32 = STRING_VK_BASE + 3;
pub const STRING_VK_LAST_ATTRIBUTE: u32 = STRING_VK_DEVICE_NAMES;

// Binary data

pub const BINARY_DATA_EDID: u32 = 0;
pub const BINARY_DATA_MODELINES: u32 = 1;
pub const BINARY_DATA_METAMODES: u32 = 2;
pub const BINARY_DATA_XSCREENS_USING_GPU: u32 = 3;
pub const BINARY_DATA_GPUS_USED_BY_XSCREEN: u32 = 4;
pub const BINARY_DATA_COOLERS_USED_BY_GPU: u32 = 10;
pub const BINARY_DATA_THERMAL_SENSORS_USED_BY_GPU: u32 = 12;
pub const BINARY_DATA_DISPLAYS_CONNECTED_TO_GPU: u32 = 15;
pub const BINARY_DATA_DISPLAYS_ASSIGNED_TO_XSCREEN: u32 = 19;
pub const BINARY_DATA_DISPLAYS_ON_GPU: u32 = 20;

pub const BINARY_DATA_LAST_ATTRIBUTE: u32 = 20;

pub const BINARY_GLX_BASE: u32 = BINARY_DATA_LAST_ATTRIBUTE + 1;
pub const BINARY_GLX_FBCONFIG_ATTRIBS: u32 = BINARY_GLX_BASE;
pub const BINARY_GLX_LAST_ATTRIBUTE: u32 = BINARY_GLX_FBCONFIG_ATTRIBS;

// String operations

pub const STRING_OPERATION_ADD_METAMODE: u32 = 0;
pub const STRING_OPERATION_GTF_MODELINE: u32 = 1;
pub const STRING_OPERATION_CVT_MODELINE: u32 = 2;
pub const STRING_OPERATION_BUILD_MODEPOOL: u32 = 3;
pub const STRING_OPERATION_PARSE_METAMODE: u32 = 5;

pub const STRING_OPERATION_LAST_ATTRIBUTE: u32 = 5;

/// Owner of every ID block, in dispatch priority order
pub const RANGES: &[RangeEntry] = &[
    RangeEntry::new(AttributeKind::Integer, 0, LAST_ATTRIBUTE, Backend::NvControl),
    RangeEntry::new(
        AttributeKind::Integer,
        ATTR_EXT_BASE,
        ATTR_EXT_LAST_ATTRIBUTE,
        Backend::Local,
    ),
    RangeEntry::new(
        AttributeKind::Integer,
        ATTR_NV_BASE,
        ATTR_NV_LAST_ATTRIBUTE,
        Backend::NvControl,
    ),
    RangeEntry::new(
        AttributeKind::Integer,
        ATTR_XV_BASE,
        ATTR_XV_LAST_ATTRIBUTE,
        Backend::Xv,
    ),
    RangeEntry::new(
        AttributeKind::Integer,
        ATTR_RANDR_BASE,
        ATTR_RANDR_LAST_ATTRIBUTE,
        Backend::XRandR,
    ),
    RangeEntry::new(
        AttributeKind::Integer,
        ATTR_VK_BASE,
        ATTR_VK_LAST_ATTRIBUTE,
        Backend::Vulkan,
    ),
    RangeEntry::new(AttributeKind::String, 0, STRING_LAST_ATTRIBUTE, Backend::NvControl),
    RangeEntry::new(
        AttributeKind::String,
        STRING_NV_CONTROL_BASE,
        STRING_NV_CONTROL_LAST_ATTRIBUTE,
        Backend::NvControl,
    ),
    RangeEntry::new(
        AttributeKind::String,
        STRING_XV_BASE,
        STRING_XV_LAST_ATTRIBUTE,
        Backend::Xv,
    ),
    RangeEntry::new(
        AttributeKind::String,
        STRING_GLX_BASE,
        STRING_GLX_LAST_ATTRIBUTE,
        Backend::Glx,
    ),
    RangeEntry::new(
        AttributeKind::String,
        STRING_XRANDR_BASE,
        STRING_XRANDR_LAST_ATTRIBUTE,
        Backend::XRandR,
    ),
    RangeEntry::new(
        AttributeKind::String,
        STRING_VK_BASE,
        STRING_VK_LAST_ATTRIBUTE,
        Backend::Vulkan,
    ),
    RangeEntry::new(
        AttributeKind::Binary,
        0,
        BINARY_DATA_LAST_ATTRIBUTE,
        Backend::NvControl,
    ),
    RangeEntry::new(
        AttributeKind::Binary,
        BINARY_GLX_BASE,
        BINARY_GLX_LAST_ATTRIBUTE,
        Backend::Glx,
    ),
    RangeEntry::new(
        AttributeKind::StringOperation,
        0,
        STRING_OPERATION_LAST_ATTRIBUTE,
        Backend::NvControl,
    ),
];

const fn int(name: &'static str, id: u32) -> NamedAttribute {
    NamedAttribute::new(name, AttributeKind::Integer, id)
}

const fn string(name: &'static str, id: u32) -> NamedAttribute {
    NamedAttribute::new(name, AttributeKind::String, id)
}

const fn binary(name: &'static str, id: u32) -> NamedAttribute {
    NamedAttribute::new(name, AttributeKind::Binary, id)
}

const fn string_op(name: &'static str, id: u32) -> NamedAttribute {
    NamedAttribute::new(name, AttributeKind::StringOperation, id)
}

/// Names accepted on the command line
pub const NAMED: &[NamedAttribute] = &[
    int("BusType", BUS_TYPE),
    int("TotalGPUMemory", TOTAL_GPU_MEMORY),
    int("Irq", IRQ),
    int("OperatingSystem", OPERATING_SYSTEM),
    int("SyncToVBlank", SYNC_TO_VBLANK),
    int("LogAniso", LOG_ANISO),
    int("FSAA", FSAA_MODE),
    int("GPUCoreTemp", GPU_CORE_TEMPERATURE),
    int("GPUCoreThreshold", GPU_CORE_THRESHOLD),
    int("GPUDefaultCoreThreshold", GPU_DEFAULT_CORE_THRESHOLD),
    int("GPUMaxCoreThreshold", GPU_MAX_CORE_THRESHOLD),
    int("GPUAmbientTemp", AMBIENT_TEMPERATURE),
    int("GPUCurrentClockFreqs", GPU_CURRENT_CLOCK_FREQS),
    int("PCIBus", PCI_BUS),
    int("PCIDevice", PCI_DEVICE),
    int("PCIFunc", PCI_FUNCTION),
    int("PCIID", PCI_ID),
    int("PCIEMaxLinkWidth", GPU_PCIE_MAX_LINK_WIDTH),
    int("PCIECurrentLinkWidth", GPU_PCIE_CURRENT_LINK_WIDTH),
    int("DigitalVibrance", DIGITAL_VIBRANCE),
    int("GPUECCSupported", GPU_ECC_SUPPORTED),
    int("GPUECCStatus", GPU_ECC_STATUS),
    int("GPUECCConfigurationSupported", GPU_ECC_CONFIGURATION_SUPPORTED),
    int("GPUECCConfiguration", GPU_ECC_CONFIGURATION),
    int("PCIDomain", PCI_DOMAIN),
    int("GPUFanControlState", GPU_COOLER_MANUAL_CONTROL),
    int("GPUTargetFanSpeed", THERMAL_COOLER_LEVEL),
    int("GPUFanResetToDefault", THERMAL_COOLER_LEVEL_SET_DEFAULT),
    int("GPUFanControlType", THERMAL_COOLER_CONTROL_TYPE),
    int("GPUFanTarget", THERMAL_COOLER_TARGET),
    int("PCIEGen", GPU_PCIE_GENERATION),
    int("TotalDedicatedGPUMemory", TOTAL_DEDICATED_GPU_MEMORY),
    int("UsedDedicatedGPUMemory", USED_DEDICATED_GPU_MEMORY),
    int("GPUCurrentFanSpeedRPM", THERMAL_COOLER_SPEED),
    int("ThermalSensorReading", THERMAL_SENSOR_READING),
    int("ThermalSensorProvider", THERMAL_SENSOR_PROVIDER),
    int("ThermalSensorTarget", THERMAL_SENSOR_TARGET),
    int("GPUCurrentFanSpeed", THERMAL_COOLER_CURRENT_LEVEL),
    int("NvControlPresent", ATTR_EXT_NV_PRESENT),
    int("VidModePresent", ATTR_EXT_VM_PRESENT),
    int("XvOverlayPresent", ATTR_EXT_XV_OVERLAY_PRESENT),
    int("XvTexturePresent", ATTR_EXT_XV_TEXTURE_PRESENT),
    int("XvBlitterPresent", ATTR_EXT_XV_BLITTER_PRESENT),
    int("GlxPresent", ATTR_EXT_GLX_PRESENT),
    int("XRandRPresent", ATTR_EXT_XRANDR_PRESENT),
    int("NvmlPresent", ATTR_EXT_NVML_PRESENT),
    int("VulkanPresent", ATTR_EXT_VK_PRESENT),
    int("NvControlMajorVersion", ATTR_NV_MAJOR_VERSION),
    int("NvControlMinorVersion", ATTR_NV_MINOR_VERSION),
    int("XVideoOverlaySaturation", ATTR_XV_OVERLAY_SATURATION),
    int("XVideoOverlayContrast", ATTR_XV_OVERLAY_CONTRAST),
    int("XVideoOverlayBrightness", ATTR_XV_OVERLAY_BRIGHTNESS),
    int("XVideoOverlayHue", ATTR_XV_OVERLAY_HUE),
    int("XVideoOverlaySetDefaults", ATTR_XV_OVERLAY_SET_DEFAULTS),
    int("XVideoTextureSyncToVBlank", ATTR_XV_TEXTURE_SYNC_TO_VBLANK),
    int("XVideoTextureContrast", ATTR_XV_TEXTURE_CONTRAST),
    int("XVideoTextureBrightness", ATTR_XV_TEXTURE_BRIGHTNESS),
    int("XVideoTextureSaturation", ATTR_XV_TEXTURE_SATURATION),
    int("XVideoTextureHue", ATTR_XV_TEXTURE_HUE),
    int("XVideoTextureSetDefaults", ATTR_XV_TEXTURE_SET_DEFAULTS),
    int("XVideoBlitterSyncToVBlank", ATTR_XV_BLITTER_SYNC_TO_VBLANK),
    int("XVideoBlitterSetDefaults", ATTR_XV_BLITTER_SET_DEFAULTS),
    int("RandRGammaAvailable", ATTR_RANDR_GAMMA_AVAILABLE),
    int("VulkanDeviceCount", ATTR_VK_PHYSICAL_DEVICE_COUNT),
    string("ProductName", STRING_PRODUCT_NAME),
    string("VBiosVersion", STRING_VBIOS_VERSION),
    string("NvidiaDriverVersion", STRING_NVIDIA_DRIVER_VERSION),
    string("DisplayDeviceName", STRING_DISPLAY_DEVICE_NAME),
    string("GPUCurrentClockFreqsString", STRING_GPU_CURRENT_CLOCK_FREQS),
    string("GPUPerfModes", STRING_PERFORMANCE_MODES),
    string("DisplayNameRandR", STRING_DISPLAY_NAME_RANDR),
    string("GPUUUID", STRING_GPU_UUID),
    string("GPUUtilization", STRING_GPU_UTILIZATION),
    string("NvControlVersion", STRING_NV_CONTROL_VERSION),
    string("XvVersion", STRING_XV_VERSION),
    string("GlxServerVendor", STRING_GLX_SERVER_VENDOR),
    string("GlxServerVersion", STRING_GLX_SERVER_VERSION),
    string("GlxServerExtensions", STRING_GLX_SERVER_EXTENSIONS),
    string("GlxVersion", STRING_GLX_VERSION),
    string("XRandRVersion", STRING_XRANDR_VERSION),
    string("VulkanApiVersion", STRING_VK_API_VERSION),
    string("VulkanInstanceExtensions", STRING_VK_INSTANCE_EXTENSIONS),
    string("VulkanInstanceLayers", STRING_VK_INSTANCE_LAYERS),
    string("VulkanDeviceNames", STRING_VK_DEVICE_NAMES),
    binary("EDID", BINARY_DATA_EDID),
    binary("ModeLines", BINARY_DATA_MODELINES),
    binary("MetaModes", BINARY_DATA_METAMODES),
    binary("XScreensUsingGPU", BINARY_DATA_XSCREENS_USING_GPU),
    binary("GPUsUsedByXScreen", BINARY_DATA_GPUS_USED_BY_XSCREEN),
    binary("CoolersUsedByGPU", BINARY_DATA_COOLERS_USED_BY_GPU),
    binary("ThermalSensorsUsedByGPU", BINARY_DATA_THERMAL_SENSORS_USED_BY_GPU),
    binary("DisplaysConnectedToGPU", BINARY_DATA_DISPLAYS_CONNECTED_TO_GPU),
    binary("DisplaysAssignedToXScreen", BINARY_DATA_DISPLAYS_ASSIGNED_TO_XSCREEN),
    binary("DisplaysOnGPU", BINARY_DATA_DISPLAYS_ON_GPU),
    binary("GlxFBConfigs", BINARY_GLX_FBCONFIG_ATTRIBS),
    string_op("AddMetaMode", STRING_OPERATION_ADD_METAMODE),
    string_op("GTFModeline", STRING_OPERATION_GTF_MODELINE),
    string_op("CVTModeline", STRING_OPERATION_CVT_MODELINE),
    string_op("BuildModePool", STRING_OPERATION_BUILD_MODEPOOL),
    string_op("ParseMetaMode", STRING_OPERATION_PARSE_METAMODE),
];
