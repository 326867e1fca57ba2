//! Domain models for nvsettings
//!
//! Targets, value descriptors, versions and the gamma engine, plus the
//! GPU facts the NVML backend reports. Types are validated on
//! construction (fail-fast pattern).

pub mod fan;
pub mod gamma;
pub mod gpu;
pub mod target;
pub mod thermal;
pub mod valid_values;
pub mod version;

pub use fan::{CoolerLevel, CoolerTarget, FanPolicy};
pub use gamma::{Channel, ColorMask, ColorValue, GammaInput, GammaRamp};
pub use gpu::{ClockFrequencies, EccState, MemoryInfo, PciInfo, PcieLink, Utilization};
pub use target::{Target, TargetType};
pub use thermal::{SensorProvider, SensorTarget, Temperature};
pub use valid_values::{Permissions, ValidValues, ValueType};
pub use version::ProtocolVersion;
