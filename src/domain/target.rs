//! Addressable targets
//!
//! Attributes are scoped to a `(TargetType, id)` pair. The numeric values
//! of [`TargetType`] are the ones carried on the NV-CONTROL wire.

use crate::domain::Permissions;
use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of entity an attribute is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    XScreen,
    Gpu,
    FrameLock,
    Vcsc,
    Gvi,
    Cooler,
    ThermalSensor,
    VisionProTransceiver,
    Display,
}

impl TargetType {
    /// Every target type in enumeration order
    pub const ALL: [TargetType; 9] = [
        TargetType::XScreen,
        TargetType::Gpu,
        TargetType::FrameLock,
        TargetType::Vcsc,
        TargetType::Gvi,
        TargetType::Cooler,
        TargetType::ThermalSensor,
        TargetType::VisionProTransceiver,
        TargetType::Display,
    ];

    /// Value used on the NV-CONTROL wire
    pub const fn as_raw(self) -> u16 {
        match self {
            TargetType::XScreen => 0,
            TargetType::Gpu => 1,
            TargetType::FrameLock => 2,
            TargetType::Vcsc => 3,
            TargetType::Gvi => 4,
            TargetType::Cooler => 5,
            TargetType::ThermalSensor => 6,
            TargetType::VisionProTransceiver => 7,
            TargetType::Display => 8,
        }
    }

    /// Parse a wire value
    pub fn from_raw(value: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_raw() == value)
    }

    /// Permission bit announcing that an attribute applies to this type
    pub fn permission(self) -> Permissions {
        match self {
            TargetType::XScreen => Permissions::X_SCREEN,
            TargetType::Gpu => Permissions::GPU,
            TargetType::FrameLock => Permissions::FRAMELOCK,
            TargetType::Vcsc => Permissions::VCSC,
            TargetType::Gvi => Permissions::GVI,
            TargetType::Cooler => Permissions::COOLER,
            TargetType::ThermalSensor => Permissions::THERMAL_SENSOR,
            TargetType::VisionProTransceiver => Permissions::VISION_PRO,
            TargetType::Display => Permissions::DISPLAY,
        }
    }

    /// Short name used on the command line
    pub const fn short_name(self) -> &'static str {
        match self {
            TargetType::XScreen => "screen",
            TargetType::Gpu => "gpu",
            TargetType::FrameLock => "framelock",
            TargetType::Vcsc => "vcs",
            TargetType::Gvi => "gvi",
            TargetType::Cooler => "fan",
            TargetType::ThermalSensor => "thermalsensor",
            TargetType::VisionProTransceiver => "svp",
            TargetType::Display => "dpy",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetType::XScreen => "X Screen",
            TargetType::Gpu => "GPU",
            TargetType::FrameLock => "Frame Lock Device",
            TargetType::Vcsc => "VCS",
            TargetType::Gvi => "SDI Input Device",
            TargetType::Cooler => "Fan",
            TargetType::ThermalSensor => "Thermal Sensor",
            TargetType::VisionProTransceiver => "3D Vision Pro Transceiver",
            TargetType::Display => "Display Device",
        };
        f.write_str(name)
    }
}

impl FromStr for TargetType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "screen" | "xscreen" => Ok(TargetType::XScreen),
            "gpu" => Ok(TargetType::Gpu),
            "framelock" => Ok(TargetType::FrameLock),
            "vcs" | "vcsc" => Ok(TargetType::Vcsc),
            "gvi" => Ok(TargetType::Gvi),
            "fan" | "cooler" => Ok(TargetType::Cooler),
            "thermalsensor" | "sensor" => Ok(TargetType::ThermalSensor),
            "svp" => Ok(TargetType::VisionProTransceiver),
            "dpy" | "display" => Ok(TargetType::Display),
            _ => Err(DomainError::InvalidTarget(s.to_string())),
        }
    }
}

/// A single addressable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Target {
    pub kind: TargetType,
    pub id: u32,
}

impl Target {
    pub const fn new(kind: TargetType, id: u32) -> Self {
        Self { kind, id }
    }

    pub const fn x_screen(id: u32) -> Self {
        Self::new(TargetType::XScreen, id)
    }

    pub const fn gpu(id: u32) -> Self {
        Self::new(TargetType::Gpu, id)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.kind.short_name(), self.id)
    }
}

impl FromStr for Target {
    type Err = DomainError;

    /// Accepts `gpu:0` and `[gpu:0]`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('[').trim_end_matches(']');
        let (kind, id) = trimmed
            .split_once(':')
            .ok_or_else(|| DomainError::InvalidTarget(s.to_string()))?;
        let kind: TargetType = kind.parse()?;
        let id = id
            .parse()
            .map_err(|_| DomainError::InvalidTarget(s.to_string()))?;
        Ok(Target::new(kind, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_type_raw_roundtrip() {
        for kind in TargetType::ALL {
            assert_eq!(TargetType::from_raw(kind.as_raw()), Some(kind));
        }
        assert_eq!(TargetType::from_raw(42), None);
    }

    #[test]
    fn test_target_parse() {
        assert_eq!("gpu:1".parse::<Target>().unwrap(), Target::gpu(1));
        assert_eq!(
            "[fan:3]".parse::<Target>().unwrap(),
            Target::new(TargetType::Cooler, 3)
        );
        assert!("gpu".parse::<Target>().is_err());
        assert!("monitor:0".parse::<Target>().is_err());
        assert!("gpu:x".parse::<Target>().is_err());
    }

    #[test]
    fn test_target_display() {
        assert_eq!(Target::x_screen(0).to_string(), "[screen:0]");
        assert_eq!(TargetType::Cooler.to_string(), "Fan");
    }

    #[test]
    fn test_target_permission_bits() {
        assert_eq!(TargetType::Gpu.permission(), Permissions::GPU);
        assert_eq!(TargetType::Display.permission(), Permissions::DISPLAY);
    }
}
