//! Cooler domain types
//!
//! NVML reports fans per GPU; NV-CONTROL reports them as cooler targets
//! with a level, a control policy and a cooled component.

use crate::error::DomainError;

/// Cooler level as a percentage of full speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoolerLevel(u8);

impl CoolerLevel {
    pub const MIN: i64 = 0;
    pub const MAX: i64 = 100;

    /// Level from an attribute value
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(DomainError::InvalidCoolerLevel(value));
        }
        Ok(Self(value as u8))
    }

    /// NVML can report targets above 100 while spinning up
    pub fn saturating(value: u32) -> Self {
        Self(value.min(Self::MAX as u32) as u8)
    }

    #[inline]
    pub const fn percent(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn as_attribute(self) -> i64 {
        self.0 as i64
    }
}

/// Who drives the cooler level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanPolicy {
    /// Driver curve
    #[default]
    Auto,
    Manual,
}

impl FanPolicy {
    /// Policy for a `GPUFanControlState` value
    pub const fn from_attribute(value: i64) -> Option<Self> {
        match value {
            0 => Some(FanPolicy::Auto),
            1 => Some(FanPolicy::Manual),
            _ => None,
        }
    }

    pub const fn as_attribute(self) -> i64 {
        match self {
            FanPolicy::Auto => 0,
            FanPolicy::Manual => 1,
        }
    }
}

/// Component a cooler is designed to cool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoolerTarget {
    None,
    Gpu,
    Memory,
    PowerSupply,
    /// GPU, memory and power supply together
    All,
}

impl CoolerTarget {
    /// Decode an `nvmlCoolerTarget_t` bitmask
    pub fn from_nvml(raw: u32) -> Self {
        const GPU: u32 = 1 << 1;
        const MEMORY: u32 = 1 << 2;
        const POWER_SUPPLY: u32 = 1 << 3;

        match raw & (GPU | MEMORY | POWER_SUPPLY) {
            0 => CoolerTarget::None,
            GPU => CoolerTarget::Gpu,
            MEMORY => CoolerTarget::Memory,
            POWER_SUPPLY => CoolerTarget::PowerSupply,
            _ => CoolerTarget::All,
        }
    }

    /// Value reported by the `THERMAL_COOLER_TARGET` attribute
    pub const fn as_attribute(self) -> i64 {
        match self {
            CoolerTarget::None => 0,
            CoolerTarget::Gpu => 1,
            CoolerTarget::Memory => 2,
            CoolerTarget::PowerSupply => 4,
            CoolerTarget::All => 1 | 2 | 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooler_level_bounds() {
        assert_eq!(CoolerLevel::new(0).unwrap().percent(), 0);
        assert_eq!(CoolerLevel::new(100).unwrap().as_attribute(), 100);
        assert_eq!(
            CoolerLevel::new(101),
            Err(DomainError::InvalidCoolerLevel(101))
        );
        assert!(CoolerLevel::new(-1).is_err());
    }

    #[test]
    fn test_cooler_level_saturating() {
        assert_eq!(CoolerLevel::saturating(250).percent(), 100);
        assert_eq!(CoolerLevel::saturating(42).percent(), 42);
    }

    #[test]
    fn test_cooler_target_mapping() {
        assert_eq!(CoolerTarget::from_nvml(1 << 1), CoolerTarget::Gpu);
        assert_eq!(CoolerTarget::from_nvml(0b1110), CoolerTarget::All);
        assert_eq!(CoolerTarget::from_nvml(1), CoolerTarget::None);
        assert_eq!(CoolerTarget::All.as_attribute(), 7);
    }

    #[test]
    fn test_fan_policy_attribute() {
        assert_eq!(FanPolicy::from_attribute(1), Some(FanPolicy::Manual));
        assert_eq!(FanPolicy::from_attribute(2), None);
        assert_eq!(FanPolicy::Auto.as_attribute(), 0);
    }
}
