//! Thermal sensor values
//!
//! NVML exposes one core sensor per GPU; it is reported as thermal sensor
//! targets with a fixed provider and target.

/// Core temperature in degrees Celsius
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Temperature(i32);

impl Temperature {
    pub const fn new(celsius: i32) -> Self {
        Self(celsius)
    }

    /// Value of the `THERMAL_SENSOR_READING` attribute
    pub const fn as_attribute(self) -> i64 {
        self.0 as i64
    }
}

impl From<u32> for Temperature {
    fn from(value: u32) -> Self {
        Self(i32::try_from(value).unwrap_or(i32::MAX))
    }
}

/// Where a thermal sensor reading comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorProvider {
    None,
    GpuInternal,
}

impl SensorProvider {
    /// Value reported by the `THERMAL_SENSOR_PROVIDER` attribute
    pub const fn as_attribute(self) -> i64 {
        match self {
            SensorProvider::None => 0,
            SensorProvider::GpuInternal => 1,
        }
    }
}

/// What a thermal sensor measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorTarget {
    None,
    Gpu,
    Memory,
}

impl SensorTarget {
    /// Value reported by the `THERMAL_SENSOR_TARGET` attribute
    pub const fn as_attribute(self) -> i64 {
        match self {
            SensorTarget::None => 0,
            SensorTarget::Gpu => 1,
            SensorTarget::Memory => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_attribute() {
        assert_eq!(Temperature::new(65).as_attribute(), 65);
        assert_eq!(Temperature::from(70u32).as_attribute(), 70);
        assert_eq!(Temperature::from(u32::MAX).as_attribute(), i64::from(i32::MAX));
    }

    #[test]
    fn test_sensor_attribute_values() {
        assert_eq!(SensorProvider::GpuInternal.as_attribute(), 1);
        assert_eq!(SensorTarget::Gpu.as_attribute(), 1);
        assert_eq!(SensorTarget::Memory.as_attribute(), 2);
    }
}
