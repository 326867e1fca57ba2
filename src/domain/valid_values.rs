//! Valid-values descriptors
//!
//! Describes what values an attribute accepts and who may touch it.
//! Produced per query, never cached.

use bitflags::bitflags;
use serde::Serialize;
use std::fmt;

bitflags! {
    /// Access permissions and applicable target types
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Permissions: u32 {
        const READ = 0x0001;
        const WRITE = 0x0002;
        const DISPLAY = 0x0004;
        const GPU = 0x0008;
        const FRAMELOCK = 0x0010;
        const X_SCREEN = 0x0020;
        const XINERAMA = 0x0040;
        const VCSC = 0x0080;
        const GVI = 0x0100;
        const COOLER = 0x0200;
        const THERMAL_SENSOR = 0x0400;
        const VISION_PRO = 0x0800;

        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

impl Permissions {
    pub fn readable(self) -> bool {
        self.contains(Permissions::READ)
    }

    pub fn writable(self) -> bool {
        self.contains(Permissions::WRITE)
    }
}

impl Serialize for Permissions {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

/// Kind of value an attribute holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueType {
    Unknown,
    Integer,
    Bitmask,
    Bool,
    Range { min: i64, max: i64 },
    IntBits { bits: u64 },
    Integer64,
    String,
    Binary,
    StringOperation,
}

impl ValueType {
    /// Decode the NV-CONTROL attribute type field
    pub fn from_wire(kind: u32, min: i64, max: i64, bits: u64) -> Self {
        match kind {
            1 => ValueType::Integer,
            2 => ValueType::Bitmask,
            3 => ValueType::Bool,
            4 => ValueType::Range { min, max },
            5 => ValueType::IntBits { bits },
            6 => ValueType::Integer64,
            7 => ValueType::String,
            8 => ValueType::Binary,
            9 => ValueType::StringOperation,
            _ => ValueType::Unknown,
        }
    }

    /// Whether `value` is acceptable for this type
    pub fn accepts(&self, value: i64) -> bool {
        match *self {
            ValueType::Bool => value == 0 || value == 1,
            ValueType::Range { min, max } => (min..=max).contains(&value),
            ValueType::IntBits { bits } => {
                value >= 0 && value < 64 && bits & (1u64 << value) != 0
            }
            _ => true,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Unknown => write!(f, "unknown"),
            ValueType::Integer => write!(f, "integer"),
            ValueType::Bitmask => write!(f, "bitmask"),
            ValueType::Bool => write!(f, "boolean"),
            ValueType::Range { min, max } => write!(f, "range {} - {}", min, max),
            ValueType::IntBits { bits } => {
                let values: Vec<String> = (0..64)
                    .filter(|i| bits & (1u64 << i) != 0)
                    .map(|i| i.to_string())
                    .collect();
                write!(f, "one of {{{}}}", values.join(", "))
            }
            ValueType::Integer64 => write!(f, "64-bit integer"),
            ValueType::String => write!(f, "string"),
            ValueType::Binary => write!(f, "binary data"),
            ValueType::StringOperation => write!(f, "string operation"),
        }
    }
}

/// What an attribute accepts and who may access it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidValues {
    pub value_type: ValueType,
    pub permissions: Permissions,
}

impl ValidValues {
    pub fn new(value_type: ValueType, permissions: Permissions) -> Self {
        Self {
            value_type,
            permissions,
        }
    }

    /// Read-only boolean scoped to the given targets
    pub fn read_only_bool(targets: Permissions) -> Self {
        Self::new(ValueType::Bool, Permissions::READ | targets)
    }

    /// Read-only string scoped to the given targets
    pub fn read_only_string(targets: Permissions) -> Self {
        Self::new(ValueType::String, Permissions::READ | targets)
    }
}
