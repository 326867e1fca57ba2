//! NV-CONTROL change notifications

use crate::attributes::AttributeKind;
use crate::domain::{ProtocolVersion, Target, TargetType};
use serde::Serialize;

/// Event types, numbered from the extension's first event code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyKind {
    AttributeChanged,
    TargetAttributeChanged,
    TargetAttributeAvailabilityChanged,
    TargetStringAttributeChanged,
    TargetBinaryAttributeChanged,
}

impl NotifyKind {
    pub const ALL: [NotifyKind; 5] = [
        NotifyKind::AttributeChanged,
        NotifyKind::TargetAttributeChanged,
        NotifyKind::TargetAttributeAvailabilityChanged,
        NotifyKind::TargetStringAttributeChanged,
        NotifyKind::TargetBinaryAttributeChanged,
    ];

    pub const fn as_raw(self) -> u16 {
        match self {
            NotifyKind::AttributeChanged => 0,
            NotifyKind::TargetAttributeChanged => 1,
            NotifyKind::TargetAttributeAvailabilityChanged => 2,
            NotifyKind::TargetStringAttributeChanged => 3,
            NotifyKind::TargetBinaryAttributeChanged => 4,
        }
    }

    pub fn from_raw(raw: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_raw() == u16::from(raw))
    }

    /// Whether a server at `version` can deliver this event
    pub fn supported_by(self, version: ProtocolVersion) -> bool {
        match self {
            NotifyKind::AttributeChanged => true,
            NotifyKind::TargetAttributeChanged => version.newer_than(1, 15),
            NotifyKind::TargetAttributeAvailabilityChanged => version.newer_than(1, 16),
            NotifyKind::TargetStringAttributeChanged
            | NotifyKind::TargetBinaryAttributeChanged => version.newer_than(1, 17),
        }
    }

    /// Namespace of the attribute an event of this kind refers to
    pub fn attribute_kind(self) -> AttributeKind {
        match self {
            NotifyKind::TargetStringAttributeChanged => AttributeKind::String,
            NotifyKind::TargetBinaryAttributeChanged => AttributeKind::Binary,
            _ => AttributeKind::Integer,
        }
    }
}

/// A decoded NV-CONTROL event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NvControlEvent {
    pub kind: NotifyKind,
    pub time: u32,
    pub target: Target,
    pub display_mask: u32,
    pub attribute: u32,
    /// New value; 0 for string and binary changes
    pub value: i64,
    /// Set only for availability changes
    pub available: Option<bool>,
}

impl NvControlEvent {
    pub const SIZE: usize = 32;

    /// Decode a raw X event, `None` if it is not an NV-CONTROL event
    pub fn parse(raw: &[u8], event_base: u8) -> Option<Self> {
        if raw.len() < Self::SIZE {
            return None;
        }
        let code = raw[0] & 0x7f;
        let kind = NotifyKind::from_raw(code.checked_sub(event_base)?)?;

        let u16_at = |off: usize| u16::from_ne_bytes([raw[off], raw[off + 1]]);
        let u32_at =
            |off: usize| u32::from_ne_bytes([raw[off], raw[off + 1], raw[off + 2], raw[off + 3]]);

        let time = u32_at(4);
        let target = match kind {
            // The original event carries a 32-bit screen number
            NotifyKind::AttributeChanged => Target::x_screen(u32_at(8)),
            _ => {
                let kind = TargetType::from_raw(u16_at(8))?;
                Target::new(kind, u32::from(u16_at(10)))
            }
        };
        let display_mask = u32_at(12);
        let attribute = u32_at(16);

        let (value, available) = match kind {
            NotifyKind::AttributeChanged | NotifyKind::TargetAttributeChanged => {
                (i64::from(u32_at(20) as i32), None)
            }
            NotifyKind::TargetAttributeAvailabilityChanged => (0, Some(raw[20] != 0)),
            NotifyKind::TargetStringAttributeChanged
            | NotifyKind::TargetBinaryAttributeChanged => (0, None),
        };

        Some(Self {
            kind,
            time,
            target,
            display_mask,
            attribute,
            value,
            available,
        })
    }

    /// Encode back to the 32-byte wire form
    pub fn to_bytes(&self, event_base: u8) -> [u8; Self::SIZE] {
        let mut raw = [0u8; Self::SIZE];
        raw[0] = event_base + self.kind.as_raw() as u8;
        raw[4..8].copy_from_slice(&self.time.to_ne_bytes());
        match self.kind {
            NotifyKind::AttributeChanged => {
                raw[8..12].copy_from_slice(&self.target.id.to_ne_bytes());
            }
            _ => {
                raw[8..10].copy_from_slice(&self.target.kind.as_raw().to_ne_bytes());
                raw[10..12].copy_from_slice(&(self.target.id as u16).to_ne_bytes());
            }
        }
        raw[12..16].copy_from_slice(&self.display_mask.to_ne_bytes());
        raw[16..20].copy_from_slice(&self.attribute.to_ne_bytes());
        match self.kind {
            NotifyKind::TargetAttributeAvailabilityChanged => {
                raw[20] = u8::from(self.available.unwrap_or(false));
            }
            _ => raw[20..24].copy_from_slice(&(self.value as i32).to_ne_bytes()),
        }
        raw
    }
}
