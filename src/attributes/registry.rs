//! Typed attribute registry
//!
//! Maps every attribute ID to the one backend that owns it. The table is
//! checked when it is built: overlapping ranges, duplicate names and names
//! outside every range are rejected.

use super::ids;
use crate::error::RegistryError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Namespace an attribute ID lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Integer,
    String,
    Binary,
    StringOperation,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Integer => write!(f, "integer"),
            AttributeKind::String => write!(f, "string"),
            AttributeKind::Binary => write!(f, "binary"),
            AttributeKind::StringOperation => write!(f, "string operation"),
        }
    }
}

/// Backend that answers an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Backend {
    NvControl,
    /// Presence flags answered by the handle itself
    Local,
    Xv,
    Glx,
    XRandR,
    Vulkan,
}

/// A contiguous block of IDs owned by one backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeEntry {
    pub kind: AttributeKind,
    pub first: u32,
    pub last: u32,
    pub backend: Backend,
}

impl RangeEntry {
    pub const fn new(kind: AttributeKind, first: u32, last: u32, backend: Backend) -> Self {
        Self {
            kind,
            first,
            last,
            backend,
        }
    }

    pub fn contains(&self, kind: AttributeKind, id: u32) -> bool {
        self.kind == kind && self.first <= id && id <= self.last
    }

    fn overlaps(&self, other: &RangeEntry) -> bool {
        self.kind == other.kind && self.first <= other.last && other.first <= self.last
    }
}

/// Human-readable name for an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NamedAttribute {
    pub name: &'static str,
    pub kind: AttributeKind,
    pub id: u32,
}

impl NamedAttribute {
    pub const fn new(name: &'static str, kind: AttributeKind, id: u32) -> Self {
        Self { name, kind, id }
    }
}

/// Routing table for attribute IDs
#[derive(Debug)]
pub struct AttributeRegistry {
    ranges: Vec<RangeEntry>,
    by_name: HashMap<String, NamedAttribute>,
    by_id: HashMap<(AttributeKind, u32), NamedAttribute>,
}

static STANDARD: OnceLock<Result<AttributeRegistry, RegistryError>> = OnceLock::new();

impl AttributeRegistry {
    /// Build a registry, rejecting any inconsistency
    pub fn new(ranges: &[RangeEntry], named: &[NamedAttribute]) -> Result<Self, RegistryError> {
        for (i, range) in ranges.iter().enumerate() {
            if range.last < range.first {
                return Err(RegistryError::EmptyRange {
                    kind: range.kind,
                    first: range.first,
                    last: range.last,
                });
            }
            if let Some(other) = ranges[..i].iter().find(|r| r.overlaps(range)) {
                return Err(RegistryError::Overlap {
                    kind: range.kind,
                    first: (other.first, other.last),
                    second: (range.first, range.last),
                });
            }
        }

        let mut by_name = HashMap::with_capacity(named.len());
        let mut by_id = HashMap::with_capacity(named.len());
        for attr in named {
            if !ranges.iter().any(|r| r.contains(attr.kind, attr.id)) {
                return Err(RegistryError::Unowned(attr.name.to_string()));
            }
            if by_name
                .insert(attr.name.to_ascii_lowercase(), *attr)
                .is_some()
            {
                return Err(RegistryError::DuplicateName(attr.name.to_string()));
            }
            if by_id.insert((attr.kind, attr.id), *attr).is_some() {
                return Err(RegistryError::DuplicateId {
                    kind: attr.kind,
                    id: attr.id,
                });
            }
        }

        Ok(Self {
            ranges: ranges.to_vec(),
            by_name,
            by_id,
        })
    }

    /// The built-in table, built once per process
    pub fn standard() -> Result<&'static AttributeRegistry, RegistryError> {
        STANDARD
            .get_or_init(|| AttributeRegistry::new(ids::RANGES, ids::NAMED))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Backend owning `id`, if any
    pub fn owner(&self, kind: AttributeKind, id: u32) -> Option<Backend> {
        self.ranges
            .iter()
            .find(|r| r.contains(kind, id))
            .map(|r| r.backend)
    }

    /// Case-insensitive lookup by name
    pub fn lookup(&self, name: &str) -> Option<NamedAttribute> {
        self.by_name.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn name_of(&self, kind: AttributeKind, id: u32) -> Option<&'static str> {
        self.by_id.get(&(kind, id)).map(|a| a.name)
    }

    pub fn ranges(&self) -> &[RangeEntry] {
        &self.ranges
    }

    /// All named attributes, sorted by kind then ID
    pub fn named(&self) -> Vec<NamedAttribute> {
        let mut all: Vec<_> = self.by_id.values().copied().collect();
        all.sort_by_key(|a| (a.kind, a.id));
        all
    }
}
