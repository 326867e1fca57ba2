//! NV-CONTROL backend
//!
//! - [`protocol`]: the request trait and opcodes
//! - [`wire`]: raw extension requests over x11rb
//! - [`events`]: event selection and decoding
//!
//! [`NvControlAttributes`] is the per-target state: the negotiated version
//! decides which request variants are used.

pub mod events;
pub mod protocol;
pub mod wire;

pub use events::{NotifyKind, NvControlEvent};
pub use protocol::{NvControlProtocol, Opcode};
pub use wire::XNvControl;

use crate::attributes::ids;
use crate::domain::{Permissions, ProtocolVersion, Target, TargetType, ValidValues, ValueType};
use crate::error::{CtrlError, CtrlResult};
use std::rc::Rc;

/// Oldest server the attribute layer talks to
pub const MINIMUM_VERSION: ProtocolVersion = ProtocolVersion::new(1, 11);

/// Target IDs of a binary association attribute
///
/// The data is a native-endian `u32` count followed by that many IDs.
pub fn parse_id_list(data: &[u8]) -> CtrlResult<Vec<u32>> {
    let mut words = data
        .chunks_exact(4)
        .map(|w| u32::from_ne_bytes([w[0], w[1], w[2], w[3]]));
    let count = words.next().ok_or(CtrlError::Error)? as usize;
    let ids: Vec<u32> = words.take(count).collect();
    if ids.len() != count {
        return Err(CtrlError::Error);
    }
    Ok(ids)
}

/// NV-CONTROL state of one target
pub struct NvControlAttributes {
    proto: Rc<dyn NvControlProtocol>,
    target: Target,
    version: ProtocolVersion,
}

impl NvControlAttributes {
    /// Probe the server for `target`
    ///
    /// `None` when the server is too old or an X screen is not driven by
    /// an NVIDIA GPU. Event selection failures are logged and ignored.
    pub fn init(proto: Rc<dyn NvControlProtocol>, target: Target) -> Option<Self> {
        let version = match proto.query_version() {
            Ok(v) => v,
            Err(e) => {
                log::debug!("NV-CONTROL version query failed on {}: {}", target, e);
                return None;
            }
        };
        if !version.at_least(MINIMUM_VERSION) {
            log::debug!(
                "NV-CONTROL {} is older than the required {}",
                version,
                MINIMUM_VERSION
            );
            return None;
        }

        if target.kind == TargetType::XScreen {
            match proto.is_nv(target.id) {
                Ok(true) => {}
                Ok(false) => {
                    log::debug!("{} is not driven by an NVIDIA GPU", target);
                    return None;
                }
                Err(e) => {
                    log::debug!("IsNv query failed on {}: {}", target, e);
                    return None;
                }
            }
        }

        let attrs = Self {
            proto,
            target,
            version,
        };
        attrs.select_events();
        log::debug!("NV-CONTROL {} initialized on {}", version, target);
        Some(attrs)
    }

    fn select_events(&self) {
        for kind in NotifyKind::ALL {
            if !kind.supported_by(self.version) {
                continue;
            }
            let result = match kind {
                NotifyKind::AttributeChanged if self.target.kind == TargetType::XScreen => {
                    self.proto.select_notify(self.target.id, kind, true)
                }
                NotifyKind::AttributeChanged => continue,
                _ => self.proto.select_target_notify(self.target, kind, true),
            };
            if let Err(e) = result {
                log::debug!("Unable to select {:?} on {}: {}", kind, self.target, e);
            }
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn protocol(&self) -> &Rc<dyn NvControlProtocol> {
        &self.proto
    }

    fn has_64bit_requests(&self) -> bool {
        self.version.newer_than(1, 20)
    }

    fn local_permissions(&self) -> Permissions {
        Permissions::READ | self.target.kind.permission()
    }

    /// Read an integer, using the 64-bit request when the server has it
    pub fn get_attribute(&self, display_mask: u32, attr: u32) -> CtrlResult<i64> {
        match attr {
            ids::ATTR_NV_MAJOR_VERSION => return Ok(self.version.major.into()),
            ids::ATTR_NV_MINOR_VERSION => return Ok(self.version.minor.into()),
            _ => {}
        }
        if self.has_64bit_requests() {
            self.proto.query_attribute64(self.target, display_mask, attr)
        } else {
            self.proto
                .query_attribute(self.target, display_mask, attr)
                .map(i64::from)
        }
    }

    pub fn set_attribute(&self, display_mask: u32, attr: u32, value: i64) -> CtrlResult<()> {
        if matches!(attr, ids::ATTR_NV_MAJOR_VERSION | ids::ATTR_NV_MINOR_VERSION) {
            return Err(CtrlError::ReadOnlyAttribute);
        }
        let value = i32::try_from(value).map_err(|_| CtrlError::BadArgument)?;
        if self
            .proto
            .set_attribute_and_get_status(self.target, display_mask, attr, value)?
        {
            Ok(())
        } else {
            Err(CtrlError::Error)
        }
    }

    pub fn valid_values(&self, display_mask: u32, attr: u32) -> CtrlResult<ValidValues> {
        if matches!(attr, ids::ATTR_NV_MAJOR_VERSION | ids::ATTR_NV_MINOR_VERSION) {
            return Ok(ValidValues::new(ValueType::Integer, self.local_permissions()));
        }
        if self.has_64bit_requests() {
            self.proto
                .query_valid_values64(self.target, display_mask, attr)
        } else {
            self.proto.query_valid_values(self.target, display_mask, attr)
        }
    }

    pub fn get_string(&self, display_mask: u32, attr: u32) -> CtrlResult<String> {
        if attr == ids::STRING_NV_CONTROL_VERSION {
            return Ok(self.version.to_string());
        }
        self.proto.query_string(self.target, display_mask, attr)
    }

    pub fn set_string(&self, display_mask: u32, attr: u32, value: &str) -> CtrlResult<()> {
        if attr == ids::STRING_NV_CONTROL_VERSION {
            return Err(CtrlError::ReadOnlyAttribute);
        }
        if self
            .proto
            .set_string(self.target, display_mask, attr, value)?
        {
            Ok(())
        } else {
            Err(CtrlError::Error)
        }
    }

    /// Servers up to 1.20 cannot describe strings; they get a plain
    /// read-only descriptor
    pub fn valid_string_values(&self, display_mask: u32, attr: u32) -> CtrlResult<ValidValues> {
        if attr == ids::STRING_NV_CONTROL_VERSION || !self.has_64bit_requests() {
            return Ok(ValidValues::read_only_string(self.target.kind.permission()));
        }
        self.proto
            .query_valid_string_values(self.target, display_mask, attr)
    }

    pub fn get_binary(&self, display_mask: u32, attr: u32) -> CtrlResult<Vec<u8>> {
        self.proto.query_binary(self.target, display_mask, attr)
    }

    pub fn string_operation(&self, display_mask: u32, attr: u32, input: &str) -> CtrlResult<String> {
        self.proto
            .string_operation(self.target, display_mask, attr, input)
    }
}
