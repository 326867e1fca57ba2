//! Xv backend: video adaptor port attributes of one X screen
//!
//! Three adaptors are looked up by name. Each attribute maps to an `XV_*`
//! port attribute on the first port of its adaptor; its range comes from
//! the port's attribute info.

use super::XDisplay;
use crate::attributes::ids;
use crate::domain::{Permissions, ProtocolVersion, ValidValues, ValueType};
use crate::error::{CtrlError, CtrlResult};
use std::collections::HashMap;
use std::rc::Rc;
use x11rb::connection::RequestConnection;
use x11rb::protocol::xproto::{Atom, ConnectionExt as _};
use x11rb::protocol::xv::{self, AttributeFlag, ConnectionExt as _, Port};

pub const MINIMUM_VERSION: ProtocolVersion = ProtocolVersion::new(2, 0);

/// Adaptors the attribute set covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Adaptor {
    Overlay,
    Texture,
    Blitter,
}

impl Adaptor {
    pub const ALL: [Adaptor; 3] = [Adaptor::Overlay, Adaptor::Texture, Adaptor::Blitter];

    /// Whether `advertised` names this adaptor
    pub fn matches(self, advertised: &[u8]) -> bool {
        let suffix = match self {
            Adaptor::Overlay => "Video Overlay",
            Adaptor::Texture => "Video Texture",
            Adaptor::Blitter => "Video Blitter",
        };
        let advertised = advertised.strip_suffix(b"\0").unwrap_or(advertised);
        advertised.ends_with(suffix.as_bytes())
    }
}

/// Adaptor and `XV_*` port attribute behind an attribute ID
pub fn route(attr: u32) -> Option<(Adaptor, &'static str)> {
    let routed = match attr {
        ids::ATTR_XV_OVERLAY_SATURATION => (Adaptor::Overlay, "XV_SATURATION"),
        ids::ATTR_XV_OVERLAY_CONTRAST => (Adaptor::Overlay, "XV_CONTRAST"),
        ids::ATTR_XV_OVERLAY_BRIGHTNESS => (Adaptor::Overlay, "XV_BRIGHTNESS"),
        ids::ATTR_XV_OVERLAY_HUE => (Adaptor::Overlay, "XV_HUE"),
        ids::ATTR_XV_OVERLAY_SET_DEFAULTS => (Adaptor::Overlay, "XV_SET_DEFAULTS"),
        ids::ATTR_XV_TEXTURE_SYNC_TO_VBLANK => (Adaptor::Texture, "XV_SYNC_TO_VBLANK"),
        ids::ATTR_XV_TEXTURE_CONTRAST => (Adaptor::Texture, "XV_CONTRAST"),
        ids::ATTR_XV_TEXTURE_BRIGHTNESS => (Adaptor::Texture, "XV_BRIGHTNESS"),
        ids::ATTR_XV_TEXTURE_SATURATION => (Adaptor::Texture, "XV_SATURATION"),
        ids::ATTR_XV_TEXTURE_HUE => (Adaptor::Texture, "XV_HUE"),
        ids::ATTR_XV_TEXTURE_SET_DEFAULTS => (Adaptor::Texture, "XV_SET_DEFAULTS"),
        ids::ATTR_XV_BLITTER_SYNC_TO_VBLANK => (Adaptor::Blitter, "XV_SYNC_TO_VBLANK"),
        ids::ATTR_XV_BLITTER_SET_DEFAULTS => (Adaptor::Blitter, "XV_SET_DEFAULTS"),
        _ => return None,
    };
    Some(routed)
}

/// Whether `attr` is a write-only "set defaults" trigger
pub fn is_set_defaults(attr: u32) -> bool {
    matches!(
        attr,
        ids::ATTR_XV_OVERLAY_SET_DEFAULTS
            | ids::ATTR_XV_TEXTURE_SET_DEFAULTS
            | ids::ATTR_XV_BLITTER_SET_DEFAULTS
    )
}

/// One port attribute as described by `XvQueryPortAttributes`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortAttribute {
    pub atom: Atom,
    pub gettable: bool,
    pub settable: bool,
    pub min: i32,
    pub max: i32,
}

impl PortAttribute {
    /// Validate `value` for a write
    pub fn check(&self, value: i64) -> CtrlResult<i32> {
        if !self.settable {
            return Err(CtrlError::ReadOnlyAttribute);
        }
        let value = i32::try_from(value).map_err(|_| CtrlError::BadArgument)?;
        if value < self.min || value > self.max {
            return Err(CtrlError::BadArgument);
        }
        Ok(value)
    }

    /// Descriptor for this attribute
    pub fn valid_values(&self, targets: Permissions) -> ValidValues {
        let mut permissions = targets;
        permissions.set(Permissions::READ, self.gettable);
        permissions.set(Permissions::WRITE, self.settable);

        let value_type = if self.min == 0 && self.max == 1 {
            ValueType::Bool
        } else {
            ValueType::Range {
                min: self.min.into(),
                max: self.max.into(),
            }
        };
        ValidValues::new(value_type, permissions)
    }
}

/// First port of an adaptor and its attributes keyed by name
struct AdaptorPort {
    port: Port,
    attributes: HashMap<String, PortAttribute>,
}

/// Xv state of one X screen
pub struct XvAttributes {
    display: Rc<XDisplay>,
    version: ProtocolVersion,
    ports: HashMap<Adaptor, AdaptorPort>,
}

impl XvAttributes {
    /// Probe Xv on X screen `screen`
    ///
    /// `None` if the extension is too old or none of the three adaptors
    /// exist.
    pub fn init(display: Rc<XDisplay>, screen: u32) -> Option<Self> {
        match Self::probe(display, screen) {
            Ok(Some(attrs)) => {
                log::debug!(
                    "Xv {} initialized on screen {} ({} adaptors)",
                    attrs.version,
                    screen,
                    attrs.ports.len()
                );
                Some(attrs)
            }
            Ok(None) => None,
            Err(e) => {
                log::debug!("Xv probe on screen {} failed: {}", screen, e);
                None
            }
        }
    }

    fn probe(display: Rc<XDisplay>, screen: u32) -> CtrlResult<Option<Self>> {
        let conn = display.conn();
        if conn.extension_information(xv::X11_EXTENSION_NAME)?.is_none() {
            log::debug!("Xv extension not present");
            return Ok(None);
        }
        let reply = conn.xv_query_extension()?.reply()?;
        let version = ProtocolVersion::new(reply.major.into(), reply.minor.into());
        if !version.at_least(MINIMUM_VERSION) {
            log::debug!("Xv {} is older than the required {}", version, MINIMUM_VERSION);
            return Ok(None);
        }

        let root = display.root(screen)?;
        let adaptors = conn.xv_query_adaptors(root)?.reply()?;

        let mut ports = HashMap::new();
        for adaptor in Adaptor::ALL {
            let Some(info) = adaptors
                .info
                .iter()
                .find(|info| info.num_ports > 0 && adaptor.matches(&info.name))
            else {
                continue;
            };
            let attributes = port_attributes(&display, info.base_id)?;
            ports.insert(
                adaptor,
                AdaptorPort {
                    port: info.base_id,
                    attributes,
                },
            );
        }

        if ports.is_empty() {
            log::debug!("No NVIDIA Xv adaptors on screen {}", screen);
            return Ok(None);
        }
        Ok(Some(Self {
            display,
            version,
            ports,
        }))
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn has_adaptor(&self, adaptor: Adaptor) -> bool {
        self.ports.contains_key(&adaptor)
    }

    fn lookup(&self, attr: u32) -> CtrlResult<(Port, PortAttribute)> {
        let (adaptor, name) = route(attr).ok_or(CtrlError::NoAttribute)?;
        let port = self.ports.get(&adaptor).ok_or(CtrlError::MissingExtension)?;
        let attribute = port
            .attributes
            .get(name)
            .copied()
            .ok_or(CtrlError::AttributeNotAvailable)?;
        Ok((port.port, attribute))
    }

    pub fn get_attribute(&self, attr: u32) -> CtrlResult<i64> {
        if is_set_defaults(attr) {
            return Err(CtrlError::WriteOnlyAttribute);
        }
        let (port, attribute) = self.lookup(attr)?;
        if !attribute.gettable {
            return Err(CtrlError::WriteOnlyAttribute);
        }
        let reply = self
            .display
            .conn()
            .xv_get_port_attribute(port, attribute.atom)?
            .reply()?;
        Ok(reply.value.into())
    }

    pub fn set_attribute(&self, attr: u32, value: i64) -> CtrlResult<()> {
        let (port, attribute) = self.lookup(attr)?;
        let value = if is_set_defaults(attr) {
            // Any write triggers the reset
            attribute.check(attribute.min.into())?
        } else {
            attribute.check(value)?
        };
        self.display
            .conn()
            .xv_set_port_attribute(port, attribute.atom, value)?
            .check()?;
        Ok(())
    }

    pub fn valid_values(&self, attr: u32, targets: Permissions) -> CtrlResult<ValidValues> {
        let (_, attribute) = self.lookup(attr)?;
        if is_set_defaults(attr) {
            return Ok(ValidValues::new(
                ValueType::Integer,
                Permissions::WRITE | targets,
            ));
        }
        Ok(attribute.valid_values(targets))
    }

    pub fn get_string(&self, attr: u32) -> CtrlResult<String> {
        match attr {
            ids::STRING_XV_VERSION => Ok(self.version.to_string()),
            _ => Err(CtrlError::NoAttribute),
        }
    }
}

fn port_attributes(display: &XDisplay, port: Port) -> CtrlResult<HashMap<String, PortAttribute>> {
    let conn = display.conn();
    let reply = conn.xv_query_port_attributes(port)?.reply()?;

    let mut attributes = HashMap::new();
    for info in reply.attributes {
        let name = info.name.strip_suffix(b"\0").unwrap_or(&info.name);
        let atom = conn.intern_atom(true, name)?.reply()?.atom;
        if atom == x11rb::NONE {
            continue;
        }
        let flags = u32::from(info.flags);
        attributes.insert(
            String::from_utf8_lossy(name).into_owned(),
            PortAttribute {
                atom,
                gettable: flags & u32::from(AttributeFlag::GETTABLE) != 0,
                settable: flags & u32::from(AttributeFlag::SETTABLE) != 0,
                min: info.min,
                max: info.max,
            },
        );
    }
    Ok(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute(min: i32, max: i32) -> PortAttribute {
        PortAttribute {
            atom: 1,
            gettable: true,
            settable: true,
            min,
            max,
        }
    }

    #[test]
    fn test_adaptor_name_matching() {
        assert!(Adaptor::Overlay.matches(b"NV17 Video Overlay"));
        assert!(Adaptor::Texture.matches(b"NV17 Video Texture\0"));
        assert!(Adaptor::Blitter.matches(b"NV05 Video Blitter"));
        assert!(!Adaptor::Overlay.matches(b"NV17 Video Texture"));
    }

    #[test]
    fn test_route() {
        assert_eq!(
            route(ids::ATTR_XV_TEXTURE_HUE),
            Some((Adaptor::Texture, "XV_HUE"))
        );
        assert_eq!(
            route(ids::ATTR_XV_BLITTER_SYNC_TO_VBLANK),
            Some((Adaptor::Blitter, "XV_SYNC_TO_VBLANK"))
        );
        assert_eq!(route(ids::ATTR_RANDR_GAMMA_AVAILABLE), None);
        for attr in ids::ATTR_XV_BASE..=ids::ATTR_XV_LAST_ATTRIBUTE {
            assert!(route(attr).is_some(), "attribute {} has no route", attr);
        }
    }

    #[test]
    fn test_set_defaults_attributes() {
        assert!(is_set_defaults(ids::ATTR_XV_OVERLAY_SET_DEFAULTS));
        assert!(is_set_defaults(ids::ATTR_XV_BLITTER_SET_DEFAULTS));
        assert!(!is_set_defaults(ids::ATTR_XV_OVERLAY_HUE));
    }

    #[test]
    fn test_value_check() {
        let hue = attribute(-1000, 1000);
        assert_eq!(hue.check(-1000), Ok(-1000));
        assert_eq!(hue.check(1001), Err(CtrlError::BadArgument));
        assert_eq!(hue.check(i64::MIN), Err(CtrlError::BadArgument));

        let fixed = PortAttribute {
            settable: false,
            ..hue
        };
        assert_eq!(fixed.check(0), Err(CtrlError::ReadOnlyAttribute));
    }

    #[test]
    fn test_valid_values_mapping() {
        let sync = attribute(0, 1).valid_values(Permissions::X_SCREEN);
        assert_eq!(sync.value_type, ValueType::Bool);
        assert!(sync.permissions.contains(Permissions::READ_WRITE | Permissions::X_SCREEN));

        let saturation = attribute(0, 8191).valid_values(Permissions::X_SCREEN);
        assert_eq!(saturation.value_type, ValueType::Range { min: 0, max: 8191 });

        let read_only = PortAttribute {
            settable: false,
            ..attribute(-1000, 1000)
        };
        assert!(!read_only.valid_values(Permissions::X_SCREEN).permissions.writable());
    }
}
