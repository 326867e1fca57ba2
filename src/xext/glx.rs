//! GLX backend: server strings and framebuffer configurations
//!
//! Framebuffer configs travel as binary data: two native-endian `u32`
//! counts (configs, properties per config) followed by
//! `configs * properties` `(attribute, value)` pairs of `u32`.

use super::XDisplay;
use crate::attributes::ids;
use crate::domain::ProtocolVersion;
use crate::error::{CtrlError, CtrlResult};
use serde::Serialize;
use std::rc::Rc;
use x11rb::connection::RequestConnection;
use x11rb::protocol::glx::{self, ConnectionExt as _};

/// First version with framebuffer configs
pub const MINIMUM_VERSION: ProtocolVersion = ProtocolVersion::new(1, 3);

// glXQueryServerString names
const GLX_VENDOR: u32 = 1;
const GLX_VERSION: u32 = 2;
const GLX_EXTENSIONS: u32 = 3;

// Framebuffer config attributes
pub const GLX_BUFFER_SIZE: u32 = 2;
pub const GLX_DOUBLEBUFFER: u32 = 5;
pub const GLX_RED_SIZE: u32 = 8;
pub const GLX_GREEN_SIZE: u32 = 9;
pub const GLX_BLUE_SIZE: u32 = 10;
pub const GLX_ALPHA_SIZE: u32 = 11;
pub const GLX_DEPTH_SIZE: u32 = 12;
pub const GLX_STENCIL_SIZE: u32 = 13;
pub const GLX_VISUAL_ID: u32 = 0x800b;
pub const GLX_FBCONFIG_ID: u32 = 0x8013;

/// One framebuffer configuration as `(attribute, value)` pairs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FbConfig {
    pub properties: Vec<(u32, u32)>,
}

impl FbConfig {
    pub fn get(&self, attribute: u32) -> Option<u32> {
        self.properties
            .iter()
            .find(|(a, _)| *a == attribute)
            .map(|(_, v)| *v)
    }

    pub fn id(&self) -> Option<u32> {
        self.get(GLX_FBCONFIG_ID)
    }
}

/// Pack a `GetFBConfigs` reply into the binary attribute layout
pub fn encode_fbconfigs(num_configs: u32, num_properties: u32, property_list: &[u32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(8 + property_list.len() * 4);
    data.extend_from_slice(&num_configs.to_ne_bytes());
    data.extend_from_slice(&num_properties.to_ne_bytes());
    for word in property_list {
        data.extend_from_slice(&word.to_ne_bytes());
    }
    data
}

/// Unpack the binary attribute layout
///
/// `BadArgument` if the data is shorter than its counts claim.
pub fn parse_fbconfigs(data: &[u8]) -> CtrlResult<Vec<FbConfig>> {
    let words: Vec<u32> = data
        .chunks_exact(4)
        .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let [num_configs, num_properties, list @ ..] = words.as_slice() else {
        return Err(CtrlError::BadArgument);
    };
    let per_config = (*num_properties as usize)
        .checked_mul(2)
        .ok_or(CtrlError::BadArgument)?;
    let needed = (*num_configs as usize)
        .checked_mul(per_config)
        .ok_or(CtrlError::BadArgument)?;
    if list.len() < needed {
        return Err(CtrlError::BadArgument);
    }
    if per_config == 0 {
        return Ok(vec![
            FbConfig {
                properties: Vec::new()
            };
            *num_configs as usize
        ]);
    }

    Ok(list[..needed]
        .chunks_exact(per_config)
        .map(|config| FbConfig {
            properties: config.chunks_exact(2).map(|p| (p[0], p[1])).collect(),
        })
        .collect())
}

/// GLX state of one X screen
pub struct GlxAttributes {
    display: Rc<XDisplay>,
    screen: u32,
    version: ProtocolVersion,
}

impl GlxAttributes {
    pub fn init(display: Rc<XDisplay>, screen: u32) -> Option<Self> {
        let version = match query_version(&display) {
            Ok(Some(v)) => v,
            Ok(None) => {
                log::debug!("GLX extension not present");
                return None;
            }
            Err(e) => {
                log::debug!("GLX version query failed: {}", e);
                return None;
            }
        };
        if !version.at_least(MINIMUM_VERSION) {
            log::debug!("GLX {} is older than the required {}", version, MINIMUM_VERSION);
            return None;
        }
        log::debug!("GLX {} initialized on screen {}", version, screen);
        Some(Self {
            display,
            screen,
            version,
        })
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    fn server_string(&self, name: u32) -> CtrlResult<String> {
        let reply = self
            .display
            .conn()
            .glx_query_server_string(self.screen, name)?
            .reply()?;
        let bytes = reply.string.strip_suffix(b"\0").unwrap_or(&reply.string);
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn get_string(&self, attr: u32) -> CtrlResult<String> {
        match attr {
            ids::STRING_GLX_SERVER_VENDOR => self.server_string(GLX_VENDOR),
            ids::STRING_GLX_SERVER_VERSION => self.server_string(GLX_VERSION),
            ids::STRING_GLX_SERVER_EXTENSIONS => self.server_string(GLX_EXTENSIONS),
            ids::STRING_GLX_VERSION => Ok(self.version.to_string()),
            _ => Err(CtrlError::NoAttribute),
        }
    }

    pub fn get_binary(&self, attr: u32) -> CtrlResult<Vec<u8>> {
        match attr {
            ids::BINARY_GLX_FBCONFIG_ATTRIBS => {
                let reply = self
                    .display
                    .conn()
                    .glx_get_fb_configs(self.screen)?
                    .reply()?;
                Ok(encode_fbconfigs(
                    reply.num_fb_configs,
                    reply.num_properties,
                    &reply.property_list,
                ))
            }
            _ => Err(CtrlError::NoAttribute),
        }
    }

    pub fn fbconfigs(&self) -> CtrlResult<Vec<FbConfig>> {
        parse_fbconfigs(&self.get_binary(ids::BINARY_GLX_FBCONFIG_ATTRIBS)?)
    }
}

fn query_version(display: &XDisplay) -> CtrlResult<Option<ProtocolVersion>> {
    let conn = display.conn();
    if conn.extension_information(glx::X11_EXTENSION_NAME)?.is_none() {
        return Ok(None);
    }
    let reply = conn.glx_query_version(1, 4)?.reply()?;
    Ok(Some(ProtocolVersion::new(
        reply.major_version,
        reply.minor_version,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fbconfigs() {
        let list = [
            GLX_FBCONFIG_ID, 0x21, GLX_DOUBLEBUFFER, 1,
            GLX_FBCONFIG_ID, 0x22, GLX_DOUBLEBUFFER, 0,
        ];
        let configs = parse_fbconfigs(&encode_fbconfigs(2, 2, &list)).unwrap();
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].id(), Some(0x21));
        assert_eq!(configs[0].get(GLX_DOUBLEBUFFER), Some(1));
        assert_eq!(configs[1].id(), Some(0x22));
        assert_eq!(configs[1].get(GLX_DEPTH_SIZE), None);
    }

    #[test]
    fn test_truncated_fbconfigs_rejected() {
        let data = encode_fbconfigs(2, 2, &[GLX_FBCONFIG_ID, 1, GLX_RED_SIZE, 8]);
        assert_eq!(parse_fbconfigs(&data), Err(CtrlError::BadArgument));
        assert_eq!(parse_fbconfigs(&[0, 0, 0]), Err(CtrlError::BadArgument));
    }

    #[test]
    fn test_empty_fbconfigs() {
        let configs = parse_fbconfigs(&encode_fbconfigs(0, 4, &[])).unwrap();
        assert!(configs.is_empty());
        let configs = parse_fbconfigs(&encode_fbconfigs(3, 0, &[])).unwrap();
        assert_eq!(configs.len(), 3);
        assert!(configs[0].properties.is_empty());
    }
}
