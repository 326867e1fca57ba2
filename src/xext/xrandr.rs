//! XRandR backend: version, gamma availability and per-display CRTC gamma

use super::{ColorState, GammaDevice, XDisplay};
use crate::attributes::ids;
use crate::domain::{
    Channel, GammaRamp, Permissions, ProtocolVersion, Target, TargetType, ValidValues,
};
use crate::error::{CtrlError, CtrlResult};
use std::rc::Rc;
use x11rb::connection::RequestConnection;
use x11rb::protocol::randr::{self, ConnectionExt as _, Crtc, NotifyMask};

/// First version with per-CRTC gamma
pub const MINIMUM_VERSION: ProtocolVersion = ProtocolVersion::new(1, 2);

/// Gamma ramp of the CRTC driving one output
struct CrtcGamma {
    display: Rc<XDisplay>,
    crtc: Crtc,
}

impl GammaDevice for CrtcGamma {
    fn ramp_size(&self) -> CtrlResult<usize> {
        let reply = self
            .display
            .conn()
            .randr_get_crtc_gamma_size(self.crtc)?
            .reply()?;
        Ok(reply.size.into())
    }

    fn read_ramp(&self, size: usize) -> CtrlResult<GammaRamp> {
        let reply = self.display.conn().randr_get_crtc_gamma(self.crtc)?.reply()?;
        if reply.red.len() != size {
            return Err(CtrlError::Error);
        }
        GammaRamp::from_channels(reply.red, reply.green, reply.blue)
    }

    fn write_ramp(&self, ramp: &GammaRamp) -> CtrlResult<()> {
        self.display
            .conn()
            .randr_set_crtc_gamma(
                self.crtc,
                ramp.channel(Channel::Red),
                ramp.channel(Channel::Green),
                ramp.channel(Channel::Blue),
            )?
            .check()?;
        Ok(())
    }
}

/// XRandR state of one X screen or display
pub struct XRandRAttributes {
    version: ProtocolVersion,
    /// Present only for displays driven by a CRTC with a gamma ramp
    color: Option<ColorState>,
}

impl XRandRAttributes {
    /// Probe XRandR for `target` on X screen `screen`
    ///
    /// Displays are matched to an output of that screen by `randr_name`,
    /// the display's RandR output name.
    pub fn init(
        display: Rc<XDisplay>,
        target: Target,
        screen: u32,
        randr_name: Option<&str>,
    ) -> Option<Self> {
        let version = match query_version(&display) {
            Ok(Some(v)) => v,
            Ok(None) => {
                log::debug!("XRandR extension not present");
                return None;
            }
            Err(e) => {
                log::debug!("XRandR version query failed: {}", e);
                return None;
            }
        };

        let root = match display.root(screen) {
            Ok(root) => root,
            Err(e) => {
                log::debug!("No root window for X screen {}: {}", screen, e);
                return None;
            }
        };

        let mask = NotifyMask::SCREEN_CHANGE | NotifyMask::CRTC_CHANGE;
        let selected = display
            .conn()
            .randr_select_input(root, mask)
            .map_err(CtrlError::from)
            .and_then(|cookie| cookie.check().map_err(CtrlError::from));
        if let Err(e) = selected {
            log::debug!("Unable to select XRandR events on {}: {}", target, e);
        }

        let device = match (target.kind, randr_name) {
            (TargetType::Display, Some(name)) => match find_crtc(&display, root, name) {
                Ok(Some(crtc)) => {
                    Some(Box::new(CrtcGamma { display, crtc }) as Box<dyn GammaDevice>)
                }
                Ok(None) => {
                    log::debug!("No active CRTC for output {}", name);
                    None
                }
                Err(e) => {
                    log::debug!("XRandR output lookup for {} failed: {}", name, e);
                    None
                }
            },
            _ => None,
        };

        match Self::with_device(version, device) {
            Ok(attrs) => {
                log::debug!("XRandR {} initialized on {}", version, target);
                Some(attrs)
            }
            Err(e) => {
                log::debug!("XRandR unusable on {}: {}", target, e);
                None
            }
        }
    }

    /// Build over an optional gamma device, checking `version`
    ///
    /// A device whose ramp cannot be read leaves gamma unavailable.
    pub fn with_device(
        version: ProtocolVersion,
        device: Option<Box<dyn GammaDevice>>,
    ) -> CtrlResult<Self> {
        if !version.at_least(MINIMUM_VERSION) {
            return Err(CtrlError::MissingExtension);
        }
        let color = match device.map(ColorState::new) {
            Some(Ok(state)) => Some(state),
            Some(Err(e)) => {
                log::debug!("CRTC gamma unavailable: {}", e);
                None
            }
            None => None,
        };
        Ok(Self { version, color })
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn gamma_available(&self) -> bool {
        self.color.is_some()
    }

    pub fn color(&self) -> Option<&ColorState> {
        self.color.as_ref()
    }

    pub fn color_mut(&mut self) -> Option<&mut ColorState> {
        self.color.as_mut()
    }

    pub fn get_attribute(&self, attr: u32) -> CtrlResult<i64> {
        match attr {
            ids::ATTR_RANDR_GAMMA_AVAILABLE => Ok(i64::from(self.gamma_available())),
            _ => Err(CtrlError::NoAttribute),
        }
    }

    pub fn valid_values(&self, attr: u32, targets: Permissions) -> CtrlResult<ValidValues> {
        match attr {
            ids::ATTR_RANDR_GAMMA_AVAILABLE => Ok(ValidValues::read_only_bool(targets)),
            _ => Err(CtrlError::NoAttribute),
        }
    }

    pub fn get_string(&self, attr: u32) -> CtrlResult<String> {
        match attr {
            ids::STRING_XRANDR_VERSION => Ok(self.version.to_string()),
            _ => Err(CtrlError::NoAttribute),
        }
    }
}

fn query_version(display: &XDisplay) -> CtrlResult<Option<ProtocolVersion>> {
    let conn = display.conn();
    if conn.extension_information(randr::X11_EXTENSION_NAME)?.is_none() {
        return Ok(None);
    }
    let reply = conn.randr_query_version(1, 6)?.reply()?;
    Ok(Some(ProtocolVersion::new(
        reply.major_version,
        reply.minor_version,
    )))
}

/// CRTC currently driving the output named `name`
fn find_crtc(display: &XDisplay, root: u32, name: &str) -> CtrlResult<Option<Crtc>> {
    let conn = display.conn();
    let resources = conn.randr_get_screen_resources_current(root)?.reply()?;
    for output in resources.outputs {
        let info = conn
            .randr_get_output_info(output, resources.config_timestamp)?
            .reply()?;
        if info.name == name.as_bytes() {
            return Ok((info.crtc != x11rb::NONE).then_some(info.crtc));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGammaDevice;

    #[test]
    fn test_screen_has_no_gamma() {
        let attrs = XRandRAttributes::with_device(ProtocolVersion::new(1, 6), None).unwrap();
        assert!(!attrs.gamma_available());
        assert_eq!(attrs.get_attribute(ids::ATTR_RANDR_GAMMA_AVAILABLE), Ok(0));
        assert_eq!(attrs.get_string(ids::STRING_XRANDR_VERSION).unwrap(), "1.6");
    }

    #[test]
    fn test_display_with_gamma() {
        let device: Box<dyn GammaDevice> = Box::new(MockGammaDevice::new(1024));
        let attrs =
            XRandRAttributes::with_device(ProtocolVersion::new(1, 2), Some(device)).unwrap();
        assert!(attrs.gamma_available());
        assert_eq!(attrs.get_attribute(ids::ATTR_RANDR_GAMMA_AVAILABLE), Ok(1));
        let valid = attrs
            .valid_values(ids::ATTR_RANDR_GAMMA_AVAILABLE, Permissions::DISPLAY)
            .unwrap();
        assert!(!valid.permissions.writable());
    }

    #[test]
    fn test_unreadable_crtc_leaves_gamma_off() {
        let device: Box<dyn GammaDevice> = Box::new(MockGammaDevice::new(0));
        let attrs =
            XRandRAttributes::with_device(ProtocolVersion::new(1, 3), Some(device)).unwrap();
        assert!(!attrs.gamma_available());
    }

    #[test]
    fn test_old_version_rejected() {
        let result = XRandRAttributes::with_device(ProtocolVersion::new(1, 1), None);
        assert!(matches!(result, Err(CtrlError::MissingExtension)));
    }
}
