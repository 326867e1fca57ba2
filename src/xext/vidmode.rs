//! XF86VidMode backend: per-X-screen gamma ramps

use super::{ColorState, GammaDevice, XDisplay};
use crate::domain::{GammaRamp, ProtocolVersion};
use crate::error::{CtrlError, CtrlResult};
use std::rc::Rc;
use x11rb::connection::RequestConnection;
use x11rb::protocol::xf86vidmode::{self, ConnectionExt as _};

/// First version with gamma ramp requests
pub const MINIMUM_VERSION: ProtocolVersion = ProtocolVersion::new(2, 1);

/// Gamma ramp of one X screen
struct ScreenGamma {
    display: Rc<XDisplay>,
    screen: u16,
}

impl GammaDevice for ScreenGamma {
    fn ramp_size(&self) -> CtrlResult<usize> {
        let reply = self
            .display
            .conn()
            .xf86vidmode_get_gamma_ramp_size(self.screen)?
            .reply()?;
        Ok(reply.size.into())
    }

    fn read_ramp(&self, size: usize) -> CtrlResult<GammaRamp> {
        let size = u16::try_from(size).map_err(|_| CtrlError::BadArgument)?;
        let reply = self
            .display
            .conn()
            .xf86vidmode_get_gamma_ramp(self.screen, size)?
            .reply()?;
        GammaRamp::from_channels(reply.red, reply.green, reply.blue)
    }

    fn write_ramp(&self, ramp: &GammaRamp) -> CtrlResult<()> {
        use crate::domain::Channel;

        let size = u16::try_from(ramp.size()).map_err(|_| CtrlError::BadArgument)?;
        self.display
            .conn()
            .xf86vidmode_set_gamma_ramp(
                self.screen,
                size,
                ramp.channel(Channel::Red),
                ramp.channel(Channel::Green),
                ramp.channel(Channel::Blue),
            )?
            .check()?;
        Ok(())
    }
}

/// XF86VidMode state of one X screen
pub struct VidModeAttributes {
    version: ProtocolVersion,
    color: ColorState,
}

impl VidModeAttributes {
    /// Probe XF86VidMode on X screen `screen`
    pub fn init(display: Rc<XDisplay>, screen: u32) -> Option<Self> {
        let version = match query_version(&display) {
            Ok(Some(v)) => v,
            Ok(None) => {
                log::debug!("XF86VidMode extension not present");
                return None;
            }
            Err(e) => {
                log::debug!("XF86VidMode version query failed: {}", e);
                return None;
            }
        };
        let screen = u16::try_from(screen).ok()?;
        let device = ScreenGamma { display, screen };
        match Self::with_device(version, Box::new(device)) {
            Ok(attrs) => {
                log::debug!("XF86VidMode {} initialized on screen {}", version, screen);
                Some(attrs)
            }
            Err(e) => {
                log::debug!("XF86VidMode unusable on screen {}: {}", screen, e);
                None
            }
        }
    }

    /// Build over an arbitrary gamma device, checking `version`
    pub fn with_device(version: ProtocolVersion, device: Box<dyn GammaDevice>) -> CtrlResult<Self> {
        if !version.at_least(MINIMUM_VERSION) {
            return Err(CtrlError::MissingExtension);
        }
        Ok(Self {
            version,
            color: ColorState::new(device)?,
        })
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn color(&self) -> &ColorState {
        &self.color
    }

    pub fn color_mut(&mut self) -> &mut ColorState {
        &mut self.color
    }
}

fn query_version(display: &XDisplay) -> CtrlResult<Option<ProtocolVersion>> {
    let conn = display.conn();
    if conn
        .extension_information(xf86vidmode::X11_EXTENSION_NAME)?
        .is_none()
    {
        return Ok(None);
    }
    let reply = conn.xf86vidmode_query_version()?.reply()?;
    Ok(Some(ProtocolVersion::new(
        reply.major_version.into(),
        reply.minor_version.into(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGammaDevice;

    #[test]
    fn test_old_version_rejected() {
        let device = Box::new(MockGammaDevice::new(256));
        let result = VidModeAttributes::with_device(ProtocolVersion::new(2, 0), device);
        assert!(matches!(result, Err(CtrlError::MissingExtension)));
    }

    #[test]
    fn test_with_device() {
        let device = Box::new(MockGammaDevice::new(256));
        let attrs = VidModeAttributes::with_device(ProtocolVersion::new(2, 2), device).unwrap();
        assert_eq!(attrs.version(), ProtocolVersion::new(2, 2));
        assert_eq!(attrs.color().ramp_size(), 256);
    }
}
