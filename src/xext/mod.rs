//! X server side of the attribute layer
//!
//! Owns the X connection shared by every X-based backend and the gamma
//! device seam used by the color engine.

pub mod color;
pub mod glx;
pub mod vidmode;
pub mod xrandr;
pub mod xv;

pub use color::ColorState;
pub use glx::{FbConfig, GlxAttributes};
pub use vidmode::VidModeAttributes;
pub use xrandr::XRandRAttributes;
pub use xv::XvAttributes;

use crate::domain::GammaRamp;
use crate::error::{AppError, CtrlError, CtrlResult};
use x11rb::connection::Connection;
use x11rb::errors::{ConnectionError, ReplyError};
use x11rb::protocol::xproto::Window;
use x11rb::protocol::ErrorKind;
use x11rb::rust_connection::RustConnection;

/// An open X display
pub struct XDisplay {
    conn: RustConnection,
    default_screen: usize,
}

impl XDisplay {
    /// Connect to `name`, or `$DISPLAY` when `None`
    pub fn connect(name: Option<&str>) -> Result<Self, AppError> {
        let (conn, default_screen) = x11rb::connect(name).map_err(|e| {
            AppError::Display(format!("{}: {}", name.unwrap_or("$DISPLAY"), e))
        })?;
        log::debug!("Connected to X display, default screen {}", default_screen);
        Ok(Self {
            conn,
            default_screen,
        })
    }

    pub fn conn(&self) -> &RustConnection {
        &self.conn
    }

    pub fn default_screen(&self) -> usize {
        self.default_screen
    }

    pub fn screen_count(&self) -> usize {
        self.conn.setup().roots.len()
    }

    /// Root window of X screen `screen`
    pub fn root(&self, screen: u32) -> CtrlResult<Window> {
        self.conn
            .setup()
            .roots
            .get(screen as usize)
            .map(|s| s.root)
            .ok_or(CtrlError::BadHandle)
    }
}

/// Hardware gamma ramp of one X screen or CRTC
pub trait GammaDevice {
    /// Entries per channel
    fn ramp_size(&self) -> CtrlResult<usize>;

    fn read_ramp(&self, size: usize) -> CtrlResult<GammaRamp>;

    fn write_ramp(&self, ramp: &GammaRamp) -> CtrlResult<()>;
}

impl From<ReplyError> for CtrlError {
    fn from(err: ReplyError) -> Self {
        match err {
            ReplyError::X11Error(e) => match e.error_kind {
                ErrorKind::Value => CtrlError::BadArgument,
                ErrorKind::Match => CtrlError::AttributeNotAvailable,
                _ => CtrlError::Error,
            },
            ReplyError::ConnectionError(_) => CtrlError::Error,
        }
    }
}

impl From<ConnectionError> for CtrlError {
    fn from(_: ConnectionError) -> Self {
        CtrlError::Error
    }
}
