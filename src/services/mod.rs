//! Service layer over the attribute handles
//!
//! Event callbacks and the blocking event loop that drives them.

pub mod events;
pub mod monitor;

pub use events::EventDispatcher;
pub use monitor::{EventMonitor, MonitorConfig};
