//! Event loop monitor
//!
//! Pulls NV-CONTROL events off the connection and feeds them to an
//! [`EventDispatcher`] until the stream ends or enough events were seen.

use crate::error::CtrlError;
use crate::nvcontrol::NvControlProtocol;
use crate::services::EventDispatcher;

use std::rc::Rc;
use std::time::Duration;

/// Configuration for the monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Stop after this many events
    pub max_events: Option<usize>,
    /// Whether to retry on errors
    pub retry: bool,
    /// Interval between retries
    pub retry_interval: Duration,
    /// Give up after this many consecutive failures
    pub max_retries: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_events: None,
            retry: false,
            retry_interval: Duration::from_secs(1),
            max_retries: 3,
        }
    }
}

/// Blocking NV-CONTROL event loop
pub struct EventMonitor {
    config: MonitorConfig,
    source: Rc<dyn NvControlProtocol>,
}

impl EventMonitor {
    pub fn new(config: MonitorConfig, source: Rc<dyn NvControlProtocol>) -> Self {
        Self { config, source }
    }

    /// Run until the event stream ends or `max_events` were dispatched
    ///
    /// Returns the number of events seen.
    pub fn run(&self, dispatcher: &mut EventDispatcher) -> Result<usize, CtrlError> {
        let mut seen = 0;
        let mut failures = 0;

        while self.config.max_events.map_or(true, |max| seen < max) {
            match self.source.next_event() {
                Ok(Some(event)) => {
                    failures = 0;
                    seen += 1;
                    log::debug!(
                        "{:?} on {}: attribute {} = {}",
                        event.kind,
                        event.target,
                        event.attribute,
                        event.value
                    );
                    dispatcher.dispatch(&event);
                }
                Ok(None) => {
                    log::info!("Event stream closed after {} events", seen);
                    break;
                }
                Err(e) => {
                    log::error!("Reading events failed: {}", e);
                    failures += 1;
                    if self.config.retry && failures <= self.config.max_retries {
                        log::info!("Retrying in {:?}...", self.config.retry_interval);
                        std::thread::sleep(self.config.retry_interval);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Ok(seen)
    }

    /// Get the monitor configuration
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{ids, AttributeKind};
    use crate::domain::{ProtocolVersion, Target};
    use crate::mock::MockNvControl;
    use crate::nvcontrol::{NotifyKind, NvControlEvent};
    use std::cell::Cell;

    fn temperature_event(value: i64) -> NvControlEvent {
        NvControlEvent {
            kind: NotifyKind::TargetAttributeChanged,
            time: 0,
            target: Target::gpu(0),
            display_mask: 0,
            attribute: ids::GPU_CORE_TEMPERATURE,
            value,
            available: None,
        }
    }

    fn source(events: &[i64]) -> Rc<MockNvControl> {
        let mock = Rc::new(MockNvControl::new(ProtocolVersion::new(1, 29)));
        for &value in events {
            mock.push_event(temperature_event(value));
        }
        mock
    }

    #[test]
    fn test_monitor_config_default() {
        let config = MonitorConfig::default();
        assert_eq!(config.max_events, None);
        assert!(!config.retry);
    }

    #[test]
    fn test_runs_until_stream_ends() {
        let last = Rc::new(Cell::new(0));
        let mut dispatcher = EventDispatcher::new();
        let sink = last.clone();
        dispatcher.on(AttributeKind::Integer, ids::GPU_CORE_TEMPERATURE, move |e| {
            sink.set(e.value)
        });

        let monitor = EventMonitor::new(MonitorConfig::default(), source(&[60, 61, 62]));
        assert_eq!(monitor.run(&mut dispatcher), Ok(3));
        assert_eq!(last.get(), 62);
    }

    #[test]
    fn test_stops_after_max_events() {
        let mock = source(&[60, 61, 62]);
        let config = MonitorConfig {
            max_events: Some(2),
            ..Default::default()
        };
        let monitor = EventMonitor::new(config, mock.clone());
        assert_eq!(monitor.run(&mut EventDispatcher::new()), Ok(2));
        assert_eq!(mock.next_event().unwrap().map(|e| e.value), Some(62));
    }
}
