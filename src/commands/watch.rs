//! Watch command implementation
//!
//! Prints NV-CONTROL change events until the stream ends or the requested
//! number of events was seen.

use crate::attributes::AttributeRegistry;
use crate::cli::args::{OutputFormat, WatchArgs};
use crate::cli::output::{print_output, EventLine};
use crate::commands::lookup_attribute;
use crate::error::{CtrlError, Result};
use crate::nvcontrol::{NotifyKind, NvControlEvent};
use crate::services::{EventDispatcher, EventMonitor, MonitorConfig};
use crate::system::CtrlSystem;

/// Render one event with its attribute name
pub fn event_line(registry: &AttributeRegistry, event: &NvControlEvent) -> EventLine {
    let attribute = registry
        .name_of(event.kind.attribute_kind(), event.attribute)
        .map_or_else(|| format!("attribute {}", event.attribute), str::to_string);
    let available = match event.kind {
        NotifyKind::TargetAttributeAvailabilityChanged => event.available,
        _ => None,
    };

    EventLine {
        time: event.time,
        target: event.target.to_string(),
        attribute,
        value: event.value,
        available,
    }
}

/// Register `sink` for the attributes in `args`, or for every event
pub fn build_dispatcher(
    system: &CtrlSystem,
    args: &WatchArgs,
    sink: impl FnMut(EventLine) + Clone + 'static,
) -> Result<EventDispatcher> {
    let registry = system.registry();
    let mut dispatcher = EventDispatcher::new();

    if args.attributes.is_empty() {
        let mut sink = sink;
        dispatcher.on_any(move |event| sink(event_line(registry, event)));
        return Ok(dispatcher);
    }

    for name in &args.attributes {
        let attr = lookup_attribute(system, name)?;
        let mut sink = sink.clone();
        dispatcher.on(attr.kind, attr.id, move |event| {
            sink(event_line(registry, event))
        });
    }
    Ok(dispatcher)
}

/// Execute the watch command
pub fn run_watch(system: &CtrlSystem, args: &WatchArgs, format: OutputFormat) -> Result<()> {
    let source = system.event_source().ok_or(CtrlError::MissingExtension)?;
    let mut dispatcher = build_dispatcher(system, args, move |line| {
        if let Err(e) = print_output(&line, format) {
            log::error!("Failed to print event: {}", e);
        }
    })?;

    let config = MonitorConfig {
        max_events: args.count,
        ..Default::default()
    };
    let seen = EventMonitor::new(config, source).run(&mut dispatcher)?;
    log::info!("Watched {} events", seen);
    Ok(())
}
