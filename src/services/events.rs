//! Change-notification callbacks
//!
//! Handlers are registered per attribute and run for every matching
//! NV-CONTROL event, in registration order. Catch-all handlers run after
//! the attribute-specific ones.

use crate::attributes::AttributeKind;
use crate::nvcontrol::NvControlEvent;
use std::collections::HashMap;

type Handler = Box<dyn FnMut(&NvControlEvent)>;

/// Routes decoded events to registered callbacks
#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<(AttributeKind, u32), Vec<Handler>>,
    catch_all: Vec<Handler>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `handler` for changes of attribute `attr` in namespace `kind`
    pub fn on(
        &mut self,
        kind: AttributeKind,
        attr: u32,
        handler: impl FnMut(&NvControlEvent) + 'static,
    ) {
        self.handlers
            .entry((kind, attr))
            .or_default()
            .push(Box::new(handler));
    }

    /// Call `handler` for every event
    pub fn on_any(&mut self, handler: impl FnMut(&NvControlEvent) + 'static) {
        self.catch_all.push(Box::new(handler));
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.values().map(Vec::len).sum::<usize>() + self.catch_all.len()
    }

    /// Run the handlers matching `event`, returning how many ran
    pub fn dispatch(&mut self, event: &NvControlEvent) -> usize {
        let key = (event.kind.attribute_kind(), event.attribute);
        let mut ran = 0;
        if let Some(handlers) = self.handlers.get_mut(&key) {
            for handler in handlers.iter_mut() {
                handler(event);
                ran += 1;
            }
        }
        for handler in self.catch_all.iter_mut() {
            handler(event);
            ran += 1;
        }
        if ran == 0 {
            log::trace!("No handler for {:?} attribute {}", key.0, key.1);
        }
        ran
    }
}
