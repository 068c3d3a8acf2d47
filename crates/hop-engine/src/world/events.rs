//! Named event listeners plus a per-frame queue the host can drain.

use std::collections::HashMap;
use std::fmt;

use crate::api::types::WorldEvent;

/// Listener key that receives every event.
pub const ANY_EVENT: &str = "*";

type Listener = Box<dyn FnMut(&WorldEvent)>;

/// Synchronous event dispatch. Listeners run in registration order.
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<String, Vec<Listener>>,
    queue: Vec<WorldEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for events whose `name()` is `event`, or for
    /// all events with [`ANY_EVENT`].
    pub fn on(&mut self, event: impl Into<String>, callback: impl FnMut(&WorldEvent) + 'static) {
        self.listeners.entry(event.into()).or_default().push(Box::new(callback));
    }

    /// Drop every listener for `event`.
    pub fn off(&mut self, event: &str) {
        self.listeners.remove(event);
    }

    /// Call listeners now and queue the event for `drain`.
    pub fn emit(&mut self, event: WorldEvent) {
        let name = event.name();
        for key in [name, ANY_EVENT] {
            if let Some(list) = self.listeners.get_mut(key) {
                for listener in list.iter_mut() {
                    listener(&event);
                }
            }
        }
        self.queue.push(event);
    }

    /// Events emitted since the last drain, oldest first.
    pub fn drain(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.queue)
    }

    pub fn pending(&self) -> &[WorldEvent] {
        &self.queue
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.listeners.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("EventBus")
            .field("listeners", &names)
            .field("queued", &self.queue.len())
            .finish()
    }
}
