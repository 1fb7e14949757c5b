//! Notification fan-out.
//!
//! The registry hands one [`RegistryEvent`] per successful write call to its
//! [`EventLog`], after the state change and its audit trail entry have been
//! stored. Nothing here can fail or block the registry: implementations
//! record or forward the event and return. The durable, queryable trail
//! lives in the store.

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use verileaf_types::RegistryEvent;

/// Sink for registry notifications.
pub trait EventLog {
    fn append(&self, event: &RegistryEvent);
}

impl<T: EventLog + ?Sized> EventLog for Arc<T> {
    fn append(&self, event: &RegistryEvent) {
        (**self).append(event)
    }
}

impl<T: EventLog + ?Sized> EventLog for &T {
    fn append(&self, event: &RegistryEvent) {
        (**self).append(event)
    }
}

/// An audit trail entry together with its sequence number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoggedEvent {
    pub sequence: u64,
    #[serde(flatten)]
    pub event: RegistryEvent,
}

/// Records notifications in memory, in arrival order.
#[derive(Default)]
pub struct MemoryEventLog {
    events: RwLock<Vec<RegistryEvent>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All recorded events, oldest first.
    pub fn events(&self) -> Vec<RegistryEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventLog for MemoryEventLog {
    fn append(&self, event: &RegistryEvent) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Synchronous fan-out of registry events to subscribed listeners.
///
/// Listeners run inline on the writing call; keep them fast.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&RegistryEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&RegistryEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    /// Forward every event into another log.
    pub fn forward_to<L: EventLog + Send + Sync + 'static>(&mut self, log: Arc<L>) {
        self.subscribe(Box::new(move |event| log.append(event)));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl EventLog for EventBus {
    fn append(&self, event: &RegistryEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}
