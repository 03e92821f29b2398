//! Typed event handler registry.
//!
//! Handlers are keyed by [`EventKind`] rather than by event-name strings, so
//! registering for an event the server can never send is a compile error, not
//! a silent no-op.

use std::collections::HashMap;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

use formpulse_shared::protocol::{EventKind, ServerEvent};

type Handler = Arc<dyn Fn(&ServerEvent) + Send + Sync>;

/// Registered handlers for inbound server events.
///
/// Cheap to clone; clones share the same handler table.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<Mutex<HashMap<EventKind, Vec<(u64, Handler)>>>>,
    next_id: Arc<AtomicU64>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind and hand back its subscription.
    pub fn on(
        &self,
        kind: EventKind,
        handler: impl Fn(&ServerEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .lock()
            .expect("handler registry lock poisoned")
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        Subscription {
            registry: self.clone(),
            kind,
            id,
        }
    }

    /// Drop every handler registered for the given kind.
    pub fn clear(&self, kind: EventKind) {
        self.handlers
            .lock()
            .expect("handler registry lock poisoned")
            .remove(&kind);
    }

    /// Drop all handlers for all kinds.
    pub fn clear_all(&self) {
        for kind in EventKind::ALL {
            self.clear(kind);
        }
    }

    /// Run every handler registered for the event's kind.
    ///
    /// Handlers run on a snapshot taken under the lock, so a handler may
    /// register or unsubscribe without deadlocking.
    pub fn dispatch(&self, event: &ServerEvent) {
        let snapshot: Vec<Handler> = {
            let handlers = self
                .handlers
                .lock()
                .expect("handler registry lock poisoned");
            handlers
                .get(&event.kind())
                .map(|list| list.iter().map(|(_, h)| h.clone()).collect())
                .unwrap_or_default()
        };
        for handler in snapshot {
            handler(event);
        }
    }

    fn remove(&self, kind: EventKind, id: u64) {
        let mut handlers = self
            .handlers
            .lock()
            .expect("handler registry lock poisoned");
        if let Some(list) = handlers.get_mut(&kind) {
            list.retain(|(handler_id, _)| *handler_id != id);
            if list.is_empty() {
                handlers.remove(&kind);
            }
        }
    }
}

/// Handle to one registered handler.
pub struct Subscription {
    registry: HandlerRegistry,
    kind: EventKind,
    id: u64,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Remove exactly this handler; others on the same kind stay registered.
    pub fn unsubscribe(self) {
        self.registry.remove(self.kind, self.id);
    }
}
