//! Host input events and scoped listener registration.
//!
//! A visualizer registers interest through [`EventHub::subscribe`] and holds
//! the returned [`Subscription`]. Dropping the guard unregisters it, so a
//! destroyed visualizer can never be handed another event.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    Resize { width: f32, height: f32 },
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp,
    /// Positive `delta` moves the camera away.
    Wheel { delta: f32 },
    PinchStart { distance: f32 },
    Pinch { distance: f32 },
    PinchEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    Resize,
    Pointer,
    Wheel,
    Touch,
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InputEvent::Resize { .. } => EventKind::Resize,
            InputEvent::PointerDown { .. } | InputEvent::PointerMove { .. } | InputEvent::PointerUp => {
                EventKind::Pointer
            }
            InputEvent::Wheel { .. } => EventKind::Wheel,
            InputEvent::PinchStart { .. } | InputEvent::Pinch { .. } | InputEvent::PinchEnd => {
                EventKind::Touch
            }
        }
    }
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    listeners: BTreeMap<u64, EventKind>,
}

/// Single-threaded registry of live listeners.
#[derive(Debug, Clone, Default)]
pub struct EventHub {
    registry: Rc<RefCell<Registry>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, kind: EventKind) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.listeners.insert(id, kind);
        Subscription {
            id,
            kind,
            registry: Rc::downgrade(&self.registry),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }

    pub fn has_listener(&self, kind: EventKind) -> bool {
        self.registry
            .borrow()
            .listeners
            .values()
            .any(|registered| *registered == kind)
    }
}

/// Registration guard; unregisters on drop.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    kind: EventKind,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .map(|registry| registry.borrow().listeners.contains_key(&self.id))
            .unwrap_or(false)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().listeners.remove(&self.id);
        }
    }
}
