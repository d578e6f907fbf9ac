//! Per-instance event listeners.

use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use thorvg_player_core::{PushKind, PushNotification};

/// Events a listener can subscribe to; one per push notification kind.
pub type EventType = PushKind;

/// Event delivered to listeners, after the instance mirror was updated.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerEvent {
    pub kind: EventType,
    pub instance_id: String,
    /// `event` payload of the push notification
    pub payload: Value,
}

impl PlayerEvent {
    pub fn current_frame(&self) -> Option<f64> {
        self.payload.get("currentFrame").and_then(Value::as_f64)
    }
}

impl From<PushNotification> for PlayerEvent {
    fn from(push: PushNotification) -> Self {
        Self {
            kind: push.kind,
            instance_id: push.instance_id,
            payload: push.event,
        }
    }
}

/// Handle returned by `add_event_listener`, used to remove that listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&PlayerEvent)>;

#[derive(Default)]
pub struct EventManager {
    listeners: RefCell<HashMap<EventType, Vec<(ListenerId, Listener)>>>,
    next_id: Cell<u64>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event_listener<F>(&self, kind: EventType, listener: F) -> ListenerId
    where
        F: Fn(&PlayerEvent) + 'static,
    {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push((id, Rc::new(listener)));
        id
    }

    /// Remove one listener, or every listener of `kind` when `id` is `None`.
    pub fn remove_event_listener(&self, kind: EventType, id: Option<ListenerId>) {
        let mut listeners = self.listeners.borrow_mut();
        match id {
            Some(id) => {
                if let Some(list) = listeners.get_mut(&kind) {
                    list.retain(|(existing, _)| *existing != id);
                    if list.is_empty() {
                        listeners.remove(&kind);
                    }
                }
            }
            None => {
                listeners.remove(&kind);
            }
        }
    }

    pub fn remove_all_event_listeners(&self) {
        self.listeners.borrow_mut().clear();
    }

    pub fn listener_count(&self, kind: EventType) -> usize {
        self.listeners.borrow().get(&kind).map_or(0, Vec::len)
    }

    /// Call every listener of `event.kind` in registration order.
    ///
    /// A panicking listener is logged and does not stop the others.
    /// Listeners may add or remove listeners; changes apply to the next event.
    pub fn dispatch(&self, event: &PlayerEvent) {
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .get(&event.kind)
            .map(|list| list.iter().map(|(_, l)| Rc::clone(l)).collect())
            .unwrap_or_default();

        for listener in listeners {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                log::error!(
                    "Listener for {} on {} panicked",
                    event.kind,
                    event.instance_id
                );
            }
        }
    }
}
