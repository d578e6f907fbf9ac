//! Routing of push notifications to the instances that own them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use thorvg_player_core::{PushKind, PushNotification};

/// Receives the push notifications addressed to one instance.
pub(crate) trait PushSink {
    fn on_push(self: Rc<Self>, push: PushNotification);
}

/// How an instance reacts to a push notification.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum PushAction {
    /// Round-trip `getInstanceState`, then notify listeners.
    Refresh,
    /// Overwrite only the cached frame, then notify listeners.
    UpdateFrame(f64),
    /// Notify listeners without touching the mirror.
    NotifyOnly,
}

pub(crate) fn plan(push: &PushNotification) -> PushAction {
    match push.kind {
        PushKind::Frame => match push.current_frame() {
            Some(frame) => PushAction::UpdateFrame(frame),
            None => PushAction::NotifyOnly,
        },
        PushKind::Ready
        | PushKind::Load
        | PushKind::Play
        | PushKind::Pause
        | PushKind::Stop
        | PushKind::Complete
        | PushKind::Error
        | PushKind::Freeze
        | PushKind::Unfreeze => PushAction::Refresh,
    }
}

/// Instance id to sink, per worker. Sinks are held weakly: a dropped
/// instance stops receiving notifications even before it unregisters.
#[derive(Default)]
pub(crate) struct PushRoutes {
    routes: RefCell<HashMap<String, Weak<dyn PushSink>>>,
}

impl PushRoutes {
    pub fn register(&self, instance_id: &str, sink: Weak<dyn PushSink>) {
        self.routes
            .borrow_mut()
            .insert(instance_id.to_string(), sink);
    }

    pub fn unregister(&self, instance_id: &str) -> bool {
        self.routes.borrow_mut().remove(instance_id).is_some()
    }

    /// Deliver `push` to its instance. Notifications for unknown or dropped
    /// instances are discarded.
    pub fn dispatch(&self, push: PushNotification) -> bool {
        let sink = self
            .routes
            .borrow()
            .get(&push.instance_id)
            .and_then(Weak::upgrade);

        match sink {
            Some(sink) => {
                sink.on_push(push);
                true
            }
            None => {
                log::trace!(
                    "Dropping {} for unknown instance {}",
                    push.kind,
                    push.instance_id
                );
                false
            }
        }
    }

    pub fn clear(&self) {
        self.routes.borrow_mut().clear();
    }
}
