use futures::channel::oneshot;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use thorvg_player_core::{RpcMethod, RpcReply};

/// Worker-reported outcome of one call.
pub(crate) type CallOutcome = Result<Value, String>;

struct PendingCall {
    method: RpcMethod,
    sender: oneshot::Sender<CallOutcome>,
}

/// Calls awaiting a reply from one worker, keyed by request id.
///
/// Removing an entry is what resolves it, so a second reply with the same id
/// finds nothing and is dropped.
#[derive(Default)]
pub(crate) struct PendingCallTable {
    calls: RefCell<HashMap<String, PendingCall>>,
}

impl PendingCallTable {
    pub fn register(&self, id: &str, method: RpcMethod) -> oneshot::Receiver<CallOutcome> {
        let (sender, receiver) = oneshot::channel();
        let replaced = self
            .calls
            .borrow_mut()
            .insert(id.to_string(), PendingCall { method, sender });
        if let Some(previous) = replaced {
            log::error!(
                "Request id {} reused while {} was pending",
                id,
                previous.method
            );
        }
        receiver
    }

    /// Resolve the matching call. Returns false when no call was waiting for `reply.id`.
    pub fn resolve(&self, reply: RpcReply) -> bool {
        let call = self.calls.borrow_mut().remove(&reply.id);
        let Some(call) = call else {
            return false;
        };

        if let Err(Err(message)) = call.sender.send(reply.outcome) {
            // Nobody awaits fire-and-forget calls.
            log::debug!("Unobserved {} ({}) failed: {}", call.method, reply.id, message);
        }
        true
    }

    /// Forget a call without resolving it; its receiver observes cancellation.
    pub fn cancel(&self, id: &str) -> bool {
        self.calls.borrow_mut().remove(id).is_some()
    }

    /// Drop every pending call; their receivers observe cancellation.
    pub fn clear(&self) -> usize {
        let drained: Vec<PendingCall> = self.calls.borrow_mut().drain().map(|(_, c)| c).collect();
        drained.len()
    }

    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    #[cfg(test)]
    pub fn contains(&self, id: &str) -> bool {
        self.calls.borrow().contains_key(id)
    }
}
