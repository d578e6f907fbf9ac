//! Transport seam between the pool and a concrete worker.
//!
//! A channel carries JSON text in both directions, plus at most one
//! transferable resource per outbound request. The browser implementation
//! lives in [`crate::workers::web_worker`].

use crate::PlayerError;
use std::rc::Rc;
use thorvg_player_core::Transfer;

/// Receives every raw inbound message of one worker.
pub type InboundHandler = Rc<dyn Fn(String)>;

pub struct OutboundMessage {
    /// Encoded [`thorvg_player_core::RpcRequest`]
    pub request: String,
    pub transfer: Option<Transfer>,
}

pub trait WorkerChannel {
    fn post(&self, message: OutboundMessage) -> Result<(), PlayerError>;

    fn set_on_message(&self, handler: InboundHandler);

    fn terminate(&self) {}
}

/// Starts the worker behind a pool slot.
pub trait WorkerSpawner {
    fn spawn(&self, worker_id: &str) -> Result<Box<dyn WorkerChannel>, PlayerError>;
}

impl<T: WorkerChannel + ?Sized> WorkerChannel for Rc<T> {
    fn post(&self, message: OutboundMessage) -> Result<(), PlayerError> {
        (**self).post(message)
    }

    fn set_on_message(&self, handler: InboundHandler) {
        (**self).set_on_message(handler)
    }

    fn terminate(&self) {
        (**self).terminate()
    }
}

impl<T: WorkerSpawner + ?Sized> WorkerSpawner for Rc<T> {
    fn spawn(&self, worker_id: &str) -> Result<Box<dyn WorkerChannel>, PlayerError> {
        (**self).spawn(worker_id)
    }
}
