//! Player error types.

use thiserror::Error;
use thorvg_player_core::{ProtocolError, RpcMethod};

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Worker not initialized: {worker_id}")]
    WorkerNotInitialized { worker_id: String },

    #[error("Canvas not found")]
    SurfaceUnavailable,

    #[error("Instance ID mismatch: expected {expected}, worker returned {actual}")]
    InstanceIdMismatch { expected: String, actual: String },

    #[error("Instance {instance_id} is already assigned to worker {assigned}, not {requested}")]
    Assignment {
        instance_id: String,
        assigned: String,
        requested: String,
    },

    #[error("Instance {instance_id} already exists")]
    DuplicateInstance { instance_id: String },

    #[error("Failed to execute method {method}: {message}")]
    Rpc { method: RpcMethod, message: String },

    #[error("Worker {worker_id} transport failed: {message}")]
    Transport { worker_id: String, message: String },

    #[error("Invalid {method} result: {source}")]
    Protocol {
        method: RpcMethod,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode request: {0}")]
    Encode(#[from] ProtocolError),

    #[error("Worker {worker_id} went away before answering {method}")]
    Disconnected { worker_id: String, method: RpcMethod },
}
