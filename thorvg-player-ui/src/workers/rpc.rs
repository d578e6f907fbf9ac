//! Correlated request/response calls over a worker channel.

use crate::workers::channel::OutboundMessage;
use crate::workers::pool::WorkerPool;
use crate::PlayerError;
use futures::channel::oneshot;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::rc::Rc;
use thorvg_player_core::{ids, RpcCall, RpcRequest, Transfer, WasmUrlParams};

/// Sends calls to pooled workers and awaits their replies.
///
/// Each call gets a fresh id; the reply carrying that id completes it, in
/// whatever order replies arrive.
#[derive(Clone)]
pub struct RpcClient {
    pool: Rc<WorkerPool>,
}

impl RpcClient {
    pub fn new(pool: Rc<WorkerPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Rc<WorkerPool> {
        &self.pool
    }

    pub async fn call(
        &self,
        worker_id: &str,
        call: RpcCall,
        transfer: Option<Transfer>,
    ) -> Result<Value, PlayerError> {
        self.call_with_id(worker_id, ids::request_id(), call, transfer)
            .await
    }

    /// Like [`call`](Self::call), decoding the result into `R`.
    pub async fn call_typed<R: DeserializeOwned>(
        &self,
        worker_id: &str,
        call: RpcCall,
        transfer: Option<Transfer>,
    ) -> Result<R, PlayerError> {
        let method = call.method();
        let value = self.call(worker_id, call, transfer).await?;
        serde_json::from_value(value).map_err(|source| PlayerError::Protocol { method, source })
    }

    /// Send a call without awaiting it.
    ///
    /// The call is still tracked so its reply is consumed; a failure reported
    /// by the worker is only logged.
    pub fn notify(&self, worker_id: &str, call: RpcCall) -> Result<(), PlayerError> {
        let receiver = self.send(worker_id, ids::request_id(), call, None)?;
        drop(receiver);
        Ok(())
    }

    /// Point the worker's engine at its wasm binary, spawning the worker if needed.
    pub async fn set_wasm_url(&self, worker_id: &str, url: &str) -> Result<(), PlayerError> {
        self.pool.get_worker(worker_id)?;
        let call = RpcCall::SetWasmUrl(WasmUrlParams {
            url: url.to_string(),
        });
        self.call_with_id(worker_id, ids::wasm_url_request_id(), call, None)
            .await?;
        Ok(())
    }

    async fn call_with_id(
        &self,
        worker_id: &str,
        id: String,
        call: RpcCall,
        transfer: Option<Transfer>,
    ) -> Result<Value, PlayerError> {
        let method = call.method();
        let receiver = self.send(worker_id, id, call, transfer)?;

        // The worker handle is not held while waiting, so decommissioning
        // the worker cancels the receiver.
        match receiver.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(PlayerError::Rpc { method, message }),
            Err(oneshot::Canceled) => Err(PlayerError::Disconnected {
                worker_id: worker_id.to_string(),
                method,
            }),
        }
    }

    fn send(
        &self,
        worker_id: &str,
        id: String,
        call: RpcCall,
        transfer: Option<Transfer>,
    ) -> Result<oneshot::Receiver<Result<Value, String>>, PlayerError> {
        let worker = self
            .pool
            .worker(worker_id)
            .ok_or_else(|| PlayerError::WorkerNotInitialized {
                worker_id: worker_id.to_string(),
            })?;

        let method = call.method();
        let request = RpcRequest::new(id, call);
        let text = request.to_json()?;

        let receiver = worker.pending().register(&request.id, method);
        log::trace!("-> {} {} ({})", worker_id, method, request.id);

        if let Err(e) = worker.post(OutboundMessage {
            request: text,
            transfer,
        }) {
            worker.pending().cancel(&request.id);
            return Err(e);
        }
        Ok(receiver)
    }
}
