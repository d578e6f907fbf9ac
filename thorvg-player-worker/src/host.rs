//! Worker-side request handling.
//!
//! [`WorkerHost`] decodes one request at a time, in arrival order, and posts
//! exactly one reply per decodable request. It owns the instance registry:
//! `create` echoes the registered id, duplicate creates and calls on unknown
//! instances are answered with an error before the engine sees them.

use crate::engine::{Engine, EngineCommand, Outbox};
use serde_json::Value;
use std::collections::HashSet;
use std::rc::Rc;
use thiserror::Error;
use thorvg_player_core::{
    CreateResult, ProtocolError, RpcCall, RpcReply, RpcRequest, StateResult, Transfer,
    WorkerToMain,
};

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Undecodable request: {0}")]
    Protocol(#[from] ProtocolError),
}

pub struct WorkerHost<E: Engine> {
    engine: E,
    outbox: Rc<dyn Outbox>,
    instances: HashSet<String>,
    wasm_url: Option<String>,
}

impl<E: Engine> WorkerHost<E> {
    pub fn new(outbox: Rc<dyn Outbox>, engine: E) -> Self {
        Self {
            engine,
            outbox,
            instances: HashSet::new(),
            wasm_url: None,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn wasm_url(&self) -> Option<&str> {
        self.wasm_url.as_deref()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn has_instance(&self, instance_id: &str) -> bool {
        self.instances.contains(instance_id)
    }

    /// Handle one request and post its reply.
    ///
    /// A request that cannot be decoded has no id to answer, so it is
    /// reported to the caller instead.
    pub fn handle_message(
        &mut self,
        request_json: &str,
        surface: Option<Transfer>,
    ) -> Result<(), HostError> {
        let request = RpcRequest::from_json(request_json)?;
        let method = request.call.method();
        log::debug!("Worker received {} ({})", method, request.id);

        let outcome = self.process(request.call, surface);
        if let Err(error) = &outcome {
            log::warn!("Method {} failed: {}", method, error);
        }

        let reply = WorkerToMain::Reply(RpcReply {
            id: request.id,
            outcome,
        });
        self.outbox.post(reply.to_json()?);
        Ok(())
    }

    fn process(&mut self, call: RpcCall, surface: Option<Transfer>) -> Result<Value, String> {
        let (instance_id, command) = match call {
            RpcCall::SetWasmUrl(params) => {
                self.engine.set_wasm_url(&params.url);
                self.wasm_url = Some(params.url);
                return Ok(Value::Null);
            }
            RpcCall::Create(params) => {
                if self.instances.contains(&params.instance_id) {
                    return Err(format!("Instance {} already exists", params.instance_id));
                }
                self.engine.create(
                    &params.instance_id,
                    &params.config,
                    params.width,
                    params.height,
                    surface,
                )?;
                self.instances.insert(params.instance_id.clone());
                return encode(CreateResult {
                    instance_id: params.instance_id,
                });
            }
            RpcCall::GetInstanceState(params) => {
                self.ensure_known(&params.instance_id)?;
                let state = self
                    .engine
                    .state(&params.instance_id)
                    .ok_or_else(|| format!("No state for instance {}", params.instance_id))?;
                return encode(StateResult { state });
            }
            RpcCall::Destroy(params) => {
                self.ensure_known(&params.instance_id)?;
                self.engine.destroy(&params.instance_id)?;
                self.instances.remove(&params.instance_id);
                return Ok(Value::Null);
            }
            RpcCall::Load(params) => (
                params.instance_id,
                EngineCommand::Load {
                    src: params.src,
                    file_type: params.file_type,
                },
            ),
            RpcCall::Play(params) => (params.instance_id, EngineCommand::Play),
            RpcCall::Pause(params) => (params.instance_id, EngineCommand::Pause),
            RpcCall::Stop(params) => (params.instance_id, EngineCommand::Stop),
            RpcCall::Seek(params) => (params.instance_id, EngineCommand::Seek(params.frame)),
            RpcCall::Resize(params) => (
                params.instance_id,
                EngineCommand::Resize {
                    width: params.width,
                    height: params.height,
                },
            ),
            RpcCall::SetSpeed(params) => (params.instance_id, EngineCommand::SetSpeed(params.speed)),
            RpcCall::SetDirection(params) => (
                params.instance_id,
                EngineCommand::SetDirection(params.direction),
            ),
            RpcCall::SetBgColor(params) => {
                (params.instance_id, EngineCommand::SetBgColor(params.color))
            }
            RpcCall::SetLooping(params) => {
                (params.instance_id, EngineCommand::SetLooping(params.value))
            }
            RpcCall::Freeze(params) => (params.instance_id, EngineCommand::Freeze),
            RpcCall::Unfreeze(params) => (params.instance_id, EngineCommand::Unfreeze),
        };

        self.ensure_known(&instance_id)?;
        self.engine.apply(&instance_id, command)?;
        Ok(Value::Null)
    }

    fn ensure_known(&self, instance_id: &str) -> Result<(), String> {
        if self.instances.contains(instance_id) {
            Ok(())
        } else {
            Err(format!("Instance {} not found", instance_id))
        }
    }
}

fn encode<T: serde::Serialize>(result: T) -> Result<Value, String> {
    serde_json::to_value(result).map_err(|e| format!("Failed to encode result: {}", e))
}
