//! Wire protocol between the main thread and a player worker.
//!
//! Requests travel as `{"id", "method", "params"}`. The worker answers with
//! either a reply (`{"id", "result"}` or `{"id", "error"}`) or, at any time, an
//! unsolicited push notification (`{"method", "result": {"instanceId",
//! "event"}}`). Replies and pushes share one shape and are told apart by the
//! presence of `id`.

use crate::{CreateConfig, FileType, InstanceStateSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request has no id")]
    MissingId,

    #[error("Push notification has no method")]
    MissingMethod,

    #[error("Push notification has no result")]
    MissingResult,

    #[error("Unknown push method: {0}")]
    UnknownPushMethod(String),
}

/// Every method a worker accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RpcMethod {
    Create,
    Load,
    Play,
    Pause,
    Stop,
    Seek,
    Resize,
    SetSpeed,
    SetDirection,
    SetBgColor,
    SetLooping,
    Freeze,
    Unfreeze,
    Destroy,
    GetInstanceState,
    SetWasmUrl,
}

impl RpcMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            RpcMethod::Create => "create",
            RpcMethod::Load => "load",
            RpcMethod::Play => "play",
            RpcMethod::Pause => "pause",
            RpcMethod::Stop => "stop",
            RpcMethod::Seek => "seek",
            RpcMethod::Resize => "resize",
            RpcMethod::SetSpeed => "setSpeed",
            RpcMethod::SetDirection => "setDirection",
            RpcMethod::SetBgColor => "setBgColor",
            RpcMethod::SetLooping => "setLooping",
            RpcMethod::Freeze => "freeze",
            RpcMethod::Unfreeze => "unfreeze",
            RpcMethod::Destroy => "destroy",
            RpcMethod::GetInstanceState => "getInstanceState",
            RpcMethod::SetWasmUrl => "setWasmUrl",
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Animation data handed to `load`: a URL or raw text, or an inline JSON document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnimationSource {
    Text(String),
    Data(Value),
}

impl From<&str> for AnimationSource {
    fn from(text: &str) -> Self {
        AnimationSource::Text(text.to_string())
    }
}

impl From<String> for AnimationSource {
    fn from(text: String) -> Self {
        AnimationSource::Text(text)
    }
}

impl From<Value> for AnimationSource {
    fn from(data: Value) -> Self {
        AnimationSource::Data(data)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceParams {
    pub instance_id: String,
}

impl InstanceParams {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParams {
    pub instance_id: String,
    pub config: CreateConfig,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadParams {
    pub instance_id: String,
    pub src: AnimationSource,
    pub file_type: FileType,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeekParams {
    pub instance_id: String,
    pub frame: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeParams {
    pub instance_id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedParams {
    pub instance_id: String,
    pub speed: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionParams {
    pub instance_id: String,
    pub direction: i8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BgColorParams {
    pub instance_id: String,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopingParams {
    pub instance_id: String,
    pub value: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasmUrlParams {
    pub url: String,
}

/// A method together with its parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum RpcCall {
    Create(CreateParams),
    Load(LoadParams),
    Play(InstanceParams),
    Pause(InstanceParams),
    Stop(InstanceParams),
    Seek(SeekParams),
    Resize(ResizeParams),
    SetSpeed(SpeedParams),
    SetDirection(DirectionParams),
    SetBgColor(BgColorParams),
    SetLooping(LoopingParams),
    Freeze(InstanceParams),
    Unfreeze(InstanceParams),
    Destroy(InstanceParams),
    GetInstanceState(InstanceParams),
    SetWasmUrl(WasmUrlParams),
}

impl RpcCall {
    pub fn method(&self) -> RpcMethod {
        match self {
            RpcCall::Create(_) => RpcMethod::Create,
            RpcCall::Load(_) => RpcMethod::Load,
            RpcCall::Play(_) => RpcMethod::Play,
            RpcCall::Pause(_) => RpcMethod::Pause,
            RpcCall::Stop(_) => RpcMethod::Stop,
            RpcCall::Seek(_) => RpcMethod::Seek,
            RpcCall::Resize(_) => RpcMethod::Resize,
            RpcCall::SetSpeed(_) => RpcMethod::SetSpeed,
            RpcCall::SetDirection(_) => RpcMethod::SetDirection,
            RpcCall::SetBgColor(_) => RpcMethod::SetBgColor,
            RpcCall::SetLooping(_) => RpcMethod::SetLooping,
            RpcCall::Freeze(_) => RpcMethod::Freeze,
            RpcCall::Unfreeze(_) => RpcMethod::Unfreeze,
            RpcCall::Destroy(_) => RpcMethod::Destroy,
            RpcCall::GetInstanceState(_) => RpcMethod::GetInstanceState,
            RpcCall::SetWasmUrl(_) => RpcMethod::SetWasmUrl,
        }
    }

    /// Target instance, `None` for global configuration calls.
    pub fn instance_id(&self) -> Option<&str> {
        match self {
            RpcCall::Create(p) => Some(&p.instance_id),
            RpcCall::Load(p) => Some(&p.instance_id),
            RpcCall::Play(p)
            | RpcCall::Pause(p)
            | RpcCall::Stop(p)
            | RpcCall::Freeze(p)
            | RpcCall::Unfreeze(p)
            | RpcCall::Destroy(p)
            | RpcCall::GetInstanceState(p) => Some(&p.instance_id),
            RpcCall::Seek(p) => Some(&p.instance_id),
            RpcCall::Resize(p) => Some(&p.instance_id),
            RpcCall::SetSpeed(p) => Some(&p.instance_id),
            RpcCall::SetDirection(p) => Some(&p.instance_id),
            RpcCall::SetBgColor(p) => Some(&p.instance_id),
            RpcCall::SetLooping(p) => Some(&p.instance_id),
            RpcCall::SetWasmUrl(_) => None,
        }
    }
}

/// One correlated request.
#[derive(Clone, Debug, PartialEq)]
pub struct RpcRequest {
    pub id: String,
    pub call: RpcCall,
}

impl RpcRequest {
    pub fn new(id: impl Into<String>, call: RpcCall) -> Self {
        Self {
            id: id.into(),
            call,
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        let mut value = serde_json::to_value(&self.call)?;
        if let Value::Object(fields) = &mut value {
            fields.insert("id".to_string(), Value::String(self.id.clone()));
        }
        Ok(serde_json::to_string(&value)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let mut value: Value = serde_json::from_str(text)?;
        let id = match value.as_object_mut().and_then(|fields| fields.remove("id")) {
            Some(Value::String(id)) if !id.is_empty() => id,
            _ => return Err(ProtocolError::MissingId),
        };
        let call = serde_json::from_value(value)?;
        Ok(Self { id, call })
    }
}

/// Result of `create`: the worker echoes the id it registered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResult {
    pub instance_id: String,
}

/// Result of `getInstanceState`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateResult {
    pub state: InstanceStateSnapshot,
}

/// Kinds of unsolicited worker notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PushKind {
    #[serde(rename = "onReady")]
    Ready,
    #[serde(rename = "onLoad")]
    Load,
    #[serde(rename = "onPlay")]
    Play,
    #[serde(rename = "onPause")]
    Pause,
    #[serde(rename = "onStop")]
    Stop,
    #[serde(rename = "onComplete")]
    Complete,
    #[serde(rename = "onFrame")]
    Frame,
    #[serde(rename = "onError")]
    Error,
    #[serde(rename = "onFreeze")]
    Freeze,
    #[serde(rename = "onUnfreeze")]
    Unfreeze,
}

impl PushKind {
    pub const ALL: [PushKind; 10] = [
        PushKind::Ready,
        PushKind::Load,
        PushKind::Play,
        PushKind::Pause,
        PushKind::Stop,
        PushKind::Complete,
        PushKind::Frame,
        PushKind::Error,
        PushKind::Freeze,
        PushKind::Unfreeze,
    ];

    pub fn method_name(self) -> &'static str {
        match self {
            PushKind::Ready => "onReady",
            PushKind::Load => "onLoad",
            PushKind::Play => "onPlay",
            PushKind::Pause => "onPause",
            PushKind::Stop => "onStop",
            PushKind::Complete => "onComplete",
            PushKind::Frame => "onFrame",
            PushKind::Error => "onError",
            PushKind::Freeze => "onFreeze",
            PushKind::Unfreeze => "onUnfreeze",
        }
    }

    pub fn from_method(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.method_name() == name)
    }
}

impl fmt::Display for PushKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// An unsolicited notification about one instance.
#[derive(Clone, Debug, PartialEq)]
pub struct PushNotification {
    pub kind: PushKind,
    pub instance_id: String,
    pub event: Value,
}

impl PushNotification {
    pub fn new(kind: PushKind, instance_id: impl Into<String>, event: Value) -> Self {
        Self {
            kind,
            instance_id: instance_id.into(),
            event,
        }
    }

    /// `event.currentFrame`, carried by frame notifications.
    pub fn current_frame(&self) -> Option<f64> {
        self.event.get("currentFrame").and_then(Value::as_f64)
    }
}

/// Answer to one request.
#[derive(Clone, Debug, PartialEq)]
pub struct RpcReply {
    pub id: String,
    /// Result value, or the error string reported by the worker.
    pub outcome: Result<Value, String>,
}

/// Messages sent from worker to main thread.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkerToMain {
    Reply(RpcReply),
    Push(PushNotification),
}

#[derive(Default, Serialize, Deserialize)]
struct RawResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushPayload {
    instance_id: String,
    #[serde(default)]
    event: Value,
}

impl WorkerToMain {
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let raw: RawResponse = serde_json::from_str(text)?;

        match raw.id.filter(|id| !id.is_empty()) {
            Some(id) => {
                let outcome = match raw.error.filter(|error| !error.is_empty()) {
                    Some(error) => Err(error),
                    None => Ok(raw.result.unwrap_or(Value::Null)),
                };
                Ok(WorkerToMain::Reply(RpcReply { id, outcome }))
            }
            None => {
                let method = raw.method.ok_or(ProtocolError::MissingMethod)?;
                let kind = PushKind::from_method(&method)
                    .ok_or(ProtocolError::UnknownPushMethod(method))?;
                let payload: PushPayload =
                    serde_json::from_value(raw.result.ok_or(ProtocolError::MissingResult)?)?;
                Ok(WorkerToMain::Push(PushNotification {
                    kind,
                    instance_id: payload.instance_id,
                    event: payload.event,
                }))
            }
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        let raw = match self {
            WorkerToMain::Reply(reply) => match &reply.outcome {
                Ok(result) => RawResponse {
                    id: Some(reply.id.clone()),
                    result: Some(result.clone()),
                    ..RawResponse::default()
                },
                Err(error) => RawResponse {
                    id: Some(reply.id.clone()),
                    error: Some(error.clone()),
                    ..RawResponse::default()
                },
            },
            WorkerToMain::Push(push) => RawResponse {
                method: Some(push.kind.method_name().to_string()),
                result: Some(serde_json::to_value(PushPayload {
                    instance_id: push.instance_id.clone(),
                    event: push.event.clone(),
                })?),
                ..RawResponse::default()
            },
        };
        Ok(serde_json::to_string(&raw)?)
    }
}
