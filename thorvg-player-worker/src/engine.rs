//! Boundary to the rendering engine.
//!
//! The engine decodes animations and paints them; this crate only routes
//! protocol traffic to it. Push notifications flow back through a
//! [`PushEmitter`] the engine keeps from construction.

use serde_json::Value;
use std::rc::Rc;
use thorvg_player_core::{
    AnimationSource, CreateConfig, FileType, InstanceStateSnapshot, PushKind, PushNotification,
    Transfer, WorkerToMain,
};

/// Where encoded worker messages go (the worker's `postMessage`).
pub trait Outbox {
    fn post(&self, message: String);
}

/// Per-instance commands, everything except construction, teardown and state queries.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineCommand {
    Load {
        src: AnimationSource,
        file_type: FileType,
    },
    Play,
    Pause,
    Stop,
    Seek(f64),
    Resize {
        width: u32,
        height: u32,
    },
    SetSpeed(f64),
    SetDirection(i8),
    SetBgColor(String),
    SetLooping(bool),
    Freeze,
    Unfreeze,
}

/// The rendering engine as seen by [`crate::WorkerHost`].
///
/// Errors are plain strings: they are forwarded verbatim in the reply's
/// `error` field.
pub trait Engine {
    fn set_wasm_url(&mut self, _url: &str) {}

    fn create(
        &mut self,
        instance_id: &str,
        config: &CreateConfig,
        width: u32,
        height: u32,
        surface: Option<Transfer>,
    ) -> Result<(), String>;

    fn apply(&mut self, instance_id: &str, command: EngineCommand) -> Result<(), String>;

    fn state(&self, instance_id: &str) -> Option<InstanceStateSnapshot>;

    fn destroy(&mut self, instance_id: &str) -> Result<(), String>;
}

/// Sends push notifications for the engine.
#[derive(Clone)]
pub struct PushEmitter {
    outbox: Rc<dyn Outbox>,
}

impl PushEmitter {
    pub fn new(outbox: Rc<dyn Outbox>) -> Self {
        Self { outbox }
    }

    pub fn emit(&self, instance_id: &str, kind: PushKind, event: Value) {
        let push = WorkerToMain::Push(PushNotification::new(kind, instance_id, event));
        match push.to_json() {
            Ok(message) => self.outbox.post(message),
            Err(e) => log::error!("Failed to encode {} for {}: {}", kind, instance_id, e),
        }
    }
}
