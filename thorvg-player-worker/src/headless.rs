//! Engine that tracks playback without painting anything.
//!
//! Useful wherever a real renderer is unavailable: native test suites and
//! server-side protocol checks. It follows the lifecycle the browser engine
//! reports, including the push notifications it emits.

use crate::engine::{Engine, EngineCommand, PushEmitter};
use serde_json::{json, Value};
use std::collections::HashMap;
use thorvg_player_core::{
    AnimationSource, CreateConfig, InstanceStateSnapshot, PlayerState, PushKind, Transfer,
};

struct HeadlessInstance {
    state: InstanceStateSnapshot,
    /// State restored by `unfreeze`
    resume_state: PlayerState,
    width: u32,
    height: u32,
}

pub struct HeadlessEngine {
    emitter: PushEmitter,
    instances: HashMap<String, HeadlessInstance>,
    wasm_url: Option<String>,
    require_surface: bool,
    reject_next: Option<String>,
}

impl HeadlessEngine {
    pub fn new(emitter: PushEmitter) -> Self {
        Self {
            emitter,
            instances: HashMap::new(),
            wasm_url: None,
            require_surface: true,
            reject_next: None,
        }
    }

    /// Accept `create` without a transferred surface.
    pub fn without_surface(mut self) -> Self {
        self.require_surface = false;
        self
    }

    /// Fail the next engine operation with `message`.
    pub fn reject_next(&mut self, message: impl Into<String>) {
        self.reject_next = Some(message.into());
    }

    pub fn wasm_url(&self) -> Option<&str> {
        self.wasm_url.as_deref()
    }

    pub fn size(&self, instance_id: &str) -> Option<(u32, u32)> {
        self.instances
            .get(instance_id)
            .map(|instance| (instance.width, instance.height))
    }

    /// Advance a playing instance by `frames`, emitting `onFrame` and, at the
    /// end of a non-looping animation, `onComplete`.
    pub fn advance(&mut self, instance_id: &str, frames: f64) {
        let Some(instance) = self.instances.get_mut(instance_id) else {
            return;
        };
        let state = &mut instance.state;
        if state.current_state != PlayerState::Playing {
            return;
        }

        let total = state.total_frame;
        let mut frame = state.current_frame + frames * state.speed * f64::from(state.direction);
        let mut completed = false;
        if total > 0.0 && !(0.0..=total).contains(&frame) {
            if state.looping {
                frame = frame.rem_euclid(total);
            } else {
                frame = frame.clamp(0.0, total);
                state.current_state = PlayerState::Stopped;
                completed = true;
            }
        }
        state.current_frame = frame;

        self.emitter.emit(
            instance_id,
            PushKind::Frame,
            json!({ "type": "frame", "currentFrame": frame }),
        );
        if completed {
            self.emitter
                .emit(instance_id, PushKind::Complete, json!({ "type": "complete" }));
        }
    }

    fn take_rejection(&mut self) -> Result<(), String> {
        match self.reject_next.take() {
            Some(message) => Err(message),
            None => Ok(()),
        }
    }
}

fn total_frames(src: &AnimationSource) -> f64 {
    match src {
        AnimationSource::Data(data) => {
            let in_point = data.get("ip").and_then(Value::as_f64).unwrap_or(0.0);
            let out_point = data.get("op").and_then(Value::as_f64).unwrap_or(0.0);
            (out_point - in_point).max(0.0)
        }
        AnimationSource::Text(_) => 0.0,
    }
}

impl Engine for HeadlessEngine {
    fn set_wasm_url(&mut self, url: &str) {
        self.wasm_url = Some(url.to_string());
    }

    fn create(
        &mut self,
        instance_id: &str,
        config: &CreateConfig,
        width: u32,
        height: u32,
        surface: Option<Transfer>,
    ) -> Result<(), String> {
        self.take_rejection()?;
        if self.require_surface && surface.is_none() {
            return Err("Canvas not provided".to_string());
        }

        let state = InstanceStateSnapshot {
            speed: config.speed,
            looping: config.looping,
            direction: config.direction,
            background_color: config.background_color.clone(),
            render_config: config.render_config.clone(),
            ..InstanceStateSnapshot::default()
        };
        self.instances.insert(
            instance_id.to_string(),
            HeadlessInstance {
                state,
                resume_state: PlayerState::Loading,
                width,
                height,
            },
        );
        self.emitter
            .emit(instance_id, PushKind::Ready, json!({ "type": "ready" }));
        Ok(())
    }

    fn apply(&mut self, instance_id: &str, command: EngineCommand) -> Result<(), String> {
        self.take_rejection()?;
        let instance = self
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| format!("Instance {} not found", instance_id))?;
        let state = &mut instance.state;

        let push = match command {
            EngineCommand::Load { src, file_type } => {
                state.total_frame = total_frames(&src);
                state.src = match src {
                    AnimationSource::Text(text) => Some(text),
                    AnimationSource::Data(_) => None,
                };
                state.file_type = file_type;
                state.current_frame = 0.0;
                state.is_loaded = true;
                state.current_state = PlayerState::Stopped;
                Some((PushKind::Load, json!({ "type": "load" })))
            }
            EngineCommand::Play => {
                state.current_state = PlayerState::Playing;
                Some((PushKind::Play, json!({ "type": "play" })))
            }
            EngineCommand::Pause => {
                state.current_state = PlayerState::Paused;
                Some((PushKind::Pause, json!({ "type": "pause" })))
            }
            EngineCommand::Stop => {
                state.current_state = PlayerState::Stopped;
                state.current_frame = if state.direction < 0 {
                    state.total_frame
                } else {
                    0.0
                };
                Some((PushKind::Stop, json!({ "type": "stop" })))
            }
            EngineCommand::Seek(frame) => {
                state.current_frame = if state.total_frame > 0.0 {
                    frame.clamp(0.0, state.total_frame)
                } else {
                    frame.max(0.0)
                };
                Some((
                    PushKind::Frame,
                    json!({ "type": "frame", "currentFrame": state.current_frame }),
                ))
            }
            EngineCommand::Resize { width, height } => {
                instance.width = width;
                instance.height = height;
                None
            }
            EngineCommand::SetSpeed(speed) => {
                if !(speed > 0.0) {
                    return Err(format!("Invalid speed {}", speed));
                }
                state.speed = speed;
                None
            }
            EngineCommand::SetDirection(direction) => {
                if direction != 1 && direction != -1 {
                    return Err(format!("Invalid direction {}", direction));
                }
                state.direction = direction;
                None
            }
            EngineCommand::SetBgColor(color) => {
                state.background_color = color;
                None
            }
            EngineCommand::SetLooping(looping) => {
                state.looping = looping;
                None
            }
            EngineCommand::Freeze => {
                if state.current_state != PlayerState::Frozen {
                    instance.resume_state = state.current_state;
                    state.current_state = PlayerState::Frozen;
                }
                Some((PushKind::Freeze, json!({ "type": "freeze" })))
            }
            EngineCommand::Unfreeze => {
                if state.current_state == PlayerState::Frozen {
                    state.current_state = instance.resume_state;
                }
                Some((PushKind::Unfreeze, json!({ "type": "unfreeze" })))
            }
        };

        if let Some((kind, event)) = push {
            self.emitter.emit(instance_id, kind, event);
        }
        Ok(())
    }

    fn state(&self, instance_id: &str) -> Option<InstanceStateSnapshot> {
        self.instances
            .get(instance_id)
            .map(|instance| instance.state.clone())
    }

    fn destroy(&mut self, instance_id: &str) -> Result<(), String> {
        self.take_rejection()?;
        self.instances
            .remove(instance_id)
            .map(|_| ())
            .ok_or_else(|| format!("Instance {} not found", instance_id))
    }
}
