//! Instance state as reported by the worker.
//!
//! The main thread never derives these values on its own: every field of an
//! [`InstanceStateSnapshot`] comes from a `getInstanceState` round trip, with
//! the single exception of `current_frame`, which frame notifications may
//! advance between round trips.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Playback state of one animation instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    Destroyed,
    Error,
    #[default]
    Loading,
    Paused,
    Playing,
    Stopped,
    Frozen,
}

impl PlayerState {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerState::Destroyed => "destroyed",
            PlayerState::Error => "error",
            PlayerState::Loading => "loading",
            PlayerState::Paused => "paused",
            PlayerState::Playing => "playing",
            PlayerState::Stopped => "stopped",
            PlayerState::Frozen => "frozen",
        }
    }

    /// `Destroyed` is the only state nothing leaves.
    pub fn is_terminal(self) -> bool {
        self == PlayerState::Destroyed
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format of the animation source handed to `load`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    #[default]
    Json,
    Lot,
    Jpg,
    Png,
    Svg,
}

/// Rendering backend requested from the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Renderer {
    /// Software rasterizer
    #[default]
    Sw,
    /// WebGPU
    Wg,
    /// WebGL
    Gl,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    #[default]
    Normal,
    Bounce,
}

/// Progress of an instance's creation handshake.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitStatus {
    #[default]
    Idle,
    Failed,
    Requested,
    Initialized,
}

/// Rendering configuration forwarded to the engine on `create`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    pub enable_device_pixel_ratio: bool,
    pub renderer: Renderer,
    pub device_pixel_ratio: f64,
    pub freeze_on_offscreen: bool,
    pub auto_resize: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enable_device_pixel_ratio: false,
            renderer: Renderer::Sw,
            device_pixel_ratio: 1.0,
            freeze_on_offscreen: true,
            auto_resize: false,
        }
    }
}

/// Authoritative state of one instance, as answered by `getInstanceState`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceStateSnapshot {
    pub current_state: PlayerState,
    pub current_frame: f64,
    pub total_frame: f64,
    pub speed: f64,
    #[serde(rename = "loop")]
    pub looping: bool,
    /// 1 plays forward, -1 plays backward.
    pub direction: i8,
    pub background_color: String,
    pub mode: PlayMode,
    /// Pause between loops, in milliseconds.
    pub intermission: u32,
    /// Number of loops to play before completing; 0 means unbounded.
    pub loop_count: u32,
    pub render_config: RenderConfig,
    pub src: Option<String>,
    pub file_type: FileType,
    pub is_loaded: bool,
}

impl Default for InstanceStateSnapshot {
    fn default() -> Self {
        Self {
            current_state: PlayerState::Loading,
            current_frame: 0.0,
            total_frame: 0.0,
            speed: 1.0,
            looping: false,
            direction: 1,
            background_color: String::new(),
            mode: PlayMode::Normal,
            intermission: 0,
            loop_count: 0,
            render_config: RenderConfig::default(),
            src: None,
            file_type: FileType::Json,
            is_loaded: false,
        }
    }
}

impl InstanceStateSnapshot {
    pub fn is_playing(&self) -> bool {
        self.current_state == PlayerState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.current_state == PlayerState::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.current_state == PlayerState::Stopped
    }

    pub fn is_frozen(&self) -> bool {
        self.current_state == PlayerState::Frozen
    }
}
