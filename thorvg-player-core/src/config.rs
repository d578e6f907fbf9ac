//! Player configuration.
//!
//! [`PlayerConfig`] is what a host page sets on one player before creation.
//! The subset the engine needs at construction time travels in `create` as a
//! [`CreateConfig`]; the source itself is sent afterwards with `load`.

use crate::{AnimationSource, FileType, RenderConfig};
use serde::{Deserialize, Serialize};

/// Worker slot shared by every instance under the default assignment strategy.
pub const DEFAULT_WORKER_ID: &str = "defaultWorker";

/// Configuration for one player instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerConfig {
    /// Animation loaded right after creation, if any
    pub src: Option<AnimationSource>,
    pub file_type: FileType,
    /// Issue `play` once creation (and the initial load) finished
    pub auto_play: bool,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub speed: f64,
    pub direction: i8,
    pub background_color: String,
    pub render_config: RenderConfig,
    /// Location of the engine's wasm binary, forwarded with `setWasmUrl`
    pub wasm_url: Option<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            src: None,
            file_type: FileType::Json,
            auto_play: false,
            looping: false,
            speed: 1.0,
            direction: 1,
            background_color: String::new(),
            render_config: RenderConfig::default(),
            wasm_url: None,
        }
    }
}

impl PlayerConfig {
    pub fn with_src(mut self, src: impl Into<AnimationSource>, file_type: FileType) -> Self {
        self.src = Some(src.into());
        self.file_type = file_type;
        self
    }

    pub fn with_auto_play(mut self, auto_play: bool) -> Self {
        self.auto_play = auto_play;
        self
    }

    pub fn create_config(&self) -> CreateConfig {
        CreateConfig {
            render_config: self.render_config.clone(),
            auto_play: self.auto_play,
            looping: self.looping,
            speed: self.speed,
            direction: self.direction,
            background_color: self.background_color.clone(),
            wasm_url: self.wasm_url.clone(),
        }
    }
}

/// Construction-time settings sent with `create`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConfig {
    pub render_config: RenderConfig,
    pub auto_play: bool,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub speed: f64,
    pub direction: i8,
    pub background_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wasm_url: Option<String>,
}
