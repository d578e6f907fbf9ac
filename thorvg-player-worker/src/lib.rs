pub mod engine;
pub mod headless;
pub mod host;
#[cfg(target_arch = "wasm32")]
pub mod worker;

pub use engine::{Engine, EngineCommand, Outbox, PushEmitter};
pub use headless::HeadlessEngine;
pub use host::{HostError, WorkerHost};
#[cfg(target_arch = "wasm32")]
pub use worker::run_worker;

// Re-export core types for convenience
pub use thorvg_player_core::*;
