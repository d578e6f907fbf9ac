mod error;
pub mod player;
mod spawn;
pub mod workers;

pub use error::PlayerError;
pub use player::{
    visibility_action, AnimationInstance, DrawingSurface, EventManager, EventType, ListenerId,
    PlayerContext, PlayerEvent, VisibilityAction,
};
#[cfg(target_arch = "wasm32")]
pub use player::ViewportObserver;
pub use spawn::TaskSpawner;
#[cfg(target_arch = "wasm32")]
pub use spawn::WasmSpawner;
pub use workers::{
    AssignmentStrategy, InboundHandler, OutboundMessage, RoundRobin, RpcClient, SingleWorker,
    WorkerChannel, WorkerHandle, WorkerLoad, WorkerPool, WorkerSpawner,
};
#[cfg(target_arch = "wasm32")]
pub use workers::{WebWorkerChannel, WebWorkerSpawner, WORKER_SCRIPT_PATH};

// Re-export core types for convenience
pub use thorvg_player_core::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Install the panic hook and route `log` output to the browser console.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    _ = console_log::init_with_level(log::Level::Debug);
}
