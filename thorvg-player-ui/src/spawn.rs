//! Local task spawning for work triggered by inbound worker messages.
//!
//! Message handlers are synchronous callbacks; anything that needs a round
//! trip (a state refresh after a push notification) is spawned as a local,
//! non-`Send` future on the caller's executor.

use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;

pub trait TaskSpawner {
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>);
}

impl TaskSpawner for futures::executor::LocalSpawner {
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
        if let Err(e) = LocalSpawnExt::spawn_local(self, future) {
            log::error!("Failed to spawn local task: {}", e);
        }
    }
}

/// Spawns onto the browser's microtask queue.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct WasmSpawner;

#[cfg(target_arch = "wasm32")]
impl TaskSpawner for WasmSpawner {
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(future);
    }
}
