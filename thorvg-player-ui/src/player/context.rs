use crate::spawn::TaskSpawner;
use crate::workers::{RpcClient, WorkerPool};
use std::rc::Rc;

/// What every instance on a page shares: the worker pool, the RPC client
/// over it, and the executor that runs push-triggered refreshes.
#[derive(Clone)]
pub struct PlayerContext {
    rpc: RpcClient,
    tasks: Rc<dyn TaskSpawner>,
}

impl PlayerContext {
    pub fn new(pool: Rc<WorkerPool>, tasks: Rc<dyn TaskSpawner>) -> Self {
        Self {
            rpc: RpcClient::new(pool),
            tasks,
        }
    }

    /// Browser context: web workers spawned from [`crate::WORKER_SCRIPT_PATH`],
    /// one shared worker, tasks on the microtask queue.
    #[cfg(target_arch = "wasm32")]
    pub fn browser() -> Self {
        Self::new(
            Rc::new(WorkerPool::new(crate::WebWorkerSpawner::default())),
            Rc::new(crate::WasmSpawner),
        )
    }

    pub fn pool(&self) -> &Rc<WorkerPool> {
        self.rpc.pool()
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    pub fn tasks(&self) -> &Rc<dyn TaskSpawner> {
        &self.tasks
    }
}
