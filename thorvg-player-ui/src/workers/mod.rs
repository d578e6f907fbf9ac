mod channel;
mod dispatch;
mod pending;
mod pool;
mod rpc;
mod strategy;
#[cfg(target_arch = "wasm32")]
mod web_worker;

pub use channel::{InboundHandler, OutboundMessage, WorkerChannel, WorkerSpawner};
pub(crate) use dispatch::{plan, PushAction, PushSink};
pub use pool::{WorkerHandle, WorkerPool};
pub use rpc::RpcClient;
pub use strategy::{AssignmentStrategy, RoundRobin, SingleWorker, WorkerLoad};
#[cfg(target_arch = "wasm32")]
pub use web_worker::{WebWorkerChannel, WebWorkerSpawner, WORKER_SCRIPT_PATH};
