//! Instance-to-worker assignment strategies.

use std::cell::Cell;
use thorvg_player_core::DEFAULT_WORKER_ID;

/// Number of instances currently served by one worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerLoad {
    pub worker_id: String,
    pub instances: usize,
}

/// Picks the worker id a new instance is assigned to.
///
/// Strategies only name a slot; the pool spawns the worker on first use.
pub trait AssignmentStrategy {
    fn select(&self, instance_id: &str, load: &[WorkerLoad]) -> String;
}

/// Every instance shares one worker.
#[derive(Clone, Debug)]
pub struct SingleWorker {
    worker_id: String,
}

impl SingleWorker {
    pub fn new(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
        }
    }
}

impl Default for SingleWorker {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_ID)
    }
}

impl AssignmentStrategy for SingleWorker {
    fn select(&self, _instance_id: &str, _load: &[WorkerLoad]) -> String {
        self.worker_id.clone()
    }
}

/// Cycles through a fixed list of worker slots.
#[derive(Debug)]
pub struct RoundRobin {
    slots: Vec<String>,
    next: Cell<usize>,
}

impl RoundRobin {
    pub fn new<I, S>(slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slots: slots.into_iter().map(Into::into).collect(),
            next: Cell::new(0),
        }
    }

    /// `worker-0` .. `worker-{count - 1}`
    pub fn with_workers(count: usize) -> Self {
        Self::new((0..count).map(|i| format!("worker-{}", i)))
    }
}

impl AssignmentStrategy for RoundRobin {
    fn select(&self, _instance_id: &str, _load: &[WorkerLoad]) -> String {
        if self.slots.is_empty() {
            return DEFAULT_WORKER_ID.to_string();
        }
        let index = self.next.get() % self.slots.len();
        self.next.set(index + 1);
        self.slots[index].clone()
    }
}
