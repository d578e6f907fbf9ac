use crate::workers::channel::{OutboundMessage, WorkerChannel, WorkerSpawner};
use crate::workers::dispatch::PushRoutes;
use crate::workers::pending::PendingCallTable;
use crate::workers::strategy::{AssignmentStrategy, SingleWorker, WorkerLoad};
use crate::PlayerError;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use thorvg_player_core::WorkerToMain;

/// One running worker and the protocol state kept for it on the main thread.
pub struct WorkerHandle {
    id: String,
    channel: Box<dyn WorkerChannel>,
    instances: RefCell<BTreeSet<String>>,
    pending: PendingCallTable,
    routes: PushRoutes,
}

impl WorkerHandle {
    fn new(id: &str, channel: Box<dyn WorkerChannel>) -> Rc<Self> {
        let handle = Rc::new(Self {
            id: id.to_string(),
            channel,
            instances: RefCell::new(BTreeSet::new()),
            pending: PendingCallTable::default(),
            routes: PushRoutes::default(),
        });

        // Message handler
        let weak = Rc::downgrade(&handle);
        handle.channel.set_on_message(Rc::new(move |text: String| {
            if let Some(handle) = weak.upgrade() {
                handle.handle_inbound(&text);
            }
        }));

        handle
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ids of the instances assigned to this worker, sorted.
    pub fn instances(&self) -> Vec<String> {
        self.instances.borrow().iter().cloned().collect()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.borrow().len()
    }

    /// Calls still waiting for a reply.
    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn pending(&self) -> &PendingCallTable {
        &self.pending
    }

    pub(crate) fn routes(&self) -> &PushRoutes {
        &self.routes
    }

    pub(crate) fn post(&self, message: OutboundMessage) -> Result<(), PlayerError> {
        self.channel.post(message)
    }

    fn attach(&self, instance_id: &str) {
        self.instances.borrow_mut().insert(instance_id.to_string());
    }

    fn detach(&self, instance_id: &str) {
        self.instances.borrow_mut().remove(instance_id);
    }

    fn handle_inbound(&self, text: &str) {
        match WorkerToMain::from_json(text) {
            Ok(WorkerToMain::Reply(reply)) => {
                let id = reply.id.clone();
                if !self.pending.resolve(reply) {
                    log::debug!("Worker {} answered unknown request {}", self.id, id);
                }
            }
            Ok(WorkerToMain::Push(push)) => {
                self.routes.dispatch(push);
            }
            Err(e) => {
                log::warn!("Worker {} sent invalid message: {} ({})", self.id, e, text);
            }
        }
    }

    fn shutdown(&self) {
        let cancelled = self.pending.clear();
        self.routes.clear();
        self.instances.borrow_mut().clear();
        self.channel.terminate();
        log::info!(
            "Worker {} decommissioned, {} pending calls cancelled",
            self.id,
            cancelled
        );
    }
}

/// Owns the workers and the instance-to-worker assignment table.
///
/// Workers are expensive and long-lived: one is spawned the first time its
/// id is requested and reused until explicitly decommissioned.
pub struct WorkerPool {
    spawner: Box<dyn WorkerSpawner>,
    strategy: Box<dyn AssignmentStrategy>,
    workers: RefCell<HashMap<String, Rc<WorkerHandle>>>,
    assignments: RefCell<HashMap<String, String>>,
}

impl WorkerPool {
    pub fn new(spawner: impl WorkerSpawner + 'static) -> Self {
        Self::with_strategy(spawner, SingleWorker::default())
    }

    pub fn with_strategy(
        spawner: impl WorkerSpawner + 'static,
        strategy: impl AssignmentStrategy + 'static,
    ) -> Self {
        Self {
            spawner: Box::new(spawner),
            strategy: Box::new(strategy),
            workers: RefCell::new(HashMap::new()),
            assignments: RefCell::new(HashMap::new()),
        }
    }

    /// Worker for `worker_id`, spawned on first use.
    pub fn get_worker(&self, worker_id: &str) -> Result<Rc<WorkerHandle>, PlayerError> {
        if let Some(worker) = self.worker(worker_id) {
            return Ok(worker);
        }

        let channel = self.spawner.spawn(worker_id)?;
        let worker = WorkerHandle::new(worker_id, channel);
        self.workers
            .borrow_mut()
            .insert(worker_id.to_string(), Rc::clone(&worker));

        log::info!("Worker {} created", worker_id);
        Ok(worker)
    }

    /// Worker for `worker_id` if it was already spawned.
    pub fn worker(&self, worker_id: &str) -> Option<Rc<WorkerHandle>> {
        self.workers.borrow().get(worker_id).cloned()
    }

    /// Spawned worker ids, sorted.
    pub fn worker_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.workers.borrow().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Worker id the strategy picks for a new instance.
    pub fn select_worker(&self, instance_id: &str) -> String {
        self.strategy.select(instance_id, &self.worker_load())
    }

    pub fn worker_load(&self) -> Vec<WorkerLoad> {
        let mut load: Vec<WorkerLoad> = self
            .workers
            .borrow()
            .values()
            .map(|worker| WorkerLoad {
                worker_id: worker.id().to_string(),
                instances: worker.instance_count(),
            })
            .collect();
        load.sort_by(|a, b| a.worker_id.cmp(&b.worker_id));
        load
    }

    /// Record that `instance_id` is served by `worker_id`.
    ///
    /// An instance is served by exactly one worker; assigning it again to the
    /// same worker is a no-op, to another worker an error.
    pub fn assign_animation_to_worker(
        &self,
        instance_id: &str,
        worker_id: &str,
    ) -> Result<(), PlayerError> {
        let worker = self
            .worker(worker_id)
            .ok_or_else(|| PlayerError::WorkerNotInitialized {
                worker_id: worker_id.to_string(),
            })?;

        let existing = self.assignments.borrow().get(instance_id).cloned();
        match existing {
            Some(assigned) if assigned == worker_id => Ok(()),
            Some(assigned) => Err(PlayerError::Assignment {
                instance_id: instance_id.to_string(),
                assigned,
                requested: worker_id.to_string(),
            }),
            None => {
                self.assignments
                    .borrow_mut()
                    .insert(instance_id.to_string(), worker_id.to_string());
                worker.attach(instance_id);
                Ok(())
            }
        }
    }

    pub fn unassign_animation_from_worker(&self, instance_id: &str) {
        let removed = self.assignments.borrow_mut().remove(instance_id);
        if let Some(worker) = removed.and_then(|worker_id| self.worker(&worker_id)) {
            worker.detach(instance_id);
        }
    }

    pub fn assigned_worker(&self, instance_id: &str) -> Option<String> {
        self.assignments.borrow().get(instance_id).cloned()
    }

    /// Terminate a worker. Its pending calls fail with
    /// [`PlayerError::Disconnected`] and its assignments are dropped.
    pub fn decommission(&self, worker_id: &str) -> bool {
        let removed = self.workers.borrow_mut().remove(worker_id);
        let Some(worker) = removed else {
            return false;
        };

        self.assignments
            .borrow_mut()
            .retain(|_, assigned| assigned != worker_id);
        worker.shutdown();
        true
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for worker in self.workers.borrow().values() {
            worker.channel.terminate();
        }
    }
}
