//! In-process worker transport for integration tests.
//!
//! Each pool slot gets a real `WorkerHost` driving a `HeadlessEngine`. By
//! default a posted request is handled and every resulting message is
//! delivered before `post` returns; in hold mode requests queue up until the
//! test processes them, and outbound messages can be reordered before
//! delivery.
#![allow(dead_code)]

use futures::executor::LocalPool;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::rc::Rc;
use thorvg_player_ui::{
    AnimationInstance, DrawingSurface, InboundHandler, OutboundMessage, PlayerConfig,
    PlayerContext, PlayerError, PushKind, PushNotification, RpcMethod, RpcRequest, TaskSpawner,
    WorkerChannel, WorkerPool, WorkerSpawner, WorkerToMain, DEFAULT_WORKER_ID,
};
use thorvg_player_worker::{HeadlessEngine, Outbox, PushEmitter, WorkerHost};

#[derive(Default)]
pub struct QueueOutbox(RefCell<VecDeque<String>>);

impl Outbox for QueueOutbox {
    fn post(&self, message: String) {
        self.0.borrow_mut().push_back(message);
    }
}

pub struct LoopbackWorker {
    host: RefCell<WorkerHost<HeadlessEngine>>,
    outbox: Rc<QueueOutbox>,
    handler: RefCell<Option<InboundHandler>>,
    sent: RefCell<Vec<RpcRequest>>,
    held: RefCell<VecDeque<OutboundMessage>>,
    hold: Cell<bool>,
    terminated: Cell<bool>,
}

impl LoopbackWorker {
    pub fn new() -> Self {
        let outbox = Rc::new(QueueOutbox::default());
        let engine = HeadlessEngine::new(PushEmitter::new(outbox.clone()));
        Self {
            host: RefCell::new(WorkerHost::new(outbox.clone(), engine)),
            outbox,
            handler: RefCell::new(None),
            sent: RefCell::new(Vec::new()),
            held: RefCell::new(VecDeque::new()),
            hold: Cell::new(false),
            terminated: Cell::new(false),
        }
    }

    /// Queue requests instead of answering them on `post`.
    pub fn hold(&self) {
        self.hold.set(true);
    }

    /// Leave hold mode, answering and delivering everything queued.
    pub fn release(&self) {
        self.hold.set(false);
        self.process_held();
        self.flush();
    }

    /// Run queued requests through the host without delivering the output.
    pub fn process_held(&self) {
        loop {
            let next = self.held.borrow_mut().pop_front();
            match next {
                Some(message) => self.run(message),
                None => break,
            }
        }
    }

    /// Messages produced by the host and not yet delivered, in order.
    pub fn take_outbox(&self) -> Vec<String> {
        self.outbox.0.borrow_mut().drain(..).collect()
    }

    /// Deliver every pending outbound message.
    pub fn flush(&self) {
        loop {
            let next = self.outbox.0.borrow_mut().pop_front();
            match next {
                Some(text) => self.deliver(&text),
                None => break,
            }
        }
    }

    /// Hand `text` to the main thread as if the worker had posted it.
    pub fn deliver(&self, text: &str) {
        let handler = self.handler.borrow().clone();
        if let Some(handler) = handler {
            handler(text.to_string());
        }
    }

    pub fn push(&self, kind: PushKind, instance_id: &str, event: Value) {
        let push = WorkerToMain::Push(PushNotification::new(kind, instance_id, event));
        self.deliver(&push.to_json().unwrap());
    }

    /// Mutate the engine directly; pushes it emits are delivered unless holding.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut HeadlessEngine) -> R) -> R {
        let result = f(self.host.borrow_mut().engine_mut());
        if !self.hold.get() {
            self.flush();
        }
        result
    }

    pub fn host_instances(&self) -> usize {
        self.host.borrow().instance_count()
    }

    pub fn sent(&self) -> Vec<RpcRequest> {
        self.sent.borrow().clone()
    }

    pub fn sent_methods(&self) -> Vec<RpcMethod> {
        self.sent.borrow().iter().map(|r| r.call.method()).collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.borrow().len()
    }

    pub fn count(&self, method: RpcMethod) -> usize {
        self.sent_methods().into_iter().filter(|m| *m == method).count()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.get()
    }

    fn run(&self, message: OutboundMessage) {
        self.host
            .borrow_mut()
            .handle_message(&message.request, message.transfer)
            .unwrap();
    }
}

impl WorkerChannel for LoopbackWorker {
    fn post(&self, message: OutboundMessage) -> Result<(), PlayerError> {
        let request = RpcRequest::from_json(&message.request).unwrap();
        self.sent.borrow_mut().push(request);

        if self.hold.get() {
            self.held.borrow_mut().push_back(message);
        } else {
            self.run(message);
            self.flush();
        }
        Ok(())
    }

    fn set_on_message(&self, handler: InboundHandler) {
        *self.handler.borrow_mut() = Some(handler);
    }

    fn terminate(&self) {
        self.terminated.set(true);
    }
}

#[derive(Default)]
pub struct LoopbackSpawner {
    workers: RefCell<HashMap<String, Rc<LoopbackWorker>>>,
}

impl LoopbackSpawner {
    pub fn worker(&self, worker_id: &str) -> Rc<LoopbackWorker> {
        Rc::clone(&self.workers.borrow()[worker_id])
    }
}

impl WorkerSpawner for LoopbackSpawner {
    fn spawn(&self, worker_id: &str) -> Result<Box<dyn WorkerChannel>, PlayerError> {
        let worker = Rc::new(LoopbackWorker::new());
        self.workers
            .borrow_mut()
            .insert(worker_id.to_string(), Rc::clone(&worker));
        Ok(Box::new(worker))
    }
}

pub struct Harness {
    pub executor: LocalPool,
    pub context: PlayerContext,
    pub spawner: Rc<LoopbackSpawner>,
}

impl Harness {
    pub fn new() -> Self {
        let spawner = Rc::new(LoopbackSpawner::default());
        Self::with_pool(Rc::clone(&spawner), WorkerPool::new(spawner))
    }

    pub fn with_pool(spawner: Rc<LoopbackSpawner>, pool: WorkerPool) -> Self {
        let executor = LocalPool::new();
        let tasks: Rc<dyn TaskSpawner> = Rc::new(executor.spawner());
        let context = PlayerContext::new(Rc::new(pool), tasks);
        Self {
            executor,
            context,
            spawner,
        }
    }

    /// Run `future` to completion, along with any task it spawns.
    pub fn block_on<F: Future>(&mut self, future: F) -> F::Output {
        let output = self.executor.run_until(future);
        self.settle();
        output
    }

    /// Run spawned tasks until none can make progress.
    pub fn settle(&mut self) {
        self.executor.run_until_stalled();
    }

    pub fn worker(&self) -> Rc<LoopbackWorker> {
        self.spawner.worker(DEFAULT_WORKER_ID)
    }

    /// Instance with a bound surface, not yet created.
    pub fn instance(&self, id: &str, config: PlayerConfig) -> AnimationInstance {
        let instance = AnimationInstance::with_id(&self.context, id, config).unwrap();
        instance.bind_surface(DrawingSurface::new((), 320, 240));
        instance
    }

    /// Instance created on its worker.
    pub fn created(&mut self, id: &str, config: PlayerConfig) -> AnimationInstance {
        let instance = self.instance(id, config);
        self.block_on(instance.create()).unwrap();
        instance
    }
}
