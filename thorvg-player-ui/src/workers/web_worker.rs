//! Browser transport: one `web_sys::Worker` per pool slot.
//!
//! Requests are posted as `{ request: <json>, canvas?: OffscreenCanvas }`,
//! with the canvas listed in the transfer array so ownership moves to the
//! worker.

use crate::workers::channel::{InboundHandler, OutboundMessage, WorkerChannel, WorkerSpawner};
use crate::PlayerError;
use js_sys::{Array, Object, Reflect};
use std::cell::RefCell;
use thorvg_player_core::Transfer;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{ErrorEvent, MessageEvent, OffscreenCanvas, Worker};

/// Script every worker is started from.
pub const WORKER_SCRIPT_PATH: &str = "./thorvg-player-worker.js";

/// Spawns module-less web workers from a script URL.
#[derive(Clone, Debug)]
pub struct WebWorkerSpawner {
    script_url: String,
}

impl WebWorkerSpawner {
    pub fn new(script_url: impl Into<String>) -> Self {
        Self {
            script_url: script_url.into(),
        }
    }
}

impl Default for WebWorkerSpawner {
    fn default() -> Self {
        Self::new(WORKER_SCRIPT_PATH)
    }
}

impl WorkerSpawner for WebWorkerSpawner {
    fn spawn(&self, worker_id: &str) -> Result<Box<dyn WorkerChannel>, PlayerError> {
        let worker = Worker::new(&self.script_url).map_err(|e| transport(worker_id, &e))?;

        // Error handler
        let id = worker_id.to_string();
        let onerror = Closure::wrap(Box::new(move |e: ErrorEvent| {
            log::error!("Worker {} error: {}", id, e.message());
        }) as Box<dyn FnMut(_)>);
        worker.set_onerror(Some(onerror.as_ref().unchecked_ref()));

        Ok(Box::new(WebWorkerChannel {
            worker_id: worker_id.to_string(),
            worker,
            onmessage: RefCell::new(None),
            onerror: RefCell::new(Some(onerror)),
        }))
    }
}

pub struct WebWorkerChannel {
    worker_id: String,
    worker: Worker,
    onmessage: RefCell<Option<Closure<dyn FnMut(MessageEvent)>>>,
    onerror: RefCell<Option<Closure<dyn FnMut(ErrorEvent)>>>,
}

impl WebWorkerChannel {
    fn envelope(&self, message: OutboundMessage) -> Result<(Object, Array), PlayerError> {
        let envelope = Object::new();
        let transfer = Array::new();

        Reflect::set(
            &envelope,
            &JsValue::from_str("request"),
            &JsValue::from_str(&message.request),
        )
        .map_err(|e| transport(&self.worker_id, &e))?;

        if let Some(resource) = message.transfer {
            let canvas = surface_value(resource).map_err(|message| PlayerError::Transport {
                worker_id: self.worker_id.clone(),
                message,
            })?;
            Reflect::set(&envelope, &JsValue::from_str("canvas"), &canvas)
                .map_err(|e| transport(&self.worker_id, &e))?;
            transfer.push(&canvas);
        }

        Ok((envelope, transfer))
    }
}

impl WorkerChannel for WebWorkerChannel {
    fn post(&self, message: OutboundMessage) -> Result<(), PlayerError> {
        let (envelope, transfer) = self.envelope(message)?;
        self.worker
            .post_message_with_transfer(&envelope, &transfer)
            .map_err(|e| transport(&self.worker_id, &e))
    }

    fn set_on_message(&self, handler: InboundHandler) {
        let worker_id = self.worker_id.clone();
        let onmessage = Closure::wrap(Box::new(move |e: MessageEvent| {
            match e.data().as_string() {
                Some(text) => handler(text),
                None => log::warn!("Worker {} sent a non-string message", worker_id),
            }
        }) as Box<dyn FnMut(_)>);

        self.worker
            .set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        *self.onmessage.borrow_mut() = Some(onmessage);
    }

    fn terminate(&self) {
        self.worker.set_onmessage(None);
        self.worker.set_onerror(None);
        self.worker.terminate();
        self.onmessage.borrow_mut().take();
        self.onerror.borrow_mut().take();
    }
}

fn surface_value(resource: Transfer) -> Result<JsValue, String> {
    match resource.downcast::<OffscreenCanvas>() {
        Ok(canvas) => Ok(canvas.into()),
        Err(resource) => resource
            .downcast::<JsValue>()
            .map_err(|other| format!("Cannot transfer {:?} to a worker", other)),
    }
}

fn transport(worker_id: &str, error: &JsValue) -> PlayerError {
    PlayerError::Transport {
        worker_id: worker_id.to_string(),
        message: format!("{:?}", error),
    }
}
