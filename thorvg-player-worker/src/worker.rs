use crate::{Engine, Outbox, PushEmitter, WorkerHost};
use std::cell::RefCell;
use std::rc::Rc;
use thorvg_player_core::Transfer;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{DedicatedWorkerGlobalScope, MessageEvent, OffscreenCanvas};

/// Posts encoded replies and pushes back to the main thread.
struct ScopeOutbox {
    global: DedicatedWorkerGlobalScope,
}

impl Outbox for ScopeOutbox {
    fn post(&self, message: String) {
        if let Err(err) = self.global.post_message(&JsValue::from_str(&message)) {
            web_sys::console::error_1(&err);
        }
    }
}

/// Worker initialization - called by the worker script once the engine's
/// wasm module is loaded. `make_engine` receives the emitter the engine uses
/// for push notifications.
pub fn run_worker<E, F>(make_engine: F) -> Result<(), JsValue>
where
    E: Engine + 'static,
    F: FnOnce(PushEmitter) -> E,
{
    console_error_panic_hook::set_once();
    _ = console_log::init_with_level(log::Level::Debug);

    let global = js_sys::global().dyn_into::<DedicatedWorkerGlobalScope>()?;
    let outbox: Rc<dyn Outbox> = Rc::new(ScopeOutbox {
        global: global.clone(),
    });
    let engine = make_engine(PushEmitter::new(Rc::clone(&outbox)));
    let host = Rc::new(RefCell::new(WorkerHost::new(outbox, engine)));

    // Set up message handler
    let onmessage = Closure::wrap(Box::new(move |e: MessageEvent| {
        if let Err(err) = handle_message(&host, e.data()) {
            web_sys::console::error_1(&err);
        }
    }) as Box<dyn FnMut(_)>);

    global.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget();

    Ok(())
}

/// Handle message from main thread: `{request: string, canvas?: OffscreenCanvas}`.
fn handle_message<E: Engine>(
    host: &RefCell<WorkerHost<E>>,
    event_data: JsValue,
) -> Result<(), JsValue> {
    let request = js_sys::Reflect::get(&event_data, &JsValue::from_str("request"))?
        .as_string()
        .ok_or_else(|| JsValue::from_str("No request field"))?;

    let surface = js_sys::Reflect::get(&event_data, &JsValue::from_str("canvas"))?
        .dyn_into::<OffscreenCanvas>()
        .ok()
        .map(Transfer::new);

    host.borrow_mut()
        .handle_message(&request, surface)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
