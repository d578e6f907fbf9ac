//! Freezing instances that scroll out of view.

use thorvg_player_core::PlayerState;

/// Call issued on a visibility change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisibilityAction {
    Freeze,
    Play,
}

/// Decide from the cached state alone; no round trip is made first.
pub fn visibility_action(state: PlayerState, intersecting: bool) -> Option<VisibilityAction> {
    match (intersecting, state) {
        (false, PlayerState::Playing) => Some(VisibilityAction::Freeze),
        (true, PlayerState::Frozen) => Some(VisibilityAction::Play),
        _ => None,
    }
}

#[cfg(target_arch = "wasm32")]
pub use observer::ViewportObserver;

#[cfg(target_arch = "wasm32")]
mod observer {
    use crate::AnimationInstance;
    use js_sys::Array;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry};

    /// Feeds an element's intersection changes into
    /// [`AnimationInstance::handle_visibility`]. Disconnects on drop.
    pub struct ViewportObserver {
        observer: IntersectionObserver,
        _callback: Closure<dyn FnMut(Array, IntersectionObserver)>,
    }

    impl ViewportObserver {
        pub fn observe(instance: &AnimationInstance, element: &Element) -> Result<Self, JsValue> {
            let instance = instance.clone();
            let callback = Closure::wrap(Box::new(move |entries: Array, _: IntersectionObserver| {
                // Only the latest entry matters when several are batched.
                let Some(entry) = entries
                    .iter()
                    .last()
                    .and_then(|e| e.dyn_into::<IntersectionObserverEntry>().ok())
                else {
                    return;
                };

                let intersecting = entry.is_intersecting();
                let instance = instance.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(e) = instance.handle_visibility(intersecting).await {
                        log::warn!("Visibility change on {} failed: {}", instance.id(), e);
                    }
                });
            }) as Box<dyn FnMut(_, _)>);

            let observer = IntersectionObserver::new(callback.as_ref().unchecked_ref())?;
            observer.observe(element);

            Ok(Self {
                observer,
                _callback: callback,
            })
        }
    }

    impl Drop for ViewportObserver {
        fn drop(&mut self) {
            self.observer.disconnect();
        }
    }
}
