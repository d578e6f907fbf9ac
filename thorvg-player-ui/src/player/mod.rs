mod context;
mod events;
mod instance;
mod viewport;

pub use context::PlayerContext;
pub use events::{EventManager, EventType, ListenerId, PlayerEvent};
pub use instance::{AnimationInstance, DrawingSurface};
pub use viewport::{visibility_action, VisibilityAction};
#[cfg(target_arch = "wasm32")]
pub use viewport::ViewportObserver;
