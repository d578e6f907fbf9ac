//! One animation instance as seen from the main thread.
//!
//! The instance keeps a mirror of the state the worker reports. Mutating
//! operations go to the worker and are followed by a `getInstanceState`
//! round trip; the mirror is never advanced locally except for the current
//! frame, which frame notifications overwrite between round trips.

use crate::player::context::PlayerContext;
use crate::player::events::{EventManager, EventType, ListenerId, PlayerEvent};
use crate::player::viewport::{visibility_action, VisibilityAction};
use crate::workers::{plan, PushAction, PushSink};
use crate::PlayerError;
use futures::FutureExt;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use thorvg_player_core::{
    ids, AnimationSource, BgColorParams, CreateParams, CreateResult, DirectionParams, FileType,
    InitStatus, InstanceParams, InstanceStateSnapshot, LoadParams, LoopingParams, PlayerConfig,
    PlayerState, PushKind, PushNotification, ResizeParams, RpcCall, SeekParams, SpeedParams,
    StateResult, Transfer,
};

/// Drawing surface handed to the worker on `create`.
///
/// The handle is moved with the request; once creation started the instance
/// no longer owns it.
#[derive(Debug)]
pub struct DrawingSurface {
    handle: Transfer,
    width: u32,
    height: u32,
}

impl DrawingSurface {
    pub fn new<T: Any>(handle: T, width: u32, height: u32) -> Self {
        Self {
            handle: Transfer::new(handle),
            width,
            height,
        }
    }

    /// Hand control of `canvas` to an `OffscreenCanvas` that can be moved to
    /// the worker. A canvas can only be transferred once.
    #[cfg(target_arch = "wasm32")]
    pub fn from_canvas(canvas: &web_sys::HtmlCanvasElement) -> Result<Self, PlayerError> {
        let (width, height) = (canvas.width(), canvas.height());
        let offscreen = canvas.transfer_control_to_offscreen().map_err(|e| {
            log::error!("Canvas transfer failed: {:?}", e);
            PlayerError::SurfaceUnavailable
        })?;
        Ok(Self::new(offscreen, width, height))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

struct InstanceInner {
    id: String,
    worker_id: String,
    context: PlayerContext,
    config: PlayerConfig,
    /// Set once the worker acknowledged construction, cleared first thing on destroy.
    created: Cell<bool>,
    init_status: Cell<InitStatus>,
    state: RefCell<InstanceStateSnapshot>,
    surface: RefCell<Option<DrawingSurface>>,
    events: EventManager,
    destroying: Cell<bool>,
    released: Cell<bool>,
}

/// Handle to one animation instance; clones share the instance.
#[derive(Clone)]
pub struct AnimationInstance {
    inner: Rc<InstanceInner>,
}

impl AnimationInstance {
    /// New instance with a generated id, assigned to the worker the pool's
    /// strategy selects. The worker is spawned if needed; nothing is sent
    /// until [`create`](Self::create).
    pub fn new(context: &PlayerContext, config: PlayerConfig) -> Result<Self, PlayerError> {
        Self::with_id(context, ids::instance_id(), config)
    }

    /// New instance under a caller-chosen id. Fails while another live
    /// instance holds the same id.
    pub fn with_id(
        context: &PlayerContext,
        id: impl Into<String>,
        config: PlayerConfig,
    ) -> Result<Self, PlayerError> {
        let id = id.into();
        let pool = context.pool();
        if pool.assigned_worker(&id).is_some() {
            return Err(PlayerError::DuplicateInstance { instance_id: id });
        }
        let worker_id = pool.select_worker(&id);
        let worker = pool.get_worker(&worker_id)?;
        pool.assign_animation_to_worker(&id, &worker_id)?;

        let state = InstanceStateSnapshot {
            speed: config.speed,
            looping: config.looping,
            direction: config.direction,
            background_color: config.background_color.clone(),
            render_config: config.render_config.clone(),
            file_type: config.file_type,
            ..InstanceStateSnapshot::default()
        };

        let inner = Rc::new(InstanceInner {
            id,
            worker_id,
            context: context.clone(),
            config,
            created: Cell::new(false),
            init_status: Cell::new(InitStatus::Idle),
            state: RefCell::new(state),
            surface: RefCell::new(None),
            events: EventManager::new(),
            destroying: Cell::new(false),
            released: Cell::new(false),
        });

        let sink: Weak<dyn PushSink> = Rc::downgrade(&inner) as Weak<dyn PushSink>;
        worker.routes().register(&inner.id, sink);

        log::debug!("Instance {} assigned to worker {}", inner.id, inner.worker_id);
        Ok(Self { inner })
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn worker_id(&self) -> &str {
        &self.inner.worker_id
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.inner.config
    }

    pub fn is_created(&self) -> bool {
        self.inner.created.get()
    }

    pub fn init_status(&self) -> InitStatus {
        self.inner.init_status.get()
    }

    /// Surface moved to the worker by the next [`create`](Self::create).
    pub fn bind_surface(&self, surface: DrawingSurface) {
        *self.inner.surface.borrow_mut() = Some(surface);
    }

    pub fn has_surface(&self) -> bool {
        self.inner.surface.borrow().is_some()
    }

    /// Construct the instance on its worker.
    ///
    /// Sends `setWasmUrl` if configured, then `create` with the bound surface,
    /// then loads the configured source and plays it when auto-play is set.
    /// Any failure leaves the instance in [`PlayerState::Error`].
    pub async fn create(&self) -> Result<(), PlayerError> {
        let inner = &self.inner;
        match inner.init_status.get() {
            InitStatus::Requested | InitStatus::Initialized => return Ok(()),
            InitStatus::Idle | InitStatus::Failed => {}
        }
        if inner.state.borrow().current_state.is_terminal() {
            return Ok(());
        }

        inner.init_status.set(InitStatus::Requested);
        match inner.initialize().await {
            Ok(()) => {
                inner.init_status.set(InitStatus::Initialized);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to create instance {}: {}", inner.id, e);
                inner.init_status.set(InitStatus::Failed);
                inner.state.borrow_mut().current_state = PlayerState::Error;
                Err(e)
            }
        }
    }

    pub async fn load(
        &self,
        src: impl Into<AnimationSource>,
        file_type: FileType,
    ) -> Result<(), PlayerError> {
        let call = RpcCall::Load(LoadParams {
            instance_id: self.inner.id.clone(),
            src: src.into(),
            file_type,
        });
        self.inner.mutate(call).await
    }

    pub async fn play(&self) -> Result<(), PlayerError> {
        self.inner.mutate(RpcCall::Play(self.params())).await
    }

    pub async fn pause(&self) -> Result<(), PlayerError> {
        self.inner.mutate(RpcCall::Pause(self.params())).await
    }

    pub async fn stop(&self) -> Result<(), PlayerError> {
        self.inner.mutate(RpcCall::Stop(self.params())).await
    }

    pub async fn seek(&self, frame: f64) -> Result<(), PlayerError> {
        let call = RpcCall::Seek(SeekParams {
            instance_id: self.inner.id.clone(),
            frame,
        });
        self.inner.mutate(call).await
    }

    pub async fn resize(&self, width: u32, height: u32) -> Result<(), PlayerError> {
        let call = RpcCall::Resize(ResizeParams {
            instance_id: self.inner.id.clone(),
            width,
            height,
        });
        self.inner.mutate(call).await
    }

    pub async fn set_speed(&self, speed: f64) -> Result<(), PlayerError> {
        let call = RpcCall::SetSpeed(SpeedParams {
            instance_id: self.inner.id.clone(),
            speed,
        });
        self.inner.mutate(call).await
    }

    pub async fn set_direction(&self, direction: i8) -> Result<(), PlayerError> {
        let call = RpcCall::SetDirection(DirectionParams {
            instance_id: self.inner.id.clone(),
            direction,
        });
        self.inner.mutate(call).await
    }

    pub async fn set_bg_color(&self, color: &str) -> Result<(), PlayerError> {
        let call = RpcCall::SetBgColor(BgColorParams {
            instance_id: self.inner.id.clone(),
            color: color.to_string(),
        });
        self.inner.mutate(call).await
    }

    /// Fire-and-forget: the reply is not awaited and the mirror is not
    /// refreshed. A failure reported by the worker is only logged.
    pub fn set_looping(&self, value: bool) -> Result<(), PlayerError> {
        let inner = &self.inner;
        if !inner.created.get() {
            return Ok(());
        }
        let call = RpcCall::SetLooping(LoopingParams {
            instance_id: inner.id.clone(),
            value,
        });
        inner.context.rpc().notify(&inner.worker_id, call)
    }

    pub async fn freeze(&self) -> Result<(), PlayerError> {
        self.inner.mutate(RpcCall::Freeze(self.params())).await
    }

    pub async fn unfreeze(&self) -> Result<(), PlayerError> {
        self.inner.mutate(RpcCall::Unfreeze(self.params())).await
    }

    /// Tear the instance down. Operations started after this point are no-ops.
    ///
    /// The assignment, push route and listeners are released even when the
    /// worker reports a failure.
    pub async fn destroy(&self) -> Result<(), PlayerError> {
        let inner = &self.inner;
        if !inner.created.replace(false) {
            return Ok(());
        }
        inner.destroying.set(true);

        let result = inner
            .context
            .rpc()
            .call(&inner.worker_id, RpcCall::Destroy(self.params()), None)
            .await;
        inner.release();

        match result {
            Ok(_) => {
                inner.state.borrow_mut().current_state = PlayerState::Destroyed;
                log::debug!("Instance {} destroyed", inner.id);
                Ok(())
            }
            Err(e) => {
                inner.state.borrow_mut().current_state = PlayerState::Error;
                Err(e)
            }
        }
    }

    /// Re-read the worker's state into the mirror.
    pub async fn refresh(&self) -> Result<(), PlayerError> {
        self.inner.refresh().await
    }

    /// Apply the viewport policy to a visibility change.
    ///
    /// Ignored when the render config disables freezing offscreen.
    pub async fn handle_visibility(&self, intersecting: bool) -> Result<(), PlayerError> {
        if !self.inner.config.render_config.freeze_on_offscreen {
            return Ok(());
        }
        match visibility_action(self.current_state(), intersecting) {
            Some(VisibilityAction::Freeze) => self.freeze().await,
            Some(VisibilityAction::Play) => self.play().await,
            None => Ok(()),
        }
    }

    pub fn add_event_listener<F>(&self, kind: EventType, listener: F) -> ListenerId
    where
        F: Fn(&PlayerEvent) + 'static,
    {
        self.inner.events.add_event_listener(kind, listener)
    }

    /// Remove one listener, or all listeners of `kind` when `id` is `None`.
    pub fn remove_event_listener(&self, kind: EventType, id: Option<ListenerId>) {
        self.inner.events.remove_event_listener(kind, id)
    }

    pub fn snapshot(&self) -> InstanceStateSnapshot {
        self.inner.state.borrow().clone()
    }

    pub fn current_state(&self) -> PlayerState {
        self.inner.state.borrow().current_state
    }

    pub fn current_frame(&self) -> f64 {
        self.inner.state.borrow().current_frame
    }

    pub fn total_frame(&self) -> f64 {
        self.inner.state.borrow().total_frame
    }

    pub fn speed(&self) -> f64 {
        self.inner.state.borrow().speed
    }

    pub fn looping(&self) -> bool {
        self.inner.state.borrow().looping
    }

    pub fn direction(&self) -> i8 {
        self.inner.state.borrow().direction
    }

    pub fn background_color(&self) -> String {
        self.inner.state.borrow().background_color.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.state.borrow().is_loaded
    }

    pub fn is_playing(&self) -> bool {
        self.inner.state.borrow().is_playing()
    }

    pub fn is_paused(&self) -> bool {
        self.inner.state.borrow().is_paused()
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.state.borrow().is_stopped()
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.state.borrow().is_frozen()
    }

    fn params(&self) -> InstanceParams {
        InstanceParams::new(self.inner.id.clone())
    }
}

impl InstanceInner {
    async fn initialize(&self) -> Result<(), PlayerError> {
        let surface = self
            .surface
            .borrow_mut()
            .take()
            .ok_or(PlayerError::SurfaceUnavailable)?;
        let rpc = self.context.rpc();

        if let Some(url) = &self.config.wasm_url {
            rpc.set_wasm_url(&self.worker_id, url).await?;
        }

        let call = RpcCall::Create(CreateParams {
            instance_id: self.id.clone(),
            config: self.config.create_config(),
            width: surface.width,
            height: surface.height,
        });
        let result: CreateResult = rpc
            .call_typed(&self.worker_id, call, Some(surface.handle))
            .await?;
        if result.instance_id != self.id {
            return Err(PlayerError::InstanceIdMismatch {
                expected: self.id.clone(),
                actual: result.instance_id,
            });
        }

        self.created.set(true);
        self.refresh().await?;

        if let Some(src) = &self.config.src {
            let call = RpcCall::Load(LoadParams {
                instance_id: self.id.clone(),
                src: src.clone(),
                file_type: self.config.file_type,
            });
            self.mutate(call).await?;
        }
        if self.config.auto_play {
            self.mutate(RpcCall::Play(InstanceParams::new(self.id.clone())))
                .await?;
        }
        Ok(())
    }

    /// Call, then refresh. No-op until the worker acknowledged creation.
    async fn mutate(&self, call: RpcCall) -> Result<(), PlayerError> {
        if !self.created.get() {
            log::debug!("Ignoring {} on instance {} that is not created", call.method(), self.id);
            return Ok(());
        }
        self.context.rpc().call(&self.worker_id, call, None).await?;
        self.refresh().await
    }

    async fn refresh(&self) -> Result<(), PlayerError> {
        if !self.created.get() {
            return Ok(());
        }
        let call = RpcCall::GetInstanceState(InstanceParams::new(self.id.clone()));
        let result: StateResult = self
            .context
            .rpc()
            .call_typed(&self.worker_id, call, None)
            .await?;

        // A destroy may have started while the request was in flight.
        if self.created.get() {
            *self.state.borrow_mut() = result.state;
        }
        Ok(())
    }

    fn release(&self) {
        if self.released.replace(true) {
            return;
        }
        let pool = self.context.pool();
        pool.unassign_animation_from_worker(&self.id);
        if let Some(worker) = pool.worker(&self.worker_id) {
            worker.routes().unregister(&self.id);
        }
        self.events.remove_all_event_listeners();
    }
}

impl PushSink for InstanceInner {
    fn on_push(self: Rc<Self>, push: PushNotification) {
        match plan(&push) {
            PushAction::UpdateFrame(frame) => {
                self.state.borrow_mut().current_frame = frame;
                self.events.dispatch(&PlayerEvent::from(push));
            }
            PushAction::NotifyOnly => {
                self.events.dispatch(&PlayerEvent::from(push));
            }
            PushAction::Refresh => {
                // Late ready notifications must not revive an instance being torn down.
                if push.kind == PushKind::Ready && !self.destroying.get() && !self.released.get() {
                    self.created.set(true);
                }

                let this = Rc::clone(&self);
                let task = async move {
                    if let Err(e) = this.refresh().await {
                        log::warn!("Refresh of {} after {} failed: {}", this.id, push.kind, e);
                    }
                    this.events.dispatch(&PlayerEvent::from(push));
                };
                self.context.tasks().spawn_local(task.boxed_local());
            }
        }
    }
}

impl Drop for InstanceInner {
    fn drop(&mut self) {
        self.release();
    }
}
