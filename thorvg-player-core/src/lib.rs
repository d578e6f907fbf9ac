pub mod config;
pub mod ids;
pub mod messages;
pub mod state;
pub mod transfer;

pub use config::{CreateConfig, PlayerConfig, DEFAULT_WORKER_ID};
pub use messages::{
    AnimationSource, BgColorParams, CreateParams, CreateResult, DirectionParams, InstanceParams,
    LoadParams, LoopingParams, ProtocolError, PushKind, PushNotification, ResizeParams, RpcCall,
    RpcMethod, RpcReply, RpcRequest, SeekParams, SpeedParams, StateResult, WasmUrlParams,
    WorkerToMain,
};
pub use state::{
    FileType, InitStatus, InstanceStateSnapshot, PlayMode, PlayerState, RenderConfig, Renderer,
};
pub use transfer::Transfer;
