mod support;

use futures::future::join;
use futures::FutureExt;
use serde_json::json;
use support::Harness;
use thorvg_player_ui::{
    AnimationInstance, FileType, InitStatus, PlayerConfig, PlayerError, PlayerState, PushKind,
    RpcMethod, WorkerToMain, DEFAULT_WORKER_ID,
};
use thorvg_player_worker::Engine;

fn clip() -> PlayerConfig {
    PlayerConfig::default().with_src(json!({"ip": 0, "op": 60}), FileType::Json)
}

#[test]
fn create_with_auto_play_ends_up_playing() {
    let mut harness = Harness::new();
    let a = harness.created("A", clip().with_auto_play(true));
    let methods = harness.worker().sent_methods();

    assert_eq!(methods[0], RpcMethod::Create);
    let position = |m: RpcMethod| methods.iter().position(|x| *x == m).unwrap();
    assert!(position(RpcMethod::Create) < position(RpcMethod::Load));
    assert!(position(RpcMethod::Load) < position(RpcMethod::Play));

    assert_eq!(a.init_status(), InitStatus::Initialized);
    assert_eq!(a.current_state(), PlayerState::Playing);
    assert_eq!(a.total_frame(), 60.0);
    assert!(a.is_loaded());
    assert!(a.is_playing());
}

#[test]
fn create_sends_the_wasm_url_first() {
    let mut harness = Harness::new();
    let config = PlayerConfig {
        wasm_url: Some("/thorvg.wasm".to_string()),
        ..PlayerConfig::default()
    };
    let _a = harness.created("A", config);

    let sent = harness.worker().sent();
    assert_eq!(sent[0].call.method(), RpcMethod::SetWasmUrl);
    assert!(sent[0].id.starts_with("set-wasm-url-"));
    assert_eq!(sent[1].call.method(), RpcMethod::Create);
    let url = harness
        .worker()
        .with_engine(|engine| engine.wasm_url().map(str::to_string));
    assert_eq!(url.as_deref(), Some("/thorvg.wasm"));
}

#[test]
fn create_without_surface_fails_locally() {
    let mut harness = Harness::new();
    let a = AnimationInstance::with_id(&harness.context, "A", clip()).unwrap();

    let err = harness.block_on(a.create()).unwrap_err();

    assert!(matches!(err, PlayerError::SurfaceUnavailable));
    assert_eq!(a.current_state(), PlayerState::Error);
    assert_eq!(a.init_status(), InitStatus::Failed);
    assert_eq!(harness.worker().sent_count(), 0);
}

#[test]
fn worker_side_create_failure_sets_error() {
    let mut harness = Harness::new();
    let a = harness.instance("A", clip());
    harness
        .worker()
        .with_engine(|engine| engine.reject_next("WebGPU unavailable"));

    let err = harness.block_on(a.create()).unwrap_err();

    assert_eq!(
        err.to_string(),
        "Failed to execute method create: WebGPU unavailable"
    );
    assert_eq!(a.current_state(), PlayerState::Error);
    assert!(!a.is_created());
}

#[test]
fn mismatched_instance_id_is_rejected() {
    let mut harness = Harness::new();
    let a = harness.instance("A", clip());
    let worker = harness.worker();

    worker.hold();
    let mut create = Box::pin(a.create());
    assert!(create.as_mut().now_or_never().is_none());
    worker.process_held();

    for text in worker.take_outbox() {
        if let WorkerToMain::Reply(mut reply) = WorkerToMain::from_json(&text).unwrap() {
            reply.outcome = Ok(json!({"instanceId": "B"}));
            worker.deliver(&WorkerToMain::Reply(reply).to_json().unwrap());
        }
    }

    let err = harness.block_on(create).unwrap_err();
    assert!(matches!(
        err,
        PlayerError::InstanceIdMismatch { ref expected, ref actual }
            if expected == "A" && actual == "B"
    ));
    assert_eq!(a.current_state(), PlayerState::Error);
    assert_eq!(a.init_status(), InitStatus::Failed);
}

#[test]
fn operations_before_creation_are_no_ops() {
    let mut harness = Harness::new();
    let a = harness.instance("A", clip());

    harness.block_on(a.play()).unwrap();
    harness.block_on(a.seek(10.0)).unwrap();
    harness.block_on(a.destroy()).unwrap();
    a.set_looping(true).unwrap();

    assert_eq!(harness.worker().sent_count(), 0);
    assert_eq!(a.current_state(), PlayerState::Loading);
}

#[test]
fn destroy_is_terminal_and_silences_later_operations() {
    let mut harness = Harness::new();
    let a = harness.created("A", clip().with_auto_play(true));
    let worker = harness.worker();

    harness.block_on(a.destroy()).unwrap();
    let sent = worker.sent_count();

    harness.block_on(a.play()).unwrap();
    harness.block_on(a.pause()).unwrap();
    harness.block_on(a.seek(3.0)).unwrap();
    harness.block_on(a.freeze()).unwrap();
    harness.block_on(a.destroy()).unwrap();
    a.set_looping(false).unwrap();

    assert_eq!(worker.sent_count(), sent);
    assert_eq!(a.current_state(), PlayerState::Destroyed);
    assert_eq!(worker.host_instances(), 0);
    assert!(harness.context.pool().assigned_worker("A").is_none());
    let handle = harness.context.pool().worker(DEFAULT_WORKER_ID).unwrap();
    assert_eq!(handle.instance_count(), 0);
}

#[test]
fn ready_push_during_destroy_does_not_revive_the_instance() {
    let mut harness = Harness::new();
    let a = harness.created("A", clip());
    let worker = harness.worker();

    worker.hold();
    let mut destroy = Box::pin(a.destroy());
    assert!(destroy.as_mut().now_or_never().is_none());
    let after_destroy = worker.sent_count();
    assert_eq!(worker.sent_methods().last(), Some(&RpcMethod::Destroy));

    worker.push(PushKind::Ready, "A", json!({"type": "ready"}));
    harness.settle();
    assert!(!a.is_created());

    let mut play = Box::pin(a.play());
    assert!(play.as_mut().now_or_never().is_some());
    a.set_looping(true).unwrap();
    harness.settle();
    assert_eq!(worker.sent_count(), after_destroy);

    worker.release();
    harness.block_on(destroy).unwrap();
    assert_eq!(worker.sent_count(), after_destroy);
    assert_eq!(a.current_state(), PlayerState::Destroyed);
}

#[test]
fn set_looping_does_not_wait_and_swallows_failures() {
    let mut harness = Harness::new();
    let a = harness.created("A", clip());
    let worker = harness.worker();
    worker.with_engine(|engine| engine.reject_next("looping unsupported"));

    a.set_looping(true).unwrap();
    harness.settle();

    assert_eq!(worker.count(RpcMethod::SetLooping), 1);
    let handle = harness.context.pool().worker(DEFAULT_WORKER_ID).unwrap();
    assert_eq!(handle.pending_calls(), 0);
    assert!(!a.looping());
}

#[test]
fn interleaved_calls_on_two_instances_settle_independently() {
    let mut harness = Harness::new();
    let a = harness.created("A", clip());
    let b = harness.created("B", clip());
    let worker = harness.worker();

    worker.hold();
    let mut play = Box::pin(a.play());
    let mut pause = Box::pin(b.pause());
    assert!(play.as_mut().now_or_never().is_none());
    assert!(pause.as_mut().now_or_never().is_none());

    worker.process_held();
    let mut outbound = worker.take_outbox();
    outbound.reverse();
    worker.release();
    for text in &outbound {
        worker.deliver(text);
    }

    let (played, paused) = harness.block_on(join(play, pause));
    played.unwrap();
    paused.unwrap();

    assert_eq!(a.current_state(), PlayerState::Playing);
    assert_eq!(b.current_state(), PlayerState::Paused);
}

#[test]
fn mirror_matches_worker_state_after_round_trips() {
    let mut harness = Harness::new();
    let a = harness.created("A", clip());

    harness.block_on(a.set_speed(2.0)).unwrap();
    harness.block_on(a.set_direction(-1)).unwrap();
    harness.block_on(a.set_bg_color("#ff0000")).unwrap();
    harness.block_on(a.seek(12.0)).unwrap();
    harness.block_on(a.resize(640, 480)).unwrap();
    harness.block_on(a.play()).unwrap();

    let worker_state = harness
        .worker()
        .with_engine(|engine| engine.state("A"))
        .unwrap();
    assert_eq!(a.snapshot(), worker_state);
    assert_eq!(a.speed(), 2.0);
    assert_eq!(a.direction(), -1);
    assert_eq!(a.background_color(), "#ff0000");
    assert_eq!(a.current_frame(), 12.0);
    assert_eq!(
        harness.worker().with_engine(|engine| engine.size("A")),
        Some((640, 480))
    );
}

#[test]
fn rejected_operation_leaves_the_mirror_untouched() {
    let mut harness = Harness::new();
    let a = harness.created("A", clip());
    let before = a.snapshot();

    let err = harness.block_on(a.set_speed(0.0)).unwrap_err();

    assert!(matches!(
        err,
        PlayerError::Rpc {
            method: RpcMethod::SetSpeed,
            ..
        }
    ));
    assert_eq!(a.snapshot(), before);
}

#[test]
fn freeze_and_unfreeze_round_trip() {
    let mut harness = Harness::new();
    let a = harness.created("A", clip().with_auto_play(true));

    harness.block_on(a.freeze()).unwrap();
    assert!(a.is_frozen());
    harness.block_on(a.unfreeze()).unwrap();
    assert!(a.is_playing());
    harness.block_on(a.stop()).unwrap();
    assert!(a.is_stopped());
}

#[test]
fn load_replaces_the_animation() {
    let mut harness = Harness::new();
    let a = harness.created("A", PlayerConfig::default());
    assert!(!a.is_loaded());

    harness
        .block_on(a.load(json!({"ip": 10, "op": 40}), FileType::Json))
        .unwrap();

    assert!(a.is_loaded());
    assert_eq!(a.total_frame(), 30.0);
    assert_eq!(a.current_state(), PlayerState::Stopped);
}

#[test]
fn dropping_an_instance_releases_its_assignment() {
    let mut harness = Harness::new();
    {
        let _a = harness.created("A", clip());
        assert_eq!(
            harness.context.pool().assigned_worker("A").as_deref(),
            Some(DEFAULT_WORKER_ID)
        );
    }
    harness.settle();

    assert!(harness.context.pool().assigned_worker("A").is_none());
}

#[test]
fn generated_ids_are_distinct() {
    let harness = Harness::new();
    let a = AnimationInstance::new(&harness.context, PlayerConfig::default()).unwrap();
    let b = AnimationInstance::new(&harness.context, PlayerConfig::default()).unwrap();

    assert!(a.id().starts_with("thorvg-"));
    assert_ne!(a.id(), b.id());
    assert_eq!(a.worker_id(), DEFAULT_WORKER_ID);
    assert_eq!(
        harness.context.pool().worker(DEFAULT_WORKER_ID).unwrap().instance_count(),
        2
    );
}

#[test]
fn a_live_id_cannot_be_taken_twice() {
    let mut harness = Harness::new();
    let a = harness.created("A", clip());

    let err = AnimationInstance::with_id(&harness.context, "A", clip()).err();
    assert!(matches!(
        err,
        Some(PlayerError::DuplicateInstance { ref instance_id }) if instance_id == "A"
    ));

    harness
        .worker()
        .push(PushKind::Frame, "A", json!({"currentFrame": 7}));
    assert_eq!(a.current_frame(), 7.0);
    assert_eq!(
        harness.context.pool().assigned_worker("A").as_deref(),
        Some(DEFAULT_WORKER_ID)
    );

    drop(a);
    harness.settle();
    assert!(AnimationInstance::with_id(&harness.context, "A", clip()).is_ok());
}
