mod support;

use futures::FutureExt;
use serde_json::{json, Value};
use support::Harness;
use thorvg_player_ui::{
    InstanceParams, PlayerConfig, PlayerError, PlayerState, RpcCall, RpcMethod, StateResult,
    WorkerToMain, DEFAULT_WORKER_ID,
};

#[test]
fn replies_delivered_in_reverse_order_resolve_their_own_calls() {
    let mut harness = Harness::new();
    let _a = harness.created("A", PlayerConfig::default());
    let worker = harness.worker();
    let rpc = harness.context.rpc().clone();

    worker.hold();
    let mut state = Box::pin(rpc.call_typed::<StateResult>(
        DEFAULT_WORKER_ID,
        RpcCall::GetInstanceState(InstanceParams::new("A")),
        None,
    ));
    let mut ghost = Box::pin(rpc.call(
        DEFAULT_WORKER_ID,
        RpcCall::Play(InstanceParams::new("ghost")),
        None,
    ));
    assert!(state.as_mut().now_or_never().is_none());
    assert!(ghost.as_mut().now_or_never().is_none());

    worker.process_held();
    let mut replies = worker.take_outbox();
    replies.reverse();
    for reply in &replies {
        worker.deliver(reply);
    }

    let state = harness.block_on(state).unwrap();
    assert_eq!(state.state.current_state, PlayerState::Loading);
    let err = harness.block_on(ghost).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to execute method play: Instance ghost not found"
    );
}

#[test]
fn call_to_unknown_worker_sends_nothing() {
    let mut harness = Harness::new();
    let _a = harness.instance("A", PlayerConfig::default());
    let rpc = harness.context.rpc().clone();

    let result = harness.block_on(rpc.call(
        "missing",
        RpcCall::Play(InstanceParams::new("A")),
        None,
    ));

    assert!(matches!(
        result,
        Err(PlayerError::WorkerNotInitialized { ref worker_id }) if worker_id == "missing"
    ));
    assert_eq!(harness.worker().sent_count(), 0);
}

#[test]
fn duplicate_reply_does_not_resolve_twice() {
    let mut harness = Harness::new();
    let _a = harness.created("A", PlayerConfig::default());
    let worker = harness.worker();
    let rpc = harness.context.rpc().clone();

    worker.hold();
    let mut call = Box::pin(rpc.call(
        DEFAULT_WORKER_ID,
        RpcCall::GetInstanceState(InstanceParams::new("A")),
        None,
    ));
    assert!(call.as_mut().now_or_never().is_none());
    worker.process_held();
    let reply = worker.take_outbox().pop().unwrap();

    worker.deliver(&reply);
    worker.deliver(&reply);

    assert!(harness.block_on(call).is_ok());
    let handle = harness.context.pool().worker(DEFAULT_WORKER_ID).unwrap();
    assert_eq!(handle.pending_calls(), 0);
}

#[test]
fn unknown_and_malformed_messages_are_dropped() {
    let mut harness = Harness::new();
    let _a = harness.created("A", PlayerConfig::default());
    let worker = harness.worker();
    let handle = harness.context.pool().worker(DEFAULT_WORKER_ID).unwrap();

    worker.deliver(&json!({"id": "thorvg-request-unknown", "result": null}).to_string());
    worker.deliver("not json");
    worker.deliver(&json!({"method": "onSomething", "result": {"instanceId": "A"}}).to_string());

    assert_eq!(handle.pending_calls(), 0);
}

#[test]
fn create_transfers_the_surface_and_request_ids_are_unique() {
    let mut harness = Harness::new();
    let _a = harness.created("A", PlayerConfig::default());
    let _b = harness.created("B", PlayerConfig::default());
    let sent = harness.worker().sent();

    let mut ids: Vec<&str> = sent.iter().map(|r| r.id.as_str()).collect();
    assert!(ids.iter().all(|id| id.starts_with("thorvg-request-")));
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);

    assert_eq!(harness.worker().count(RpcMethod::Create), 2);
    assert_eq!(harness.worker().host_instances(), 2);
}

#[test]
fn decommission_fails_pending_calls() {
    let mut harness = Harness::new();
    let _a = harness.created("A", PlayerConfig::default());
    let worker = harness.worker();
    let rpc = harness.context.rpc().clone();

    worker.hold();
    let mut call = Box::pin(rpc.call(
        DEFAULT_WORKER_ID,
        RpcCall::Pause(InstanceParams::new("A")),
        None,
    ));
    assert!(call.as_mut().now_or_never().is_none());

    assert!(harness.context.pool().decommission(DEFAULT_WORKER_ID));
    assert!(worker.is_terminated());
    assert!(matches!(
        harness.block_on(call),
        Err(PlayerError::Disconnected {
            method: RpcMethod::Pause,
            ..
        })
    ));
}

#[test]
fn reply_wire_format_is_decoded() {
    let text = r#"{"id":"thorvg-request-1","result":{"instanceId":"A"}}"#;
    match WorkerToMain::from_json(text).unwrap() {
        WorkerToMain::Reply(reply) => {
            assert_eq!(reply.outcome, Ok(json!({"instanceId": "A"})));
        }
        WorkerToMain::Push(_) => panic!("expected a reply"),
    }

    let text = r#"{"id":"thorvg-request-2","error":"Instance A not found"}"#;
    match WorkerToMain::from_json(text).unwrap() {
        WorkerToMain::Reply(reply) => {
            assert_eq!(reply.outcome, Err("Instance A not found".to_string()));
        }
        WorkerToMain::Push(_) => panic!("expected a reply"),
    }

    let text = r#"{"id":"thorvg-request-3"}"#;
    assert!(matches!(
        WorkerToMain::from_json(text).unwrap(),
        WorkerToMain::Reply(reply) if reply.outcome == Ok(Value::Null)
    ));
}
