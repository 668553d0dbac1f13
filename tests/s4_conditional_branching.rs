//! S4 — conditional branching on `ctx.option` (spec §8).
//!
//! `option == 1` selects Saga(A) (a remote step, pauses then finishes),
//! `option == 2` selects Saga(B) (a remote step whose `on_success` always
//! fails), anything else falls through to the else-saga Saga(C) (a local
//! step that always finishes immediately).

mod common;

use saga_engine::prelude::*;

fn option_is(value: i64) -> impl Fn(&Context) -> bool {
    move |ctx: &Context| ctx.get("option").and_then(serde_json::Value::as_i64) == Some(value)
}

fn register_branch_callbacks(registry: &mut CallbackRegistry) {
    registry.register_request(
        "send_a",
        common::FnRequest(|_ctx: &Context| Ok(Request::new("branch-a", serde_json::json!({"step": "a"})))),
    );
    registry.register_response(
        "handle_a_success",
        common::FnResponse(|ctx: &Context, response: &Response| {
            let mut ctx = ctx.clone();
            ctx.set("chosen", response.payload.clone());
            Ok(ctx)
        }),
    );
    registry.register_request(
        "send_b",
        common::FnRequest(|_ctx: &Context| Ok(Request::new("branch-b", serde_json::json!({"step": "b"})))),
    );
    registry.register_response(
        "handle_b_success_fails",
        common::FnResponse(|_ctx: &Context, _response: &Response| Err("branch B handler exploded".to_string())),
    );
    registry.register_request(
        "send_b_compensate",
        common::FnRequest(|_ctx: &Context| Ok(Request::new("branch-b", serde_json::json!({"step": "b-undo"})))),
    );
    registry.register_local(
        "set_chosen_c",
        common::FnLocal(|ctx: &Context| {
            let mut ctx = ctx.clone();
            ctx.set("chosen", serde_json::json!("c"));
            Ok(ctx)
        }),
    );
    registry.register_predicate("option_is_1", common::FnPredicate(option_is(1)));
    registry.register_predicate("option_is_2", common::FnPredicate(option_is(2)));
}

fn branching_saga() -> Saga {
    let saga_a = Saga::builder()
        .remote_step(Operation::new("send_a"))
        .unwrap()
        .on_success(Operation::new("handle_a_success"))
        .unwrap()
        .commit(None)
        .unwrap();
    let saga_b = Saga::builder()
        .remote_step(Operation::new("send_b"))
        .unwrap()
        .on_success(Operation::new("handle_b_success_fails"))
        .unwrap()
        .on_failure(Operation::new("send_b_compensate"))
        .unwrap()
        .commit(None)
        .unwrap();
    let saga_c = Saga::builder()
        .local_step(Operation::new("set_chosen_c"))
        .unwrap()
        .commit(None)
        .unwrap();

    Saga::builder()
        .conditional_step(
            vec![
                Branch {
                    predicate: Operation::new("option_is_1"),
                    saga: saga_a,
                },
                Branch {
                    predicate: Operation::new("option_is_2"),
                    saga: saga_b,
                },
            ],
            Some(saga_c),
        )
        .unwrap()
        .commit(None)
        .unwrap()
}

#[tokio::test]
async fn option_one_selects_branch_a_and_finishes() {
    let mut harness = common::Harness::new();
    register_branch_callbacks(&mut harness.registry);

    let mut context = Context::new();
    context.set("option", 1);
    let mut execution = SagaExecution::new_with_context(uuid::Uuid::new_v4(), None, branching_saga(), context);

    let outcome = execution
        .execute(&harness.registry, &harness.broker, &harness.transaction_manager, None)
        .await
        .unwrap();
    assert_eq!(outcome, SagaOutcome::Paused);
    assert_eq!(execution.status, SagaStatus::Paused);

    let response = Response::success(execution.uuid, serde_json::json!("a-done"));
    let outcome = execution
        .execute(&harness.registry, &harness.broker, &harness.transaction_manager, Some(&response))
        .await
        .unwrap();

    let SagaOutcome::Finished(context) = outcome else {
        panic!("expected the saga to finish");
    };
    assert_eq!(context.get("option"), Some(&serde_json::json!(1)));
    assert_eq!(context.get("chosen"), Some(&serde_json::json!("a-done")));
    assert_eq!(execution.status, SagaStatus::Finished);
}

#[tokio::test]
async fn option_two_selects_branch_b_and_rolls_back_on_success_failure() {
    let mut harness = common::Harness::new();
    register_branch_callbacks(&mut harness.registry);

    let mut context = Context::new();
    context.set("option", 2);
    let mut execution = SagaExecution::new_with_context(uuid::Uuid::new_v4(), None, branching_saga(), context);

    execution
        .execute(&harness.registry, &harness.broker, &harness.transaction_manager, None)
        .await
        .unwrap();
    harness.recording_broker.reset();

    let response = Response::success(execution.uuid, serde_json::json!("b-done"));
    let err = execution
        .execute(&harness.registry, &harness.broker, &harness.transaction_manager, Some(&response))
        .await
        .unwrap_err();

    assert!(matches!(err, SagaError::StepFailed { .. }));
    assert_eq!(execution.status, SagaStatus::Errored);

    // The inner branch's own on_failure compensation runs first (inside
    // its `rollback`), then the outer saga's reverse walk delegates to the
    // (now already-rolled-back) conditional step, a no-op.
    let sent = harness.recording_broker.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].topic, "branch-b");
    assert_eq!(sent[0].data, serde_json::json!({"step": "b-undo"}));
}

#[tokio::test]
async fn option_three_falls_through_to_else_branch() {
    let mut harness = common::Harness::new();
    register_branch_callbacks(&mut harness.registry);

    let mut context = Context::new();
    context.set("option", 3);
    let mut execution = SagaExecution::new_with_context(uuid::Uuid::new_v4(), None, branching_saga(), context);

    let outcome = execution
        .execute(&harness.registry, &harness.broker, &harness.transaction_manager, None)
        .await
        .unwrap();

    let SagaOutcome::Finished(context) = outcome else {
        panic!("expected the else-branch to finish without pausing");
    };
    assert_eq!(context.get("chosen"), Some(&serde_json::json!("c")));
    assert_eq!(execution.status, SagaStatus::Finished);
    assert_eq!(harness.recording_broker.call_count(), 0);
}
