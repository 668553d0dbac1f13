//! S2 — a response-phase failure triggers a full-saga rollback (spec §8).

mod common;

use saga_engine::prelude::*;

#[tokio::test]
async fn failing_on_success_rolls_back_and_blocks_further_execution() {
    let mut harness = common::Harness::new();
    common::register_order_ticket_callbacks(&mut harness.registry);
    let saga = common::two_step_order_ticket_saga(true);

    let mut execution = SagaExecution::new(saga);

    execution
        .execute(&harness.registry, &harness.broker, &harness.transaction_manager, None)
        .await
        .unwrap();
    let order_response = Response::success(execution.uuid, serde_json::json!("order-1"));
    execution
        .execute(
            &harness.registry,
            &harness.broker,
            &harness.transaction_manager,
            Some(&order_response),
        )
        .await
        .unwrap();

    harness.recording_broker.reset();

    let ticket_response = Response::success(execution.uuid, serde_json::json!("ticket-1"));
    let err = execution
        .execute(
            &harness.registry,
            &harness.broker,
            &harness.transaction_manager,
            Some(&ticket_response),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SagaError::StepFailed { .. }));
    assert_eq!(execution.status, SagaStatus::Errored);

    // Rollback walked only step A (order); step B never succeeded so it
    // was never appended to executed_steps and has nothing to compensate.
    let sent = harness.recording_broker.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].topic, "orders");
    assert_eq!(sent[0].data, serde_json::json!({"action": "delete"}));

    let again = execution
        .execute(&harness.registry, &harness.broker, &harness.transaction_manager, None)
        .await
        .unwrap_err();
    assert!(matches!(again, SagaError::AlreadyExecuted { .. }));
}
