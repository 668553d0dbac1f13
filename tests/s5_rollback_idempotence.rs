//! S5 — rollback idempotence (spec §8).

mod common;

use saga_engine::prelude::*;

#[tokio::test]
async fn second_rollback_call_is_a_no_op() {
    let mut harness = common::Harness::new();
    common::register_order_ticket_callbacks(&mut harness.registry);
    let saga = common::two_step_order_ticket_saga(false);

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
    assert_eq!(execution.status, SagaStatus::Paused);
    assert_eq!(execution.executed_steps.len(), 1);

    harness.recording_broker.reset();
    execution
        .rollback(&harness.registry, &harness.broker, &harness.transaction_manager)
        .await
        .unwrap();
    assert_eq!(harness.recording_broker.call_count(), 1);
    assert!(execution.already_rolled_back);

    let again = execution
        .rollback(&harness.registry, &harness.broker, &harness.transaction_manager)
        .await
        .unwrap_err();
    assert!(matches!(again, RollbackExecutionError::AlreadyDone));
    assert_eq!(harness.recording_broker.call_count(), 0);
}
