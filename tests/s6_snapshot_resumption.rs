//! S6 — snapshot resumption (spec §8): pause, serialize, rehydrate in a
//! fresh instance, resume to completion.

mod common;

use saga_engine::prelude::*;

#[tokio::test]
async fn rehydrated_execution_resumes_to_the_same_final_context() {
    let mut harness = common::Harness::new();
    common::register_order_ticket_callbacks(&mut harness.registry);

    let mut execution = SagaExecution::new(common::two_step_order_ticket_saga(false));
    execution
        .execute(&harness.registry, &harness.broker, &harness.transaction_manager, None)
        .await
        .unwrap();
    assert_eq!(execution.status, SagaStatus::Paused);

    let snapshot = execution.raw().unwrap();
    drop(execution);
    let mut rehydrated = SagaExecution::from_raw(&snapshot).unwrap();

    let order_response = Response::success(rehydrated.uuid, serde_json::json!("order-1"));
    rehydrated
        .execute(
            &harness.registry,
            &harness.broker,
            &harness.transaction_manager,
            Some(&order_response),
        )
        .await
        .unwrap();
    assert_eq!(rehydrated.status, SagaStatus::Paused);

    let ticket_response = Response::success(rehydrated.uuid, serde_json::json!("ticket-1"));
    let outcome = rehydrated
        .execute(
            &harness.registry,
            &harness.broker,
            &harness.transaction_manager,
            Some(&ticket_response),
        )
        .await
        .unwrap();

    let mut expected = Context::new();
    expected.set("order", serde_json::json!("order-1"));
    expected.set("ticket", serde_json::json!("ticket-1"));
    assert_eq!(outcome, SagaOutcome::Finished(expected));
    assert_eq!(rehydrated.status, SagaStatus::Finished);
}
