//! S3 — a `SYSTEM_ERROR` reply fails the step and runs its compensation
//! (spec §8).

mod common;

use saga_engine::prelude::*;

#[tokio::test]
async fn system_error_reply_fails_step_and_compensates() {
    let mut harness = common::Harness::new();
    harness.registry.register_request(
        "send_charge",
        common::FnRequest(|_ctx: &Context| Ok(Request::new("payments", serde_json::json!({"action": "charge"})))),
    );
    harness.registry.register_request(
        "send_refund",
        common::FnRequest(|_ctx: &Context| Ok(Request::new("payments", serde_json::json!({"action": "refund"})))),
    );

    let saga = Saga::builder()
        .remote_step(Operation::new("send_charge"))
        .unwrap()
        .on_failure(Operation::new("send_refund"))
        .unwrap()
        .commit(None)
        .unwrap();

    let mut execution = SagaExecution::new(saga);
    execution
        .execute(&harness.registry, &harness.broker, &harness.transaction_manager, None)
        .await
        .unwrap();
    harness.recording_broker.reset();

    let response = Response::system_error(execution.uuid, serde_json::json!("payment gateway down"));
    let err = execution
        .execute(
            &harness.registry,
            &harness.broker,
            &harness.transaction_manager,
            Some(&response),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SagaError::StepFailed { .. }));
    assert_eq!(execution.status, SagaStatus::Errored);

    // The step's on_failure compensation runs inline as part of its own
    // SYSTEM_ERROR handling; the step itself never succeeded so it was
    // never appended to executed_steps, and the saga-level reverse walk
    // has nothing further to compensate.
    let sent = harness.recording_broker.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].topic, "payments");
    assert_eq!(sent[0].data, serde_json::json!({"action": "refund"}));
}
