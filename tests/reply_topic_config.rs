//! `EngineConfig::reply_topic` derivation and its override path
//! (`SagaExecution::with_reply_topic`), spec §10.3.

mod common;

use saga_engine::prelude::*;

#[tokio::test]
async fn default_reply_topic_is_derived_from_engine_config() {
    let mut harness = common::Harness::new();
    common::register_order_ticket_callbacks(&mut harness.registry);
    let saga = common::two_step_order_ticket_saga(false);

    let mut execution = SagaExecution::new(saga);
    execution
        .execute(&harness.registry, &harness.broker, &harness.transaction_manager, None)
        .await
        .unwrap();

    let sent = harness.recording_broker.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].reply_topic.as_deref(), Some(format!("saga-reply-{}", execution.uuid)).as_deref());
}

#[tokio::test]
async fn with_reply_topic_overrides_the_config_derived_default() {
    let mut harness = common::Harness::new();
    common::register_order_ticket_callbacks(&mut harness.registry);
    let saga = common::two_step_order_ticket_saga(false);

    let mut execution = SagaExecution::new(saga).with_reply_topic("custom-topic");
    execution
        .execute(&harness.registry, &harness.broker, &harness.transaction_manager, None)
        .await
        .unwrap();

    let sent = harness.recording_broker.sent();
    assert_eq!(sent[0].reply_topic.as_deref(), Some("custom-topic"));
}

#[tokio::test]
async fn with_config_changes_the_reply_topic_prefix() {
    let mut harness = common::Harness::new();
    common::register_order_ticket_callbacks(&mut harness.registry);
    let saga = common::two_step_order_ticket_saga(false);

    let config = EngineConfig {
        reply_topic_prefix: "custom-prefix".to_string(),
        ..EngineConfig::default()
    };
    let mut execution = SagaExecution::new(saga).with_config(config);
    execution
        .execute(&harness.registry, &harness.broker, &harness.transaction_manager, None)
        .await
        .unwrap();

    let sent = harness.recording_broker.sent();
    assert_eq!(
        sent[0].reply_topic.as_deref(),
        Some(format!("custom-prefix-{}", execution.uuid)).as_deref()
    );
}
