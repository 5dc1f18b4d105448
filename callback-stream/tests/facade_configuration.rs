/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod support;

use callback_stream::operation::options::{ALLOW_DISK_USE, BATCH_SIZE, COLLATION, MAX_TIME};
use callback_stream::{AggregateObservable, BridgeConfig, ErrorKind, StreamAdapter};
use integration_test_utils::ScriptedAggregate;
use serde_json::json;
use std::time::Duration;

#[test]
fn every_setter_returns_the_same_facade() {
    let (mut aggregate, _) =
        support::make_aggregate(ScriptedAggregate::new([]), StreamAdapter::default());
    let facade: *const AggregateObservable<ScriptedAggregate> = &aggregate;

    let chained = aggregate
        .allow_disk_use(true)
        .use_cursor(true)
        .bypass_document_validation(false)
        .max_time(Duration::from_secs(5))
        .unwrap()
        .max_await_time(Duration::from_millis(250))
        .unwrap()
        .batch_size(64)
        .unwrap()
        .comment("weekly report")
        .unwrap()
        .collation(json!({ "locale": "fr", "strength": 1 }))
        .unwrap()
        .option("hint", "by_date")
        .unwrap();

    assert!(std::ptr::eq(facade, chained));
    assert_eq!(aggregate.options().len(), 9);
    assert_eq!(
        aggregate.options().get_document(COLLATION),
        Some(&json!({ "locale": "fr", "strength": 1 }))
    );
}

#[test]
fn invalid_arguments_fail_synchronously() {
    let (mut aggregate, executor) =
        support::make_aggregate(ScriptedAggregate::new([]), StreamAdapter::default());

    assert_eq!(
        aggregate.batch_size(0).err().map(|err| err.kind()),
        Some(ErrorKind::InvalidArgument)
    );
    assert_eq!(
        aggregate.collation(json!(["fr"])).err().map(|err| err.to_string()),
        Some("invalid value for `collation`: collation must be a JSON object".to_string())
    );
    assert_eq!(executor.invocations(), 0);
}

#[tokio::test]
async fn options_set_after_stream_creation_apply_to_later_streams_only() {
    integration_test_utils::init_logging();

    let (mut aggregate, executor) =
        support::make_aggregate(ScriptedAggregate::new([1]), StreamAdapter::default());
    aggregate.batch_size(10).unwrap();
    let early = aggregate.to_item_stream();

    aggregate.batch_size(20).unwrap();
    let late = aggregate.to_item_stream();

    early.to_stream().collect_items().await.unwrap();
    late.to_stream().collect_items().await.unwrap();
    early.to_stream().collect_items().await.unwrap();

    let batch_sizes: Vec<_> = executor
        .seen_options()
        .iter()
        .map(|options| options.get_int(BATCH_SIZE))
        .collect();
    assert_eq!(batch_sizes, vec![Some(10), Some(20), Some(10)]);
}

#[test]
fn defaults_from_config_are_applied() {
    let config = BridgeConfig::from_json5_str(
        r#"{
            delivery: { mode: "inline" },
            aggregate: { allow_disk_use: false, max_time_ms: 30000 },
        }"#,
    )
    .unwrap();

    let (mut aggregate, _) = support::make_aggregate(
        ScriptedAggregate::new([]),
        StreamAdapter::from_config(&config.delivery).unwrap(),
    );
    aggregate.apply_defaults(&config.aggregate).unwrap();

    assert_eq!(aggregate.options().get_bool(ALLOW_DISK_USE), Some(false));
    assert_eq!(
        aggregate.options().get_duration(MAX_TIME),
        Some(Duration::from_secs(30))
    );
    assert_eq!(aggregate.options().get(BATCH_SIZE), None);
}

#[test]
fn invalid_default_is_reported() {
    let config = BridgeConfig::from_json5_str(r#"{ aggregate: { batch_size: 0 } }"#).unwrap();
    let (mut aggregate, _) =
        support::make_aggregate(ScriptedAggregate::new([]), StreamAdapter::default());

    let err = aggregate
        .apply_defaults(&config.aggregate)
        .err()
        .expect("zero batch size should be rejected");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}
