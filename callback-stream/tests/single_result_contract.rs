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

use callback_stream::{DeliveryPolicy, ErrorKind, StreamAdapter, Success};
use integration_test_utils::{RecordedEvent, RecordingSubscriber, ScriptedAggregate, SingleEnding};
use std::time::Duration;

#[test]
fn void_completion_yields_one_success_then_complete() {
    integration_test_utils::init_logging();

    let (aggregate, executor) =
        support::make_aggregate(ScriptedAggregate::new([]), StreamAdapter::default());

    let subscriber = RecordingSubscriber::new();
    aggregate.to_single_result_stream().subscribe(subscriber.clone());

    assert_eq!(
        subscriber.events(),
        vec![RecordedEvent::Next(Success), RecordedEvent::Complete]
    );
    assert_eq!(executor.invocations(), 1);
}

#[test]
fn failure_yields_only_an_error() {
    integration_test_utils::init_logging();

    let (aggregate, _) = support::make_aggregate(
        ScriptedAggregate::new([]).single_ending(SingleEnding::Fail("connection reset".into())),
        StreamAdapter::default(),
    );

    let subscriber = RecordingSubscriber::<Success>::new();
    aggregate.to_collection().subscribe(subscriber.clone());

    assert_eq!(
        subscriber.events(),
        vec![RecordedEvent::Error {
            kind: ErrorKind::Upstream,
            message: "upstream operation failed: connection reset".to_string(),
        }]
    );
}

#[test]
fn dropped_callback_yields_an_upstream_error() {
    integration_test_utils::init_logging();

    let (aggregate, _) = support::make_aggregate(
        ScriptedAggregate::new([]).single_ending(SingleEnding::Drop),
        StreamAdapter::default(),
    );

    let subscriber = RecordingSubscriber::<Success>::new();
    aggregate.to_single_result_stream().subscribe(subscriber.clone());

    let events = subscriber.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        RecordedEvent::Error {
            kind: ErrorKind::Upstream,
            ..
        }
    ));
}

#[tokio::test]
async fn each_subscription_runs_the_operation_again() {
    integration_test_utils::init_logging();

    let (aggregate, executor) =
        support::make_aggregate(ScriptedAggregate::new([]), StreamAdapter::default());
    let stream = aggregate.to_single_result_stream();

    assert_eq!(stream.single().await.unwrap(), Some(Success));
    assert_eq!(stream.single().await.unwrap(), Some(Success));
    assert_eq!(executor.invocations(), 2);
}

#[test]
fn cancel_before_result_discards_it() {
    integration_test_utils::init_logging();

    let (aggregate, executor) = support::make_aggregate(
        ScriptedAggregate::new([]).single_ending(SingleEnding::Hold),
        StreamAdapter::default(),
    );

    let subscriber = RecordingSubscriber::<Success>::new();
    let subscription = aggregate.to_single_result_stream().subscribe(subscriber.clone());
    subscription.cancel();

    executor
        .take_held_single()
        .expect("operation held its callback")
        .on_empty();

    assert!(subscriber.events().is_empty());
    assert!(!subscription.is_terminated());
}

#[tokio::test]
async fn result_fired_from_another_thread_reaches_queued_subscriber() {
    integration_test_utils::init_logging();

    let (aggregate, executor) = support::make_aggregate(
        ScriptedAggregate::new([]).single_ending(SingleEnding::Hold),
        StreamAdapter::new(DeliveryPolicy::SharedRuntime).unwrap(),
    );

    let subscriber = RecordingSubscriber::<Success>::new();
    aggregate.to_single_result_stream().subscribe(subscriber.clone());

    let callback = executor.take_held_single().expect("operation held its callback");
    std::thread::spawn(move || callback.on_empty())
        .join()
        .unwrap();
    subscriber
        .wait_for_terminal(Duration::from_secs(5))
        .await;

    assert_eq!(
        subscriber.events(),
        vec![RecordedEvent::Next(Success), RecordedEvent::Complete]
    );
}
