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

//! Delivery loop that drains one subscription's queue onto its subscriber.

use crate::delivery::gate::{deliver_guarded, BoxedSubscriber};
use crate::delivery::state::SubscriptionState;
use crate::error::BridgeError;
use crate::observability::{events, fields};
use crate::subscriber::Signal;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

const COMPONENT: &str = "delivery_loop";

/// Owns a queued subscriber until its delivery loop finishes.
///
/// Dropped before finishing, because the loop never ran or its runtime shut
/// down mid-way, it fails the subscription with an upstream error.
pub(crate) struct DeliveryGuard<T: 'static> {
    state: Arc<SubscriptionState>,
    subscriber: Option<BoxedSubscriber<T>>,
    finished: bool,
}

impl<T: 'static> DeliveryGuard<T> {
    pub(crate) fn new(state: Arc<SubscriptionState>, subscriber: BoxedSubscriber<T>) -> Self {
        Self {
            state,
            subscriber: Some(subscriber),
            finished: false,
        }
    }

    /// Hands the subscriber back for inline delivery.
    pub(crate) fn into_subscriber(mut self) -> Option<BoxedSubscriber<T>> {
        self.finished = true;
        self.subscriber.take()
    }

    fn deliver(&mut self, signal: Signal<T>) -> bool {
        match self.subscriber.as_mut() {
            Some(subscriber) => deliver_guarded(&self.state, subscriber.as_mut(), signal),
            None => false,
        }
    }
}

impl<T: 'static> Drop for DeliveryGuard<T> {
    fn drop(&mut self) {
        if self.finished || self.state.is_cancelled() {
            return;
        }
        let Some(subscriber) = self.subscriber.as_mut() else {
            return;
        };

        warn!(
            event = events::DELIVERY_LOOP_LOST,
            component = COMPONENT,
            subscription_id = self.state.id(),
            "delivery loop ended before delivering a terminal signal"
        );
        self.state.try_terminate();
        let err = BridgeError::upstream("delivery ended without a terminal signal");
        deliver_guarded(&self.state, subscriber.as_mut(), Signal::Error(err));
    }
}

/// Delivers queued signals in order until a terminal signal, cancellation, or
/// the producer side going away.
pub(crate) async fn delivery_loop<T: 'static>(
    mut receiver: UnboundedReceiver<Signal<T>>,
    mut guard: DeliveryGuard<T>,
) {
    let state = guard.state.clone();
    let worker_thread = fields::current_thread_name_or_default();
    debug!(
        event = events::DELIVERY_LOOP_START,
        component = COMPONENT,
        subscription_id = state.id(),
        worker_thread = worker_thread.as_str(),
        "delivery loop started"
    );

    let reason = loop {
        tokio::select! {
            biased;
            _ = state.cancelled() => break fields::REASON_CANCELLED,
            signal = receiver.recv() => match signal {
                Some(signal) => {
                    if !guard.deliver(signal) {
                        break if state.is_cancelled() {
                            fields::REASON_CANCELLED
                        } else {
                            fields::REASON_TERMINATED
                        };
                    }
                }
                None => break fields::REASON_QUEUE_CLOSED,
            },
        }
    };
    guard.finished = true;

    debug!(
        event = events::DELIVERY_LOOP_CLOSED,
        component = COMPONENT,
        subscription_id = state.id(),
        worker_thread = worker_thread.as_str(),
        reason,
        "delivery loop stopped"
    );
}
