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

//! Delivery layer.
//!
//! Owns the per-subscription gate between producer callbacks and subscriber
//! handlers, and the queue-draining loop used by every non-inline policy.

pub(crate) mod delivery_loop;
pub(crate) mod gate;
pub(crate) mod map_sink;
pub(crate) mod state;

use crate::delivery::gate::{BoxedSubscriber, SubscriptionCore};
use crate::delivery::state::SubscriptionState;
use crate::runtime;
use crate::stream_adapter::DeliveryPolicy;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Builds the gate for a new subscription, starting a delivery loop when the
/// policy moves delivery off the emitting thread.
pub(crate) fn open<T: Send + 'static>(
    policy: &DeliveryPolicy,
    state: Arc<SubscriptionState>,
    subscriber: BoxedSubscriber<T>,
) -> SubscriptionCore<T> {
    if let DeliveryPolicy::Inline = policy {
        return SubscriptionCore::inline(state, subscriber);
    }

    let (sender, receiver) = mpsc::unbounded_channel();
    match runtime::spawn_delivery(policy, state.clone(), receiver, subscriber) {
        Ok(()) => SubscriptionCore::queued(state, sender),
        Err(subscriber) => SubscriptionCore::inline(state, subscriber),
    }
}
