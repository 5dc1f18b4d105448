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

//! Runtime integration layer.
//!
//! Isolates where delivery loops run so threading behavior stays localized to
//! the delivery policies.

pub(crate) mod shared_runtime;
pub(crate) mod worker_runtime;

use crate::delivery::delivery_loop::{delivery_loop, DeliveryGuard};
use crate::delivery::gate::BoxedSubscriber;
use crate::delivery::state::SubscriptionState;
use crate::observability::events;
use crate::stream_adapter::DeliveryPolicy;
use crate::subscriber::Signal;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::error;

const COMPONENT: &str = "runtime";

/// Starts the delivery loop for a queued policy.
///
/// Hands the subscriber back when no loop could be started so the caller can
/// fall back to inline delivery. A loop that is accepted but never runs fails
/// the subscription through its [`DeliveryGuard`].
pub(crate) fn spawn_delivery<T: Send + 'static>(
    policy: &DeliveryPolicy,
    state: Arc<SubscriptionState>,
    receiver: UnboundedReceiver<Signal<T>>,
    subscriber: BoxedSubscriber<T>,
) -> Result<(), BoxedSubscriber<T>> {
    let guard = DeliveryGuard::new(state.clone(), subscriber);

    match policy {
        DeliveryPolicy::Inline => guard.into_subscriber().map_or(Ok(()), Err),
        DeliveryPolicy::SharedRuntime => {
            shared_runtime::shared_handle().spawn(delivery_loop(receiver, guard));
            Ok(())
        }
        DeliveryPolicy::Handle(handle) => {
            handle.spawn(delivery_loop(receiver, guard));
            Ok(())
        }
        DeliveryPolicy::DedicatedThread { thread_name } => {
            let slot = Arc::new(Mutex::new(Some(guard)));
            let loop_slot = slot.clone();

            let spawned = worker_runtime::spawn_delivery_thread(thread_name, move || async move {
                let guard = loop_slot
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                if let Some(guard) = guard {
                    delivery_loop(receiver, guard).await;
                }
            });

            match spawned {
                Ok(_) => Ok(()),
                Err(err) => {
                    error!(
                        event = events::RUNTIME_SPAWN_FAILED,
                        component = COMPONENT,
                        subscription_id = state.id(),
                        err = %err,
                        "unable to spawn delivery thread; falling back to inline delivery"
                    );
                    let guard = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
                    guard
                        .and_then(DeliveryGuard::into_subscriber)
                        .map_or(Ok(()), Err)
                }
            }
        }
    }
}
