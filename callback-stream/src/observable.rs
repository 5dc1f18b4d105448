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

//! Cold reactive stream, its subscription handle and its pull-based view.

use crate::delivery;
use crate::delivery::gate::Emitter;
use crate::delivery::map_sink::MapSink;
use crate::delivery::state::SubscriptionState;
use crate::error::{panic_message, BridgeError};
use crate::observability::events;
use crate::stream_adapter::DeliveryPolicy;
use crate::subscriber::{Signal, Subscriber};
use futures::{Stream, StreamExt, TryStreamExt};
use std::fmt::Display;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

const COMPONENT: &str = "bridge_stream";

pub(crate) type Producer<T> = Arc<dyn Fn(Emitter<T>) + Send + Sync>;

/// A cold stream: nothing runs until [`subscribe`](Self::subscribe), and every
/// subscription runs the producer again from scratch.
pub struct BridgeStream<T> {
    producer: Producer<T>,
    policy: DeliveryPolicy,
}

impl<T> Clone for BridgeStream<T> {
    fn clone(&self) -> Self {
        Self {
            producer: self.producer.clone(),
            policy: self.policy.clone(),
        }
    }
}

impl<T: Send + 'static> BridgeStream<T> {
    pub(crate) fn new(producer: Producer<T>, policy: DeliveryPolicy) -> Self {
        Self { producer, policy }
    }

    pub fn policy(&self) -> &DeliveryPolicy {
        &self.policy
    }

    /// Same stream, delivered under another policy.
    pub fn deliver_on(self, policy: DeliveryPolicy) -> Result<Self, BridgeError> {
        policy.validate()?;
        Ok(Self {
            producer: self.producer,
            policy,
        })
    }

    /// Registers `subscriber` and invokes the producer for it.
    ///
    /// Dropping the returned [`Subscription`] does not cancel it.
    pub fn subscribe<S>(&self, subscriber: S) -> Subscription
    where
        S: Subscriber<T>,
    {
        let state = SubscriptionState::new();
        debug!(
            event = events::SUBSCRIBE,
            component = COMPONENT,
            subscription_id = state.id(),
            delivery = self.policy.label(),
            "new subscription"
        );

        let core = delivery::open(&self.policy, state.clone(), Box::new(subscriber));
        let emitter = Emitter::new(Arc::new(core));
        self.invoke_producer(&state, emitter);

        Subscription { state }
    }

    fn invoke_producer(&self, state: &SubscriptionState, emitter: Emitter<T>) {
        debug!(
            event = events::UPSTREAM_INVOKE,
            component = COMPONENT,
            subscription_id = state.id(),
            "invoking upstream operation"
        );

        let producer = self.producer.clone();
        let producer_emitter = emitter.clone();
        let outcome = catch_unwind(AssertUnwindSafe(move || producer(producer_emitter)));

        if let Err(payload) = outcome {
            let message = panic_message(payload.as_ref());
            warn!(
                event = events::UPSTREAM_INVOKE_PANICKED,
                component = COMPONENT,
                subscription_id = state.id(),
                reason = message.as_str(),
                "upstream operation panicked while being invoked"
            );
            emitter.error(BridgeError::upstream(format!(
                "operation panicked while being invoked: {message}"
            )));
        }
    }

    /// Subscribes and exposes the events as a [`futures::Stream`].
    pub fn to_stream(&self) -> ItemStream<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let subscription = self.subscribe(ChannelSubscriber { sender });
        ItemStream {
            receiver,
            subscription,
            finished: false,
        }
    }

    /// Subscribes and resolves to the single item, if any.
    ///
    /// Extra items are ignored; the subscription is cancelled after the first.
    pub async fn single(&self) -> Result<Option<T>, BridgeError> {
        let mut stream = self.to_stream();
        stream.next().await.transpose()
    }

    pub fn map<U, F>(self, transform: F) -> BridgeStream<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.try_map(move |item| Ok::<U, BridgeError>(transform(item)))
    }

    /// Applies a fallible transformation per item. An `Err` or a panic ends the
    /// subscription with a consumer error and asks the producer to stop.
    pub fn try_map<U, E, F>(self, transform: F) -> BridgeStream<U>
    where
        U: Send + 'static,
        E: Display,
        F: Fn(T) -> Result<U, E> + Send + Sync + 'static,
    {
        let transform: Arc<dyn Fn(T) -> Result<U, BridgeError> + Send + Sync> =
            Arc::new(move |item| {
                transform(item).map_err(|err| BridgeError::consumer(err.to_string()))
            });
        let upstream = self.producer;

        BridgeStream::new(
            Arc::new(move |downstream: Emitter<U>| {
                let sink = MapSink::new(downstream, transform.clone());
                upstream(Emitter::new(Arc::new(sink)));
            }),
            self.policy,
        )
    }
}

/// Handle to one active subscription.
#[derive(Clone)]
pub struct Subscription {
    state: Arc<SubscriptionState>,
}

impl Subscription {
    pub fn id(&self) -> &str {
        self.state.id()
    }

    /// Stops delivery to this subscriber.
    ///
    /// This is advisory for the producer: it sees `ControlFlow::Break` from its
    /// next emit and may stop early, but an operation that has no way to stop
    /// keeps running and its remaining results are discarded.
    pub fn cancel(&self) {
        if self.state.cancel() {
            debug!(
                event = events::SUBSCRIPTION_CANCEL,
                component = COMPONENT,
                subscription_id = self.state.id(),
                "subscription cancelled"
            );
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    /// `true` once the producer's terminal signal has been admitted.
    pub fn is_terminated(&self) -> bool {
        self.state.is_terminated()
    }
}

struct ChannelSubscriber<T> {
    sender: UnboundedSender<Signal<T>>,
}

impl<T: Send + 'static> Subscriber<T> for ChannelSubscriber<T> {
    fn on_next(&mut self, item: T) {
        let _ = self.sender.send(Signal::Next(item));
    }

    fn on_error(&mut self, err: BridgeError) {
        let _ = self.sender.send(Signal::Error(err));
    }

    fn on_complete(&mut self) {
        let _ = self.sender.send(Signal::Complete);
    }
}

/// Pull-based view of one subscription.
///
/// Yields `Ok(item)` per item, then either ends or yields one `Err` and ends.
/// Losing the subscriber without a terminal event, other than by cancelling,
/// surfaces as an upstream `Err`.
/// Items are buffered without bound until polled, because the callback
/// protocol has no way to pause the producer. Dropping the stream cancels the
/// subscription.
pub struct ItemStream<T> {
    receiver: UnboundedReceiver<Signal<T>>,
    subscription: Subscription,
    finished: bool,
}

impl<T> Unpin for ItemStream<T> {}

impl<T> ItemStream<T> {
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Drains the stream, failing on the first error.
    pub async fn collect_items(self) -> Result<Vec<T>, BridgeError> {
        self.try_collect().await
    }
}

impl<T> Stream for ItemStream<T> {
    type Item = Result<T, BridgeError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        match self.receiver.poll_recv(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Signal::Next(item))) => Poll::Ready(Some(Ok(item))),
            Poll::Ready(Some(Signal::Error(err))) => {
                self.finished = true;
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(Some(Signal::Complete)) => {
                self.finished = true;
                Poll::Ready(None)
            }
            Poll::Ready(None) if self.subscription.is_cancelled() => {
                self.finished = true;
                Poll::Ready(None)
            }
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(Some(Err(BridgeError::upstream(
                    "delivery ended without a terminal signal",
                ))))
            }
        }
    }
}

impl<T> Drop for ItemStream<T> {
    fn drop(&mut self) {
        if !self.finished {
            self.subscription.cancel();
        }
    }
}
