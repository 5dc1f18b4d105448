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

//! Bridges an item-by-item callback protocol into a stream of the same shape.

use crate::delivery::gate::Emitter;
use crate::error::{BridgeError, UpstreamFailure};
use crate::observable::BridgeStream;
use crate::stream_adapter::StreamAdapter;
use std::ops::ControlFlow;

/// Item callback handed to a multi-item operation.
///
/// Call [`on_next`](Self::on_next) per item, then exactly one of
/// [`on_complete`](Self::on_complete) or [`on_error`](Self::on_error). Extra
/// terminal calls are ignored and logged. Clones feed the same subscription;
/// once every clone is dropped without a terminal call the subscription fails
/// with an upstream error.
pub struct ItemCallback<T> {
    emitter: Emitter<T>,
}

impl<T> Clone for ItemCallback<T> {
    fn clone(&self) -> Self {
        Self {
            emitter: self.emitter.clone(),
        }
    }
}

impl<T: Send + 'static> ItemCallback<T> {
    pub(crate) fn new(emitter: Emitter<T>) -> Self {
        Self { emitter }
    }

    /// Delivers one item. `Break` asks the operation to stop producing; it is
    /// returned once the consumer cancelled or the subscription terminated.
    pub fn on_next(&self, item: T) -> ControlFlow<()> {
        self.emitter.next(item)
    }

    pub fn on_complete(&self) {
        self.emitter.complete();
    }

    pub fn on_error(&self, failure: impl Into<UpstreamFailure>) {
        self.emitter.error(BridgeError::upstream(failure));
    }

    /// `true` once further items would be discarded.
    pub fn is_closed(&self) -> bool {
        self.emitter.is_closed()
    }
}

/// Wraps an operation reporting through an [`ItemCallback`].
///
/// `subscribe` runs again for every subscription. Items reach the subscriber in
/// the order the operation delivered them.
pub fn convert_multi<T, F>(adapter: &StreamAdapter, subscribe: F) -> BridgeStream<T>
where
    T: Send + 'static,
    F: Fn(ItemCallback<T>) + Send + Sync + 'static,
{
    adapter.create(move |emitter| subscribe(ItemCallback::new(emitter)))
}

#[cfg(test)]
mod tests {
    use super::{convert_multi, ItemCallback};
    use crate::error::ErrorKind;
    use crate::stream_adapter::StreamAdapter;
    use crate::subscriber::subscriber_fn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn items_then_completion() {
        let stream = convert_multi(&StreamAdapter::default(), |callback| {
            for item in [1, 2, 3] {
                let _ = callback.on_next(item);
            }
            callback.on_complete();
        });

        assert_eq!(stream.to_stream().collect_items().await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn error_after_items_ends_stream() {
        let stream = convert_multi(&StreamAdapter::default(), |callback: ItemCallback<u8>| {
            let _ = callback.on_next(1);
            callback.on_error("cursor killed");
            callback.on_complete();
        });

        let err = stream
            .to_stream()
            .collect_items()
            .await
            .expect_err("error should end the stream");
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[tokio::test]
    async fn operation_can_stop_on_break() {
        let produced = Arc::new(AtomicUsize::new(0));
        let counter = produced.clone();
        let stream = convert_multi(&StreamAdapter::default(), move |callback: ItemCallback<u32>| {
            for item in 0..100 {
                counter.fetch_add(1, Ordering::SeqCst);
                if callback.on_next(item).is_break() {
                    return;
                }
            }
            callback.on_complete();
        })
        .try_map(|item| if item < 1 { Ok(item) } else { Err("too big") });

        let err = stream.to_stream().collect_items().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consumer);
        assert_eq!(produced.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clones_share_the_subscription() {
        let flows = Arc::new(Mutex::new(Vec::new()));
        let recorded = flows.clone();
        let stream = convert_multi(&StreamAdapter::default(), move |callback: ItemCallback<u8>| {
            let other = callback.clone();
            other.on_complete();
            let mut recorded = recorded.lock().unwrap();
            recorded.push(callback.is_closed());
            recorded.push(callback.on_next(1).is_break());
        });

        let subscription = stream.subscribe(subscriber_fn(|_: u8| {}));

        assert!(subscription.is_terminated());
        assert_eq!(*flows.lock().unwrap(), vec![true, true]);
    }
}
