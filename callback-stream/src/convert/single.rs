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

//! Bridges a single-result callback into a stream of at most one item.

use crate::delivery::gate::Emitter;
use crate::error::{BridgeError, UpstreamFailure};
use crate::observability::events;
use crate::observable::BridgeStream;
use crate::stream_adapter::StreamAdapter;
use tracing::warn;

const COMPONENT: &str = "single_result_callback";

type Completion<T> = Box<dyn FnOnce(Result<Option<T>, BridgeError>) + Send>;

/// Single-use completion handle handed to a callback-driven operation.
///
/// Firing consumes the handle, so it cannot be invoked twice. Dropping it
/// without firing fails the subscription with an upstream error.
pub struct SingleResultCallback<T> {
    completion: Option<Completion<T>>,
}

impl<T: Send + 'static> SingleResultCallback<T> {
    pub(crate) fn for_emitter(emitter: Emitter<T>) -> Self {
        Self {
            completion: Some(Box::new(move |result| match result {
                Ok(Some(value)) => {
                    let _ = emitter.next(value);
                    emitter.complete();
                }
                Ok(None) => emitter.complete(),
                Err(err) => emitter.error(err),
            })),
        }
    }

    /// `Ok(Some(_))` is a value, `Ok(None)` is success without a value.
    pub fn on_result(mut self, result: Result<Option<T>, BridgeError>) {
        if let Some(completion) = self.completion.take() {
            completion(result);
        }
    }

    pub fn on_success(self, value: T) {
        self.on_result(Ok(Some(value)));
    }

    pub fn on_empty(self) {
        self.on_result(Ok(None));
    }

    pub fn on_failure(self, failure: impl Into<UpstreamFailure>) {
        self.on_result(Err(BridgeError::upstream(failure)));
    }

    /// Returns a handle for an operation reporting `U`, converting its result
    /// with `convert` before it reaches this handle.
    pub fn adapt<U, F>(mut self, convert: F) -> SingleResultCallback<U>
    where
        U: Send + 'static,
        F: FnOnce(Result<Option<U>, BridgeError>) -> Result<Option<T>, BridgeError>
            + Send
            + 'static,
    {
        let completion = self.completion.take().map(|completion| {
            Box::new(move |result| completion(convert(result))) as Completion<U>
        });
        SingleResultCallback { completion }
    }
}

impl<T> Drop for SingleResultCallback<T> {
    fn drop(&mut self) {
        if let Some(completion) = self.completion.take() {
            warn!(
                event = events::CALLBACK_DROPPED_UNFIRED,
                component = COMPONENT,
                "single result callback dropped without a result"
            );
            completion(Err(BridgeError::upstream(
                "single result callback dropped without a result",
            )));
        }
    }
}

/// Wraps an operation reporting through a [`SingleResultCallback`].
///
/// `invoke` runs again for every subscription. Cancelling a subscription only
/// discards the eventual result; the operation itself is not interrupted.
pub fn convert_single<T, F>(adapter: &StreamAdapter, invoke: F) -> BridgeStream<T>
where
    T: Send + 'static,
    F: Fn(SingleResultCallback<T>) + Send + Sync + 'static,
{
    adapter.create(move |emitter| invoke(SingleResultCallback::for_emitter(emitter)))
}
