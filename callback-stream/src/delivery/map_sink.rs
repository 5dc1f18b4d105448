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

//! Consumer transformations applied between the producer and the subscription.

use crate::delivery::gate::{Emitter, SignalSink};
use crate::error::{panic_message, BridgeError};
use crate::observability::events;
use crate::subscriber::Signal;
use std::ops::ControlFlow;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

const COMPONENT: &str = "map_sink";

pub(crate) type Transform<T, U> = Arc<dyn Fn(T) -> Result<U, BridgeError> + Send + Sync>;

/// Applies a fallible transformation to each item. A failing or panicking
/// transformation becomes a single consumer error downstream and never
/// unwinds into the producer's callback.
pub(crate) struct MapSink<T, U> {
    downstream: Emitter<U>,
    transform: Transform<T, U>,
    failed: AtomicBool,
}

impl<T, U: Send + 'static> MapSink<T, U> {
    pub(crate) fn new(downstream: Emitter<U>, transform: Transform<T, U>) -> Self {
        Self {
            downstream,
            transform,
            failed: AtomicBool::new(false),
        }
    }

    fn fail(&self, err: BridgeError) -> ControlFlow<()> {
        warn!(
            event = events::CONSUMER_TRANSFORM_FAILED,
            component = COMPONENT,
            err = %err,
            "item transformation failed"
        );
        self.failed.store(true, Ordering::SeqCst);
        self.downstream.error(err);
        ControlFlow::Break(())
    }
}

impl<T: Send, U: Send + 'static> SignalSink<T> for MapSink<T, U> {
    fn signal(&self, signal: Signal<T>) -> ControlFlow<()> {
        if self.failed.load(Ordering::SeqCst) {
            return ControlFlow::Break(());
        }

        match signal {
            Signal::Next(item) => {
                match catch_unwind(AssertUnwindSafe(|| (self.transform)(item))) {
                    Ok(Ok(mapped)) => self.downstream.next(mapped),
                    Ok(Err(err)) => self.fail(err),
                    Err(payload) => self.fail(BridgeError::consumer(format!(
                        "transformation panicked: {}",
                        panic_message(payload.as_ref())
                    ))),
                }
            }
            Signal::Error(err) => self.downstream.emit(Signal::Error(err)),
            Signal::Complete => self.downstream.emit(Signal::Complete),
        }
    }

    fn is_open(&self) -> bool {
        !self.failed.load(Ordering::SeqCst) && !self.downstream.is_closed()
    }
}
