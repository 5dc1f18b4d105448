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

use callback_stream::{BridgeError, ErrorKind, Subscriber};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;

#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent<T> {
    Next(T),
    Error { kind: ErrorKind, message: String },
    Complete,
}

impl<T> RecordedEvent<T> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RecordedEvent::Next(_))
    }
}

struct Shared<T> {
    events: Mutex<Vec<RecordedEvent<T>>>,
    threads: Mutex<Vec<Option<String>>>,
    terminal: Notify,
    panic_on_item: Option<usize>,
    seen_items: AtomicUsize,
}

/// Subscriber that records every event it receives, and the thread it received
/// it on. Clones share one record.
pub struct RecordingSubscriber<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for RecordingSubscriber<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> RecordingSubscriber<T> {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Panics inside `on_next` when the `nth` item (1-based) arrives.
    pub fn panicking_on_item(nth: usize) -> Self {
        Self::build(Some(nth))
    }

    fn build(panic_on_item: Option<usize>) -> Self {
        Self {
            shared: Arc::new(Shared {
                events: Mutex::new(Vec::new()),
                threads: Mutex::new(Vec::new()),
                terminal: Notify::new(),
                panic_on_item,
                seen_items: AtomicUsize::new(0),
            }),
        }
    }

    pub fn events(&self) -> Vec<RecordedEvent<T>> {
        self.shared.events.lock().unwrap().clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RecordedEvent::Next(item) => Some(item),
                _ => None,
            })
            .collect()
    }

    pub fn terminal_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| event.is_terminal())
            .count()
    }

    /// Names of the threads each event was delivered on, in delivery order.
    pub fn delivery_threads(&self) -> Vec<Option<String>> {
        self.shared.threads.lock().unwrap().clone()
    }

    /// Waits until a terminal event was recorded. Panics after `timeout`.
    pub async fn wait_for_terminal(&self, timeout: Duration) {
        let waited = tokio::time::timeout(timeout, async {
            loop {
                if self.terminal_count() > 0 {
                    return;
                }
                self.shared.terminal.notified().await;
            }
        })
        .await;
        assert!(waited.is_ok(), "no terminal event within {timeout:?}");
    }

    fn record(&self, event: RecordedEvent<T>) {
        let terminal = event.is_terminal();
        self.shared
            .threads
            .lock()
            .unwrap()
            .push(std::thread::current().name().map(str::to_string));
        self.shared.events.lock().unwrap().push(event);
        if terminal {
            self.shared.terminal.notify_one();
        }
    }
}

impl<T: Clone + Send + 'static> Default for RecordingSubscriber<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> Subscriber<T> for RecordingSubscriber<T> {
    fn on_next(&mut self, item: T) {
        let seen = self.shared.seen_items.fetch_add(1, Ordering::SeqCst) + 1;
        if self.shared.panic_on_item == Some(seen) {
            panic!("recording subscriber told to panic on item {seen}");
        }
        self.record(RecordedEvent::Next(item));
    }

    fn on_error(&mut self, err: BridgeError) {
        debug!(err = %err, "recording subscriber received error");
        self.record(RecordedEvent::Error {
            kind: err.kind(),
            message: err.to_string(),
        });
    }

    fn on_complete(&mut self) {
        self.record(RecordedEvent::Complete);
    }
}
