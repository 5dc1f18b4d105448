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

use callback_stream::{AggregateExecutor, ItemCallback, OperationOptions, SingleResultCallback};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// What `run_multi` does once its items are out.
#[derive(Clone, Debug)]
pub enum MultiEnding {
    Complete,
    Fail(String),
    /// Keeps the callback so the test can drive it further.
    Hold,
}

/// How `run_single` reports.
#[derive(Clone, Debug)]
pub enum SingleEnding {
    Empty,
    Fail(String),
    Hold,
    /// Drops the callback without reporting.
    Drop,
}

/// Callback-driven aggregate backend with a fixed script.
///
/// Counts invocations, keeps a copy of the options each run saw and the
/// `ControlFlow` every `on_next` returned. Stops emitting items on `Break`.
pub struct ScriptedAggregate {
    items: Vec<u32>,
    multi_ending: MultiEnding,
    single_ending: SingleEnding,
    background: bool,
    invocations: AtomicUsize,
    seen_options: Mutex<Vec<OperationOptions>>,
    flows: Arc<Mutex<Vec<ControlFlow<()>>>>,
    held_multi: Arc<Mutex<Vec<ItemCallback<u32>>>>,
    held_single: Mutex<Vec<SingleResultCallback<()>>>,
}

impl ScriptedAggregate {
    pub fn new(items: impl Into<Vec<u32>>) -> Self {
        Self {
            items: items.into(),
            multi_ending: MultiEnding::Complete,
            single_ending: SingleEnding::Empty,
            background: false,
            invocations: AtomicUsize::new(0),
            seen_options: Mutex::new(Vec::new()),
            flows: Arc::new(Mutex::new(Vec::new())),
            held_multi: Arc::new(Mutex::new(Vec::new())),
            held_single: Mutex::new(Vec::new()),
        }
    }

    pub fn ending(mut self, ending: MultiEnding) -> Self {
        self.multi_ending = ending;
        self
    }

    pub fn single_ending(mut self, ending: SingleEnding) -> Self {
        self.single_ending = ending;
        self
    }

    /// Runs the multi-item script on a fresh thread after `run_multi` returns.
    pub fn on_background_thread(mut self) -> Self {
        self.background = true;
        self
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    pub fn seen_options(&self) -> Vec<OperationOptions> {
        self.seen_options.lock().unwrap().clone()
    }

    pub fn flows(&self) -> Vec<ControlFlow<()>> {
        self.flows.lock().unwrap().clone()
    }

    pub fn take_held_multi(&self) -> Option<ItemCallback<u32>> {
        self.held_multi.lock().unwrap().pop()
    }

    pub fn take_held_single(&self) -> Option<SingleResultCallback<()>> {
        self.held_single.lock().unwrap().pop()
    }

    fn record_run(&self, options: &OperationOptions) {
        let run = self.invocations.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(run, options = options.len(), "scripted aggregate invoked");
        self.seen_options.lock().unwrap().push(options.clone());
    }
}

fn play(
    items: Vec<u32>,
    ending: MultiEnding,
    callback: ItemCallback<u32>,
    flows: Arc<Mutex<Vec<ControlFlow<()>>>>,
    held: Arc<Mutex<Vec<ItemCallback<u32>>>>,
) {
    for item in items {
        let flow = callback.on_next(item);
        flows.lock().unwrap().push(flow);
        if flow.is_break() {
            return;
        }
    }
    match ending {
        MultiEnding::Complete => callback.on_complete(),
        MultiEnding::Fail(reason) => callback.on_error(reason),
        MultiEnding::Hold => held.lock().unwrap().push(callback),
    }
}

impl AggregateExecutor for ScriptedAggregate {
    type Item = u32;

    fn run_single(&self, options: &OperationOptions, callback: SingleResultCallback<()>) {
        self.record_run(options);
        match &self.single_ending {
            SingleEnding::Empty => callback.on_empty(),
            SingleEnding::Fail(reason) => callback.on_failure(reason.clone()),
            SingleEnding::Hold => self.held_single.lock().unwrap().push(callback),
            SingleEnding::Drop => drop(callback),
        }
    }

    fn run_multi(&self, options: &OperationOptions, callback: ItemCallback<u32>) {
        self.record_run(options);
        let items = self.items.clone();
        let ending = self.multi_ending.clone();
        let flows = self.flows.clone();
        let held = self.held_multi.clone();

        if self.background {
            std::thread::spawn(move || play(items, ending, callback, flows, held));
        } else {
            play(items, ending, callback, flows, held);
        }
    }
}
