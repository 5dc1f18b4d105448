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

use callback_stream::operation::options::{ALLOW_DISK_USE, BATCH_SIZE, MAX_TIME};
use callback_stream::{AggregateExecutor, ItemCallback, OperationOptions, SingleResultCallback};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;
use tracing::{debug, info};

/// Aggregation over an in-memory document list: keeps documents whose fields
/// equal every field of `filter`, reported from a worker thread.
pub(crate) struct InMemoryAggregate {
    documents: Arc<Vec<Value>>,
    filter: Value,
    output: Arc<Mutex<Vec<Value>>>,
}

impl InMemoryAggregate {
    pub(crate) fn new(documents: Vec<Value>, filter: Value) -> Self {
        Self {
            documents: Arc::new(documents),
            filter,
            output: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn output_len(&self) -> usize {
        self.output.lock().map(|output| output.len()).unwrap_or_default()
    }

    fn matching(documents: &[Value], filter: &Value) -> Vec<Value> {
        let Some(filter) = filter.as_object() else {
            return documents.to_vec();
        };
        documents
            .iter()
            .filter(|document| {
                filter
                    .iter()
                    .all(|(field, expected)| document.get(field) == Some(expected))
            })
            .cloned()
            .collect()
    }
}

impl AggregateExecutor for InMemoryAggregate {
    type Item = Value;

    fn run_single(&self, options: &OperationOptions, callback: SingleResultCallback<()>) {
        let documents = self.documents.clone();
        let filter = self.filter.clone();
        let output = self.output.clone();
        debug!(allow_disk_use = ?options.get_bool(ALLOW_DISK_USE), "writing aggregate output");

        thread::spawn(move || {
            let matched = InMemoryAggregate::matching(&documents, &filter);
            match output.lock() {
                Ok(mut output) => {
                    *output = matched;
                    callback.on_empty();
                }
                Err(_) => callback.on_failure("output collection is poisoned"),
            }
        });
    }

    fn run_multi(&self, options: &OperationOptions, callback: ItemCallback<Value>) {
        let documents = self.documents.clone();
        let filter = self.filter.clone();
        let max_time = options.get_duration(MAX_TIME);
        let batch_size = options
            .get_int(BATCH_SIZE)
            .filter(|size| *size > 0)
            .unwrap_or(i64::MAX);
        info!(?max_time, batch_size, "running aggregate");

        thread::spawn(move || {
            let started = Instant::now();
            for (index, document) in InMemoryAggregate::matching(&documents, &filter)
                .into_iter()
                .enumerate()
            {
                if max_time.is_some_and(|limit| started.elapsed() > limit) {
                    callback.on_error("operation exceeded time limit");
                    return;
                }
                if (index as i64 + 1) % batch_size == 0 {
                    debug!(index, "batch boundary");
                }
                if callback.on_next(document).is_break() {
                    return;
                }
            }
            callback.on_complete();
        });
    }
}
