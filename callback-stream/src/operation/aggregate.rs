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

//! Fluent aggregate facade.
//!
//! [`AggregateObservable`] owns one [`Operation`] and the [`StreamAdapter`]
//! its streams are built with. Setters validate their argument, record it in
//! the operation's options and hand back the same facade so calls chain:
//!
//! ```ignore
//! aggregate
//!     .allow_disk_use(true)
//!     .max_time(Duration::from_secs(5))?
//!     .batch_size(500)?;
//! let items = aggregate.to_item_stream();
//! ```
//!
//! Each terminal method freezes a copy of the options at the moment it is
//! called. Setters applied afterwards only affect streams created later; a
//! stream already handed out keeps running with the options it was built with,
//! on every subscription.

use crate::config::AggregateDefaults;
use crate::convert::multi::{convert_multi, ItemCallback};
use crate::convert::single::{convert_single, SingleResultCallback};
use crate::error::BridgeError;
use crate::observability::{events, fields};
use crate::observable::{BridgeStream, Subscription};
use crate::operation::executor::{AggregateExecutor, Operation};
use crate::operation::options::{
    OperationOptions, OptionValue, ALLOW_DISK_USE, BATCH_SIZE, BYPASS_DOCUMENT_VALIDATION,
    COLLATION, COMMENT, MAX_AWAIT_TIME, MAX_TIME, USE_CURSOR,
};
use crate::operation::success::{void_to_success, Success};
use crate::stream_adapter::StreamAdapter;
use crate::subscriber::Subscriber;
use std::time::Duration;
use tracing::{debug, warn};

const COMPONENT: &str = "aggregate_observable";

pub struct AggregateObservable<E> {
    operation: Operation<E>,
    adapter: StreamAdapter,
}

impl<E: AggregateExecutor> AggregateObservable<E> {
    pub fn new(operation: Operation<E>, adapter: StreamAdapter) -> Self {
        Self { operation, adapter }
    }

    pub fn options(&self) -> &OperationOptions {
        self.operation.options()
    }

    pub fn adapter(&self) -> &StreamAdapter {
        &self.adapter
    }

    /// Lets the backend spill intermediate pipeline stages to disk.
    pub fn allow_disk_use(&mut self, allow_disk_use: bool) -> &mut Self {
        self.set_known(ALLOW_DISK_USE, OptionValue::Bool(allow_disk_use))
    }

    pub fn use_cursor(&mut self, use_cursor: bool) -> &mut Self {
        self.set_known(USE_CURSOR, OptionValue::Bool(use_cursor))
    }

    pub fn bypass_document_validation(&mut self, bypass: bool) -> &mut Self {
        self.set_known(BYPASS_DOCUMENT_VALIDATION, OptionValue::Bool(bypass))
    }

    /// Server-side time limit for the whole operation.
    ///
    /// Fails for limits that do not fit in a signed 64-bit millisecond count.
    pub fn max_time(&mut self, max_time: Duration) -> Result<&mut Self, BridgeError> {
        self.set_duration(MAX_TIME, max_time)
    }

    /// Time limit for each wait on new results of a tailable cursor.
    pub fn max_await_time(&mut self, max_await_time: Duration) -> Result<&mut Self, BridgeError> {
        self.set_duration(MAX_AWAIT_TIME, max_await_time)
    }

    pub fn batch_size(&mut self, batch_size: u32) -> Result<&mut Self, BridgeError> {
        if batch_size == 0 {
            return Err(self.reject(BATCH_SIZE, "batch size must be greater than zero"));
        }
        Ok(self.set_known(BATCH_SIZE, OptionValue::from(batch_size)))
    }

    pub fn comment(&mut self, comment: impl Into<String>) -> Result<&mut Self, BridgeError> {
        let comment = comment.into();
        if comment.trim().is_empty() {
            return Err(self.reject(COMMENT, "comment must not be blank"));
        }
        Ok(self.set_known(COMMENT, OptionValue::Text(comment)))
    }

    /// Language-specific string comparison rules, as a JSON object.
    pub fn collation(&mut self, collation: serde_json::Value) -> Result<&mut Self, BridgeError> {
        if !collation.is_object() {
            return Err(self.reject(COLLATION, "collation must be a JSON object"));
        }
        Ok(self.set_known(COLLATION, OptionValue::Document(collation)))
    }

    /// Sets an option this facade has no dedicated setter for.
    pub fn option(
        &mut self,
        name: impl Into<String>,
        value: impl Into<OptionValue>,
    ) -> Result<&mut Self, BridgeError> {
        let name = name.into();
        if let Err(err) = self.operation.with_option(name.as_str(), value) {
            warn!(
                event = events::OPTION_REJECTED,
                component = COMPONENT,
                option = name.as_str(),
                err = %err,
                "option rejected"
            );
            return Err(err);
        }
        debug!(
            event = events::OPTION_SET,
            component = COMPONENT,
            option = name.as_str(),
            "option set"
        );
        Ok(self)
    }

    /// Applies every default that is present. Stops at the first invalid one.
    pub fn apply_defaults(&mut self, defaults: &AggregateDefaults) -> Result<&mut Self, BridgeError> {
        if let Some(allow_disk_use) = defaults.allow_disk_use {
            self.allow_disk_use(allow_disk_use);
        }
        if let Some(max_time_ms) = defaults.max_time_ms {
            self.max_time(Duration::from_millis(max_time_ms))?;
        }
        if let Some(batch_size) = defaults.batch_size {
            self.batch_size(batch_size)?;
        }
        Ok(self)
    }

    /// Runs the pipeline for its side effect and yields one [`Success`] when
    /// the backend reports completion.
    pub fn to_single_result_stream(&self) -> BridgeStream<Success> {
        let options = self.operation.snapshot();
        let executor = self.operation.executor().clone();
        convert_single(&self.adapter, move |callback: SingleResultCallback<Success>| {
            executor.run_single(&options, callback.adapt(void_to_success))
        })
    }

    /// Same as [`to_single_result_stream`](Self::to_single_result_stream).
    pub fn to_collection(&self) -> BridgeStream<Success> {
        self.to_single_result_stream()
    }

    /// Yields the pipeline output item by item.
    pub fn to_item_stream(&self) -> BridgeStream<E::Item> {
        let options = self.operation.snapshot();
        let executor = self.operation.executor().clone();
        convert_multi(&self.adapter, move |callback: ItemCallback<E::Item>| {
            executor.run_multi(&options, callback)
        })
    }

    pub fn subscribe<S>(&self, subscriber: S) -> Subscription
    where
        S: Subscriber<E::Item>,
    {
        self.to_item_stream().subscribe(subscriber)
    }

    fn set_duration(&mut self, name: &'static str, value: Duration) -> Result<&mut Self, BridgeError> {
        if value.as_millis() > i64::MAX as u128 {
            return Err(self.reject(name, "duration exceeds i64::MAX milliseconds"));
        }
        debug!(
            event = events::OPTION_SET,
            component = COMPONENT,
            option = name,
            value = fields::format_duration(value).as_str(),
            "option set"
        );
        self.operation.set_known(name, OptionValue::Duration(value));
        Ok(self)
    }

    fn set_known(&mut self, name: &'static str, value: OptionValue) -> &mut Self {
        debug!(
            event = events::OPTION_SET,
            component = COMPONENT,
            option = name,
            value = ?value,
            "option set"
        );
        self.operation.set_known(name, value);
        self
    }

    fn reject(&self, name: &'static str, reason: &str) -> BridgeError {
        warn!(
            event = events::OPTION_REJECTED,
            component = COMPONENT,
            option = name,
            reason,
            "option rejected"
        );
        BridgeError::configuration(name, reason)
    }
}
