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

use crate::convert::multi::ItemCallback;
use crate::convert::single::SingleResultCallback;
use crate::error::BridgeError;
use crate::operation::options::{OperationOptions, OptionValue};
use std::sync::Arc;

/// Callback-driven backend that runs an aggregation.
///
/// Both methods must report through the handle they receive: one result for
/// [`run_single`](Self::run_single), items followed by one terminal call for
/// [`run_multi`](Self::run_multi). Either may return before reporting.
pub trait AggregateExecutor: Send + Sync + 'static {
    type Item: Send + 'static;

    /// Runs the pipeline writing its output server-side. Reports no value.
    fn run_single(&self, options: &OperationOptions, callback: SingleResultCallback<()>);

    /// Runs the pipeline and reports its output item by item.
    fn run_multi(&self, options: &OperationOptions, callback: ItemCallback<Self::Item>);
}

/// One configured request: its options and the executor that will run it.
pub struct Operation<E> {
    options: OperationOptions,
    executor: Arc<E>,
}

impl<E: AggregateExecutor> Operation<E> {
    pub fn new(executor: Arc<E>) -> Self {
        Self {
            options: OperationOptions::new(),
            executor,
        }
    }

    pub fn with_options(executor: Arc<E>, options: OperationOptions) -> Self {
        Self { options, executor }
    }

    pub fn with_option(
        &mut self,
        name: impl Into<String>,
        value: impl Into<OptionValue>,
    ) -> Result<&mut Self, BridgeError> {
        self.options.with_option(name, value)?;
        Ok(self)
    }

    pub(crate) fn set_known(&mut self, name: &'static str, value: OptionValue) {
        self.options.set_known(name, value);
    }

    pub fn options(&self) -> &OperationOptions {
        &self.options
    }

    pub fn executor(&self) -> &Arc<E> {
        &self.executor
    }

    /// Copy of the current options, frozen for one production entry point.
    pub(crate) fn snapshot(&self) -> Arc<OperationOptions> {
        Arc::new(self.options.clone())
    }
}
