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

//! Delivery policy and the adapter that stamps it onto new streams.

use crate::config::{DeliveryConfig, DeliveryMode};
use crate::delivery::gate::Emitter;
use crate::error::BridgeError;
use crate::observability::{events, fields};
use crate::observable::BridgeStream;
use crate::runtime::worker_runtime::THREAD_NAME_MAX_LEN;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::debug;

const COMPONENT: &str = "stream_adapter";

pub(crate) const DEFAULT_DEDICATED_THREAD_NAME: &str = "cb-dedicated";

/// Where subscriber handlers run.
#[derive(Clone, Debug, Default)]
pub enum DeliveryPolicy {
    /// On whichever thread the upstream callback fires.
    #[default]
    Inline,
    /// On a lazily started process-wide runtime, one ordered loop per
    /// subscription.
    SharedRuntime,
    /// On a caller-provided runtime, one ordered loop per subscription.
    Handle(Handle),
    /// On a new named thread per subscription.
    DedicatedThread { thread_name: String },
}

impl DeliveryPolicy {
    pub fn dedicated_thread(thread_name: impl Into<String>) -> Self {
        Self::DedicatedThread {
            thread_name: thread_name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        let Self::DedicatedThread { thread_name } = self else {
            return Ok(());
        };

        if thread_name.trim().is_empty() {
            return Err(BridgeError::configuration("thread_name", "must not be empty"));
        }
        if thread_name.len() > THREAD_NAME_MAX_LEN {
            return Err(BridgeError::configuration(
                "thread_name",
                format!("must be at most {THREAD_NAME_MAX_LEN} bytes"),
            ));
        }
        if thread_name.contains('\0') {
            return Err(BridgeError::configuration("thread_name", "must not contain NUL bytes"));
        }
        Ok(())
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::SharedRuntime => "shared_runtime",
            Self::Handle(_) => "handle",
            Self::DedicatedThread { .. } => "dedicated_thread",
        }
    }
}

impl TryFrom<&DeliveryConfig> for DeliveryPolicy {
    type Error = BridgeError;

    fn try_from(config: &DeliveryConfig) -> Result<Self, Self::Error> {
        let policy = match config.mode {
            DeliveryMode::Inline => Self::Inline,
            DeliveryMode::SharedRuntime => Self::SharedRuntime,
            DeliveryMode::DedicatedThread => Self::dedicated_thread(
                config
                    .thread_name
                    .as_deref()
                    .unwrap_or(DEFAULT_DEDICATED_THREAD_NAME),
            ),
        };
        policy.validate()?;
        Ok(policy)
    }
}

/// Turns raw producers into [`BridgeStream`]s carrying one fixed
/// [`DeliveryPolicy`].
///
/// The policy is validated at construction and never changes afterwards; a
/// single stream can still override it with [`BridgeStream::deliver_on`].
///
/// ```
/// use callback_stream::{DeliveryPolicy, Emitter, StreamAdapter};
///
/// assert!(StreamAdapter::new(DeliveryPolicy::dedicated_thread("")).is_err());
///
/// let adapter = StreamAdapter::default();
/// let stream = adapter.create(|emitter: Emitter<u32>| {
///     let _ = emitter.next(1);
///     emitter.complete();
/// });
/// let subscription = stream.subscribe(callback_stream::subscriber_fn(|item: u32| {
///     assert_eq!(item, 1);
/// }));
/// assert!(subscription.is_terminated());
/// ```
#[derive(Clone, Debug, Default)]
pub struct StreamAdapter {
    policy: DeliveryPolicy,
}

impl StreamAdapter {
    pub fn new(policy: DeliveryPolicy) -> Result<Self, BridgeError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn from_config(config: &DeliveryConfig) -> Result<Self, BridgeError> {
        let policy = DeliveryPolicy::try_from(config)?;
        debug!(
            event = events::ADAPTER_CONFIGURED,
            component = COMPONENT,
            delivery = policy.label(),
            worker_thread = fields::format_optional(config.thread_name.as_deref()).as_str(),
            "stream adapter built from configuration"
        );
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &DeliveryPolicy {
        &self.policy
    }

    /// Wraps a producer that is invoked once per subscription with a fresh
    /// [`Emitter`].
    pub fn create<T, F>(&self, producer: F) -> BridgeStream<T>
    where
        T: Send + 'static,
        F: Fn(Emitter<T>) + Send + Sync + 'static,
    {
        BridgeStream::new(Arc::new(producer), self.policy.clone())
    }
}
