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

//! Error taxonomy shared by the adapter, the converters and the facade.

use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Boxed failure reported by a callback-driven collaborator.
pub type UpstreamFailure = Box<dyn StdError + Send + Sync + 'static>;

/// Coarse classification of a [`BridgeError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// A setter or policy rejected its argument.
    InvalidArgument,
    /// The underlying operation reported a failure.
    Upstream,
    /// A consumer handler or transformation failed.
    Consumer,
    /// A configuration file could not be read or parsed.
    Config,
}

#[derive(Clone, Debug, Error)]
pub enum BridgeError {
    #[error("invalid value for `{option}`: {reason}")]
    Configuration { option: String, reason: String },

    #[error("upstream operation failed: {0}")]
    Upstream(#[source] Arc<dyn StdError + Send + Sync + 'static>),

    #[error("consumer handler failed: {0}")]
    Consumer(String),

    #[error("unable to load configuration: {0}")]
    Config(String),
}

impl BridgeError {
    pub fn configuration(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            option: option.into(),
            reason: reason.into(),
        }
    }

    /// Wraps any collaborator failure, including plain strings.
    ///
    /// ```
    /// use callback_stream::{BridgeError, ErrorKind};
    ///
    /// let err = BridgeError::upstream("connection reset");
    /// assert_eq!(err.kind(), ErrorKind::Upstream);
    /// assert_eq!(err.to_string(), "upstream operation failed: connection reset");
    /// ```
    pub fn upstream(failure: impl Into<UpstreamFailure>) -> Self {
        Self::Upstream(Arc::from(failure.into()))
    }

    pub fn consumer(reason: impl Into<String>) -> Self {
        Self::Consumer(reason.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::InvalidArgument,
            Self::Upstream(_) => ErrorKind::Upstream,
            Self::Consumer(_) => ErrorKind::Consumer,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

/// Renders a caught panic payload for a consumer or upstream error message.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{panic_message, BridgeError, ErrorKind};
    use std::error::Error;

    #[test]
    fn configuration_error_names_option_and_reason() {
        let err = BridgeError::configuration("batch_size", "must be greater than zero");

        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            err.to_string(),
            "invalid value for `batch_size`: must be greater than zero"
        );
    }

    #[test]
    fn upstream_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
        let err = BridgeError::upstream(io);

        let source = err.source().expect("upstream errors carry their source");
        assert_eq!(source.to_string(), "connection reset");
    }

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        let static_payload = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        let owned_payload =
            std::panic::catch_unwind(|| panic!("{}", String::from("owned boom"))).unwrap_err();

        assert_eq!(panic_message(static_payload.as_ref()), "boom");
        assert_eq!(panic_message(owned_payload.as_ref()), "owned boom");
    }
}
