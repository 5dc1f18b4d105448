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

//! Option mapping carried by an [`Operation`](super::Operation).

use crate::error::BridgeError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub const ALLOW_DISK_USE: &str = "allow_disk_use";
pub const MAX_TIME: &str = "max_time";
pub const MAX_AWAIT_TIME: &str = "max_await_time";
pub const USE_CURSOR: &str = "use_cursor";
pub const BYPASS_DOCUMENT_VALIDATION: &str = "bypass_document_validation";
pub const BATCH_SIZE: &str = "batch_size";
pub const COMMENT: &str = "comment";
pub const COLLATION: &str = "collation";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Duration(Duration),
    Text(String),
    Document(serde_json::Value),
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<Duration> for OptionValue {
    fn from(value: Duration) -> Self {
        Self::Duration(value)
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<serde_json::Value> for OptionValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Document(value)
    }
}

/// Option name to value, iterated in name order.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct OperationOptions {
    values: BTreeMap<String, OptionValue>,
}

impl OperationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, replacing any previous value.
    pub fn with_option(
        &mut self,
        name: impl Into<String>,
        value: impl Into<OptionValue>,
    ) -> Result<&mut Self, BridgeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BridgeError::configuration("option", "option name must not be empty"));
        }
        self.values.insert(name, value.into());
        Ok(self)
    }

    pub(crate) fn set_known(&mut self, name: &'static str, value: OptionValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            OptionValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            OptionValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn get_duration(&self, name: &str) -> Option<Duration> {
        match self.get(name)? {
            OptionValue::Duration(value) => Some(*value),
            _ => None,
        }
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            OptionValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_document(&self, name: &str) -> Option<&serde_json::Value> {
        match self.get(name)? {
            OptionValue::Document(value) => Some(value),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn later_value_replaces_earlier() {
        let mut options = OperationOptions::new();
        options
            .with_option(ALLOW_DISK_USE, true)
            .unwrap()
            .with_option(ALLOW_DISK_USE, false)
            .unwrap();

        assert_eq!(options.len(), 1);
        assert_eq!(options.get_bool(ALLOW_DISK_USE), Some(false));
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut options = OperationOptions::new();
        let err = options.with_option("  ", 1i64).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(options.is_empty());
    }

    #[test]
    fn typed_getters_ignore_mismatched_values() {
        let mut options = OperationOptions::new();
        options
            .with_option(MAX_TIME, Duration::from_secs(5))
            .unwrap()
            .with_option(COMMENT, "nightly rollup")
            .unwrap();

        assert_eq!(options.get_duration(MAX_TIME), Some(Duration::from_secs(5)));
        assert_eq!(options.get_bool(MAX_TIME), None);
        assert_eq!(options.get_text(COMMENT), Some("nightly rollup"));
        assert_eq!(options.get_int(BATCH_SIZE), None);
    }

    #[test]
    fn iterates_in_name_order() {
        let mut options = OperationOptions::new();
        options
            .with_option(USE_CURSOR, true)
            .unwrap()
            .with_option(BATCH_SIZE, 10u32)
            .unwrap();

        let names: Vec<_> = options.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec![BATCH_SIZE, USE_CURSOR]);
    }
}
