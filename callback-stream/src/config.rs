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

//! File-backed configuration: delivery policy and aggregate option defaults.

use crate::error::BridgeError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub aggregate: AggregateDefaults,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    #[serde(default)]
    pub mode: DeliveryMode,
    /// Only read for `dedicated_thread`.
    #[serde(default)]
    pub thread_name: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    #[default]
    Inline,
    SharedRuntime,
    DedicatedThread,
}

/// Options applied to every aggregate facade built by a caller that opts in.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AggregateDefaults {
    #[serde(default)]
    pub allow_disk_use: Option<bool>,
    #[serde(default)]
    pub max_time_ms: Option<u64>,
    #[serde(default)]
    pub batch_size: Option<u32>,
}

impl BridgeConfig {
    pub fn from_json5_str(contents: &str) -> Result<Self, BridgeError> {
        json5::from_str(contents).map_err(|err| BridgeError::Config(err.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|err| BridgeError::Config(format!("{}: {err}", path.display())))?;
        Self::from_json5_str(&contents)
    }
}
