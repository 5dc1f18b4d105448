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

//! Canonical structured field keys and value-format helpers.

use std::time::Duration;

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const SUBSCRIPTION_ID: &str = "subscription_id";
pub const DELIVERY: &str = "delivery";
pub const WORKER_THREAD: &str = "worker_thread";
pub const SIGNAL: &str = "signal";
pub const OPTION: &str = "option";
pub const REASON: &str = "reason";
pub const ERR: &str = "err";

pub const NONE: &str = "none";
pub const REASON_CANCELLED: &str = "cancelled";
pub const REASON_TERMINATED: &str = "terminated";
pub const REASON_QUEUE_CLOSED: &str = "queue_closed";
pub const DEFAULT_WORKER_THREAD: &str = "unknown-thread";

pub fn thread_name_or_default(thread_name: Option<&str>) -> String {
    thread_name.unwrap_or(DEFAULT_WORKER_THREAD).to_string()
}

pub fn current_thread_name_or_default() -> String {
    thread_name_or_default(std::thread::current().name())
}

/// Milliseconds with a unit suffix, the form used in option log lines.
pub fn format_duration(duration: Duration) -> String {
    format!("{}ms", duration.as_millis())
}

pub fn format_optional(value: Option<&str>) -> String {
    value.unwrap_or(NONE).to_string()
}
