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

//! Canonical structured event names used across `callback-stream`.

// Subscription lifecycle events.
pub const SUBSCRIBE: &str = "subscribe";
pub const SUBSCRIPTION_CANCEL: &str = "subscription_cancel";
pub const UPSTREAM_INVOKE: &str = "upstream_invoke";
pub const UPSTREAM_INVOKE_PANICKED: &str = "upstream_invoke_panicked";

// Signal gating events.
pub const SIGNAL_DROPPED_CANCELLED: &str = "signal_dropped_cancelled";
pub const SIGNAL_DROPPED_TERMINATED: &str = "signal_dropped_terminated";
pub const DUPLICATE_TERMINAL_SIGNAL: &str = "duplicate_terminal_signal";
pub const CALLBACK_DROPPED_UNFIRED: &str = "callback_dropped_unfired";

// Consumer-side events.
pub const CONSUMER_HANDLER_PANICKED: &str = "consumer_handler_panicked";
pub const CONSUMER_TRANSFORM_FAILED: &str = "consumer_transform_failed";
pub const UNHANDLED_STREAM_ERROR: &str = "unhandled_stream_error";

// Delivery loop events.
pub const DELIVERY_LOOP_START: &str = "delivery_loop_start";
pub const DELIVERY_LOOP_CLOSED: &str = "delivery_loop_closed";
pub const DELIVERY_LOOP_LOST: &str = "delivery_loop_lost";
pub const DELIVERY_QUEUE_CLOSED: &str = "delivery_queue_closed";

// Runtime events.
pub const RUNTIME_SPAWN_START: &str = "runtime_spawn_start";
pub const RUNTIME_SPAWN_OK: &str = "runtime_spawn_ok";
pub const RUNTIME_SPAWN_FAILED: &str = "runtime_spawn_failed";

// Facade events.
pub const ADAPTER_CONFIGURED: &str = "adapter_configured";
pub const OPTION_SET: &str = "option_set";
pub const OPTION_REJECTED: &str = "option_rejected";
