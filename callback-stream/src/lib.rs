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

//! # callback-stream
//!
//! `callback-stream` bridges callback-driven operations into cold, cancellable
//! reactive streams.
//!
//! Typical usage wraps a backend behind [`AggregateExecutor`], configures an
//! [`AggregateObservable`] and consumes one of its two production entry points.
//!
//! ## Item stream
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use callback_stream::{
//!     AggregateExecutor, AggregateObservable, ItemCallback, Operation, OperationOptions,
//!     SingleResultCallback, StreamAdapter,
//! };
//!
//! struct InMemory;
//!
//! impl AggregateExecutor for InMemory {
//!     type Item = u32;
//!
//!     fn run_single(&self, _options: &OperationOptions, callback: SingleResultCallback<()>) {
//!         callback.on_empty();
//!     }
//!
//!     fn run_multi(&self, _options: &OperationOptions, callback: ItemCallback<u32>) {
//!         for item in [1, 2, 3] {
//!             if callback.on_next(item).is_break() {
//!                 return;
//!             }
//!         }
//!         callback.on_complete();
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut aggregate =
//!     AggregateObservable::new(Operation::new(Arc::new(InMemory)), StreamAdapter::default());
//! aggregate
//!     .allow_disk_use(true)
//!     .max_time(Duration::from_secs(5))
//!     .unwrap();
//!
//! let items = aggregate.to_item_stream().to_stream().collect_items().await.unwrap();
//! assert_eq!(items, vec![1, 2, 3]);
//! # });
//! ```
//!
//! ## Delivery policies
//!
//! By default subscriber handlers run on whichever thread fires the upstream
//! callback. [`DeliveryPolicy`] moves delivery onto a shared runtime, a caller
//! runtime or a dedicated thread; every policy preserves per-subscription order
//! and delivers at most one terminal event.
//!
//! ## Internal architecture map
//!
//! - Adapter: `StreamAdapter` and `DeliveryPolicy`
//! - Converters: single-result and item-by-item callbacks to `BridgeStream`
//! - Delivery: per-subscription gate, ordered queue and drain loop
//! - Runtime: shared runtime and dedicated delivery threads
//! - Operation: option mapping, executor seam and the aggregate facade
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events and does not initialize a global subscriber.
//! Binaries and tests are responsible for one-time `tracing_subscriber`
//! initialization at process boundaries.

mod config;
pub use config::{AggregateDefaults, BridgeConfig, DeliveryConfig, DeliveryMode};

mod convert;
pub use convert::multi::{convert_multi, ItemCallback};
pub use convert::single::{convert_single, SingleResultCallback};

mod delivery;
pub use delivery::gate::Emitter;

mod error;
pub use error::{BridgeError, ErrorKind, UpstreamFailure};

#[doc(hidden)]
pub mod observability;

mod observable;
pub use observable::{BridgeStream, ItemStream, Subscription};

pub mod operation;
pub use operation::{
    void_to_success, AggregateExecutor, AggregateObservable, Operation, OperationOptions,
    OptionValue, Success,
};

mod runtime;

mod stream_adapter;
pub use stream_adapter::{DeliveryPolicy, StreamAdapter};

mod subscriber;
pub use subscriber::{subscriber_fn, FnSubscriber, Signal, Subscriber};
