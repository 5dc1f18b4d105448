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

//! Configurable operations and the aggregate facade built on them.

pub(crate) mod aggregate;
pub(crate) mod executor;
pub mod options;
pub(crate) mod success;

pub use aggregate::AggregateObservable;
pub use executor::{AggregateExecutor, Operation};
pub use options::{OperationOptions, OptionValue};
pub use success::{void_to_success, Success};
