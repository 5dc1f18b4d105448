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

use callback_stream::{AggregateObservable, Operation, StreamAdapter};
use integration_test_utils::ScriptedAggregate;
use std::sync::Arc;
use std::time::Duration;

#[allow(dead_code)]
pub(crate) const TERMINAL_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) fn make_aggregate(
    executor: ScriptedAggregate,
    adapter: StreamAdapter,
) -> (AggregateObservable<ScriptedAggregate>, Arc<ScriptedAggregate>) {
    let executor = Arc::new(executor);
    let aggregate = AggregateObservable::new(Operation::new(executor.clone()), adapter);
    (aggregate, executor)
}
