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

//! Process-wide runtime backing [`DeliveryPolicy::SharedRuntime`].
//!
//! [`DeliveryPolicy::SharedRuntime`]: crate::DeliveryPolicy::SharedRuntime

use lazy_static::lazy_static;
use tokio::runtime::{Handle, Runtime};

const SHARED_DELIVERY_RUNTIME_THREADS: usize = 2;
const SHARED_DELIVERY_RUNTIME_THREAD_NAME: &str = "cb-delivery";

lazy_static! {
    static ref SHARED_DELIVERY_RUNTIME: Runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(SHARED_DELIVERY_RUNTIME_THREADS)
        .thread_name(SHARED_DELIVERY_RUNTIME_THREAD_NAME)
        .enable_all()
        .build()
        .expect("Unable to create shared delivery runtime");
}

pub(crate) fn shared_handle() -> Handle {
    SHARED_DELIVERY_RUNTIME.handle().clone()
}
