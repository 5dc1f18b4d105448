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

//! Runtime helper for spawning dedicated delivery threads.

use crate::observability::{events, fields};
use std::io;
use std::thread;
use tokio::runtime::Builder;
use tracing::{debug, error};

const COMPONENT: &str = "worker_runtime";

/// Linux truncates thread names above this many bytes.
pub(crate) const THREAD_NAME_MAX_LEN: usize = 15;

/// Runs `run_loop` to completion on a new named thread that owns a
/// current-thread Tokio runtime.
pub(crate) fn spawn_delivery_thread<F, Fut>(
    thread_name: &str,
    run_loop: F,
) -> io::Result<thread::JoinHandle<()>>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()>,
{
    debug!(
        event = events::RUNTIME_SPAWN_START,
        component = COMPONENT,
        worker_thread = thread_name,
        "spawning dedicated delivery thread"
    );

    let handle = thread::Builder::new()
        .name(thread_name.to_string())
        .spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!(
                        event = events::RUNTIME_SPAWN_FAILED,
                        component = COMPONENT,
                        worker_thread = fields::current_thread_name_or_default().as_str(),
                        err = %err,
                        "unable to build delivery runtime"
                    );
                    return;
                }
            };

            runtime.block_on(run_loop());
        })?;

    debug!(
        event = events::RUNTIME_SPAWN_OK,
        component = COMPONENT,
        worker_thread = thread_name,
        "dedicated delivery thread started"
    );
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::spawn_delivery_thread;

    #[test]
    fn runs_loop_on_named_thread() {
        let handle = spawn_delivery_thread("cb-test-worker", || async {
            assert_eq!(std::thread::current().name(), Some("cb-test-worker"));
        })
        .expect("thread should spawn");

        handle.join().expect("loop should not panic");
    }
}
