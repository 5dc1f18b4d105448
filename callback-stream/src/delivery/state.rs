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

//! Flags shared by a subscription's producer side, delivery side and handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use uuid::Uuid;

pub(crate) struct SubscriptionState {
    id: String,
    cancelled: AtomicBool,
    terminated: AtomicBool,
    cancel_notify: Notify,
}

impl SubscriptionState {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4().to_string(),
            cancelled: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
            cancel_notify: Notify::new(),
        })
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    /// Returns `true` only for the call that performed the cancellation.
    pub(crate) fn cancel(&self) -> bool {
        let first = !self.cancelled.swap(true, Ordering::SeqCst);
        if first {
            self.cancel_notify.notify_one();
        }
        first
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Claims the single terminal slot; `false` means a terminal signal was
    /// already admitted.
    pub(crate) fn try_terminate(&self) -> bool {
        self.terminated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    pub(crate) fn is_open(&self) -> bool {
        !self.is_cancelled() && !self.is_terminated()
    }

    /// Resolves once the subscription is cancelled.
    pub(crate) async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.cancel_notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::SubscriptionState;
    use std::time::Duration;

    #[test]
    fn cancel_reports_first_caller_only() {
        let state = SubscriptionState::new();

        assert!(state.cancel());
        assert!(!state.cancel());
        assert!(state.is_cancelled());
        assert!(!state.is_open());
    }

    #[test]
    fn only_one_terminal_slot() {
        let state = SubscriptionState::new();

        assert!(state.try_terminate());
        assert!(!state.try_terminate());
        assert!(state.is_terminated());
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(SubscriptionState::new().id(), SubscriptionState::new().id());
    }

    #[tokio::test]
    async fn cancelled_resolves_when_cancel_races_the_wait() {
        let state = SubscriptionState::new();
        let waiter = state.clone();

        let handle = tokio::spawn(async move { waiter.cancelled().await });
        state.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("cancellation should wake the waiter")
            .expect("waiter task should not panic");
    }
}
