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

//! Signal gating for one subscription.
//!
//! Every producer-side signal passes through [`SubscriptionCore::signal`], which
//! enforces "nothing after cancellation" and "at most one terminal signal" before
//! handing the signal to the outlet chosen by the delivery policy.

use crate::delivery::state::SubscriptionState;
use crate::error::{panic_message, BridgeError};
use crate::observability::events;
use crate::subscriber::{dispatch, Signal, Subscriber};
use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

const COMPONENT: &str = "subscription_core";

pub(crate) type BoxedSubscriber<T> = Box<dyn Subscriber<T>>;

/// Producer-facing side of a subscription.
pub(crate) trait SignalSink<T>: Send + Sync {
    fn signal(&self, signal: Signal<T>) -> ControlFlow<()>;

    fn is_open(&self) -> bool;
}

/// Handle a producer uses to push signals into one subscription.
///
/// Cloning is cheap; every clone feeds the same subscription.
pub struct Emitter<T> {
    sink: Arc<dyn SignalSink<T>>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            sink: self.sink.clone(),
        }
    }
}

impl<T: Send + 'static> Emitter<T> {
    pub(crate) fn new(sink: Arc<dyn SignalSink<T>>) -> Self {
        Self { sink }
    }

    /// Pushes one signal. `Break` means the subscription no longer wants items.
    pub fn emit(&self, signal: Signal<T>) -> ControlFlow<()> {
        self.sink.signal(signal)
    }

    pub fn next(&self, item: T) -> ControlFlow<()> {
        self.emit(Signal::Next(item))
    }

    pub fn error(&self, err: BridgeError) {
        let _ = self.emit(Signal::Error(err));
    }

    pub fn complete(&self) {
        let _ = self.emit(Signal::Complete);
    }

    /// `true` once the subscription was cancelled or has terminated.
    pub fn is_closed(&self) -> bool {
        !self.sink.is_open()
    }
}

enum Outlet<T: 'static> {
    Inline {
        pending: VecDeque<Signal<T>>,
        draining: bool,
        subscriber: Arc<Mutex<BoxedSubscriber<T>>>,
    },
    Queued(UnboundedSender<Signal<T>>),
}

pub(crate) struct SubscriptionCore<T: 'static> {
    state: Arc<SubscriptionState>,
    outlet: Mutex<Outlet<T>>,
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Send + 'static> SubscriptionCore<T> {
    /// Delivers on whichever thread emits, serialized through a pending queue so
    /// re-entrant or concurrent emits never interleave handler calls.
    pub(crate) fn inline(state: Arc<SubscriptionState>, subscriber: BoxedSubscriber<T>) -> Self {
        Self {
            state,
            outlet: Mutex::new(Outlet::Inline {
                pending: VecDeque::new(),
                draining: false,
                subscriber: Arc::new(Mutex::new(subscriber)),
            }),
        }
    }

    /// Hands signals to a delivery loop running elsewhere.
    pub(crate) fn queued(state: Arc<SubscriptionState>, sender: UnboundedSender<Signal<T>>) -> Self {
        Self {
            state,
            outlet: Mutex::new(Outlet::Queued(sender)),
        }
    }

    fn admit(&self, signal: &Signal<T>) -> bool {
        let subscription_id = self.state.id();

        if self.state.is_cancelled() {
            debug!(
                event = events::SIGNAL_DROPPED_CANCELLED,
                component = COMPONENT,
                subscription_id,
                signal = signal.label(),
                "dropping signal for cancelled subscription"
            );
            return false;
        }

        if signal.is_terminal() {
            if !self.state.try_terminate() {
                warn!(
                    event = events::DUPLICATE_TERMINAL_SIGNAL,
                    component = COMPONENT,
                    subscription_id,
                    signal = signal.label(),
                    "ignoring duplicate terminal signal from upstream"
                );
                return false;
            }
        } else if self.state.is_terminated() {
            warn!(
                event = events::SIGNAL_DROPPED_TERMINATED,
                component = COMPONENT,
                subscription_id,
                signal = signal.label(),
                "ignoring item delivered after a terminal signal"
            );
            return false;
        }

        true
    }

    fn drain_inline(&self, subscriber: Arc<Mutex<BoxedSubscriber<T>>>) {
        loop {
            let next = {
                let mut outlet = lock(&self.outlet);
                let Outlet::Inline {
                    pending, draining, ..
                } = &mut *outlet
                else {
                    return;
                };
                match pending.pop_front() {
                    Some(signal) => signal,
                    None => {
                        *draining = false;
                        return;
                    }
                }
            };

            let mut subscriber = lock(&*subscriber);
            deliver_guarded(&self.state, subscriber.as_mut(), next);
        }
    }
}

impl<T: Send + 'static> SignalSink<T> for SubscriptionCore<T> {
    fn signal(&self, signal: Signal<T>) -> ControlFlow<()> {
        let drain = {
            let mut outlet = lock(&self.outlet);
            if !self.admit(&signal) {
                return ControlFlow::Break(());
            }

            match &mut *outlet {
                Outlet::Queued(sender) => {
                    if sender.send(signal).is_err() {
                        debug!(
                            event = events::DELIVERY_QUEUE_CLOSED,
                            component = COMPONENT,
                            subscription_id = self.state.id(),
                            "delivery loop is gone; cancelling subscription"
                        );
                        self.state.cancel();
                    }
                    None
                }
                Outlet::Inline {
                    pending,
                    draining,
                    subscriber,
                } => {
                    pending.push_back(signal);
                    if *draining {
                        None
                    } else {
                        *draining = true;
                        Some(subscriber.clone())
                    }
                }
            }
        };

        if let Some(subscriber) = drain {
            self.drain_inline(subscriber);
        }

        if self.state.is_open() {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    }

    fn is_open(&self) -> bool {
        self.state.is_open()
    }
}

impl<T: 'static> Drop for SubscriptionCore<T> {
    fn drop(&mut self) {
        if self.state.is_cancelled() || !self.state.try_terminate() {
            return;
        }

        warn!(
            event = events::CALLBACK_DROPPED_UNFIRED,
            component = COMPONENT,
            subscription_id = self.state.id(),
            "upstream released the subscription without a terminal signal"
        );
        let err = BridgeError::upstream("operation ended without a terminal signal");

        match self.outlet.get_mut().unwrap_or_else(PoisonError::into_inner) {
            Outlet::Queued(sender) => {
                let _ = sender.send(Signal::Error(err));
            }
            Outlet::Inline {
                pending,
                subscriber,
                ..
            } => {
                let mut subscriber = lock(&**subscriber);
                for signal in pending.drain(..) {
                    deliver_guarded(&self.state, subscriber.as_mut(), signal);
                }
                deliver_guarded(&self.state, subscriber.as_mut(), Signal::Error(err));
            }
        }
    }
}

/// Calls the subscriber for one admitted signal, isolating handler panics.
///
/// Returns `false` once the subscription must not receive anything else.
pub(crate) fn deliver_guarded<T: 'static>(
    state: &SubscriptionState,
    subscriber: &mut dyn Subscriber<T>,
    signal: Signal<T>,
) -> bool {
    if state.is_cancelled() {
        debug!(
            event = events::SIGNAL_DROPPED_CANCELLED,
            component = COMPONENT,
            subscription_id = state.id(),
            signal = signal.label(),
            "dropping queued signal for cancelled subscription"
        );
        return false;
    }

    let terminal = signal.is_terminal();
    let label = signal.label();
    let outcome = catch_unwind(AssertUnwindSafe(|| dispatch(&mut *subscriber, signal)));

    let Err(payload) = outcome else {
        return !terminal;
    };

    let message = panic_message(payload.as_ref());
    warn!(
        event = events::CONSUMER_HANDLER_PANICKED,
        component = COMPONENT,
        subscription_id = state.id(),
        signal = label,
        reason = message.as_str(),
        "subscriber handler panicked"
    );

    state.try_terminate();
    state.cancel();
    if !terminal {
        let err = BridgeError::consumer(format!("{label} handler panicked: {message}"));
        let _ = catch_unwind(AssertUnwindSafe(|| subscriber.on_error(err)));
    }
    false
}

#[cfg(test)]
mod tests {
    use super::{Emitter, SignalSink, SubscriptionCore};
    use crate::delivery::state::SubscriptionState;
    use crate::error::{BridgeError, ErrorKind};
    use crate::subscriber::{subscriber_fn, Signal};
    use std::ops::ControlFlow;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording_core(state: Arc<SubscriptionState>) -> (Arc<SubscriptionCore<u32>>, Log) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let (next_log, error_log, complete_log) = (log.clone(), log.clone(), log.clone());
        let subscriber = subscriber_fn(move |item: u32| {
            next_log.lock().unwrap().push(format!("next({item})"))
        })
        .on_error(move |err| error_log.lock().unwrap().push(format!("error({:?})", err.kind())))
        .on_complete(move || complete_log.lock().unwrap().push("complete".to_string()));

        (
            Arc::new(SubscriptionCore::inline(state, Box::new(subscriber))),
            log,
        )
    }

    #[test]
    fn second_terminal_signal_is_ignored() {
        let (core, log) = recording_core(SubscriptionState::new());

        assert_eq!(core.signal(Signal::Next(1)), ControlFlow::Continue(()));
        assert_eq!(core.signal(Signal::Complete), ControlFlow::Break(()));
        assert_eq!(
            core.signal(Signal::Error(BridgeError::upstream("late"))),
            ControlFlow::Break(())
        );
        assert_eq!(core.signal(Signal::Next(2)), ControlFlow::Break(()));

        assert_eq!(*log.lock().unwrap(), vec!["next(1)", "complete"]);
    }

    #[test]
    fn cancelled_subscription_receives_nothing() {
        let state = SubscriptionState::new();
        let (core, log) = recording_core(state.clone());

        state.cancel();

        assert_eq!(core.signal(Signal::Next(1)), ControlFlow::Break(()));
        assert_eq!(core.signal(Signal::Complete), ControlFlow::Break(()));
        drop(core);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn dropping_core_without_terminal_reports_upstream_error() {
        let (core, log) = recording_core(SubscriptionState::new());

        let _ = core.signal(Signal::Next(5));
        drop(core);

        assert_eq!(*log.lock().unwrap(), vec!["next(5)", "error(Upstream)"]);
    }

    #[test]
    fn panicking_handler_becomes_consumer_error_and_stops_upstream() {
        let state = SubscriptionState::new();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let completions = Arc::new(Mutex::new(0));
        let (errors_seen, completions_seen) = (errors.clone(), completions.clone());
        let subscriber = subscriber_fn(|item: u32| {
            if item == 2 {
                panic!("cannot handle two");
            }
        })
        .on_error(move |err| errors_seen.lock().unwrap().push(err.kind()))
        .on_complete(move || *completions_seen.lock().unwrap() += 1);
        let emitter: Emitter<u32> = Emitter::new(Arc::new(SubscriptionCore::inline(
            state.clone(),
            Box::new(subscriber),
        )));

        assert_eq!(emitter.next(1), ControlFlow::Continue(()));
        assert_eq!(emitter.next(2), ControlFlow::Break(()));
        assert!(emitter.is_closed());
        emitter.complete();

        assert_eq!(*errors.lock().unwrap(), vec![ErrorKind::Consumer]);
        assert_eq!(*completions.lock().unwrap(), 0);
        assert!(state.is_cancelled());
    }

    #[test]
    fn reentrant_emit_is_delivered_after_current_handler() {
        let state = SubscriptionState::new();
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let slot: Arc<Mutex<Option<Emitter<u32>>>> = Arc::new(Mutex::new(None));
        let (handler_log, handler_slot) = (log.clone(), slot.clone());
        let subscriber = subscriber_fn(move |item: u32| {
            handler_log.lock().unwrap().push(format!("start({item})"));
            if item == 1 {
                let emitter = handler_slot.lock().unwrap().clone();
                if let Some(emitter) = emitter {
                    let _ = emitter.next(2);
                }
            }
            handler_log.lock().unwrap().push(format!("end({item})"));
        });
        let emitter: Emitter<u32> = Emitter::new(Arc::new(SubscriptionCore::inline(
            state,
            Box::new(subscriber),
        )));
        *slot.lock().unwrap() = Some(emitter.clone());

        let _ = emitter.next(1);

        assert_eq!(
            *log.lock().unwrap(),
            vec!["start(1)", "end(1)", "start(2)", "end(2)"]
        );
        slot.lock().unwrap().take();
    }
}
