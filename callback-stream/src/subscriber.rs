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

//! Consumer-side protocol: `next* (complete | error)?`.

use crate::error::BridgeError;
use crate::observability::events;
use tracing::error;

const COMPONENT: &str = "subscriber";

/// One event of the next/complete/error protocol.
#[derive(Debug)]
pub enum Signal<T> {
    Next(T),
    Error(BridgeError),
    Complete,
}

impl<T> Signal<T> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Signal::Next(_))
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Signal::Next(_) => "next",
            Signal::Error(_) => "error",
            Signal::Complete => "complete",
        }
    }
}

/// Receives the events of one subscription.
///
/// At most one of `on_error` / `on_complete` is ever called, and nothing is
/// called after it.
pub trait Subscriber<T>: Send + 'static {
    fn on_next(&mut self, item: T);

    /// Called when the subscription fails. The default surfaces the error as an
    /// unhandled stream error in the log.
    fn on_error(&mut self, err: BridgeError) {
        error!(
            event = events::UNHANDLED_STREAM_ERROR,
            component = COMPONENT,
            err = %err,
            "stream error reached a subscriber without an error handler"
        );
    }

    fn on_complete(&mut self) {}
}

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type ErrorFn = Box<dyn FnMut(BridgeError) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;

/// Closure-backed [`Subscriber`]; see [`subscriber_fn`].
pub struct FnSubscriber<T> {
    on_next: NextFn<T>,
    on_error: Option<ErrorFn>,
    on_complete: Option<CompleteFn>,
}

/// Builds a subscriber from an item handler, with optional error and
/// completion handlers.
///
/// ```
/// use callback_stream::subscriber_fn;
///
/// let _subscriber = subscriber_fn(|item: u32| println!("{item}"))
///     .on_error(|err| eprintln!("{err}"))
///     .on_complete(|| println!("done"));
/// ```
pub fn subscriber_fn<T, F>(on_next: F) -> FnSubscriber<T>
where
    F: FnMut(T) + Send + 'static,
{
    FnSubscriber {
        on_next: Box::new(on_next),
        on_error: None,
        on_complete: None,
    }
}

impl<T> FnSubscriber<T> {
    pub fn on_error<F>(mut self, on_error: F) -> Self
    where
        F: FnMut(BridgeError) + Send + 'static,
    {
        self.on_error = Some(Box::new(on_error));
        self
    }

    pub fn on_complete<F>(mut self, on_complete: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.on_complete = Some(Box::new(on_complete));
        self
    }
}

impl<T: 'static> Subscriber<T> for FnSubscriber<T> {
    fn on_next(&mut self, item: T) {
        (self.on_next)(item);
    }

    fn on_error(&mut self, err: BridgeError) {
        match self.on_error.as_mut() {
            Some(handler) => handler(err),
            None => error!(
                event = events::UNHANDLED_STREAM_ERROR,
                component = COMPONENT,
                err = %err,
                "stream error reached a subscriber without an error handler"
            ),
        }
    }

    fn on_complete(&mut self) {
        if let Some(handler) = self.on_complete.as_mut() {
            handler();
        }
    }
}

/// Routes one signal to the matching subscriber method.
pub(crate) fn dispatch<T: 'static>(subscriber: &mut dyn Subscriber<T>, signal: Signal<T>) {
    match signal {
        Signal::Next(item) => subscriber.on_next(item),
        Signal::Error(err) => subscriber.on_error(err),
        Signal::Complete => subscriber.on_complete(),
    }
}

#[cfg(test)]
mod tests {
    use super::{dispatch, subscriber_fn, Signal, Subscriber};
    use crate::error::BridgeError;
    use std::sync::{Arc, Mutex};

    #[test]
    fn fn_subscriber_routes_each_signal() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (next_seen, error_seen, complete_seen) = (seen.clone(), seen.clone(), seen.clone());

        let mut subscriber = subscriber_fn(move |item: u8| {
            next_seen.lock().unwrap().push(format!("next({item})"))
        })
        .on_error(move |err| error_seen.lock().unwrap().push(format!("error({err})")))
        .on_complete(move || complete_seen.lock().unwrap().push("complete".to_string()));

        dispatch(&mut subscriber, Signal::Next(7));
        dispatch(&mut subscriber, Signal::Complete);
        Subscriber::on_error(&mut subscriber, BridgeError::consumer("late"));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "next(7)".to_string(),
                "complete".to_string(),
                "error(consumer handler failed: late)".to_string()
            ]
        );
    }

    #[test]
    fn subscriber_without_error_handler_does_not_panic() {
        let mut subscriber = subscriber_fn(|_: u8| {});

        Subscriber::on_error(&mut subscriber, BridgeError::upstream("unhandled"));
    }

    #[test]
    fn only_next_is_non_terminal() {
        assert!(!Signal::Next(1).is_terminal());
        assert!(Signal::<u8>::Complete.is_terminal());
        assert!(Signal::<u8>::Error(BridgeError::consumer("x")).is_terminal());
    }
}
