// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `IntersectionObserver`-backed subscription.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use js_sys::Array;
use sightline_core::{
    BatchCallback, ClientRect, IntersectionRecord, Subscription, SubscriptionInit, TrackerError,
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    DomRectReadOnly, Element, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit,
};

type ObserverCallback = Closure<dyn FnMut(Array, IntersectionObserver)>;

/// A live `IntersectionObserver` plus the closure it calls.
///
/// Dropping the subscription disconnects the observer before releasing the
/// closure, so the browser never calls into freed memory.
pub struct WebSubscription {
    observer: IntersectionObserver,
    _callback: ObserverCallback,
}

impl WebSubscription {
    pub(crate) fn new(
        init: SubscriptionInit<'_, Element>,
        mut on_batch: BatchCallback<Element>,
    ) -> Result<Self, TrackerError> {
        let callback = ObserverCallback::new(move |entries: Array, _: IntersectionObserver| {
            let records: Vec<IntersectionRecord<Element>> = entries
                .iter()
                .map(|entry| record_from_entry(&entry.unchecked_into()))
                .collect();
            on_batch(&records);
        });

        let options = IntersectionObserverInit::new();
        options.set_root(init.root);
        options.set_root_margin(init.root_margin);
        let thresholds: Array = init
            .thresholds
            .iter()
            .map(|t| JsValue::from_f64(*t))
            .collect();
        options.set_threshold(&thresholds);

        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)
                .map_err(rejected)?;
        Ok(Self {
            observer,
            _callback: callback,
        })
    }

    /// The underlying observer.
    #[must_use]
    pub fn observer(&self) -> &IntersectionObserver {
        &self.observer
    }
}

impl Subscription<Element> for WebSubscription {
    fn observe(&self, target: &Element) {
        self.observer.observe(target);
    }

    fn unobserve(&self, target: &Element) {
        self.observer.unobserve(target);
    }

    fn disconnect(&self) {
        self.observer.disconnect();
    }
}

impl Drop for WebSubscription {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

impl fmt::Debug for WebSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSubscription")
            .field("root_margin", &self.observer.root_margin())
            .finish_non_exhaustive()
    }
}

fn record_from_entry(entry: &IntersectionObserverEntry) -> IntersectionRecord<Element> {
    IntersectionRecord::new(entry.target(), entry.intersection_ratio())
        .with_rect(client_rect(&entry.bounding_client_rect()))
}

fn client_rect(rect: &DomRectReadOnly) -> ClientRect {
    ClientRect {
        x: rect.x(),
        y: rect.y(),
        width: rect.width(),
        height: rect.height(),
        top: rect.top(),
        right: rect.right(),
        bottom: rect.bottom(),
        left: rect.left(),
    }
}

/// Maps a thrown JS value (usually a `SyntaxError` for a bad `rootMargin`)
/// into a tracker error.
fn rejected(err: JsValue) -> TrackerError {
    let message = err
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    TrackerError::SubscriptionRejected(message)
}
