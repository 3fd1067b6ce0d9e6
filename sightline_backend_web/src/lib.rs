// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for sightline.
//!
//! This crate connects a [`Tracker`] to browser APIs:
//!
//! - [`WebHost`]: feature detection, `querySelector`/`querySelectorAll`, and
//!   `setTimeout`-based deferral
//! - [`WebSubscription`]: one `IntersectionObserver` per tracker
//!
//! ```no_run
//! use sightline_backend_web::web_tracker;
//! use sightline_core::{TrackerConfig, WatchRequest, WatchedEntry};
//! use web_sys::Element;
//!
//! let tracker = web_tracker(TrackerConfig::default().with_thresholds([0.0, 0.5, 1.0]));
//! tracker.observe(
//!     WatchRequest::selector("img.lazy")
//!         .trigger_ratio(0.5)
//!         .on_visible(|entry: &WatchedEntry<Element>| {
//!             let _ = entry.element().set_attribute("data-seen", "");
//!         }),
//! );
//! ```

#![no_std]

extern crate alloc;

mod observer;
mod timer;

pub use observer::WebSubscription;
pub use sightline_core::Host;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::time::Duration;

use sightline_core::{BatchCallback, SubscriptionInit, Tracker, TrackerConfig, TrackerError};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element};

/// Browser [`Host`] bound to one document.
#[derive(Clone, Debug)]
pub struct WebHost {
    document: Option<Document>,
}

impl WebHost {
    /// Host for the current window's document.
    ///
    /// Outside a window (for example in a worker) there is no document, so
    /// every selector resolves to nothing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            document: web_sys::window().and_then(|w| w.document()),
        }
    }

    /// Host bound to an explicit document.
    #[must_use]
    pub fn with_document(document: Document) -> Self {
        Self {
            document: Some(document),
        }
    }

    /// The document selectors resolve against.
    #[must_use]
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }
}

impl Default for WebHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for WebHost {
    type Element = Element;
    type Subscription = WebSubscription;

    fn supports_intersection(&self) -> bool {
        js_sys::Reflect::has(
            &js_sys::global(),
            &JsValue::from_str("IntersectionObserver"),
        )
        .unwrap_or(false)
    }

    // Invalid selectors throw; they are treated as matching nothing.
    fn query_one(&self, selector: &str) -> Option<Element> {
        self.document.as_ref()?.query_selector(selector).ok().flatten()
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        let Some(list) = self
            .document
            .as_ref()
            .and_then(|doc| doc.query_selector_all(selector).ok())
        else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn create_subscription(
        &self,
        init: SubscriptionInit<'_, Element>,
        on_batch: BatchCallback<Element>,
    ) -> Result<WebSubscription, TrackerError> {
        WebSubscription::new(init, on_batch)
    }

    fn defer(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        timer::defer(delay, task);
    }
}

/// Creates a tracker over the current window's document.
#[must_use]
pub fn web_tracker(config: TrackerConfig) -> Tracker<WebHost> {
    Tracker::new(WebHost::new(), config)
}
