// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `setTimeout`-based deferred execution.

use alloc::boxed::Box;
use core::time::Duration;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

// Global binding instead of `web_sys::Window::set_timeout_*` so deferral also
// works in workers, where there is no `Window`.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(handler: &JsValue, timeout: i32) -> i32;
}

/// Runs `task` once after at least `delay`. The returned timer id is dropped:
/// deferred tasks are never cancelled.
pub(crate) fn defer(delay: Duration, task: Box<dyn FnOnce()>) {
    // Browsers clamp larger delays to 0, so saturate instead of wrapping.
    let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
    let handler = Closure::once_into_js(move || task());
    set_timeout(&handler, millis);
}
