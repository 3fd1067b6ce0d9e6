// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracker configuration and per-registration options.
//!
//! Malformed values are never rejected. Ratios are clamped into `[0, 1]` with
//! `NaN` mapping to `0`, and an empty threshold list falls back to `[0.0]`.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use core::time::Duration;

use crate::entry::{EntryCallback, WatchedEntry};

/// Clamps a ratio into `[0, 1]`. `NaN` becomes `0`.
#[must_use]
pub fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    }
}

/// Clamps every threshold, then sorts and de-duplicates the list.
#[must_use]
pub fn normalize_thresholds(thresholds: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = thresholds.iter().copied().map(clamp_ratio).collect();
    out.sort_by(f64::total_cmp);
    out.dedup();
    if out.is_empty() {
        out.push(0.0);
    }
    out
}

/// Construction options for a [`Tracker`](crate::tracker::Tracker).
#[derive(Clone, Debug, PartialEq)]
pub struct TrackerConfig {
    /// Selector for the containment element. `None`, or a selector that
    /// matches nothing, means the full viewport.
    pub root: Option<String>,
    /// Margin around the containment context, in CSS margin syntax.
    pub root_margin: String,
    /// Fractions at which the primitive emits notifications.
    pub thresholds: Vec<f64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::viewport()
    }
}

impl TrackerConfig {
    /// Full-viewport configuration: no root, `"0px"` margin, threshold `0`.
    #[must_use]
    pub fn viewport() -> Self {
        Self {
            root: None,
            root_margin: String::from("0px"),
            thresholds: vec![0.0],
        }
    }

    /// Sets the containment element selector.
    #[must_use]
    pub fn with_root(mut self, selector: impl Into<String>) -> Self {
        self.root = Some(selector.into());
        self
    }

    /// Sets the root margin.
    #[must_use]
    pub fn with_root_margin(mut self, margin: impl Into<String>) -> Self {
        self.root_margin = margin.into();
        self
    }

    /// Sets the notification thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: impl Into<Vec<f64>>) -> Self {
        self.thresholds = thresholds.into();
        self
    }
}

/// Per-registration behavior shared by every element in one
/// [`WatchRequest`].
pub struct WatchOptions<E> {
    /// Keep the entry after its first hide transition.
    pub keep_observing: bool,
    /// Fraction that separates hidden from visible. Clamped on registration.
    pub trigger_ratio: f64,
    /// Fire the visible callback on every hidden→visible edge instead of
    /// only the first one.
    pub always_trigger: bool,
    /// Delay per batch position before firing the visible callback.
    pub stagger: Duration,
    /// Called (after the stagger delay) when the entry becomes visible.
    pub on_visible: Option<EntryCallback<E>>,
    /// Called immediately when the entry becomes hidden.
    pub on_hidden: Option<EntryCallback<E>>,
}

impl<E> Default for WatchOptions<E> {
    fn default() -> Self {
        Self {
            keep_observing: false,
            trigger_ratio: 0.0,
            always_trigger: true,
            stagger: Duration::ZERO,
            on_visible: None,
            on_hidden: None,
        }
    }
}

impl<E> Clone for WatchOptions<E> {
    fn clone(&self) -> Self {
        Self {
            keep_observing: self.keep_observing,
            trigger_ratio: self.trigger_ratio,
            always_trigger: self.always_trigger,
            stagger: self.stagger,
            on_visible: self.on_visible.clone(),
            on_hidden: self.on_hidden.clone(),
        }
    }
}

impl<E> fmt::Debug for WatchOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchOptions")
            .field("keep_observing", &self.keep_observing)
            .field("trigger_ratio", &self.trigger_ratio)
            .field("always_trigger", &self.always_trigger)
            .field("stagger", &self.stagger)
            .field("on_visible", &self.on_visible.is_some())
            .field("on_hidden", &self.on_hidden.is_some())
            .finish()
    }
}

/// A registration passed to [`Tracker::observe`](crate::tracker::Tracker::observe).
///
/// Explicit elements win; the selector is only resolved when no elements were
/// given.
pub struct WatchRequest<E> {
    pub(crate) elements: Vec<E>,
    pub(crate) selector: Option<String>,
    pub(crate) options: WatchOptions<E>,
}

impl<E> fmt::Debug for WatchRequest<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRequest")
            .field("elements", &self.elements.len())
            .field("selector", &self.selector)
            .field("options", &self.options)
            .finish()
    }
}

impl<E> WatchRequest<E> {
    /// Watches the given elements.
    #[must_use]
    pub fn elements(elements: impl IntoIterator<Item = E>) -> Self {
        Self {
            elements: elements.into_iter().collect(),
            selector: None,
            options: WatchOptions::default(),
        }
    }

    /// Watches every element matching `selector` at registration time.
    #[must_use]
    pub fn selector(selector: impl Into<String>) -> Self {
        Self {
            elements: Vec::new(),
            selector: Some(selector.into()),
            options: WatchOptions::default(),
        }
    }

    /// Sets the fallback selector used when the element list is empty.
    #[must_use]
    pub fn or_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Replaces all options at once.
    #[must_use]
    pub fn with_options(mut self, options: WatchOptions<E>) -> Self {
        self.options = options;
        self
    }

    /// See [`WatchOptions::keep_observing`].
    #[must_use]
    pub fn keep_observing(mut self, keep: bool) -> Self {
        self.options.keep_observing = keep;
        self
    }

    /// See [`WatchOptions::trigger_ratio`].
    #[must_use]
    pub fn trigger_ratio(mut self, ratio: f64) -> Self {
        self.options.trigger_ratio = ratio;
        self
    }

    /// See [`WatchOptions::always_trigger`].
    #[must_use]
    pub fn always_trigger(mut self, always: bool) -> Self {
        self.options.always_trigger = always;
        self
    }

    /// See [`WatchOptions::stagger`].
    #[must_use]
    pub fn stagger(mut self, stagger: Duration) -> Self {
        self.options.stagger = stagger;
        self
    }

    /// See [`WatchOptions::on_visible`].
    #[must_use]
    pub fn on_visible(mut self, f: impl Fn(&WatchedEntry<E>) + 'static) -> Self {
        self.options.on_visible = Some(Rc::new(f));
        self
    }

    /// See [`WatchOptions::on_hidden`].
    #[must_use]
    pub fn on_hidden(mut self, f: impl Fn(&WatchedEntry<E>) + 'static) -> Self {
        self.options.on_hidden = Some(Rc::new(f));
        self
    }
}
