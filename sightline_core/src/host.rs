// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for platform integrations.
//!
//! A tracker never talks to a platform directly. Each backend crate provides a
//! [`Host`] that supplies three collaborators:
//!
//! - **Observation primitive** — [`Host::create_subscription`] builds the one
//!   [`Subscription`] a tracker owns and wires it to the tracker's
//!   [`BatchCallback`]. In a browser this is an `IntersectionObserver`.
//!
//! - **Lookup** — [`Host::query_one`] resolves the containment root and
//!   [`Host::query_all`] resolves registration selectors.
//!
//! - **Deferred execution** — [`Host::defer`] runs a task after at least the
//!   given delay. Tasks cannot be cancelled and carry no ordering guarantee
//!   beyond what the host's timer queue provides.
//!
//! # Crate boundaries
//!
//! `sightline_core` owns the entry model, option normalization, and the
//! notification handler. Backend crates depend on `sightline_core` and
//! provide platform glue; the `sightline_harness` crate provides a simulated
//! host for tests.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::time::Duration;

use crate::error::TrackerError;
use crate::geometry::ClientRect;

/// One raw observation delivered by the primitive.
#[derive(Clone, Debug, PartialEq)]
pub struct IntersectionRecord<E> {
    /// The observed element.
    pub target: E,
    /// Visible fraction of the target, in `[0, 1]`.
    pub intersection_ratio: f64,
    /// Geometry of the target at observation time.
    pub bounding_client_rect: ClientRect,
}

impl<E> IntersectionRecord<E> {
    /// Creates a record with an all-zero bounding box.
    #[must_use]
    pub fn new(target: E, intersection_ratio: f64) -> Self {
        Self {
            target,
            intersection_ratio,
            bounding_client_rect: ClientRect::ZERO,
        }
    }

    /// Attaches a bounding box.
    #[must_use]
    pub fn with_rect(mut self, rect: ClientRect) -> Self {
        self.bounding_client_rect = rect;
        self
    }
}

/// The entry point a subscription calls with each notification batch.
pub type BatchCallback<E> = Box<dyn FnMut(&[IntersectionRecord<E>])>;

/// Configuration passed to [`Host::create_subscription`].
#[derive(Clone, Copy, Debug)]
pub struct SubscriptionInit<'a, E> {
    /// Containment element, or `None` for the full viewport.
    pub root: Option<&'a E>,
    /// Margin around the containment context.
    pub root_margin: &'a str,
    /// Normalized notification thresholds.
    pub thresholds: &'a [f64],
}

/// A live connection to the observation primitive.
pub trait Subscription<E> {
    /// Starts reporting intersection changes for `target`.
    fn observe(&self, target: &E);

    /// Stops reporting for `target`.
    fn unobserve(&self, target: &E);

    /// Stops reporting for every target at once.
    fn disconnect(&self);
}

/// Everything a [`Tracker`](crate::tracker::Tracker) needs from its
/// environment.
pub trait Host: 'static {
    /// Element handle. `PartialEq` must compare by identity.
    type Element: Clone + PartialEq + 'static;

    /// Subscription type produced by [`create_subscription`](Self::create_subscription).
    type Subscription: Subscription<Self::Element> + 'static;

    /// Returns `true` if the observation primitive exists.
    fn supports_intersection(&self) -> bool;

    /// Resolves a selector to at most one element.
    fn query_one(&self, selector: &str) -> Option<Self::Element>;

    /// Resolves a selector to every matching element, in document order.
    fn query_all(&self, selector: &str) -> Vec<Self::Element>;

    /// Creates the tracker's single subscription.
    ///
    /// Only called when [`supports_intersection`](Self::supports_intersection)
    /// returned `true`.
    fn create_subscription(
        &self,
        init: SubscriptionInit<'_, Self::Element>,
        on_batch: BatchCallback<Self::Element>,
    ) -> Result<Self::Subscription, TrackerError>;

    /// Runs `task` after at least `delay`.
    fn defer(&self, delay: Duration, task: Box<dyn FnOnce()>);
}
