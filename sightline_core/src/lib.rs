// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visibility tracking over a host-provided intersection observation
//! primitive.
//!
//! `sightline_core` lets a caller register a batch of elements and receive
//! callbacks when each element's visible fraction crosses a configurable
//! trigger ratio. It is `no_std` compatible (with `alloc`) and knows nothing
//! about any particular platform: the observation primitive, element lookup,
//! and deferred execution are supplied by a [`Host`](host::Host).
//!
//! # Architecture
//!
//! ```text
//!   Host::create_subscription ──► Subscription (one per tracker)
//!                                      │
//!                                      ▼
//!   IntersectionRecord batch ──► Tracker (hysteresis on `in_view`)
//!                                      │
//!              ┌───────────────────────┴───────────────────────┐
//!              ▼                                               ▼
//!   Host::defer(i × stagger) ──► on_visible             on_hidden (immediate)
//!                                                              │
//!                                                              ▼
//!                                               evict unless keep_observing
//! ```
//!
//! **[`tracker`]** — The [`Tracker`](tracker::Tracker) handle: registration,
//! unregistration, global callbacks, and the batch notification handler.
//!
//! **[`entry`]** — [`WatchedEntry`](entry::WatchedEntry), the live per-element
//! tracking record handed to callbacks.
//!
//! **[`options`]** — Tracker configuration, per-registration options, and
//! ratio normalization.
//!
//! **[`host`]** — The contract platform backends implement.
//!
//! **[`geometry`]** — [`ClientRect`](geometry::ClientRect) snapshots.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! tracker instrumentation.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod entry;
pub mod error;
pub mod geometry;
pub mod host;
pub mod options;
pub mod trace;
pub mod tracker;

pub use entry::{EntryId, WatchedEntry};
pub use error::TrackerError;
pub use geometry::ClientRect;
pub use host::{BatchCallback, Host, IntersectionRecord, Subscription, SubscriptionInit};
pub use options::{TrackerConfig, WatchOptions, WatchRequest, clamp_ratio};
pub use tracker::{RootContext, Tracker};
