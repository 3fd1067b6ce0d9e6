// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the tracker.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! tracker calls as it registers entries, processes notification batches, and
//! fires callbacks. All method bodies default to no-ops, so implementing only
//! the events you care about is fine.
//!
//! [`Tracer`] owns an optional boxed [`TraceSink`]. When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing and installed sinks are
//! dropped. When **on**, each method performs a single `Option` branch before
//! dispatching.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;
use core::time::Duration;

use crate::entry::EntryId;
use crate::error::TrackerError;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why an entry left the watch list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnwatchReason {
    /// `unwatch_one` / `unwatch_many` was called for its element.
    Explicit,
    /// The entry had `keep_observing = false` and just became hidden.
    Evicted,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when an element is registered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WatchEvent {
    /// The new entry.
    pub entry: EntryId,
    /// Clamped trigger ratio.
    pub trigger_ratio: f64,
    /// Whether the entry survives its first hide.
    pub keep_observing: bool,
    /// Whether every visible edge fires.
    pub always_trigger: bool,
    /// Per-position stagger.
    pub stagger: Duration,
}

/// Emitted after a notification batch has been processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchEvent {
    /// Number of records in the batch.
    pub len: usize,
    /// Number of records that matched a watched entry.
    pub matched: usize,
}

/// Emitted when a visible callback is queued on the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibleScheduledEvent {
    /// The entry that became visible.
    pub entry: EntryId,
    /// Position of its record within the batch.
    pub batch_index: usize,
    /// Observed intersection fraction.
    pub ratio: f64,
    /// Delay handed to the host.
    pub delay: Duration,
}

/// Emitted when an entry transitions to hidden.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HiddenEvent {
    /// The entry that became hidden.
    pub entry: EntryId,
    /// Observed intersection fraction.
    pub ratio: f64,
}

/// Emitted when an entry is removed from the watch list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnwatchEvent {
    /// The removed entry.
    pub entry: EntryId,
    /// What removed it.
    pub reason: UnwatchReason,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from a tracker.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when an element is registered.
    fn on_watch(&mut self, e: &WatchEvent) {
        _ = e;
    }

    /// Called when a registration is skipped because its element already has
    /// an entry.
    fn on_duplicate(&mut self, existing: EntryId) {
        _ = existing;
    }

    /// Called for a batch record whose target is not watched.
    fn on_unmatched(&mut self, batch_index: usize) {
        _ = batch_index;
    }

    /// Called when a visible callback is queued.
    fn on_visible_scheduled(&mut self, e: &VisibleScheduledEvent) {
        _ = e;
    }

    /// Called when a queued visible callback fires.
    fn on_visible_fired(&mut self, entry: EntryId) {
        _ = entry;
    }

    /// Called when an entry becomes hidden.
    fn on_hidden(&mut self, e: &HiddenEvent) {
        _ = e;
    }

    /// Called when an entry leaves the watch list.
    fn on_unwatch(&mut self, e: &UnwatchEvent) {
        _ = e;
    }

    /// Called after a batch has been processed.
    fn on_batch(&mut self, e: &BatchEvent) {
        _ = e;
    }

    /// Called when every entry is dropped at once.
    fn on_disconnect(&mut self, dropped: usize) {
        _ = dropped;
    }

    /// Called when the subscription could not be created.
    fn on_error(&mut self, error: &TrackerError) {
        _ = error;
    }
}

/// Lets a caller keep a handle to a sink it installed on a tracker.
impl<T: TraceSink + ?Sized> TraceSink for Rc<RefCell<T>> {
    fn on_watch(&mut self, e: &WatchEvent) {
        self.borrow_mut().on_watch(e);
    }

    fn on_duplicate(&mut self, existing: EntryId) {
        self.borrow_mut().on_duplicate(existing);
    }

    fn on_unmatched(&mut self, batch_index: usize) {
        self.borrow_mut().on_unmatched(batch_index);
    }

    fn on_visible_scheduled(&mut self, e: &VisibleScheduledEvent) {
        self.borrow_mut().on_visible_scheduled(e);
    }

    fn on_visible_fired(&mut self, entry: EntryId) {
        self.borrow_mut().on_visible_fired(entry);
    }

    fn on_hidden(&mut self, e: &HiddenEvent) {
        self.borrow_mut().on_hidden(e);
    }

    fn on_unwatch(&mut self, e: &UnwatchEvent) {
        self.borrow_mut().on_unwatch(e);
    }

    fn on_batch(&mut self, e: &BatchEvent) {
        self.borrow_mut().on_batch(e);
    }

    fn on_disconnect(&mut self, dropped: usize) {
        self.borrow_mut().on_disconnect(dropped);
    }

    fn on_error(&mut self, error: &TrackerError) {
        self.borrow_mut().on_error(error);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer
// ---------------------------------------------------------------------------

/// Holder for the optional sink a tracker reports to.
///
/// Sinks must not call back into the tracker that owns this tracer.
#[derive(Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: RefCell<Option<Box<dyn TraceSink>>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! emit {
    ($self:ident, $method:ident($($arg:expr),*)) => {{
        #[cfg(feature = "trace")]
        if let Some(s) = $self.sink.borrow_mut().as_mut() {
            s.$method($($arg),*);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = ($($arg,)*);
        }
    }};
}

impl Tracer {
    /// Creates a tracer with no sink.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Installs `sink`, replacing any previous one.
    #[inline]
    pub fn set_sink(&self, sink: Box<dyn TraceSink>) {
        #[cfg(feature = "trace")]
        {
            *self.sink.borrow_mut() = Some(sink);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
        }
    }

    /// Removes the installed sink.
    #[inline]
    pub fn clear_sink(&self) {
        #[cfg(feature = "trace")]
        {
            self.sink.borrow_mut().take();
        }
    }

    /// Emits a [`WatchEvent`].
    #[inline]
    pub fn watch(&self, e: &WatchEvent) {
        emit!(self, on_watch(e));
    }

    /// Reports a skipped duplicate registration.
    #[inline]
    pub fn duplicate(&self, existing: EntryId) {
        emit!(self, on_duplicate(existing));
    }

    /// Reports an unmatched batch record.
    #[inline]
    pub fn unmatched(&self, batch_index: usize) {
        emit!(self, on_unmatched(batch_index));
    }

    /// Emits a [`VisibleScheduledEvent`].
    #[inline]
    pub fn visible_scheduled(&self, e: &VisibleScheduledEvent) {
        emit!(self, on_visible_scheduled(e));
    }

    /// Reports a fired visible callback.
    #[inline]
    pub fn visible_fired(&self, entry: EntryId) {
        emit!(self, on_visible_fired(entry));
    }

    /// Emits a [`HiddenEvent`].
    #[inline]
    pub fn hidden(&self, e: &HiddenEvent) {
        emit!(self, on_hidden(e));
    }

    /// Emits an [`UnwatchEvent`].
    #[inline]
    pub fn unwatch(&self, e: &UnwatchEvent) {
        emit!(self, on_unwatch(e));
    }

    /// Emits a [`BatchEvent`].
    #[inline]
    pub fn batch(&self, e: &BatchEvent) {
        emit!(self, on_batch(e));
    }

    /// Reports a full disconnect.
    #[inline]
    pub fn disconnect(&self, dropped: usize) {
        emit!(self, on_disconnect(dropped));
    }

    /// Reports a subscription failure.
    #[inline]
    pub fn error(&self, error: &TrackerError) {
        emit!(self, on_error(error));
    }
}
