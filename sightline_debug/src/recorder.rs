// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and keeps every event as a
//! [`RecordedEvent`], in arrival order.

use sightline_core::EntryId;
use sightline_core::TrackerError;
use sightline_core::trace::{
    BatchEvent, HiddenEvent, TraceSink, UnwatchEvent, VisibleScheduledEvent, WatchEvent,
};

/// A recorded trace event.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`WatchEvent`].
    Watch(WatchEvent),
    /// A registration skipped because the element was already watched.
    Duplicate(EntryId),
    /// A batch record with no matching entry, by batch position.
    Unmatched(usize),
    /// A [`VisibleScheduledEvent`].
    VisibleScheduled(VisibleScheduledEvent),
    /// A visible callback that ran.
    VisibleFired(EntryId),
    /// A [`HiddenEvent`].
    Hidden(HiddenEvent),
    /// An [`UnwatchEvent`].
    Unwatch(UnwatchEvent),
    /// A [`BatchEvent`].
    Batch(BatchEvent),
    /// Every entry dropped at once; holds the count.
    Disconnect(usize),
    /// A subscription failure.
    Error(TrackerError),
}

impl RecordedEvent {
    /// Short event name, as used by the pretty printer and JSON export.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Watch(_) => "watch",
            Self::Duplicate(_) => "duplicate",
            Self::Unmatched(_) => "unmatched",
            Self::VisibleScheduled(_) => "visible-scheduled",
            Self::VisibleFired(_) => "visible-fired",
            Self::Hidden(_) => "hidden",
            Self::Unwatch(_) => "unwatch",
            Self::Batch(_) => "batch",
            Self::Disconnect(_) => "disconnect",
            Self::Error(_) => "error",
        }
    }

    /// The entry the event is about, if any.
    #[must_use]
    pub fn entry(&self) -> Option<EntryId> {
        match self {
            Self::Watch(e) => Some(e.entry),
            Self::Duplicate(id) | Self::VisibleFired(id) => Some(*id),
            Self::VisibleScheduled(e) => Some(e.entry),
            Self::Hidden(e) => Some(e.entry),
            Self::Unwatch(e) => Some(e.entry),
            Self::Unmatched(_) | Self::Batch(_) | Self::Disconnect(_) | Self::Error(_) => None,
        }
    }
}

/// A [`TraceSink`] that stores events in memory.
#[derive(Debug, Default)]
pub struct RecorderSink {
    events: Vec<RecordedEvent>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events.
    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Removes and returns everything recorded so far.
    pub fn take(&mut self) -> Vec<RecordedEvent> {
        core::mem::take(&mut self.events)
    }

    /// Events concerning `entry`, in order.
    pub fn for_entry(&self, entry: EntryId) -> impl Iterator<Item = &RecordedEvent> {
        self.events.iter().filter(move |e| e.entry() == Some(entry))
    }

    /// Consumes the recorder and returns the events.
    #[must_use]
    pub fn into_events(self) -> Vec<RecordedEvent> {
        self.events
    }
}

impl TraceSink for RecorderSink {
    fn on_watch(&mut self, e: &WatchEvent) {
        self.events.push(RecordedEvent::Watch(*e));
    }

    fn on_duplicate(&mut self, existing: EntryId) {
        self.events.push(RecordedEvent::Duplicate(existing));
    }

    fn on_unmatched(&mut self, batch_index: usize) {
        self.events.push(RecordedEvent::Unmatched(batch_index));
    }

    fn on_visible_scheduled(&mut self, e: &VisibleScheduledEvent) {
        self.events.push(RecordedEvent::VisibleScheduled(*e));
    }

    fn on_visible_fired(&mut self, entry: EntryId) {
        self.events.push(RecordedEvent::VisibleFired(entry));
    }

    fn on_hidden(&mut self, e: &HiddenEvent) {
        self.events.push(RecordedEvent::Hidden(*e));
    }

    fn on_unwatch(&mut self, e: &UnwatchEvent) {
        self.events.push(RecordedEvent::Unwatch(*e));
    }

    fn on_batch(&mut self, e: &BatchEvent) {
        self.events.push(RecordedEvent::Batch(*e));
    }

    fn on_disconnect(&mut self, dropped: usize) {
        self.events.push(RecordedEvent::Disconnect(dropped));
    }

    fn on_error(&mut self, error: &TrackerError) {
        self.events.push(RecordedEvent::Error(error.clone()));
    }
}
