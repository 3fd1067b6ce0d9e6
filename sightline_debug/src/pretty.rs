// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use sightline_core::trace::{
    BatchEvent, HiddenEvent, TraceSink, UnwatchEvent, UnwatchReason, VisibleScheduledEvent,
    WatchEvent,
};
use sightline_core::{EntryId, TrackerError};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn reason_name(reason: UnwatchReason) -> &'static str {
    match reason {
        UnwatchReason::Explicit => "explicit",
        UnwatchReason::Evicted => "evicted",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_watch(&mut self, e: &WatchEvent) {
        let _ = writeln!(
            self.writer,
            "[watch] entry={} trigger={:.3} keep={} always={} stagger={}ms",
            e.entry.0,
            e.trigger_ratio,
            e.keep_observing,
            e.always_trigger,
            e.stagger.as_millis(),
        );
    }

    fn on_duplicate(&mut self, existing: EntryId) {
        let _ = writeln!(self.writer, "[duplicate] entry={}", existing.0);
    }

    fn on_unmatched(&mut self, batch_index: usize) {
        let _ = writeln!(self.writer, "[unmatched] index={batch_index}");
    }

    fn on_visible_scheduled(&mut self, e: &VisibleScheduledEvent) {
        let _ = writeln!(
            self.writer,
            "[visible:scheduled] entry={} index={} ratio={:.3} delay={}ms",
            e.entry.0,
            e.batch_index,
            e.ratio,
            e.delay.as_millis(),
        );
    }

    fn on_visible_fired(&mut self, entry: EntryId) {
        let _ = writeln!(self.writer, "[visible:fired] entry={}", entry.0);
    }

    fn on_hidden(&mut self, e: &HiddenEvent) {
        let _ = writeln!(self.writer, "[hidden] entry={} ratio={:.3}", e.entry.0, e.ratio);
    }

    fn on_unwatch(&mut self, e: &UnwatchEvent) {
        let _ = writeln!(
            self.writer,
            "[unwatch] entry={} reason={}",
            e.entry.0,
            reason_name(e.reason),
        );
    }

    fn on_batch(&mut self, e: &BatchEvent) {
        let _ = writeln!(self.writer, "[batch] records={} matched={}", e.len, e.matched);
    }

    fn on_disconnect(&mut self, dropped: usize) {
        let _ = writeln!(self.writer, "[disconnect] dropped={dropped}");
    }

    fn on_error(&mut self, error: &TrackerError) {
        let _ = writeln!(self.writer, "[error] {error}");
    }
}
