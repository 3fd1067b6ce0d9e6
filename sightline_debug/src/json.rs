// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON export of recorded events.
//!
//! [`export`] writes a recording from a
//! [`RecorderSink`](super::recorder::RecorderSink) as one JSON array. Each
//! element carries its position (`seq`), the event name, and the event's
//! fields; durations are in milliseconds.

use std::io::{self, Write};

use serde_json::{Value, json};

use sightline_core::trace::UnwatchReason;

use crate::recorder::RecordedEvent;

/// Converts one event to a JSON object.
#[must_use]
pub fn to_value(seq: usize, event: &RecordedEvent) -> Value {
    let args = match event {
        RecordedEvent::Watch(e) => json!({
            "entry": e.entry.0,
            "trigger_ratio": e.trigger_ratio,
            "keep_observing": e.keep_observing,
            "always_trigger": e.always_trigger,
            "stagger_ms": duration_ms(e.stagger),
        }),
        RecordedEvent::Duplicate(id) | RecordedEvent::VisibleFired(id) => {
            json!({ "entry": id.0 })
        }
        RecordedEvent::Unmatched(index) => json!({ "batch_index": index }),
        RecordedEvent::VisibleScheduled(e) => json!({
            "entry": e.entry.0,
            "batch_index": e.batch_index,
            "ratio": e.ratio,
            "delay_ms": duration_ms(e.delay),
        }),
        RecordedEvent::Hidden(e) => json!({
            "entry": e.entry.0,
            "ratio": e.ratio,
        }),
        RecordedEvent::Unwatch(e) => json!({
            "entry": e.entry.0,
            "reason": match e.reason {
                UnwatchReason::Explicit => "explicit",
                UnwatchReason::Evicted => "evicted",
            },
        }),
        RecordedEvent::Batch(e) => json!({
            "len": e.len,
            "matched": e.matched,
        }),
        RecordedEvent::Disconnect(dropped) => json!({ "dropped": dropped }),
        RecordedEvent::Error(err) => json!({ "message": err.to_string() }),
    };
    json!({
        "seq": seq,
        "event": event.name(),
        "args": args,
    })
}

/// Writes `events` as a pretty-printed JSON array.
pub fn export(events: &[RecordedEvent], writer: &mut dyn Write) -> io::Result<()> {
    let values: Vec<Value> = events
        .iter()
        .enumerate()
        .map(|(seq, event)| to_value(seq, event))
        .collect();
    serde_json::to_writer_pretty(&mut *writer, &values)?;
    writeln!(writer)
}

fn duration_ms(d: std::time::Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
