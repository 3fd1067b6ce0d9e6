// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and JSON export for sightline diagnostics.
//!
//! This crate provides [`TraceSink`](sightline_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: in-memory recording of every event in order.
//! - [`json::export`]: writes a recording as a JSON array.
//!
//! Install a sink through an `Rc<RefCell<_>>` to keep reading it while the
//! tracker owns the other handle.

pub mod json;
pub mod pretty;
pub mod recorder;
