// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracker error kinds.
//!
//! Errors are never returned from tracker operations. They are delivered
//! once, on a deferred tick, to the handler registered with
//! [`Tracker::on_error`](crate::tracker::Tracker::on_error), and the tracker
//! stays inert afterwards.

use alloc::string::String;

/// Why a tracker could not create its observation subscription.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    /// The host has no intersection observation primitive.
    #[error("intersection observation is not supported by this environment")]
    UnsupportedEnvironment,
    /// The primitive exists but refused the subscription configuration.
    #[error("intersection observer rejected its configuration: {0}")]
    SubscriptionRejected(String),
}
