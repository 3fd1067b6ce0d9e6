// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-element tracking records.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;
use core::time::Duration;

use crate::geometry::ClientRect;
use crate::options::{WatchOptions, clamp_ratio};

/// Callback invoked with the live entry it concerns.
pub type EntryCallback<E> = Rc<dyn Fn(&WatchedEntry<E>)>;

/// Identifies one registration within a tracker.
///
/// Ids are handed out in registration order, so they stay meaningful in trace
/// output after eviction. The counter wraps after `u32::MAX` registrations;
/// only then can a tracker hand out an id a second time.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub u32);

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", self.0)
    }
}

pub(crate) struct EntryState<E> {
    pub(crate) id: EntryId,
    pub(crate) element: E,
    pub(crate) keep_observing: bool,
    pub(crate) trigger_ratio: f64,
    pub(crate) always_trigger: bool,
    pub(crate) stagger: Duration,
    pub(crate) on_visible: Option<EntryCallback<E>>,
    pub(crate) on_hidden: Option<EntryCallback<E>>,
    pub(crate) in_view: bool,
    pub(crate) ratio: f64,
    pub(crate) bounding_client_rect: ClientRect,
    pub(crate) triggered: bool,
    pub(crate) visible_count: u32,
}

/// A shared handle to one tracked element and its state.
///
/// Callbacks receive this handle rather than a snapshot, so a staggered
/// visible callback sees the state at the moment it fires. The handle stays
/// usable after the entry has been unwatched.
pub struct WatchedEntry<E> {
    pub(crate) state: Rc<RefCell<EntryState<E>>>,
}

impl<E> Clone for WatchedEntry<E> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<E> WatchedEntry<E> {
    pub(crate) fn new(id: EntryId, element: E, options: &WatchOptions<E>) -> Self {
        Self {
            state: Rc::new(RefCell::new(EntryState {
                id,
                element,
                keep_observing: options.keep_observing,
                trigger_ratio: clamp_ratio(options.trigger_ratio),
                always_trigger: options.always_trigger,
                stagger: options.stagger,
                on_visible: options.on_visible.clone(),
                on_hidden: options.on_hidden.clone(),
                in_view: false,
                ratio: 0.0,
                bounding_client_rect: ClientRect::ZERO,
                triggered: false,
                visible_count: 0,
            })),
        }
    }

    /// Returns `true` if both handles refer to the same registration.
    #[must_use]
    pub fn same_entry(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    /// Registration id.
    #[must_use]
    pub fn id(&self) -> EntryId {
        self.state.borrow().id
    }

    /// Whether the entry is currently considered visible.
    #[must_use]
    pub fn in_view(&self) -> bool {
        self.state.borrow().in_view
    }

    /// Last observed intersection fraction.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        self.state.borrow().ratio
    }

    /// Last observed bounding box.
    #[must_use]
    pub fn bounding_client_rect(&self) -> ClientRect {
        self.state.borrow().bounding_client_rect
    }

    /// Clamped trigger ratio.
    #[must_use]
    pub fn trigger_ratio(&self) -> f64 {
        self.state.borrow().trigger_ratio
    }

    /// Whether the entry survives its first hide transition.
    #[must_use]
    pub fn keep_observing(&self) -> bool {
        self.state.borrow().keep_observing
    }

    /// Whether every hidden→visible edge fires the visible callback.
    #[must_use]
    pub fn always_trigger(&self) -> bool {
        self.state.borrow().always_trigger
    }

    /// Per-position stagger delay.
    #[must_use]
    pub fn stagger(&self) -> Duration {
        self.state.borrow().stagger
    }

    /// Number of visible callbacks delivered so far.
    #[must_use]
    pub fn visible_count(&self) -> u32 {
        self.state.borrow().visible_count
    }

    pub(crate) fn is_for(&self, element: &E) -> bool
    where
        E: PartialEq,
    {
        self.state.borrow().element == *element
    }
}

impl<E: Clone> WatchedEntry<E> {
    /// The tracked element.
    #[must_use]
    pub fn element(&self) -> E {
        self.state.borrow().element.clone()
    }
}

impl<E> fmt::Debug for WatchedEntry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.state.borrow();
        f.debug_struct("WatchedEntry")
            .field("id", &s.id)
            .field("in_view", &s.in_view)
            .field("ratio", &s.ratio)
            .field("trigger_ratio", &s.trigger_ratio)
            .field("keep_observing", &s.keep_observing)
            .field("always_trigger", &s.always_trigger)
            .field("stagger", &s.stagger)
            .finish_non_exhaustive()
    }
}
