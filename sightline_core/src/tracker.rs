// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The visibility tracker.
//!
//! A [`Tracker`] owns one [`Subscription`] to the host's observation primitive
//! and an insertion-ordered list of [`WatchedEntry`] records. Each
//! notification batch is interpreted against the entries' `in_view` flags, so
//! only edges produce callbacks:
//!
//! - **hidden → visible** (`ratio > trigger_ratio`): the entry's visible
//!   callback and the global visible callback are queued on the host with a
//!   delay of `batch_index × stagger`. Entries registered with
//!   `always_trigger = false` only ever queue one visible callback.
//! - **visible → hidden** (`ratio <= trigger_ratio`): the hidden callbacks run
//!   immediately, then the entry is evicted unless it was registered with
//!   `keep_observing = true`.
//!
//! The last observed ratio and bounding box are recorded for every matching
//! record, whether or not it produced an edge.
//!
//! # Re-entrancy
//!
//! Callbacks may call back into the tracker (register, unwatch, replace
//! global callbacks). No internal borrow is held while a callback runs.
//! Queued visible callbacks cannot be withdrawn: they still fire against the
//! entry handle after it has been unwatched or the tracker has been reset.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::time::Duration;

use crate::entry::{EntryCallback, EntryId, WatchedEntry};
use crate::error::TrackerError;
use crate::host::{BatchCallback, Host, IntersectionRecord, Subscription, SubscriptionInit};
use crate::options::{TrackerConfig, WatchRequest, normalize_thresholds};
use crate::trace::{
    BatchEvent, HiddenEvent, TraceSink, Tracer, UnwatchEvent, UnwatchReason,
    VisibleScheduledEvent, WatchEvent,
};

type ErrorCallback = Rc<dyn Fn(&TrackerError)>;

/// The context intersections are measured against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RootContext<E> {
    /// The full viewport.
    Viewport,
    /// A resolved containment element.
    Element(E),
}

impl<E> RootContext<E> {
    /// Returns the containment element, if any.
    #[must_use]
    pub fn element(&self) -> Option<&E> {
        match self {
            Self::Viewport => None,
            Self::Element(el) => Some(el),
        }
    }
}

/// Tracks the visibility of registered elements.
///
/// `Tracker` is a cheap handle: clones share the same state, which makes it
/// easy to capture in callbacks. The subscription is released when the last
/// handle is dropped.
pub struct Tracker<H: Host> {
    inner: Rc<Inner<H>>,
}

struct Inner<H: Host> {
    host: H,
    root: RootContext<H::Element>,
    root_margin: String,
    thresholds: Vec<f64>,
    /// `None` when the subscription could not be created; every registration
    /// is then a no-op.
    subscription: Option<H::Subscription>,
    watch_list: RefCell<Vec<WatchedEntry<H::Element>>>,
    next_id: Cell<u32>,
    on_error: RefCell<Option<ErrorCallback>>,
    on_any_visible: RefCell<Option<EntryCallback<H::Element>>>,
    on_any_hidden: RefCell<Option<EntryCallback<H::Element>>>,
    tracer: Tracer,
}

impl<H: Host> Clone for Tracker<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H: Host> fmt::Debug for Tracker<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker")
            .field("supported", &self.is_supported())
            .field("root_is_viewport", &self.inner.root.element().is_none())
            .field("root_margin", &self.inner.root_margin)
            .field("thresholds", &self.inner.thresholds)
            .field("watched", &self.len())
            .finish_non_exhaustive()
    }
}

impl<H: Host> Tracker<H> {
    /// Creates a tracker and its subscription.
    ///
    /// If the host lacks the observation primitive, or refuses the
    /// configuration, the tracker is inert and the error handler (see
    /// [`on_error`](Self::on_error)) is invoked on the next deferred tick.
    pub fn new(host: H, config: TrackerConfig) -> Self {
        let TrackerConfig {
            root,
            root_margin,
            thresholds,
        } = config;
        let thresholds = normalize_thresholds(&thresholds);

        let inner = Rc::new_cyclic(|weak: &Weak<Inner<H>>| {
            let mut root_context = RootContext::Viewport;
            let created = if host.supports_intersection() {
                if let Some(el) = root.as_deref().and_then(|sel| host.query_one(sel)) {
                    root_context = RootContext::Element(el);
                }
                let batch_target = weak.clone();
                let on_batch: BatchCallback<H::Element> =
                    Box::new(move |records: &[IntersectionRecord<H::Element>]| {
                        if let Some(inner) = batch_target.upgrade() {
                            Inner::handle_batch(&inner, records);
                        }
                    });
                let init = SubscriptionInit {
                    root: root_context.element(),
                    root_margin: &root_margin,
                    thresholds: &thresholds,
                };
                host.create_subscription(init, on_batch)
            } else {
                Err(TrackerError::UnsupportedEnvironment)
            };

            let subscription = match created {
                Ok(subscription) => Some(subscription),
                Err(error) => {
                    schedule_error(&host, weak.clone(), error);
                    None
                }
            };

            Inner {
                host,
                root: root_context,
                root_margin,
                thresholds,
                subscription,
                watch_list: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                on_error: RefCell::new(None),
                on_any_visible: RefCell::new(None),
                on_any_hidden: RefCell::new(None),
                tracer: Tracer::none(),
            }
        });

        Self { inner }
    }

    // -- Registration --

    /// Starts watching the elements named by `request`.
    ///
    /// Elements that already have an entry are skipped; the existing entry
    /// and its callbacks are kept. Does nothing on an inert tracker.
    pub fn observe(&self, request: WatchRequest<H::Element>) {
        let inner = &*self.inner;
        let Some(subscription) = &inner.subscription else {
            return;
        };

        let WatchRequest {
            elements,
            selector,
            options,
        } = request;
        let elements = if elements.is_empty() {
            selector
                .map(|sel| inner.host.query_all(&sel))
                .unwrap_or_default()
        } else {
            elements
        };

        for element in elements {
            if let Some(existing) = inner.find(&element) {
                inner.tracer.duplicate(existing.id());
                continue;
            }

            let id = EntryId(inner.next_id.get());
            inner.next_id.set(id.0.wrapping_add(1));
            let entry = WatchedEntry::new(id, element.clone(), &options);
            inner.tracer.watch(&WatchEvent {
                entry: id,
                trigger_ratio: entry.trigger_ratio(),
                keep_observing: options.keep_observing,
                always_trigger: options.always_trigger,
                stagger: options.stagger,
            });
            inner.watch_list.borrow_mut().push(entry);
            subscription.observe(&element);
        }
    }

    // -- Unregistration --

    /// Stops watching `element`. Returns `true` if it had an entry.
    pub fn unwatch_one(&self, element: &H::Element) -> bool {
        match self.inner.find(element) {
            Some(entry) => self.inner.remove(&entry, UnwatchReason::Explicit),
            None => false,
        }
    }

    /// Stops watching each element in turn; unknown elements are skipped.
    pub fn unwatch_many<'a>(&self, elements: impl IntoIterator<Item = &'a H::Element>) {
        for element in elements {
            self.unwatch_one(element);
        }
    }

    /// Disconnects the subscription and clears the watch list.
    ///
    /// The subscription object is kept, so later registrations still reach
    /// the primitive.
    pub fn unwatch_all(&self) {
        if let Some(subscription) = &self.inner.subscription {
            subscription.disconnect();
        }
        let dropped = self.inner.watch_list.take().len();
        self.inner.tracer.disconnect(dropped);
    }

    // -- Global callbacks --

    /// Sets the handler for subscription failures, replacing any previous one.
    pub fn on_error(&self, f: impl Fn(&TrackerError) + 'static) -> &Self {
        *self.inner.on_error.borrow_mut() = Some(Rc::new(f));
        self
    }

    /// Sets the handler run after every entry's own visible callback.
    pub fn on_any_visible(&self, f: impl Fn(&WatchedEntry<H::Element>) + 'static) -> &Self {
        *self.inner.on_any_visible.borrow_mut() = Some(Rc::new(f));
        self
    }

    /// Sets the handler run after every entry's own hidden callback.
    pub fn on_any_hidden(&self, f: impl Fn(&WatchedEntry<H::Element>) + 'static) -> &Self {
        *self.inner.on_any_hidden.borrow_mut() = Some(Rc::new(f));
        self
    }

    /// Installs a trace sink. Requires the `trace` feature to have any effect.
    pub fn set_trace_sink(&self, sink: impl TraceSink + 'static) -> &Self {
        self.inner.tracer.set_sink(Box::new(sink));
        self
    }

    // -- Introspection --

    /// Returns `false` if the tracker is inert.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.inner.subscription.is_some()
    }

    /// Number of watched entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.watch_list.borrow().len()
    }

    /// Returns `true` if nothing is watched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.watch_list.borrow().is_empty()
    }

    /// Returns `true` if `element` has an entry.
    #[must_use]
    pub fn is_watching(&self, element: &H::Element) -> bool {
        self.inner.find(element).is_some()
    }

    /// Returns the entry for `element`, if any.
    #[must_use]
    pub fn entry(&self, element: &H::Element) -> Option<WatchedEntry<H::Element>> {
        self.inner.find(element)
    }

    /// Returns handles to every entry, in registration order.
    #[must_use]
    pub fn entries(&self) -> Vec<WatchedEntry<H::Element>> {
        self.inner.watch_list.borrow().clone()
    }

    /// The resolved containment context.
    #[must_use]
    pub fn root(&self) -> &RootContext<H::Element> {
        &self.inner.root
    }

    /// The root margin the subscription was created with.
    #[must_use]
    pub fn root_margin(&self) -> &str {
        &self.inner.root_margin
    }

    /// The normalized notification thresholds.
    #[must_use]
    pub fn thresholds(&self) -> &[f64] {
        &self.inner.thresholds
    }

    /// The host this tracker runs on.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.inner.host
    }
}

impl<H: Host> Inner<H> {
    fn find(&self, element: &H::Element) -> Option<WatchedEntry<H::Element>> {
        self.watch_list
            .borrow()
            .iter()
            .find(|entry| entry.is_for(element))
            .cloned()
    }

    /// Removes `entry` by identity and unobserves its element.
    fn remove(&self, entry: &WatchedEntry<H::Element>, reason: UnwatchReason) -> bool {
        let removed = {
            let mut list = self.watch_list.borrow_mut();
            match list.iter().position(|e| e.same_entry(entry)) {
                Some(pos) => {
                    list.remove(pos);
                    true
                }
                None => false,
            }
        };
        if !removed {
            return false;
        }

        let (id, element) = {
            let s = entry.state.borrow();
            (s.id, s.element.clone())
        };
        if let Some(subscription) = &self.subscription {
            subscription.unobserve(&element);
        }
        self.tracer.unwatch(&UnwatchEvent { entry: id, reason });
        true
    }

    fn handle_batch(this: &Rc<Self>, records: &[IntersectionRecord<H::Element>]) {
        let mut matched = 0;
        for (batch_index, record) in records.iter().enumerate() {
            let Some(entry) = this.find(&record.target) else {
                this.tracer.unmatched(batch_index);
                continue;
            };
            matched += 1;

            let ratio = record.intersection_ratio;
            let (id, trigger_ratio, in_view, always_trigger, triggered, stagger, keep_observing) = {
                let s = entry.state.borrow();
                (
                    s.id,
                    s.trigger_ratio,
                    s.in_view,
                    s.always_trigger,
                    s.triggered,
                    s.stagger,
                    s.keep_observing,
                )
            };

            if ratio > trigger_ratio {
                if !in_view && (always_trigger || !triggered) {
                    let position = u32::try_from(batch_index).unwrap_or(u32::MAX);
                    let delay = stagger.saturating_mul(position);
                    this.tracer.visible_scheduled(&VisibleScheduledEvent {
                        entry: id,
                        batch_index,
                        ratio,
                        delay,
                    });
                    entry.state.borrow_mut().triggered = true;
                    Self::schedule_visible(this, entry.clone(), delay);
                }
                entry.state.borrow_mut().in_view = true;
            } else if in_view && ratio <= trigger_ratio {
                entry.state.borrow_mut().in_view = false;
                this.tracer.hidden(&HiddenEvent { entry: id, ratio });

                let own = entry.state.borrow().on_hidden.clone();
                if let Some(callback) = own {
                    callback(&entry);
                }
                let global = this.on_any_hidden.borrow().clone();
                if let Some(callback) = global {
                    callback(&entry);
                }

                if !keep_observing {
                    this.remove(&entry, UnwatchReason::Evicted);
                }
            }

            let mut s = entry.state.borrow_mut();
            s.ratio = ratio;
            s.bounding_client_rect = record.bounding_client_rect;
        }

        this.tracer.batch(&BatchEvent {
            len: records.len(),
            matched,
        });
    }

    fn schedule_visible(this: &Rc<Self>, entry: WatchedEntry<H::Element>, delay: Duration) {
        let tracker = Rc::downgrade(this);
        this.host.defer(
            delay,
            Box::new(move || {
                let own = {
                    let mut s = entry.state.borrow_mut();
                    s.visible_count = s.visible_count.saturating_add(1);
                    s.on_visible.clone()
                };
                if let Some(callback) = own {
                    callback(&entry);
                }
                if let Some(inner) = tracker.upgrade() {
                    inner.tracer.visible_fired(entry.id());
                    let global = inner.on_any_visible.borrow().clone();
                    if let Some(callback) = global {
                        callback(&entry);
                    }
                }
            }),
        );
    }
}

/// Queues delivery of `error` to whatever error handler is set at fire time.
fn schedule_error<H: Host>(host: &H, tracker: Weak<Inner<H>>, error: TrackerError) {
    host.defer(
        Duration::ZERO,
        Box::new(move || {
            let Some(inner) = tracker.upgrade() else {
                return;
            };
            inner.tracer.error(&error);
            let callback = inner.on_error.borrow().clone();
            if let Some(callback) = callback {
                callback(&error);
            }
        }),
    );
}
