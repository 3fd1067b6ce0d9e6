// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic simulated host for sightline trackers.
//!
//! [`SimHost`] implements [`Host`] without a browser:
//!
//! - a tiny document of [`SimElement`]s answers selector lookups,
//! - subscriptions record which elements they observe and hand out their
//!   batch callback through [`SimHost::deliver`],
//! - deferred tasks wait on a virtual clock until [`SimHost::advance`] or
//!   [`SimHost::run_until_idle`] is called.
//!
//! `SimHost` is a cheap handle; give one clone to the tracker and keep
//! another to drive it.

#![no_std]

extern crate alloc;

mod element;

pub use element::SimElement;

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::time::Duration;

use sightline_core::{
    BatchCallback, ClientRect, Host, IntersectionRecord, Subscription, SubscriptionInit,
    TrackerError,
};

type Task = Box<dyn FnOnce()>;

/// How the simulated environment responds to subscription requests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Support {
    /// Subscriptions are created normally.
    #[default]
    Supported,
    /// The observation primitive does not exist.
    Missing,
    /// The primitive exists but throws with the given message.
    Rejecting(String),
}

/// Configuration a subscription was created with.
#[derive(Clone, Debug, PartialEq)]
pub struct SimInit {
    /// Resolved containment element.
    pub root: Option<SimElement>,
    /// Root margin string.
    pub root_margin: String,
    /// Normalized thresholds.
    pub thresholds: Vec<f64>,
}

/// A simulated host environment.
#[derive(Clone, Default)]
pub struct SimHost {
    state: Rc<SimState>,
}

#[derive(Default)]
struct SimState {
    support: RefCell<Support>,
    now: Cell<Duration>,
    next_seq: Cell<u64>,
    timers: RefCell<BTreeMap<(Duration, u64), Task>>,
    scheduled: RefCell<Vec<Duration>>,
    document: RefCell<Vec<SimElement>>,
    next_element: Cell<u32>,
    subscriptions: RefCell<Vec<Rc<SimObserver>>>,
}

struct SimObserver {
    init: SimInit,
    callback: RefCell<Option<BatchCallback<SimElement>>>,
    observed: RefCell<Vec<SimElement>>,
    disconnects: Cell<u32>,
}

/// The [`Subscription`] produced by [`SimHost`].
pub struct SimSubscription {
    observer: Rc<SimObserver>,
}

impl fmt::Debug for SimSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimSubscription")
            .field("init", &self.observer.init)
            .field("observed", &self.observer.observed.borrow().len())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for SimHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimHost")
            .field("support", &self.state.support.borrow())
            .field("now", &self.state.now.get())
            .field("pending_timers", &self.pending_timers())
            .field("subscriptions", &self.subscription_count())
            .finish_non_exhaustive()
    }
}

impl Subscription<SimElement> for SimSubscription {
    fn observe(&self, target: &SimElement) {
        let mut observed = self.observer.observed.borrow_mut();
        if !observed.contains(target) {
            observed.push(target.clone());
        }
    }

    fn unobserve(&self, target: &SimElement) {
        self.observer.observed.borrow_mut().retain(|el| el != target);
    }

    fn disconnect(&self) {
        self.observer.observed.borrow_mut().clear();
        self.observer
            .disconnects
            .set(self.observer.disconnects.get() + 1);
    }
}

impl SimHost {
    /// Creates a host where intersection observation is available.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host without the observation primitive.
    #[must_use]
    pub fn unsupported() -> Self {
        Self::with_support(Support::Missing)
    }

    /// Creates a host with the given support mode.
    #[must_use]
    pub fn with_support(support: Support) -> Self {
        let host = Self::default();
        *host.state.support.borrow_mut() = support;
        host
    }

    // -- Document --

    /// Adds an element with the given tag and classes to the document.
    pub fn create_element(&self, tag: &str, classes: &[&str]) -> SimElement {
        let id = self.state.next_element.get();
        self.state.next_element.set(id + 1);
        let el = SimElement::new(id, tag, classes);
        self.state.document.borrow_mut().push(el.clone());
        el
    }

    /// Adds `count` elements sharing a tag and classes.
    pub fn create_elements(&self, count: usize, tag: &str, classes: &[&str]) -> Vec<SimElement> {
        (0..count)
            .map(|_| self.create_element(tag, classes))
            .collect()
    }

    // -- Subscriptions --

    /// Number of subscriptions created so far.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.state.subscriptions.borrow().len()
    }

    /// Configuration of the most recent subscription.
    #[must_use]
    pub fn last_init(&self) -> Option<SimInit> {
        self.latest().map(|obs| obs.init.clone())
    }

    /// Elements the most recent subscription currently observes.
    #[must_use]
    pub fn observed(&self) -> Vec<SimElement> {
        self.latest()
            .map(|obs| obs.observed.borrow().clone())
            .unwrap_or_default()
    }

    /// Returns `true` if the most recent subscription observes `el`.
    #[must_use]
    pub fn is_observing(&self, el: &SimElement) -> bool {
        self.latest()
            .is_some_and(|obs| obs.observed.borrow().contains(el))
    }

    /// Number of `disconnect` calls on the most recent subscription.
    #[must_use]
    pub fn disconnect_count(&self) -> u32 {
        self.latest().map_or(0, |obs| obs.disconnects.get())
    }

    /// Delivers a batch to the most recent subscription.
    ///
    /// Records are passed through unfiltered, as if the primitive had
    /// reported them. Returns `false` if there is no subscription or a
    /// delivery is already in progress.
    pub fn deliver(&self, records: &[IntersectionRecord<SimElement>]) -> bool {
        let Some(observer) = self.latest() else {
            return false;
        };
        let Some(mut callback) = observer.callback.borrow_mut().take() else {
            return false;
        };
        callback(records);
        let mut slot = observer.callback.borrow_mut();
        if slot.is_none() {
            *slot = Some(callback);
        }
        true
    }

    /// Delivers one record per `(element, ratio)` pair, with empty geometry.
    pub fn deliver_ratios(&self, ratios: &[(&SimElement, f64)]) -> bool {
        let records: Vec<_> = ratios
            .iter()
            .map(|&(el, ratio)| IntersectionRecord::new(el.clone(), ratio))
            .collect();
        self.deliver(&records)
    }

    /// Builds a record with a square bounding box of side `size` at `top`.
    #[must_use]
    pub fn record(
        el: &SimElement,
        ratio: f64,
        top: f64,
        size: f64,
    ) -> IntersectionRecord<SimElement> {
        IntersectionRecord::new(el.clone(), ratio)
            .with_rect(ClientRect::from_xywh(0.0, top, size, size))
    }

    fn latest(&self) -> Option<Rc<SimObserver>> {
        self.state.subscriptions.borrow().last().cloned()
    }

    // -- Virtual clock --

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.state.now.get()
    }

    /// Every delay passed to [`Host::defer`], in call order.
    #[must_use]
    pub fn scheduled_delays(&self) -> Vec<Duration> {
        self.state.scheduled.borrow().clone()
    }

    /// Number of deferred tasks that have not run yet.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.state.timers.borrow().len()
    }

    /// Advances the clock by `by`, running every task that comes due, in due
    /// order. Tasks scheduled by those tasks also run if they come due within
    /// the window. Returns the number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now().saturating_add(by);
        let mut ran = 0;
        while let Some(task) = self.pop_due(target) {
            task();
            ran += 1;
        }
        self.state.now.set(target);
        ran
    }

    /// Runs tasks until none remain, moving the clock to each due time.
    /// Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.pop_due(Duration::MAX) {
            task();
            ran += 1;
        }
        ran
    }

    fn pop_due(&self, limit: Duration) -> Option<Task> {
        let mut timers = self.state.timers.borrow_mut();
        let (&(due, seq), _) = timers.first_key_value()?;
        if due > limit {
            return None;
        }
        let task = timers.remove(&(due, seq))?;
        self.state.now.set(due);
        Some(task)
    }
}

impl Host for SimHost {
    type Element = SimElement;
    type Subscription = SimSubscription;

    fn supports_intersection(&self) -> bool {
        *self.state.support.borrow() != Support::Missing
    }

    fn query_one(&self, selector: &str) -> Option<SimElement> {
        self.state
            .document
            .borrow()
            .iter()
            .find(|el| el.matches(selector))
            .cloned()
    }

    fn query_all(&self, selector: &str) -> Vec<SimElement> {
        self.state
            .document
            .borrow()
            .iter()
            .filter(|el| el.matches(selector))
            .cloned()
            .collect()
    }

    fn create_subscription(
        &self,
        init: SubscriptionInit<'_, SimElement>,
        on_batch: BatchCallback<SimElement>,
    ) -> Result<SimSubscription, TrackerError> {
        match &*self.state.support.borrow() {
            Support::Supported => {}
            Support::Missing => return Err(TrackerError::UnsupportedEnvironment),
            Support::Rejecting(reason) => {
                return Err(TrackerError::SubscriptionRejected(reason.clone()));
            }
        }
        let observer = Rc::new(SimObserver {
            init: SimInit {
                root: init.root.cloned(),
                root_margin: init.root_margin.to_string(),
                thresholds: init.thresholds.to_vec(),
            },
            callback: RefCell::new(Some(on_batch)),
            observed: RefCell::new(Vec::new()),
            disconnects: Cell::new(0),
        });
        self.state
            .subscriptions
            .borrow_mut()
            .push(Rc::clone(&observer));
        Ok(SimSubscription { observer })
    }

    fn defer(&self, delay: Duration, task: Task) {
        let seq = self.state.next_seq.get();
        self.state.next_seq.set(seq + 1);
        self.state.scheduled.borrow_mut().push(delay);
        let due = self.now().saturating_add(delay);
        self.state.timers.borrow_mut().insert((due, seq), task);
    }
}
