// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end tracker behavior on the simulated host.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use sightline_core::trace::{TraceSink, UnwatchEvent, UnwatchReason, VisibleScheduledEvent};
use sightline_core::{
    ClientRect, EntryId, RootContext, Tracker, TrackerConfig, TrackerError, WatchRequest,
    WatchedEntry,
};
use sightline_harness::{SimElement, SimHost, Support};

type Log = Rc<RefCell<Vec<String>>>;

fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn push(log: &Log, line: impl Into<String>) {
    log.borrow_mut().push(line.into());
}

fn take(log: &Log) -> Vec<String> {
    log.take()
}

/// Registers `el` with callbacks that log `visible:<id>` / `hidden:<id>`.
fn logged(el: &SimElement, log: &Log) -> WatchRequest<SimElement> {
    let (v, h) = (Rc::clone(log), Rc::clone(log));
    WatchRequest::elements([el.clone()])
        .on_visible(move |e| push(&v, format!("visible:{}", e.element().id())))
        .on_hidden(move |e| push(&h, format!("hidden:{}", e.element().id())))
}

fn setup(thresholds: &[f64]) -> (SimHost, Tracker<SimHost>) {
    let host = SimHost::new();
    let tracker = Tracker::new(
        host.clone(),
        TrackerConfig::default().with_thresholds(thresholds.to_vec()),
    );
    (host, tracker)
}

#[test]
fn keep_observing_entry_toggles_visibility() {
    let (host, tracker) = setup(&[0.5]);
    let el = host.create_element("div", &["panel"]);
    let log = new_log();
    tracker.observe(
        logged(&el, &log)
            .trigger_ratio(0.5)
            .always_trigger(true)
            .keep_observing(true),
    );

    host.deliver_ratios(&[(&el, 0.6)]);
    let entry = tracker.entry(&el).expect("entry");
    assert!(entry.in_view());
    assert!(take(&log).is_empty(), "visible callback is deferred");
    host.run_until_idle();
    assert_eq!(take(&log), ["visible:0"]);

    host.deliver_ratios(&[(&el, 0.3)]);
    assert_eq!(take(&log), ["hidden:0"], "hidden callback is immediate");
    assert!(!entry.in_view());
    assert!(tracker.is_watching(&el));
    assert!(host.is_observing(&el));

    host.deliver_ratios(&[(&el, 0.6)]);
    host.run_until_idle();
    assert_eq!(take(&log), ["visible:0"]);
    assert_eq!(entry.visible_count(), 2);
}

#[test]
fn single_shot_entry_is_evicted_after_hiding() {
    let (host, tracker) = setup(&[0.5]);
    let el = host.create_element("div", &[]);
    let log = new_log();
    tracker.observe(logged(&el, &log).trigger_ratio(0.5));

    host.deliver_ratios(&[(&el, 0.6)]);
    host.run_until_idle();
    host.deliver_ratios(&[(&el, 0.3)]);
    assert_eq!(take(&log), ["visible:0", "hidden:0"]);
    assert!(!tracker.is_watching(&el));
    assert!(!host.is_observing(&el));

    host.deliver_ratios(&[(&el, 0.9)]);
    host.deliver_ratios(&[(&el, 0.1)]);
    host.run_until_idle();
    assert!(take(&log).is_empty());
}

#[test]
fn unsupported_environment_reports_once_after_a_tick() {
    let host = SimHost::unsupported();
    let tracker = Tracker::new(host.clone(), TrackerConfig::default());
    let errors = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&errors);
    tracker.on_error(move |err| seen.borrow_mut().push(err.clone()));

    assert!(errors.borrow().is_empty());
    assert_eq!(host.advance(Duration::ZERO), 1);
    assert_eq!(*errors.borrow(), [TrackerError::UnsupportedEnvironment]);

    let el = host.create_element("div", &[]);
    tracker.observe(WatchRequest::elements([el.clone()]));
    tracker.observe(WatchRequest::selector("div"));
    assert!(tracker.is_empty());
    assert!(!tracker.is_supported());
    assert_eq!(host.subscription_count(), 0);
    assert!(!host.deliver_ratios(&[(&el, 1.0)]));
    host.run_until_idle();
    assert_eq!(errors.borrow().len(), 1);
}

#[test]
fn rejected_configuration_is_reported_like_missing_support() {
    let host = SimHost::with_support(Support::Rejecting("rootMargin must be px or %".into()));
    let tracker = Tracker::new(
        host.clone(),
        TrackerConfig::default().with_root_margin("ten pixels"),
    );
    let errors = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&errors);
    tracker.on_error(move |err| seen.borrow_mut().push(err.to_string()));
    host.run_until_idle();
    assert_eq!(errors.borrow().len(), 1);
    assert!(errors.borrow()[0].contains("rootMargin must be px or %"));
    assert!(!tracker.is_supported());
}

#[test]
fn error_handler_is_read_when_the_tick_fires() {
    let host = SimHost::unsupported();
    let tracker = Tracker::new(host.clone(), TrackerConfig::default());
    let log = new_log();
    let (first, second) = (Rc::clone(&log), Rc::clone(&log));
    tracker
        .on_error(move |_| push(&first, "first"))
        .on_error(move |_| push(&second, "second"));
    host.run_until_idle();
    assert_eq!(take(&log), ["second"]);
}

#[test]
fn stagger_spreads_visible_callbacks_by_batch_position() {
    let (host, tracker) = setup(&[0.0]);
    let els = host.create_elements(3, "li", &["item"]);
    let log = new_log();
    let sink = Rc::clone(&log);
    let clock = host.clone();
    tracker.observe(
        WatchRequest::selector(".item")
            .stagger(Duration::from_millis(100))
            .on_visible(move |e: &WatchedEntry<SimElement>| {
                push(
                    &sink,
                    format!("{}@{}", e.element().id(), clock.now().as_millis()),
                );
            }),
    );
    assert_eq!(tracker.len(), 3);

    host.deliver_ratios(&[(&els[0], 0.2), (&els[1], 0.2), (&els[2], 0.2)]);
    assert_eq!(
        host.scheduled_delays(),
        [
            Duration::ZERO,
            Duration::from_millis(100),
            Duration::from_millis(200)
        ]
    );

    host.advance(Duration::from_millis(150));
    assert_eq!(take(&log), ["0@0", "1@100"]);
    host.advance(Duration::from_millis(50));
    assert_eq!(take(&log), ["2@200"]);
}

#[test]
fn stagger_uses_position_in_the_whole_batch() {
    let (host, tracker) = setup(&[0.0]);
    let stranger = host.create_element("p", &[]);
    let el = host.create_element("div", &[]);
    tracker.observe(WatchRequest::elements([el.clone()]).stagger(Duration::from_millis(40)));

    host.deliver_ratios(&[(&stranger, 1.0), (&stranger, 1.0), (&el, 1.0)]);
    assert_eq!(host.scheduled_delays(), [Duration::from_millis(80)]);
}

#[test]
fn without_always_trigger_visible_fires_once_per_lifetime() {
    let (host, tracker) = setup(&[0.0]);
    let el = host.create_element("div", &[]);
    let log = new_log();
    tracker.observe(logged(&el, &log).always_trigger(false).keep_observing(true));

    for _ in 0..4 {
        host.deliver_ratios(&[(&el, 0.8)]);
        host.deliver_ratios(&[(&el, 0.0)]);
    }
    host.run_until_idle();
    let lines = take(&log);
    assert_eq!(lines.iter().filter(|l| l.starts_with("visible")).count(), 1);
    assert_eq!(lines.iter().filter(|l| l.starts_with("hidden")).count(), 4);
}

#[test]
fn repeated_identical_batches_do_not_retrigger() {
    let (host, tracker) = setup(&[0.0, 0.5, 1.0]);
    let el = host.create_element("div", &[]);
    let log = new_log();
    tracker.observe(logged(&el, &log).keep_observing(true).trigger_ratio(0.5));

    host.deliver_ratios(&[(&el, 0.75)]);
    host.run_until_idle();
    assert_eq!(take(&log), ["visible:0"]);

    host.deliver_ratios(&[(&el, 0.75)]);
    host.deliver_ratios(&[(&el, 1.0)]);
    host.run_until_idle();
    assert!(take(&log).is_empty());
    assert_eq!(tracker.entry(&el).map(|e| e.ratio()), Some(1.0));

    host.deliver_ratios(&[(&el, 0.25)]);
    host.deliver_ratios(&[(&el, 0.25)]);
    assert_eq!(take(&log), ["hidden:0"]);
}

#[test]
fn ratio_equal_to_trigger_counts_as_hidden() {
    let (host, tracker) = setup(&[0.5]);
    let el = host.create_element("div", &[]);
    let log = new_log();
    tracker.observe(logged(&el, &log).keep_observing(true).trigger_ratio(0.5));

    host.deliver_ratios(&[(&el, 0.5)]);
    host.run_until_idle();
    assert!(take(&log).is_empty());

    host.deliver_ratios(&[(&el, 0.51)]);
    host.deliver_ratios(&[(&el, 0.5)]);
    host.run_until_idle();
    assert_eq!(take(&log), ["hidden:0", "visible:0"]);
}

#[test]
fn records_update_geometry_on_every_batch() {
    let (host, tracker) = setup(&[0.0]);
    let el = host.create_element("img", &[]);
    tracker.observe(WatchRequest::elements([el.clone()]).keep_observing(true));

    host.deliver(&[SimHost::record(&el, 0.0, 900.0, 50.0)]);
    let entry = tracker.entry(&el).expect("entry");
    assert_eq!(
        entry.bounding_client_rect(),
        ClientRect::from_xywh(0.0, 900.0, 50.0, 50.0)
    );

    host.deliver(&[SimHost::record(&el, 0.4, 700.0, 50.0)]);
    assert_eq!(entry.ratio(), 0.4);
    assert_eq!(entry.bounding_client_rect().top, 700.0);
}

#[test]
fn entry_callback_runs_before_global_callback() {
    let (host, tracker) = setup(&[0.0]);
    let el = host.create_element("div", &[]);
    let log = new_log();
    let (v, h) = (Rc::clone(&log), Rc::clone(&log));
    tracker
        .on_any_visible(move |e| push(&v, format!("any-visible:{}", e.element().id())))
        .on_any_hidden(move |e| push(&h, format!("any-hidden:{}", e.element().id())));
    tracker.observe(logged(&el, &log));

    host.deliver_ratios(&[(&el, 1.0)]);
    host.run_until_idle();
    host.deliver_ratios(&[(&el, 0.0)]);
    assert_eq!(
        take(&log),
        ["visible:0", "any-visible:0", "hidden:0", "any-hidden:0"]
    );
}

#[test]
fn global_visible_callback_is_read_at_fire_time() {
    let (host, tracker) = setup(&[0.0]);
    let el = host.create_element("div", &[]);
    let log = new_log();
    let early = Rc::clone(&log);
    tracker.on_any_visible(move |_| push(&early, "early"));
    tracker.observe(WatchRequest::elements([el.clone()]).stagger(Duration::from_millis(10)));

    host.deliver_ratios(&[(&el, 1.0)]);
    let late = Rc::clone(&log);
    tracker.on_any_visible(move |_| push(&late, "late"));
    host.run_until_idle();
    assert_eq!(take(&log), ["late"]);
}

#[test]
fn staggered_callback_fires_against_evicted_entry() {
    let (host, tracker) = setup(&[0.0]);
    let els = host.create_elements(2, "div", &[]);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    tracker.observe(
        WatchRequest::elements(els.clone())
            .stagger(Duration::from_millis(100))
            .on_visible(move |e| sink.borrow_mut().push((e.element().id(), e.in_view()))),
    );

    host.deliver_ratios(&[(&els[0], 1.0), (&els[1], 1.0)]);
    host.advance(Duration::from_millis(10));
    host.deliver_ratios(&[(&els[1], 0.0)]);
    assert!(!tracker.is_watching(&els[1]));

    host.run_until_idle();
    assert_eq!(*seen.borrow(), [(0, true), (1, false)]);
}

#[test]
fn queued_callbacks_survive_unwatch_all_and_tracker_drop() {
    let (host, tracker) = setup(&[0.0]);
    let el = host.create_element("div", &[]);
    let log = new_log();
    let any = Rc::clone(&log);
    tracker.on_any_visible(move |_| push(&any, "any"));
    tracker.observe(logged(&el, &log).stagger(Duration::from_millis(5)));

    host.deliver_ratios(&[(&el, 1.0)]);
    tracker.unwatch_all();
    assert!(tracker.is_empty());
    assert_eq!(host.disconnect_count(), 1);
    drop(tracker);

    host.run_until_idle();
    assert_eq!(
        take(&log),
        ["visible:0"],
        "global slot went away with the tracker"
    );
}

#[test]
fn unwatch_uses_identity_not_structure() {
    let (host, tracker) = setup(&[0.0]);
    let twins = host.create_elements(2, "li", &["row"]);
    assert!(twins[0].is_equal_node(&twins[1]));
    tracker.observe(WatchRequest::elements(twins.clone()).keep_observing(true));

    assert!(tracker.unwatch_one(&twins[0]));
    assert!(!tracker.unwatch_one(&twins[0]));
    assert!(tracker.is_watching(&twins[1]));
    assert_eq!(host.observed(), [twins[1].clone()]);
}

#[test]
fn eviction_keeps_structurally_equal_siblings() {
    let (host, tracker) = setup(&[0.0]);
    let twins = host.create_elements(3, "li", &["row"]);
    tracker.observe(WatchRequest::elements(twins.clone()));

    host.deliver_ratios(&[(&twins[1], 1.0)]);
    host.deliver_ratios(&[(&twins[1], 0.0)]);
    let left: Vec<_> = tracker.entries().iter().map(|e| e.element()).collect();
    assert_eq!(left, [twins[0].clone(), twins[2].clone()]);
}

#[test]
fn unwatch_many_skips_unknown_elements() {
    let (host, tracker) = setup(&[0.0]);
    let els = host.create_elements(4, "div", &[]);
    let stranger = host.create_element("div", &[]);
    tracker.observe(WatchRequest::elements(els[..3].to_vec()));

    tracker.unwatch_many([&els[0], &stranger, &els[2], &els[3]]);
    assert_eq!(tracker.len(), 1);
    assert!(tracker.is_watching(&els[1]));
    assert_eq!(host.observed(), [els[1].clone()]);
}

#[test]
fn callbacks_may_reenter_the_tracker() {
    let (host, tracker) = setup(&[0.0]);
    let first = host.create_element("div", &[]);
    let second = host.create_element("div", &[]);
    let third = host.create_element("div", &[]);

    let handle = tracker.clone();
    let (unwatch, watch) = (second.clone(), third.clone());
    tracker.observe(
        WatchRequest::elements([first.clone(), second.clone()])
            .keep_observing(true)
            .on_hidden(move |_| {
                handle.unwatch_one(&unwatch);
                handle.observe(WatchRequest::elements([watch.clone()]));
            }),
    );

    host.deliver_ratios(&[(&first, 1.0)]);
    host.deliver_ratios(&[(&first, 0.0), (&second, 1.0), (&third, 1.0)]);
    assert!(!tracker.is_watching(&second));
    assert!(tracker.is_watching(&third));
    assert!(tracker.entry(&third).is_some_and(|e| e.in_view()));
}

#[test]
fn root_selector_resolves_or_falls_back_to_viewport() {
    let host = SimHost::new();
    let scroller = host.create_element("div", &["scroller"]);
    let tracker = Tracker::new(
        host.clone(),
        TrackerConfig::default()
            .with_root(".scroller")
            .with_root_margin("0px 0px -20% 0px")
            .with_thresholds([0.0, 0.25]),
    );
    assert_eq!(tracker.root(), &RootContext::Element(scroller.clone()));
    let init = host.last_init().expect("subscription");
    assert_eq!(init.root, Some(scroller));
    assert_eq!(init.root_margin, "0px 0px -20% 0px");
    assert_eq!(init.thresholds, [0.0, 0.25]);

    let fallback = Tracker::new(host.clone(), TrackerConfig::default().with_root(".nope"));
    assert_eq!(fallback.root(), &RootContext::Viewport);
    assert_eq!(host.last_init().and_then(|i| i.root), None);
}

#[derive(Default)]
struct Events {
    scheduled: Vec<VisibleScheduledEvent>,
    unwatched: Vec<UnwatchEvent>,
    duplicates: Vec<EntryId>,
    unmatched: Vec<usize>,
}

impl TraceSink for Events {
    fn on_visible_scheduled(&mut self, e: &VisibleScheduledEvent) {
        self.scheduled.push(*e);
    }

    fn on_unwatch(&mut self, e: &UnwatchEvent) {
        self.unwatched.push(*e);
    }

    fn on_duplicate(&mut self, existing: EntryId) {
        self.duplicates.push(existing);
    }

    fn on_unmatched(&mut self, batch_index: usize) {
        self.unmatched.push(batch_index);
    }
}

#[test]
fn trace_sink_sees_tracker_decisions() {
    let (host, tracker) = setup(&[0.0]);
    let events = Rc::new(RefCell::new(Events::default()));
    tracker.set_trace_sink(Rc::clone(&events));

    let els = host.create_elements(2, "div", &[]);
    let stranger = host.create_element("div", &[]);
    tracker.observe(WatchRequest::elements(els.clone()).stagger(Duration::from_millis(30)));
    tracker.observe(WatchRequest::elements([els[0].clone()]));

    host.deliver_ratios(&[(&stranger, 1.0), (&els[1], 1.0)]);
    host.deliver_ratios(&[(&els[1], 0.0)]);
    tracker.unwatch_one(&els[0]);

    let events = events.borrow();
    assert_eq!(events.duplicates, [EntryId(0)]);
    assert_eq!(events.unmatched, [0]);
    assert_eq!(events.scheduled.len(), 1);
    assert_eq!(events.scheduled[0].entry, EntryId(1));
    assert_eq!(events.scheduled[0].delay, Duration::from_millis(30));
    assert_eq!(
        events.unwatched,
        [
            UnwatchEvent {
                entry: EntryId(1),
                reason: UnwatchReason::Evicted,
            },
            UnwatchEvent {
                entry: EntryId(0),
                reason: UnwatchReason::Explicit,
            },
        ]
    );
}
