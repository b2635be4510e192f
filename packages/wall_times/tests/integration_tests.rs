//! Integration tests for `wall_times` against the real clock.
//!
//! These tests sleep for real wall-clock time and verify that the recorded
//! spans cover at least that much time. Upper bounds are generous so the tests
//! stay reliable on heavily loaded machines.

use std::thread;
use std::time::Duration;

use wall_times::ContextManager;

/// An interval long enough for `thread::sleep` to dominate scheduling noise.
const SLEEP: Duration = Duration::from_millis(50);

/// Far above anything a healthy test run should take for one sleep.
const UPPER_BOUND_MS: f64 = 30_000.0;

/// Extracts the rendered milliseconds of one span from a report line.
fn span_millis(report: &str, name: &str) -> f64 {
    let marker = format!("[{name}: ");
    let value_start = report
        .find(&marker)
        .unwrap_or_else(|| panic!("span {name} not found in report: {report}"))
        + marker.len();
    let rest = &report[value_start..];
    let value_end = rest.find("(ms)").expect("span rendering is malformed");
    rest[..value_end]
        .parse()
        .expect("span milliseconds did not parse as a number")
}

#[test]
#[cfg_attr(miri, ignore)] // Miri cannot use the real operating system APIs.
fn explicit_interval_covers_real_sleep() {
    let manager = ContextManager::new();
    let handle = manager.init("it-explicit");

    let recorder = handle.add_recorder("nap");
    recorder.start();
    thread::sleep(SLEEP);
    recorder.end();

    let millis = span_millis(&handle.report(), "nap");
    assert!(
        millis >= SLEEP.as_secs_f64() * 1000.0,
        "expected the span to cover the {SLEEP:?} sleep, but got {millis}ms"
    );
    assert!(
        millis < UPPER_BOUND_MS,
        "expected a sane span duration, but got {millis}ms"
    );
}

#[test]
#[cfg_attr(miri, ignore)] // Miri cannot use the real operating system APIs.
fn scope_drop_records_the_interval() {
    let manager = ContextManager::new();
    let handle = manager.init("it-scoped");

    {
        let _step = handle.add_recorder("step");
        thread::sleep(SLEEP);
    }

    let millis = span_millis(&handle.report(), "step");
    assert!(
        millis >= SLEEP.as_secs_f64() * 1000.0,
        "expected the dropped recorder to cover the {SLEEP:?} sleep, but got {millis}ms"
    );
}

#[test]
#[cfg_attr(miri, ignore)] // Miri cannot use the real operating system APIs.
fn report_ends_an_open_recorder() {
    let manager = ContextManager::new();
    let handle = manager.init("it-open");

    // Deliberately left running; the report itself must close it.
    let recorder = handle.add_recorder("main");
    recorder.start();
    thread::sleep(SLEEP);

    let first = handle.report();
    let millis = span_millis(&first, "main");
    assert!(
        millis >= SLEEP.as_secs_f64() * 1000.0,
        "expected the forced end to cover the {SLEEP:?} sleep, but got {millis}ms"
    );

    // The interval is sealed now, so reporting again renders the same span.
    thread::sleep(Duration::from_millis(5));
    assert_eq!(handle.report(), first);
}

#[test]
#[cfg_attr(miri, ignore)] // Miri cannot use the real operating system APIs.
fn elapsed_tracks_real_time() {
    let manager = ContextManager::new();
    let handle = manager.init("it-elapsed");

    let recorder = handle.add_recorder("watched");
    recorder.start();
    thread::sleep(SLEEP);

    assert!(
        recorder.elapsed() >= SLEEP,
        "expected elapsed to cover the sleep, but got {:?}",
        recorder.elapsed()
    );
}

#[test]
#[cfg_attr(miri, ignore)] // Miri cannot use the real operating system APIs.
fn fields_and_spans_share_one_report_line() {
    let manager = ContextManager::new();
    let handle = manager.init("it-combined");
    handle.add_field("user", "alice");
    handle.add_field("user", "bob");
    handle.set_field("route", "/v2/status");

    {
        let _work = handle.add_recorder("work");
        thread::sleep(Duration::from_millis(10));
    }

    let report = handle.report();
    assert!(
        report.starts_with("[logid: it-combined] [route: /v2/status] [user: alice] [work: "),
        "unexpected report layout: {report}"
    );
    assert!(report.ends_with("(ms)]"), "unexpected report tail: {report}");
}

#[test]
#[cfg_attr(miri, ignore)] // Miri cannot use the real operating system APIs.
fn global_manager_round_trip() {
    // The global manager is shared with every other test in this binary, so
    // this test uses an identifier nothing else touches.
    let handle = ContextManager::global().init("it-global-round-trip");

    let context = ContextManager::global().current_context();
    assert_eq!(context.logid(), "it-global-round-trip");

    context.add_field("source", "global");
    assert!(handle.report().contains("[source: global]"));

    drop(handle);

    // The registration is gone; lookups on this thread degrade to an
    // anonymous context.
    assert_eq!(ContextManager::global().current_context().logid(), "");
}
