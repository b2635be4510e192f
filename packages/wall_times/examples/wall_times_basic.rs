//! Simplified example demonstrating key `wall_times` types working together.
//!
//! This example shows how to use the main types in the `wall_times` package:
//! - `ContextManager`: Registers contexts and tracks the current one per thread
//! - `ContextHandle`: Owns one activation of a context and releases it on drop
//! - `Recorder`: Records one named wall-clock interval
//!
//! Run with: `cargo run --example wall_times_basic`.

use std::thread;
use std::time::Duration;

use wall_times::ContextManager;

fn main() {
    println!("=== Wall-Clock Timing Example ===");
    println!();

    let manager = ContextManager::new();

    // Register a context for this request and make it current on this thread.
    let handle = manager.init("request-001");
    handle.add_field("endpoint", "/api/v1/report");
    handle.add_field("user", "alice");
    println!("✓ Initialized context '{}'", handle.logid());

    // One recorder covers the whole request. It is deliberately left open;
    // taking the report at the end closes it.
    let main_process = handle.add_recorder("main_process");
    main_process.start();

    parse_input(&manager);
    query_backend(&manager);

    println!("✓ Request processing finished");
    println!();

    // Everything recorded anywhere in the call stack lands in one line.
    println!("Report:");
    println!("{}", handle.report());
    println!();

    // Dropping the handle releases the registration; the context itself
    // lives on for as long as someone holds an Arc to it.
    drop(handle);
    assert_eq!(manager.current_context().logid(), "");
    println!("✓ Released; lookups on this thread now get an anonymous context");
}

/// Parses the request. Reaches the current context through the manager
/// instead of having it passed in.
fn parse_input(manager: &ContextManager) {
    let context = manager.current_context();

    // Dropping the recorder at the end of the scope ends the interval.
    let _step = context.add_recorder("parse_input");
    thread::sleep(Duration::from_millis(100));
}

/// Queries the backend and renders the response.
fn query_backend(manager: &ContextManager) {
    let context = manager.current_context();
    context.add_field("cache", "miss");

    {
        let _step = context.add_recorder("backend_query");
        thread::sleep(Duration::from_millis(150));
    }

    {
        let _step = context.add_recorder("render_response");
        thread::sleep(Duration::from_millis(50));
    }
}
