//! Reentrancy and multithreading example for `wall_times`.
//!
//! Worker threads re-enter a logical operation that is still in flight. Every
//! activation of the same identifier shares one context, so the spans recorded
//! by all workers merge into a single report. Independent operations on other
//! threads stay fully separate.
//!
//! Run with: `cargo run --example wall_times_reentrant`.
#![expect(
    clippy::arithmetic_side_effects,
    reason = "this is example code that does not need production-level safety"
)]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use wall_times::ContextManager;

fn main() {
    println!("=== Reentrant Activations Example ===");
    println!();

    let manager = Arc::new(ContextManager::new());

    // The base activation of the batch operation.
    let base = manager.init("batch-42");
    base.add_field("workers", "3");
    println!("✓ Base activation registered under key {:?}", base.key());

    {
        let _total = base.add_recorder("batch_total");

        // Each worker re-enters the same identifier. The manager links an
        // alternate key to the existing context instead of replacing it.
        let mut workers = Vec::new();
        for worker_index in 0..3 {
            let manager = Arc::clone(&manager);
            workers.push(thread::spawn(move || {
                let activation = manager.init("batch-42");
                println!(
                    "✓ Worker {worker_index} joined as key {:?}",
                    activation.key()
                );

                let _step = activation.add_recorder(format!("worker_{worker_index}"));
                thread::sleep(Duration::from_millis(40 * (worker_index + 1)));

                // Dropping the activation releases only this worker's key;
                // the base registration and the shared context remain.
            }));
        }
        for worker in workers {
            worker.join().unwrap();
        }
    }

    println!();
    println!("Merged report:");
    println!("{}", base.report());
    println!();

    // A different identifier on another thread is a separate operation with
    // its own context and its own report.
    let other_report = {
        let manager = Arc::clone(&manager);
        thread::spawn(move || {
            let activation = manager.init("maintenance-7");
            {
                let _step = activation.add_recorder("compact");
                thread::sleep(Duration::from_millis(30));
            }
            activation.report()
        })
        .join()
        .unwrap()
    };
    println!("Independent report:");
    println!("{other_report}");
    println!();

    // Dropping the base activation releases every key linked beneath it.
    drop(base);
    println!("✓ Base released; the whole activation family is gone");
}
