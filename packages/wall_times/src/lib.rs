//! Request-scoped wall-clock timing with merged, human-readable reports.
//!
//! This package records how long the named steps of a logical operation take and
//! renders them, together with the operation's identifier and key-value fields,
//! as a single report line.
//!
//! The core functionality includes:
//! - [`ContextManager`] - Registers contexts by identifier and tracks the current one per thread
//! - [`ContextHandle`] - Owns one activation's registration and releases it on drop
//! - [`Context`] - Carries the identifier, fields and recorded spans of one operation
//! - [`Recorder`] - Records one named wall-clock interval, at most once
//! - [`TimeTable`] - Collects recorders and merges same-named intervals into spans
//!
//! # Simple Usage
//!
//! ```
//! use wall_times::ContextManager;
//!
//! let manager = ContextManager::new();
//!
//! // Register a context for this operation and make it current on this thread.
//! let handle = manager.init("req-42");
//! handle.add_field("user", "alice");
//!
//! {
//!     // Each recorder measures one named interval; dropping it ends the interval.
//!     let _step = handle.add_recorder("parse");
//!     // ...the work being measured...
//! }
//!
//! // [logid: req-42] [user: alice] [parse: 0.031(ms)]
//! println!("{}", handle.report());
//! ```
//!
//! Code deeper in the call stack does not need the handle passed through; it can
//! reach the current context via the manager:
//!
//! ```
//! use wall_times::ContextManager;
//!
//! fn deep_in_the_call_stack(manager: &ContextManager) {
//!     let context = manager.current_context();
//!     let _span = context.add_recorder("db_query");
//!     // ...query...
//! }
//!
//! let manager = ContextManager::new();
//! let handle = manager.init("req-43");
//! deep_in_the_call_stack(&manager);
//! assert!(handle.report().contains("[db_query:"));
//! ```
//!
//! # Reentrant Activations
//!
//! Initializing an identifier that is already registered does not replace the
//! existing context. Instead the new activation gets an alternate registry key
//! linked to the same context, so fields and spans from every activation merge
//! into one report:
//!
//! ```
//! use wall_times::ContextManager;
//!
//! let manager = ContextManager::new();
//!
//! let outer = manager.init("job-9");
//! let retry = manager.init("job-9");
//!
//! retry.add_field("stage", "retry");
//! assert!(outer.report().contains("[stage: retry]"));
//! ```
//!
//! Dropping the base activation's handle releases every linked activation with
//! it; dropping a nested handle releases only that activation.
//!
//! # Threading
//!
//! All types are thread-safe. The current context is tracked per thread and per
//! manager, so `init` on one thread does not change what is current on another.
//! Contexts and handles can be moved across threads freely, allowing one thread
//! to record into, report on or release an activation that another created.

mod constants;
mod context;
mod manager;
mod pal;
mod recorder;
mod time_table;

pub(crate) use constants::ERR_POISONED_LOCK;
pub use context::Context;
pub use manager::{ContextHandle, ContextManager};
pub use recorder::Recorder;
pub use time_table::TimeTable;
