//! This package provides [`CascadeMap`], a thread-safe, string-keyed registry of shared
//! values in which keys can be linked to a base key and released in cascades.
//!
//! The registry was built for request-scoped bookkeeping: one piece of state is
//! registered under a primary key, additional keys are linked to it as aliases for
//! nested or concurrent activations, and releasing the primary key tears the whole
//! family down at once.
//!
//! # Features
//!
//! - **Shared values**: every entry is an [`Arc`][std::sync::Arc]; linked keys resolve
//!   to the same value as their base key.
//! - **Cascading release**: a [`CascadeGuard`] removes its key and every key
//!   transitively linked beneath it when dropped.
//! - **Decoupled lifetimes**: removal only ends registry membership; the value lives
//!   on while any `Arc` clone of it exists.
//! - **Graceful degradation**: linking to a missing base key logs a warning and falls
//!   back to an unlinked entry instead of failing.
//! - **Thread-safe**: one internal mutex guards all bookkeeping.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cascade_map::CascadeMap;
//!
//! let map = CascadeMap::new();
//!
//! // Register a root entry and link two aliases to it.
//! map.insert("order-17", Arc::new("order state".to_string()));
//! map.insert_linked("order-17-audit", "order-17", || Arc::new(String::new()));
//! map.insert_linked("order-17-retry", "order-17", || Arc::new(String::new()));
//!
//! // All three keys resolve to the same shared value.
//! let root = map.get("order-17").unwrap();
//! let audit = map.get("order-17-audit").unwrap();
//! assert!(Arc::ptr_eq(&root, &audit));
//!
//! // Dropping the root guard releases the entire family.
//! drop(map.guard("order-17"));
//! assert!(map.is_empty());
//! ```

mod constants;
mod guard;
mod map;

pub(crate) use constants::ERR_POISONED_LOCK;
pub use guard::CascadeGuard;
pub use map::CascadeMap;
