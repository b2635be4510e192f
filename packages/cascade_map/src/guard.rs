//! Release guards handed out by [`CascadeMap::guard()`][crate::CascadeMap::guard].

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use crate::ERR_POISONED_LOCK;
use crate::map::MapState;

/// Owns the registration of one key in a [`CascadeMap`][crate::CascadeMap].
///
/// Dropping the guard removes the key and every key transitively linked beneath it
/// from the registry, in a single pass under the registry lock. The guarded value
/// itself stays alive for as long as any `Arc` clone of it exists; the guard only
/// controls registry membership.
///
/// The guard dereferences to the value, so it can stand in for the value wherever
/// a borrow is enough.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use cascade_map::CascadeMap;
///
/// let map = CascadeMap::new();
/// map.insert("session", Arc::new("state".to_string()));
/// map.insert_linked("session-child", "session", || Arc::new(String::new()));
///
/// let guard = map.guard("session").unwrap();
/// assert_eq!(guard.key(), "session");
/// assert_eq!(&**guard, "state");
///
/// // Releasing the guard sweeps the key and its linked child.
/// drop(guard);
/// assert!(map.get("session").is_none());
/// assert!(map.get("session-child").is_none());
/// ```
#[must_use = "dropping the guard removes the key and everything linked beneath it"]
pub struct CascadeGuard<T> {
    key: String,
    data: Arc<T>,
    state: Arc<Mutex<MapState<T>>>,
}

impl<T> CascadeGuard<T> {
    pub(crate) fn new(key: String, data: Arc<T>, state: Arc<Mutex<MapState<T>>>) -> Self {
        Self { key, data, state }
    }

    /// The key this guard releases on drop.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The shared value registered under the guarded key.
    ///
    /// Clone the `Arc` to keep the value alive past the guard's release.
    #[must_use]
    pub fn data(&self) -> &Arc<T> {
        &self.data
    }
}

impl<T> Deref for CascadeGuard<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> fmt::Debug for CascadeGuard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CascadeGuard")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<T> Drop for CascadeGuard<T> {
    fn drop(&mut self) {
        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);

        // Another guard for the same key may have swept already; the sweep
        // tolerates absent keys, so this is naturally idempotent.
        state.remove_cascading(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CascadeMap;

    #[test]
    fn missing_key_yields_no_guard() {
        let map: CascadeMap<u32> = CascadeMap::new();

        assert!(map.guard("absent").is_none());
    }

    #[test]
    fn drop_removes_key() {
        let map = CascadeMap::new();
        map.insert("solo", Arc::new(1_u32));

        let guard = map.guard("solo").unwrap();
        drop(guard);

        assert!(map.get("solo").is_none());
        assert!(map.is_empty());
    }

    #[test]
    fn drop_removes_transitive_children() {
        let map = CascadeMap::new();
        map.insert("a", Arc::new("root".to_string()));
        map.insert_linked("b", "a", || Arc::new(String::new()));
        map.insert_linked("c", "b", || Arc::new(String::new()));

        drop(map.guard("a"));

        assert!(map.get("a").is_none());
        assert!(map.get("b").is_none());
        assert!(map.get("c").is_none());
        assert!(map.is_empty());
    }

    #[test]
    fn sibling_subtree_survives() {
        let map = CascadeMap::new();
        map.insert("a", Arc::new(1_u32));
        map.insert_linked("a-child", "a", || Arc::new(0));
        map.insert("x", Arc::new(2));
        map.insert_linked("x-child", "x", || Arc::new(0));

        drop(map.guard("a"));

        assert!(map.get("a").is_none());
        assert!(map.get("a-child").is_none());
        assert!(map.get("x").is_some());
        assert!(map.get("x-child").is_some());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn data_outlives_removal() {
        let map = CascadeMap::new();
        map.insert("job", Arc::new("still here".to_string()));

        let kept = map.get("job").unwrap();
        drop(map.guard("job"));

        assert!(map.get("job").is_none());
        assert_eq!(*kept, "still here");
    }

    #[test]
    fn second_guard_drop_is_inert() {
        let map = CascadeMap::new();
        map.insert("shared", Arc::new(5_u32));
        map.insert("bystander", Arc::new(6));

        let first = map.guard("shared").unwrap();
        let second = map.guard("shared").unwrap();

        drop(first);
        assert!(map.get("shared").is_none());
        assert_eq!(map.len(), 1);

        drop(second);
        assert_eq!(map.len(), 1);
        assert!(map.get("bystander").is_some());
    }

    #[test]
    fn child_guard_releases_only_its_subtree() {
        let map = CascadeMap::new();
        map.insert("a", Arc::new(1_u32));
        map.insert_linked("b", "a", || Arc::new(0));
        map.insert_linked("c", "b", || Arc::new(0));

        drop(map.guard("b"));

        assert!(map.get("a").is_some());
        assert!(map.get("b").is_none());
        assert!(map.get("c").is_none());

        // The base key no longer lists the released child.
        assert_eq!(map.children_of("a").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn guard_exposes_shared_data() {
        let map = CascadeMap::new();
        let data = Arc::new("payload".to_string());
        map.insert("key", Arc::clone(&data));

        let guard = map.guard("key").unwrap();

        assert!(Arc::ptr_eq(guard.data(), &data));
        assert_eq!(&**guard, "payload");
    }

    // Guards travel between threads together with the values they guard.
    static_assertions::assert_impl_all!(CascadeGuard<String>: Send, Sync);
}
