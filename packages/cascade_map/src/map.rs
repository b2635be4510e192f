use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::ERR_POISONED_LOCK;
use crate::guard::CascadeGuard;

/// A string-keyed registry of shared values in which keys can be linked to a base key
/// and later released in cascades.
///
/// Every entry holds an [`Arc<T>`]. Linked keys share the `Arc` of their base key, so
/// looking up any key in a linked family yields the same underlying value. Links are
/// remembered as a parent-to-children relation; releasing a key through its
/// [`CascadeGuard`] also releases every key transitively linked beneath it.
///
/// Registry membership and value lifetime are independent: removing a key drops the
/// registry's reference, while clones of the `Arc` held elsewhere keep the value alive.
///
/// All operations lock a single internal mutex, so the registry can be freely shared
/// across threads.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use cascade_map::CascadeMap;
///
/// let map = CascadeMap::new();
/// map.insert("request-1", Arc::new("payload".to_string()));
///
/// // A linked key resolves to the base key's value.
/// map.insert_linked("request-1-retry", "request-1", || Arc::new(String::new()));
/// let via_link = map.get("request-1-retry").unwrap();
/// assert_eq!(*via_link, "payload");
///
/// // Dropping the base key's guard releases the whole family.
/// drop(map.guard("request-1"));
/// assert!(map.is_empty());
/// ```
pub struct CascadeMap<T> {
    state: Arc<Mutex<MapState<T>>>,
}

/// Entries and the parent-to-children link relation, guarded by one mutex.
///
/// Child sets may contain names of keys that were already released individually;
/// the sweep and the accessors tolerate and filter these.
pub(crate) struct MapState<T> {
    entries: HashMap<String, Arc<T>>,
    children: HashMap<String, HashSet<String>>,
}

impl<T> CascadeMap<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MapState {
                entries: HashMap::new(),
                children: HashMap::new(),
            })),
        }
    }

    /// Inserts `data` under `key` as an unlinked root entry.
    ///
    /// If the key already exists, its value is replaced while any links recorded for
    /// it remain in effect. Keys previously linked to it keep the `Arc` they shared
    /// at link time.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use cascade_map::CascadeMap;
    ///
    /// let map = CascadeMap::new();
    /// map.insert("config", Arc::new(42_u32));
    /// assert_eq!(map.get("config").as_deref(), Some(&42));
    /// ```
    pub fn insert(&self, key: impl Into<String>, data: Arc<T>) {
        let key = key.into();

        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);
        state.children.entry(key.clone()).or_default();
        state.entries.insert(key, data);
    }

    /// Inserts `key` as a link to `base_key`, sharing the base key's value.
    ///
    /// On success the new key resolves to the same `Arc` as the base key and is
    /// recorded as its child, so releasing the base key's [`CascadeGuard`] also
    /// releases this key. Returns `true` when the link was made.
    ///
    /// If `base_key` is not present, this is a caller contract violation: a warning
    /// is logged and `key` is inserted as an unlinked root holding `fallback()`, so
    /// later lookups still find a usable value. Returns `false` in that case. The
    /// fallback is not invoked when the base key exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use cascade_map::CascadeMap;
    ///
    /// let map = CascadeMap::new();
    /// map.insert("base", Arc::new("shared".to_string()));
    ///
    /// assert!(map.insert_linked("child", "base", || Arc::new(String::new())));
    /// let base = map.get("base").unwrap();
    /// let child = map.get("child").unwrap();
    /// assert!(Arc::ptr_eq(&base, &child));
    /// ```
    pub fn insert_linked(
        &self,
        key: impl Into<String>,
        base_key: &str,
        fallback: impl FnOnce() -> Arc<T>,
    ) -> bool {
        let key = key.into();

        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);

        match state.entries.get(base_key).map(Arc::clone) {
            Some(base_data) => {
                state
                    .children
                    .entry(base_key.to_string())
                    .or_default()
                    .insert(key.clone());
                state.children.entry(key.clone()).or_default();
                state.entries.insert(key, base_data);
                true
            }
            None => {
                warn!(
                    key = %key,
                    base_key,
                    "base key not found, inserting as unlinked root"
                );
                state.children.entry(key.clone()).or_default();
                state.entries.insert(key, fallback());
                false
            }
        }
    }

    /// Looks up the value registered under `key`.
    ///
    /// Has no structural effect; in particular it does not touch links.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        let state = self.state.lock().expect(ERR_POISONED_LOCK);
        state.entries.get(key).map(Arc::clone)
    }

    /// Acquires a release guard for `key`, or `None` if the key is not present.
    ///
    /// Dropping the guard removes the key and every key transitively linked beneath
    /// it from the registry. Multiple guards may exist for one key; the first to be
    /// dropped performs the removal and the remaining ones become inert.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use cascade_map::CascadeMap;
    ///
    /// let map = CascadeMap::new();
    /// map.insert("job", Arc::new(7_u8));
    ///
    /// let guard = map.guard("job").unwrap();
    /// assert_eq!(*guard, 7);
    ///
    /// drop(guard);
    /// assert!(map.get("job").is_none());
    /// ```
    #[must_use]
    pub fn guard(&self, key: &str) -> Option<CascadeGuard<T>> {
        let state = self.state.lock().expect(ERR_POISONED_LOCK);
        state.entries.get(key).map(|data| {
            CascadeGuard::new(key.to_string(), Arc::clone(data), Arc::clone(&self.state))
        })
    }

    /// Returns the keys currently linked beneath `key`, sorted by name, or `None`
    /// if the key is not present.
    ///
    /// Only keys that still resolve are listed; links whose keys were already
    /// released individually are omitted.
    #[must_use]
    pub fn children_of(&self, key: &str) -> Option<Vec<String>> {
        let state = self.state.lock().expect(ERR_POISONED_LOCK);

        if !state.entries.contains_key(key) {
            return None;
        }

        let mut listed: Vec<String> = match state.children.get(key) {
            Some(children) => children
                .iter()
                .filter(|child| state.entries.contains_key(child.as_str()))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        listed.sort_unstable();

        Some(listed)
    }

    /// Returns the number of keys currently registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().expect(ERR_POISONED_LOCK).entries.len()
    }

    /// Returns `true` if no keys are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().expect(ERR_POISONED_LOCK).entries.is_empty()
    }
}

impl<T> Default for CascadeMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CascadeMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().expect(ERR_POISONED_LOCK);

        f.debug_struct("CascadeMap")
            .field("len", &state.entries.len())
            .finish_non_exhaustive()
    }
}

impl<T> MapState<T> {
    /// Removes `origin` and every key transitively linked beneath it.
    ///
    /// Breadth-first sweep over the link relation: the whole subtree is collected
    /// first, then erased from the entry mapping. A key's child set is taken out of
    /// the relation before its members are enqueued, so link cycles cannot revisit a
    /// key and sweeping an already absent key is a no-op.
    ///
    /// Returns the keys that were actually removed.
    pub(crate) fn remove_cascading(&mut self, origin: &str) -> Vec<String> {
        let mut doomed = Vec::new();
        let mut pending = VecDeque::new();
        pending.push_back(origin.to_string());

        while let Some(key) = pending.pop_front() {
            if let Some(children) = self.children.remove(&key) {
                pending.extend(children);
            }

            doomed.push(key);
        }

        let mut removed = Vec::new();
        for key in doomed {
            if self.entries.remove(&key).is_some() {
                removed.push(key);
            }
        }

        if !removed.is_empty() {
            debug!(origin, removed = ?removed, "released keys");
        }

        removed
    }
}
