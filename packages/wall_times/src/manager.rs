use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex};

use cascade_map::{CascadeGuard, CascadeMap};
use tracing::{debug, warn};

use crate::ERR_POISONED_LOCK;
use crate::context::Context;
use crate::pal::PlatformFacade;

/// Registers [`Context`]s under logical identifiers and tracks, per thread, which
/// context is current.
///
/// A manager is an ordinary constructible object, so it can be created per
/// component and passed around like any dependency; [`global()`][Self::global]
/// provides a process-wide instance for code that wants one. Separate managers
/// are fully independent, including their per-thread current-context cells.
///
/// # Activations and reentrancy
///
/// [`init()`][Self::init] registers a context for an identifier and makes it
/// current on the calling thread. When the identifier is already registered -
/// the same logical operation entered again, on this thread or another - the
/// manager registers an alternate key (`dummy_<id>_<serial>`) linked to the
/// existing context instead. Every activation therefore shares one context, so
/// fields and spans from all of them merge into a single report, while each
/// activation holds its own releasable registration.
///
/// Releasing an activation's [`ContextHandle`] removes its key and every key
/// linked beneath it; the base activation's handle therefore tears down the
/// whole family, while a nested activation's handle releases just itself.
///
/// # Examples
///
/// ```
/// use wall_times::ContextManager;
///
/// let manager = ContextManager::new();
///
/// let handle = manager.init("req-7");
/// handle.add_field("route", "/status");
///
/// // Deeper code can reach the same context without it being passed through.
/// let context = manager.current_context();
/// context.add_field("cache", "hit");
///
/// assert_eq!(context.logid(), "req-7");
/// assert!(handle.report().starts_with("[logid: req-7] [cache: hit] [route: /status]"));
/// ```
#[derive(Debug)]
pub struct ContextManager {
    /// Distinguishes this manager's entry in the per-thread current-key cells.
    id: u64,

    registry: CascadeMap<Context>,

    /// Serializes the lookup-then-register sequence in `init`; concurrent inits
    /// for one identifier must observe each other's registrations.
    init_lock: Mutex<()>,

    dummy_serial: AtomicU64,

    platform: PlatformFacade,
}

/// The process-wide manager returned by [`ContextManager::global()`].
static GLOBAL_MANAGER: LazyLock<ContextManager> = LazyLock::new(ContextManager::new);

/// Source of unique manager identifiers, shared by all managers in the process.
static NEXT_MANAGER_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    /// The current registry key of each manager on this thread.
    ///
    /// Keyed by manager id so that independent managers used on one thread do
    /// not interfere. An entry stays in place until the same manager initializes
    /// again on this thread; if the key it names has been released, lookups
    /// through it degrade gracefully.
    static CURRENT_KEYS: RefCell<HashMap<u64, String>> = RefCell::new(HashMap::new());
}

impl ContextManager {
    /// Creates a new manager with no registered contexts.
    #[expect(
        clippy::new_without_default,
        reason = "a 'default manager' would be too easily confused with the process-wide one from global()"
    )]
    #[must_use]
    pub fn new() -> Self {
        Self::with_platform(PlatformFacade::real())
    }

    pub(crate) fn with_platform(platform: PlatformFacade) -> Self {
        Self {
            id: NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed),
            registry: CascadeMap::new(),
            init_lock: Mutex::new(()),
            dummy_serial: AtomicU64::new(0),
            platform,
        }
    }

    /// The process-wide manager instance.
    ///
    /// Created on first use. Intended for code that has no manager wired through
    /// its call path; components that can take a manager as a dependency should
    /// prefer their own [`new()`][Self::new] instance.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL_MANAGER
    }

    /// Registers a context for `logid`, makes it current on this thread and
    /// returns the handle owning the registration.
    ///
    /// If the identifier is not registered yet, a fresh [`Context`] is created
    /// and registered under it. If it is - a nested or concurrent activation of
    /// the same logical operation - an alternate key `dummy_<logid>_<serial>` is
    /// registered instead, linked to and sharing the existing context.
    ///
    /// Any previous current key of this manager on this thread is replaced and
    /// not released; release always happens through handles.
    pub fn init(&self, logid: impl Into<String>) -> ContextHandle {
        let logid = logid.into();

        let _init_guard = self.init_lock.lock().expect(ERR_POISONED_LOCK);

        let (key, context) = match self.registry.get(&logid) {
            None => {
                let context = Arc::new(Context::with_platform(
                    logid.as_str(),
                    self.platform.clone(),
                ));
                self.registry.insert(logid.as_str(), Arc::clone(&context));
                debug!(logid = %logid, "registered new context");

                (logid, context)
            }
            Some(existing) => {
                let serial = self.dummy_serial.fetch_add(1, Ordering::Relaxed);
                let key = format!("dummy_{logid}_{serial}");

                // The fallback only runs if the base key vanished since the
                // lookup above, in which case the alternate key becomes a root
                // with its own fresh context.
                self.registry.insert_linked(key.as_str(), &logid, || {
                    Arc::new(Context::with_platform(
                        logid.as_str(),
                        self.platform.clone(),
                    ))
                });
                debug!(logid = %logid, key = %key, "registered reentrant activation");

                (key, existing)
            }
        };

        self.set_current(&key);

        match self.registry.guard(&key) {
            Some(guard) => ContextHandle::registered(guard),
            None => {
                // Only reachable if a stale guard for the same key name was
                // dropped concurrently; the handle still carries the context,
                // it just has no registration left to release.
                warn!(key = %key, "context was released before its handle could be taken");
                ContextHandle::disconnected(context)
            }
        }
    }

    /// The context most recently made current on this thread by
    /// [`init()`][Self::init] on this manager.
    ///
    /// If nothing was initialized on this thread, or the current key has been
    /// released in the meantime, a warning is logged and a fresh disconnected
    /// context with an empty identifier is returned, so callers can record into
    /// it without checking.
    #[must_use]
    pub fn current_context(&self) -> Arc<Context> {
        if let Some(key) = self.current_key() {
            if let Some(context) = self.registry.get(&key) {
                return context;
            }
            warn!(key = %key, "current context key is no longer registered");
        } else {
            warn!("no context was initialized on this thread");
        }

        Arc::new(Context::with_platform(
            String::new(),
            self.platform.clone(),
        ))
    }

    /// Acquires a handle owning the registration of this thread's current
    /// context.
    ///
    /// Like [`current_context()`][Self::current_context], but the returned
    /// handle also owns the current key's registration, so dropping it releases
    /// the key and everything linked beneath it. On a lookup miss the handle is
    /// disconnected: it carries a fresh empty context and releases nothing.
    pub fn acquire_current_guard(&self) -> ContextHandle {
        if let Some(key) = self.current_key() {
            if let Some(guard) = self.registry.guard(&key) {
                return ContextHandle::registered(guard);
            }
            warn!(key = %key, "current context key is no longer registered");
        } else {
            warn!("no context was initialized on this thread");
        }

        ContextHandle::disconnected(Arc::new(Context::with_platform(
            String::new(),
            self.platform.clone(),
        )))
    }

    fn current_key(&self) -> Option<String> {
        CURRENT_KEYS.with_borrow(|keys| keys.get(&self.id).cloned())
    }

    fn set_current(&self, key: &str) {
        CURRENT_KEYS.with(|keys| {
            let previous = keys.borrow_mut().insert(self.id, key.to_string());
            if let Some(previous) = previous {
                debug!(previous = %previous, current = %key, "replaced current context key");
            }
        });
    }
}

/// Owns one activation's context registration.
///
/// The handle dereferences to its [`Context`], so fields, recorders and reports
/// are all directly reachable through it. Dropping the handle releases the
/// activation's registry key together with every key linked beneath it; the
/// context itself stays alive for as long as any `Arc` clone of it exists, so a
/// report can still be taken from a handle whose registration is gone.
///
/// Handles are `Send`, so an activation can be released from a different thread
/// than the one that created it.
#[must_use = "dropping the handle releases this activation's context registration"]
pub struct ContextHandle {
    context: Arc<Context>,
    guard: Option<CascadeGuard<Context>>,
}

impl ContextHandle {
    fn registered(guard: CascadeGuard<Context>) -> Self {
        Self {
            context: Arc::clone(guard.data()),
            guard: Some(guard),
        }
    }

    fn disconnected(context: Arc<Context>) -> Self {
        Self {
            context,
            guard: None,
        }
    }

    /// The shared context of this activation.
    ///
    /// Clone the `Arc` to keep the context alive past the handle's release.
    #[must_use]
    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// The registry key this handle releases on drop, or `None` for a
    /// disconnected handle.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.guard.as_ref().map(CascadeGuard::key)
    }

    /// Whether this handle owns a registration.
    ///
    /// Handles from degraded lookups are disconnected and release nothing.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.guard.is_some()
    }
}

impl Deref for ContextHandle {
    type Target = Context;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

impl fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextHandle")
            .field("logid", &self.context.logid())
            .field("key", &self.key())
            .finish_non_exhaustive()
    }
}
