// A poisoned lock means another thread panicked while updating the registry, so the
// key/child bookkeeping may be incoherent and must not be used (we panic).
pub(crate) const ERR_POISONED_LOCK: &str =
    "encountered poisoned lock - program validity cannot be guaranteed";
