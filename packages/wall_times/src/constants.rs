// A poisoned lock means another thread panicked while updating timing state, so any
// report built from that state could be wrong (we panic).
pub(crate) const ERR_POISONED_LOCK: &str =
    "encountered poisoned lock - program validity cannot be guaranteed";
