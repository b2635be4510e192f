use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::ERR_POISONED_LOCK;
use crate::pal::{Platform, PlatformFacade};
use crate::time_table::SpanMap;

/// Records one named wall-clock interval into the owning [`TimeTable`][crate::TimeTable].
///
/// A recorder captures its creation time and can be explicitly started and ended.
/// Exactly one interval is recorded per recorder, no matter how it is used:
///
/// - `end()` records `[start, end]`, where the start falls back to the creation
///   time when `start()` was never called;
/// - dropping a recorder that was never ended records `[start-or-creation, now]`.
///
/// Repeated `start()` and `end()` calls are no-ops after the first, so a recorder
/// can be handed to code that completes it redundantly without double counting.
/// Intervals of recorders that share a name are merged by the owning table.
///
/// # Examples
///
/// Explicit start and end:
///
/// ```
/// use wall_times::TimeTable;
///
/// let table = TimeTable::new();
///
/// let recorder = table.add_recorder("parse");
/// recorder.start();
/// // ... the work being timed ...
/// recorder.end();
///
/// assert!(table.report().starts_with("[parse: "));
/// ```
///
/// Scope-based recording, where the interval runs from creation to drop:
///
/// ```
/// use wall_times::TimeTable;
///
/// let table = TimeTable::new();
/// {
///     let _recorder = table.add_recorder("load");
///     // ... the work being timed ...
/// }
///
/// assert!(table.report().starts_with("[load: "));
/// ```
#[derive(Debug)]
pub struct Recorder {
    name: String,
    spans: Arc<SpanMap>,
    platform: PlatformFacade,
    created_at: Duration,
    state: Mutex<RecorderState>,
}

#[derive(Debug)]
struct RecorderState {
    started_at: Option<Duration>,
    ended_at: Option<Duration>,
    recorded: bool,
}

impl Recorder {
    pub(crate) fn new(name: String, spans: Arc<SpanMap>, platform: PlatformFacade) -> Self {
        let created_at = platform.timestamp();

        Self {
            name,
            spans,
            platform,
            created_at,
            state: Mutex::new(RecorderState {
                started_at: None,
                ended_at: None,
                recorded: false,
            }),
        }
    }

    /// The name this recorder's interval is recorded under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Marks the start of the interval.
    ///
    /// Only the first call has an effect; later calls, and calls after `end()`,
    /// are no-ops. Without a call to `start()` the interval starts at the
    /// recorder's creation time.
    pub fn start(&self) {
        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);

        if state.started_at.is_some() || state.ended_at.is_some() {
            return;
        }

        state.started_at = Some(self.platform.timestamp());
    }

    /// Marks the end of the interval and records it into the owning table.
    ///
    /// Only the first call has an effect; the interval is recorded exactly once.
    pub fn end(&self) {
        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);

        if state.ended_at.is_some() {
            return;
        }

        let now = self.platform.timestamp();
        state.ended_at = Some(now);
        self.record(&mut state, now);
    }

    /// The time elapsed since `start()` was called, or since creation when it
    /// was not.
    ///
    /// Read-only: the interval state is unaffected, and the value keeps growing
    /// even after `end()`.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        let state = self.state.lock().expect(ERR_POISONED_LOCK);
        let reference = state.started_at.unwrap_or(self.created_at);

        self.platform.timestamp().saturating_sub(reference)
    }

    /// Records the interval into the span map, once.
    ///
    /// The merge into the map is a min/max update and cannot fail, which is what
    /// makes the exactly-once guarantee hold on every path including drop.
    fn record(&self, state: &mut RecorderState, ended_at: Duration) {
        if state.recorded {
            return;
        }

        let started_at = state.started_at.unwrap_or(self.created_at);
        self.spans.merge(&self.name, started_at, ended_at);
        state.recorded = true;
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);

        if state.recorded {
            return;
        }

        let now = self.platform.timestamp();
        self.record(&mut state, now);
    }
}
