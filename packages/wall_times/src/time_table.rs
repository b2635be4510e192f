use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use crate::ERR_POISONED_LOCK;
use crate::pal::PlatformFacade;
use crate::recorder::Recorder;

/// The merged intervals of all recorded spans, keyed by span name.
///
/// Merging takes the minimum start and maximum end per name, so the merged
/// interval covers every recorded interval of that name regardless of the order
/// in which recorders complete.
#[derive(Debug)]
pub(crate) struct SpanMap {
    entries: Mutex<BTreeMap<String, SpanRange>>,
}

#[derive(Debug)]
struct SpanRange {
    start: Duration,
    end: Duration,
}

impl SpanMap {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Merges one recorded interval into the map.
    pub(crate) fn merge(&self, name: &str, started_at: Duration, ended_at: Duration) {
        let mut entries = self.entries.lock().expect(ERR_POISONED_LOCK);

        match entries.get_mut(name) {
            Some(range) => {
                range.start = range.start.min(started_at);
                range.end = range.end.max(ended_at);
            }
            None => {
                entries.insert(
                    name.to_string(),
                    SpanRange {
                        start: started_at,
                        end: ended_at,
                    },
                );
            }
        }
    }

    /// Renders every merged span as `[name: 1.234(ms)]`, separated by single
    /// spaces and sorted by name. Empty when nothing was recorded.
    pub(crate) fn render(&self) -> String {
        let entries = self.entries.lock().expect(ERR_POISONED_LOCK);

        let rendered: Vec<String> = entries
            .iter()
            .map(|(name, range)| {
                let millis = range.end.saturating_sub(range.start).as_secs_f64() * 1000.0;
                format!("[{name}: {millis:.3}(ms)]")
            })
            .collect();

        rendered.join(" ")
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.lock().expect(ERR_POISONED_LOCK).is_empty()
    }

    /// The merged interval recorded under `name`, for test inspection.
    #[cfg(test)]
    pub(crate) fn range_of(&self, name: &str) -> Option<(Duration, Duration)> {
        let entries = self.entries.lock().expect(ERR_POISONED_LOCK);
        entries.get(name).map(|range| (range.start, range.end))
    }
}

/// Collects wall-clock intervals from named [`Recorder`]s and renders them as a
/// merged, deterministic report.
///
/// Recorders with the same name are merged into one span covering the minimum
/// start and maximum end of all their intervals. The table keeps only weak
/// references to the recorders it hands out, so a recorder's lifetime is owned
/// entirely by the caller.
///
/// # Examples
///
/// ```
/// use wall_times::TimeTable;
///
/// let table = TimeTable::new();
///
/// {
///     let _load = table.add_recorder("load");
///     // ... loading ...
/// }
/// {
///     let _parse = table.add_recorder("parse");
///     // ... parsing ...
/// }
///
/// // Spans are rendered sorted by name: `[load: 0.012(ms)] [parse: 0.008(ms)]`
/// let report = table.report();
/// assert!(report.starts_with("[load: "));
/// assert!(report.contains("[parse: "));
/// ```
#[derive(Debug)]
pub struct TimeTable {
    spans: Arc<SpanMap>,
    recorders: Mutex<Vec<Weak<Recorder>>>,
    platform: PlatformFacade,
}

impl TimeTable {
    /// Creates an empty table backed by the real monotonic clock.
    #[expect(
        clippy::new_without_default,
        reason = "to avoid ambiguity with the notion of a 'default table' that is not actually a default table"
    )]
    #[must_use]
    pub fn new() -> Self {
        Self::with_platform(PlatformFacade::real())
    }

    pub(crate) fn with_platform(platform: PlatformFacade) -> Self {
        Self {
            spans: Arc::new(SpanMap::new()),
            recorders: Mutex::new(Vec::new()),
            platform,
        }
    }

    /// Creates a new recorder whose interval is recorded into this table.
    ///
    /// The interval runs until the recorder is ended or dropped, whichever comes
    /// first, and is merged with any other interval recorded under the same name.
    /// The table does not keep the recorder alive.
    #[must_use = "dropping the recorder ends its interval and records it"]
    pub fn add_recorder(&self, name: impl Into<String>) -> Arc<Recorder> {
        let recorder = Arc::new(Recorder::new(
            name.into(),
            Arc::clone(&self.spans),
            self.platform.clone(),
        ));

        let mut recorders = self.recorders.lock().expect(ERR_POISONED_LOCK);
        recorders.push(Arc::downgrade(&recorder));

        recorder
    }

    /// Ends every recorder that is still alive, then renders the merged spans.
    ///
    /// Forcing the ends means a report is complete even when some recorders are
    /// still in flight; ending them here is a no-op for recorders that already
    /// completed. Dead recorders are pruned from the internal collection as a
    /// side effect.
    ///
    /// Spans render as `[name: 1.234(ms)]` with millisecond precision to three
    /// decimal places, separated by single spaces and sorted by name. An empty
    /// table renders as the empty string.
    #[must_use]
    pub fn report(&self) -> String {
        {
            // Lock order: recorder collection, then each recorder's own state,
            // then the span map inside the forced end.
            let mut recorders = self.recorders.lock().expect(ERR_POISONED_LOCK);
            recorders.retain(|weak| {
                weak.upgrade().is_some_and(|recorder| {
                    recorder.end();
                    true
                })
            });
        }

        self.spans.render()
    }

    /// Whether any interval has been recorded yet.
    ///
    /// Recorders that are still in flight have not recorded anything, so a table
    /// whose recorders are all in flight is still empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn recorder_count(&self) -> usize {
        self.recorders.lock().expect(ERR_POISONED_LOCK).len()
    }
}
