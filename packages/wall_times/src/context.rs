use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::ERR_POISONED_LOCK;
use crate::pal::PlatformFacade;
use crate::recorder::Recorder;
use crate::time_table::TimeTable;

/// Request-scoped instrumentation state: a logical identifier, descriptive
/// fields and a [`TimeTable`] of recorded spans.
///
/// The identifier is fixed at construction. Fields are plain name/value strings
/// attached along the way; spans come from [`Recorder`]s handed out by
/// [`add_recorder()`][Self::add_recorder]. Everything is rendered into a single
/// report line by [`report()`][Self::report].
///
/// A context is typically shared behind an [`Arc`] by every activation of one
/// logical operation, so fields and spans contributed from different threads
/// all surface in the same report.
///
/// # Examples
///
/// ```
/// use wall_times::Context;
///
/// let context = Context::new("req-42");
/// context.add_field("endpoint", "/checkout");
///
/// {
///     let _recorder = context.add_recorder("validate");
///     // ... validation work ...
/// }
///
/// let report = context.report();
/// assert!(report.starts_with("[logid: req-42] [endpoint: /checkout] [validate: "));
/// ```
#[derive(Debug)]
pub struct Context {
    logid: String,
    fields: Mutex<BTreeMap<String, String>>,
    table: TimeTable,
}

impl Context {
    /// Creates a context for the given logical identifier, with no fields and an
    /// empty span table, backed by the real monotonic clock.
    #[must_use]
    pub fn new(logid: impl Into<String>) -> Self {
        Self::with_platform(logid, PlatformFacade::real())
    }

    pub(crate) fn with_platform(logid: impl Into<String>, platform: PlatformFacade) -> Self {
        Self {
            logid: logid.into(),
            fields: Mutex::new(BTreeMap::new()),
            table: TimeTable::with_platform(platform),
        }
    }

    /// The logical identifier this context was created for.
    #[must_use]
    pub fn logid(&self) -> &str {
        &self.logid
    }

    /// Attaches a field unless one with the same name already exists.
    ///
    /// The first write wins, so repeated activations of the same operation do not
    /// overwrite each other's annotations. Use [`set_field()`][Self::set_field]
    /// to overwrite.
    pub fn add_field(&self, name: impl Into<String>, value: impl Into<String>) {
        let mut fields = self.fields.lock().expect(ERR_POISONED_LOCK);
        fields.entry(name.into()).or_insert_with(|| value.into());
    }

    /// Attaches a field, overwriting any existing value under the same name.
    pub fn set_field(&self, name: impl Into<String>, value: impl Into<String>) {
        let mut fields = self.fields.lock().expect(ERR_POISONED_LOCK);
        fields.insert(name.into(), value.into());
    }

    /// Creates a new recorder whose interval lands in this context's span table.
    ///
    /// Same-named intervals are merged; see [`TimeTable::add_recorder()`].
    #[must_use = "dropping the recorder ends its interval and records it"]
    pub fn add_recorder(&self, name: impl Into<String>) -> Arc<Recorder> {
        self.table.add_recorder(name)
    }

    /// Renders the context as a single report line.
    ///
    /// The line is `[logid: <id>]`, followed by one `[name: value]` segment per
    /// field sorted by name, followed by the span table's rendering, all joined
    /// by single spaces. Recorders still in flight are ended by this call.
    ///
    /// A context with no fields and no spans renders as just `[logid: <id>]`.
    #[must_use]
    pub fn report(&self) -> String {
        let mut segments = vec![format!("[logid: {}]", self.logid)];

        {
            let fields = self.fields.lock().expect(ERR_POISONED_LOCK);
            for (name, value) in &*fields {
                segments.push(format!("[{name}: {value}]"));
            }
        }

        let spans = self.table.report();
        if !spans.is_empty() {
            segments.push(spans);
        }

        segments.join(" ")
    }
}
