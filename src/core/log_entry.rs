//! Log entry structure

use super::event_type::{EventType, TraceOptions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::panic::Location;
use std::path::Path;
use uuid::Uuid;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

fn get_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

fn get_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// Replace newlines, carriage returns and tabs with escape sequences so a
/// single entry can never render as several lines.
fn sanitize(text: &str) -> String {
    text.replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Name of the calling context: the stem of the caller's source file
fn caller_tag(location: &Location<'_>) -> String {
    Path::new(location.file())
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(location.file())
        .to_string()
}

/// Diagnostic fields selected by [`TraceOptions`] at construction time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_stack: Option<String>,
}

impl Diagnostics {
    fn capture(options: TraceOptions) -> Self {
        let mut diagnostics = Diagnostics::default();
        if options.contains(TraceOptions::PROCESS_ID) {
            diagnostics.process_id = Some(std::process::id());
        }
        if options.contains(TraceOptions::THREAD_ID) {
            diagnostics.thread_id = Some(get_thread_id());
            diagnostics.thread_name = get_thread_name();
        }
        if options.contains(TraceOptions::CALLSTACK) {
            diagnostics.call_stack = Some(std::backtrace::Backtrace::force_capture().to_string());
        }
        diagnostics
    }
}

/// Immutable record of one loggable event
///
/// Every field is fixed at construction. Clones share the same [`id`], so a
/// sink receiving a buffered or fanned-out copy can still correlate it with
/// the original.
///
/// [`id`]: LogEntry::id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    id: Uuid,
    event_type: EventType,
    source: String,
    tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    payload: Vec<Value>,
    trace_options: TraceOptions,
    indent_level: usize,
    indent_size: usize,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    diagnostics: Diagnostics,
}

impl LogEntry {
    /// Entry with a title and default fields, tagged with the caller's context
    #[track_caller]
    pub fn new(event_type: EventType, title: impl Into<String>) -> Self {
        LogEntryBuilder::new(event_type).title(title).build()
    }

    /// Start building an entry of the given kind
    #[track_caller]
    pub fn builder(event_type: EventType) -> LogEntryBuilder {
        LogEntryBuilder::new(event_type)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn payload(&self) -> &[Value] {
        &self.payload
    }

    pub fn trace_options(&self) -> TraceOptions {
        self.trace_options
    }

    pub fn indent_level(&self) -> usize {
        self.indent_level
    }

    pub fn indent_size(&self) -> usize {
        self.indent_size
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Leading whitespace for nested output
    pub fn indent(&self) -> String {
        " ".repeat(self.indent_level * self.indent_size)
    }
}

/// Fluent construction of a [`LogEntry`]
///
/// # Example
///
/// ```
/// use log_dispatch::{EventType, LogEntry};
///
/// let entry = LogEntry::builder(EventType::ERROR | EventType::STOP)
///     .source("worker")
///     .title("Job aborted")
///     .payload_item(42)
///     .payload_item("timeout")
///     .build();
///
/// assert_eq!(entry.source(), "worker");
/// assert_eq!(entry.payload().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct LogEntryBuilder {
    event_type: EventType,
    source: String,
    tag: Option<String>,
    title: Option<String>,
    payload: Vec<Value>,
    trace_options: TraceOptions,
    indent_level: usize,
    indent_size: usize,
    caller: &'static Location<'static>,
}

impl LogEntryBuilder {
    #[track_caller]
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            source: String::new(),
            tag: None,
            title: None,
            payload: Vec::new(),
            trace_options: TraceOptions::DEFAULT,
            indent_level: 0,
            indent_size: 0,
            caller: Location::caller(),
        }
    }

    #[must_use]
    pub fn event_type(mut self, event_type: EventType) -> Self {
        self.event_type = event_type;
        self
    }

    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Override the calling-context tag
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append one value to the payload
    #[must_use]
    pub fn payload_item(mut self, value: impl Into<Value>) -> Self {
        self.payload.push(value.into());
        self
    }

    /// Replace the payload
    #[must_use]
    pub fn payload(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.payload = values.into_iter().collect();
        self
    }

    #[must_use]
    pub fn trace_options(mut self, options: TraceOptions) -> Self {
        self.trace_options = options;
        self
    }

    #[must_use]
    pub fn indent(mut self, level: usize, size: usize) -> Self {
        self.indent_level = level;
        self.indent_size = size;
        self
    }

    pub fn build(self) -> LogEntry {
        let tag = match self.tag {
            Some(tag) => sanitize(&tag),
            None => caller_tag(self.caller),
        };

        LogEntry {
            id: Uuid::new_v4(),
            event_type: self.event_type,
            source: sanitize(&self.source),
            tag,
            title: self.title.as_deref().map(sanitize),
            payload: self.payload,
            trace_options: self.trace_options,
            indent_level: self.indent_level,
            indent_size: self.indent_size,
            timestamp: Utc::now(),
            diagnostics: Diagnostics::capture(self.trace_options),
        }
    }
}

/// A [`LogEntry`] queued in a logger's buffer rather than dispatched
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedLogEntry {
    pub entry: LogEntry,
    pub buffered_at: DateTime<Utc>,
}

impl BufferedLogEntry {
    pub fn new(entry: LogEntry) -> Self {
        Self {
            entry,
            buffered_at: Utc::now(),
        }
    }

    pub fn into_entry(self) -> LogEntry {
        self.entry
    }
}
