//! Logger contract and the reusable gating template

use super::{
    error::{AggregateFailure, DispatchError, Result},
    filter::Filter,
    log_entry::{BufferedLogEntry, LogEntry},
    metrics::GateMetrics,
    sink::Sink,
};
use parking_lot::Mutex;
use tracing::{debug, trace};

/// A gated, bufferable logger
///
/// Implemented by [`Gate`] for any [`Sink`] and by
/// [`Dispatcher`](crate::Dispatcher). All operations on one instance are
/// serialized; distinct instances never block each other.
pub trait Logger: Send + Sync {
    fn name(&self) -> &str;

    fn is_enabled(&self) -> bool;

    fn set_enabled(&self, enabled: bool);

    fn filter(&self) -> Filter;

    fn set_filter(&self, filter: Filter);

    /// Deliver `entry` to the sink if the gate admits it
    ///
    /// A disabled or filtered-out entry is dropped silently and returns
    /// `Ok(())`. Sink failures are returned to the caller.
    fn log(&self, entry: &LogEntry) -> Result<()>;

    /// Queue `entry` if the gate admits it, without calling the sink
    fn log_buffered(&self, entry: &LogEntry) -> Result<()>;

    /// Drain the buffer into the sink in insertion order
    ///
    /// A sink error stops the drain and leaves the entries not yet attempted
    /// queued. Partial fan-out failures do not stop it: every entry is
    /// attempted and the failures are merged into one aggregate.
    fn flush_buffer(&self) -> Result<()>;

    /// Write any buffered entries and release the sink's resources
    ///
    /// Calls after the first are no-ops.
    fn dispose(&self) -> Result<()>;

    fn is_disposed(&self) -> bool;

    fn buffered_len(&self) -> usize;

    fn metrics(&self) -> &GateMetrics;
}

struct GateState<S> {
    enabled: bool,
    filter: Filter,
    buffer: Vec<BufferedLogEntry>,
    disposed: bool,
    sink: S,
}

/// Gating template wrapping a concrete [`Sink`]
///
/// Holds the enabled flag, the filter and the buffer behind one lock, which
/// stays held for the full length of every operation including the sink call.
///
/// # Example
///
/// ```
/// use log_dispatch::{EventType, Filter, Gate, LogEntry, Logger, MemorySink};
///
/// let sink = MemorySink::new("memory");
/// let records = sink.records();
/// let logger = Gate::new(sink).with_filter(Filter::mask(EventType::ERROR));
///
/// logger.log(&LogEntry::new(EventType::INFORMATION, "ignored")).unwrap();
/// logger.log(&LogEntry::new(EventType::ERROR, "kept")).unwrap();
///
/// assert_eq!(records.len(), 1);
/// ```
pub struct Gate<S: Sink> {
    name: String,
    state: Mutex<GateState<S>>,
    metrics: GateMetrics,
}

impl<S: Sink> Gate<S> {
    /// Enabled gate with an [`Filter::AlwaysPass`] filter
    pub fn new(sink: S) -> Self {
        Self {
            name: sink.name().to_string(),
            state: Mutex::new(GateState {
                enabled: true,
                filter: Filter::AlwaysPass,
                buffer: Vec::new(),
                disposed: false,
                sink,
            }),
            metrics: GateMetrics::new(),
        }
    }

    #[must_use]
    pub fn with_enabled(self, enabled: bool) -> Self {
        self.state.lock().enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_filter(self, filter: Filter) -> Self {
        self.state.lock().filter = filter;
        self
    }

    /// Run `f` against the wrapped sink while holding the gate's lock
    pub fn with_sink<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.state.lock().sink)
    }

    /// Apply the enabled/filter gate, recording misses
    fn admits(&self, state: &GateState<S>, entry: &LogEntry) -> bool {
        if !state.enabled {
            self.metrics.record_disabled();
            return false;
        }
        if !state.filter.matches(entry) {
            self.metrics.record_filtered();
            trace!(logger = %self.name, event_type = %entry.event_type(), "entry filtered out");
            return false;
        }
        true
    }

    fn write(&self, sink: &mut S, entry: &LogEntry) -> Result<()> {
        sink.internal_log(entry).inspect_err(|e| {
            self.metrics.record_failed();
            debug!(logger = %self.name, error = %e, "sink write failed");
        })
    }
}

impl<S: Sink + Default> Default for Gate<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: Sink> Logger for Gate<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    fn set_enabled(&self, enabled: bool) {
        self.state.lock().enabled = enabled;
    }

    fn filter(&self) -> Filter {
        self.state.lock().filter.clone()
    }

    fn set_filter(&self, filter: Filter) {
        self.state.lock().filter = filter;
    }

    fn log(&self, entry: &LogEntry) -> Result<()> {
        let mut guard = self.state.lock();
        if guard.disposed {
            return Err(DispatchError::disposed(&self.name));
        }
        if !self.admits(&guard, entry) {
            return Ok(());
        }
        self.write(&mut guard.sink, entry)?;
        self.metrics.record_delivered();
        Ok(())
    }

    fn log_buffered(&self, entry: &LogEntry) -> Result<()> {
        let mut guard = self.state.lock();
        if guard.disposed {
            return Err(DispatchError::disposed(&self.name));
        }
        if !self.admits(&guard, entry) {
            return Ok(());
        }
        guard.buffer.push(BufferedLogEntry::new(entry.clone()));
        self.metrics.record_buffered();
        Ok(())
    }

    fn flush_buffer(&self) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.disposed {
            return Err(DispatchError::disposed(&self.name));
        }

        let mut failures = AggregateFailure::new();
        let mut pending = std::mem::take(&mut state.buffer).into_iter();
        while let Some(buffered) = pending.next() {
            match self.write(&mut state.sink, &buffered.entry) {
                Ok(()) => {
                    self.metrics.record_flushed();
                    self.metrics.record_delivered();
                }
                // Partial fan-out failure: every child was attempted, keep draining
                Err(DispatchError::Aggregate(aggregate)) => {
                    self.metrics.record_flushed();
                    failures.merge(aggregate);
                }
                Err(e) => {
                    // Entries not yet attempted stay queued for the next flush
                    state.buffer = pending.collect();
                    return Err(e);
                }
            }
        }
        failures.into_result()
    }

    /// Write every buffered entry, then dispose the sink
    ///
    /// Pending entries are attempted even when one fails, since no later
    /// flush can retry them. A sink error wins over partial fan-out failures.
    fn dispose(&self) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.disposed {
            return Ok(());
        }
        state.disposed = true;

        let pending = std::mem::take(&mut state.buffer);
        debug!(logger = %self.name, pending = pending.len(), "disposing logger");

        let mut failures = AggregateFailure::new();
        let mut sink_error = None;
        let mut absorb = |result: Result<()>| match result {
            Ok(()) => {}
            Err(DispatchError::Aggregate(aggregate)) => failures.merge(aggregate),
            Err(e) => {
                sink_error.get_or_insert(e);
            }
        };

        for buffered in &pending {
            let written = self.write(&mut state.sink, &buffered.entry);
            if written.is_ok() {
                self.metrics.record_flushed();
                self.metrics.record_delivered();
            }
            absorb(written);
        }
        absorb(state.sink.dispose());

        match sink_error {
            Some(e) => Err(e),
            None => failures.into_result(),
        }
    }

    fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    fn buffered_len(&self) -> usize {
        self.state.lock().buffer.len()
    }

    fn metrics(&self) -> &GateMetrics {
        &self.metrics
    }
}
