//! Sink trait for concrete logger backends

use super::{error::Result, log_entry::LogEntry};

/// A backend that renders or persists entries that already passed a gate
///
/// Sinks carry no gating logic of their own; wrap one in a
/// [`Gate`](crate::Gate) to get the full [`Logger`](crate::Logger) contract.
pub trait Sink: Send {
    fn internal_log(&mut self, entry: &LogEntry) -> Result<()>;

    /// Release underlying resources. Called at most once, by the owning gate.
    fn dispose(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn internal_log(&mut self, entry: &LogEntry) -> Result<()> {
        (**self).internal_log(entry)
    }

    fn dispose(&mut self) -> Result<()> {
        (**self).dispose()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
