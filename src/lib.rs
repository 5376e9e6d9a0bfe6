//! # Log Dispatch
//!
//! A multi-sink log dispatch engine: structured entries are gated by
//! per-logger enable flags and composable filters, optionally buffered, and
//! fanned out to independently configured sinks with per-sink failure
//! isolation.
//!
//! ## Features
//!
//! - **Composable Filters**: Event-type masks combined into AND/OR trees
//! - **Gated Loggers**: Any sink gains enable/filter/buffer behavior through [`Gate`]
//! - **Isolated Fan-out**: One failing sink never starves or blocks the others
//! - **Registry**: Loggers registered incrementally, dispatcher resolved on demand

pub mod config;
pub mod core;
pub mod macros;
pub mod registry;
pub mod sinks;

pub mod prelude {
    pub use crate::config::{DispatchConfig, GateSettings};
    pub use crate::core::{
        AggregateFailure, BufferedLogEntry, ChildFailure, ContractId, DispatchError, Dispatcher,
        DispatcherBuilder, EventType, Filter, Gate, GateMetrics, LogEntry, LogEntryBuilder,
        Logger, Result, Sink, TraceOptions,
    };
    pub use crate::registry::Registry;
    pub use crate::sinks::{ConsoleSink, MemoryRecords, MemorySink};
}

pub use crate::config::{DispatchConfig, GateSettings};
pub use crate::core::{
    AggregateFailure, BufferedLogEntry, ChildFailure, ContractId, Diagnostics, DispatchError,
    Dispatcher, DispatcherBuilder, EventType, Filter, Gate, GateMetrics, LogEntry,
    LogEntryBuilder, Logger, Result, Sink, TraceOptions, DEFAULT_DISPATCHER_NAME,
};
pub use registry::Registry;
pub use sinks::{ConsoleSink, MemoryRecords, MemorySink};
#[cfg(feature = "file")]
pub use sinks::FileSink;
