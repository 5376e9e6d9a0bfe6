//! Core dispatch types and traits

pub mod contract;
pub mod dispatcher;
pub mod error;
pub mod event_type;
pub mod filter;
pub mod log_entry;
pub mod logger;
pub mod metrics;
pub mod sink;

pub use contract::ContractId;
pub use dispatcher::{Dispatcher, DispatcherBuilder, DEFAULT_DISPATCHER_NAME};
pub use error::{AggregateFailure, ChildFailure, DispatchError, Result};
pub use event_type::{EventType, TraceOptions};
pub use filter::Filter;
pub use log_entry::{BufferedLogEntry, Diagnostics, LogEntry, LogEntryBuilder};
pub use logger::{Gate, Logger};
pub use metrics::GateMetrics;
pub use sink::Sink;
