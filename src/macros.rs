//! Logging macros for ergonomic entry construction.
//!
//! Each macro builds a [`LogEntry`](crate::LogEntry) tagged with the calling
//! module's path, formats the title like `format!`, and passes the entry to
//! the logger's `log`. The macros evaluate to the `Result` returned by `log`.
//!
//! # Examples
//!
//! ```
//! use log_dispatch::prelude::*;
//! use log_dispatch::{information, error};
//!
//! let dispatcher = Dispatcher::new("app");
//!
//! information!(dispatcher, "Server started")?;
//!
//! let port = 8080;
//! error!(dispatcher, "Cannot bind port {}", port)?;
//! # Ok::<(), DispatchError>(())
//! ```

/// Log an entry of any event type.
///
/// # Examples
///
/// ```
/// # use log_dispatch::prelude::*;
/// # let dispatcher = Dispatcher::new("app");
/// use log_dispatch::log_event;
/// log_event!(dispatcher, EventType::ERROR | EventType::STOP, "Job {} aborted", 7).unwrap();
/// ```
#[macro_export]
macro_rules! log_event {
    ($logger:expr, $event_type:expr, $($arg:tt)+) => {{
        use $crate::Logger as _;
        let entry = $crate::LogEntry::builder($event_type)
            .tag(module_path!())
            .title(format!($($arg)+))
            .build();
        $logger.log(&entry)
    }};
}

/// Log a verbose entry.
///
/// # Examples
///
/// ```
/// # use log_dispatch::prelude::*;
/// # let dispatcher = Dispatcher::new("app");
/// use log_dispatch::verbose;
/// verbose!(dispatcher, "Entering calculate()").unwrap();
/// ```
#[macro_export]
macro_rules! verbose {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_event!($logger, $crate::EventType::VERBOSE, $($arg)+)
    };
}

/// Log an information entry.
#[macro_export]
macro_rules! information {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_event!($logger, $crate::EventType::INFORMATION, $($arg)+)
    };
}

/// Log a warning entry.
///
/// # Examples
///
/// ```
/// # use log_dispatch::prelude::*;
/// # let dispatcher = Dispatcher::new("app");
/// use log_dispatch::warning;
/// warning!(dispatcher, "Retry attempt {} of {}", 3, 5).unwrap();
/// ```
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_event!($logger, $crate::EventType::WARNING, $($arg)+)
    };
}

/// Log an error entry.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_event!($logger, $crate::EventType::ERROR, $($arg)+)
    };
}

/// Log a critical entry.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_event!($logger, $crate::EventType::CRITICAL, $($arg)+)
    };
}
