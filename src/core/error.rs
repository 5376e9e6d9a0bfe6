//! Error types for the dispatch engine

use super::contract::ContractId;
use std::fmt;

pub type Result<T> = std::result::Result<T, DispatchError>;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A concrete sink failed to write or release its resources
    #[error("Sink '{sink}' failed: {message}")]
    SinkFailure { sink: String, message: String },

    /// One or more children of a dispatcher failed
    #[error(transparent)]
    Aggregate(#[from] AggregateFailure),

    /// No registration exists for the requested contract
    #[error("No logger registered for contract '{contract}'")]
    NotRegistered { contract: ContractId },

    /// Logger used after it was disposed
    #[error("Logger '{logger}' has been disposed")]
    Disposed { logger: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl DispatchError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        DispatchError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a sink failure
    pub fn sink(sink: impl Into<String>, message: impl Into<String>) -> Self {
        DispatchError::SinkFailure {
            sink: sink.into(),
            message: message.into(),
        }
    }

    pub fn not_registered(contract: ContractId) -> Self {
        DispatchError::NotRegistered { contract }
    }

    pub fn disposed(logger: impl Into<String>) -> Self {
        DispatchError::Disposed {
            logger: logger.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        DispatchError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        DispatchError::Other(msg.into())
    }

    /// Recorded child failures if this is an aggregate
    pub fn as_aggregate(&self) -> Option<&AggregateFailure> {
        match self {
            DispatchError::Aggregate(aggregate) => Some(aggregate),
            _ => None,
        }
    }
}

/// Failure recorded for a single child of a multi-child operation
#[derive(Debug)]
pub struct ChildFailure {
    pub contract: ContractId,
    pub logger: String,
    pub error: DispatchError,
}

impl fmt::Display for ChildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.logger, self.contract, self.error)
    }
}

/// Every child failure of one fan-out or dispose pass, in attempt order
///
/// An empty aggregate means every child succeeded; [`into_result`] turns it
/// into `Ok(())` in that case.
///
/// [`into_result`]: AggregateFailure::into_result
#[derive(Debug, Default)]
pub struct AggregateFailure {
    failures: Vec<ChildFailure>,
}

impl AggregateFailure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, contract: ContractId, logger: impl Into<String>, error: DispatchError) {
        self.failures.push(ChildFailure {
            contract,
            logger: logger.into(),
            error,
        });
    }

    /// Append every failure of `other`, keeping its order
    pub fn merge(&mut self, other: AggregateFailure) {
        self.failures.extend(other.failures);
    }

    pub fn failures(&self) -> &[ChildFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Ok(())` when nothing failed, otherwise the aggregate as an error
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DispatchError::Aggregate(self))
        }
    }
}

impl fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} logger(s) failed", self.failures.len())?;
        for (idx, failure) in self.failures.iter().enumerate() {
            let sep = if idx == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateFailure {}

impl IntoIterator for AggregateFailure {
    type Item = ChildFailure;
    type IntoIter = std::vec::IntoIter<ChildFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.into_iter()
    }
}
