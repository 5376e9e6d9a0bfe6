//! In-memory sink

use crate::core::{LogEntry, Result, Sink};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Shared view of the entries captured by a [`MemorySink`]
///
/// Stays readable after the sink has been moved into a gate or disposed.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecords {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
}

impl MemoryRecords {
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Copy of the captured entries, oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Titles of the captured entries, oldest first
    pub fn titles(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|e| e.title().unwrap_or_default().to_string())
            .collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

pub struct MemorySink {
    name: String,
    records: MemoryRecords,
    max_entries: Option<usize>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: MemoryRecords::default(),
            max_entries: None,
        }
    }

    /// Sink appending to an existing set of records
    pub fn with_records(name: impl Into<String>, records: MemoryRecords) -> Self {
        Self {
            name: name.into(),
            records,
            max_entries: None,
        }
    }

    /// Keep at most `max_entries`, discarding the oldest first
    #[must_use]
    pub fn with_capacity_limit(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn records(&self) -> MemoryRecords {
        self.records.clone()
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl Sink for MemorySink {
    fn internal_log(&mut self, entry: &LogEntry) -> Result<()> {
        let mut entries = self.records.entries.lock();
        entries.push_back(entry.clone());
        if let Some(max) = self.max_entries {
            while entries.len() > max {
                entries.pop_front();
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
