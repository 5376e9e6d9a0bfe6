//! Gate metrics for observability
//!
//! Counters describing what a logger's gate did with the entries it was
//! offered: delivered, dropped by the enabled flag or filter, buffered,
//! flushed, or failed in the sink.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one gated logger
///
/// # Example
///
/// ```
/// use log_dispatch::GateMetrics;
///
/// let metrics = GateMetrics::new();
///
/// metrics.record_delivered();
/// metrics.record_filtered();
///
/// assert_eq!(metrics.delivered(), 1);
/// assert_eq!(metrics.gate_misses(), 1);
/// ```
#[derive(Debug)]
pub struct GateMetrics {
    /// Entries handed to the sink
    delivered: AtomicU64,

    /// Entries dropped because the logger was disabled
    dropped_disabled: AtomicU64,

    /// Entries dropped because the filter rejected them
    dropped_filtered: AtomicU64,

    /// Entries appended to the buffer
    buffered: AtomicU64,

    /// Entries drained from the buffer into the sink
    flushed: AtomicU64,

    /// Sink calls that returned an error
    failed: AtomicU64,
}

impl GateMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            delivered: AtomicU64::new(0),
            dropped_disabled: AtomicU64::new(0),
            dropped_filtered: AtomicU64::new(0),
            buffered: AtomicU64::new(0),
            flushed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_disabled(&self) -> u64 {
        self.dropped_disabled.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_filtered(&self) -> u64 {
        self.dropped_filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn buffered(&self) -> u64 {
        self.buffered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn flushed(&self) -> u64 {
        self.flushed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Entries dropped by either half of the gate
    pub fn gate_misses(&self) -> u64 {
        self.dropped_disabled() + self.dropped_filtered()
    }

    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_disabled(&self) -> u64 {
        self.dropped_disabled.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.dropped_filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_buffered(&self) -> u64 {
        self.buffered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_flushed(&self) -> u64 {
        self.flushed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of offered entries that passed the gate, as a percentage
    ///
    /// Returns 100.0 if nothing has been offered yet.
    pub fn pass_rate(&self) -> f64 {
        let passed = (self.delivered() + self.buffered()) as f64;
        let total = passed + self.gate_misses() as f64;
        if total == 0.0 {
            100.0
        } else {
            (passed / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.delivered.store(0, Ordering::Relaxed);
        self.dropped_disabled.store(0, Ordering::Relaxed);
        self.dropped_filtered.store(0, Ordering::Relaxed);
        self.buffered.store(0, Ordering::Relaxed);
        self.flushed.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
    }
}

impl Default for GateMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for GateMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            delivered: AtomicU64::new(self.delivered()),
            dropped_disabled: AtomicU64::new(self.dropped_disabled()),
            dropped_filtered: AtomicU64::new(self.dropped_filtered()),
            buffered: AtomicU64::new(self.buffered()),
            flushed: AtomicU64::new(self.flushed()),
            failed: AtomicU64::new(self.failed()),
        }
    }
}
