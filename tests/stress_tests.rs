//! Stress tests for concurrent use of loggers and dispatchers
//!
//! These tests verify:
//! - Concurrent buffering and flushing never duplicates or drops entries
//! - Fan-out from many threads reaches every child exactly once per entry
//! - Gate changes from other threads are safe while logging is in flight

use log_dispatch::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

const THREADS: usize = 8;
const PER_THREAD: usize = 250;

#[test]
fn test_concurrent_buffer_and_flush() {
    let sink = MemorySink::default();
    let records = sink.records();
    let logger = Arc::new(Gate::new(sink));

    let mut handles = Vec::new();
    for thread_id in 0..THREADS {
        let logger = Arc::clone(&logger);
        handles.push(thread::spawn(move || {
            for i in 0..PER_THREAD {
                let entry = LogEntry::new(EventType::INFORMATION, format!("{}-{}", thread_id, i));
                logger.log_buffered(&entry).expect("buffering failed");
                if i % 17 == 0 {
                    logger.flush_buffer().expect("flush failed");
                }
            }
        }));
    }
    for handle in handles {
        handle.join().expect("Thread panicked");
    }
    logger.flush_buffer().unwrap();

    let entries = records.entries();
    assert_eq!(entries.len(), THREADS * PER_THREAD);

    let unique: HashSet<_> = entries.iter().map(|e| e.id()).collect();
    assert_eq!(unique.len(), entries.len(), "an entry was delivered twice");

    // Each thread's entries keep their relative order
    for thread_id in 0..THREADS {
        let prefix = format!("{}-", thread_id);
        let sequence: Vec<usize> = entries
            .iter()
            .filter_map(|e| e.title())
            .filter_map(|t| t.strip_prefix(&prefix))
            .map(|n| n.parse().expect("numeric suffix"))
            .collect();
        assert_eq!(sequence, (0..PER_THREAD).collect::<Vec<_>>());
    }
}

#[test]
fn test_concurrent_fan_out() {
    let children: Vec<MemoryRecords> = (0..4)
        .map(|_| MemoryRecords::default())
        .collect();

    let dispatcher = Arc::new(Dispatcher::new("stress"));
    for (idx, records) in children.iter().enumerate() {
        dispatcher.add_logger(
            ContractId::named(format!("child-{}", idx)),
            Gate::new(MemorySink::with_records(format!("child-{}", idx), records.clone())),
        );
    }

    let mut handles = Vec::new();
    for _ in 0..THREADS {
        let dispatcher = Arc::clone(&dispatcher);
        handles.push(thread::spawn(move || {
            for i in 0..PER_THREAD {
                let kind = if i % 2 == 0 { EventType::ERROR } else { EventType::VERBOSE };
                dispatcher
                    .log(&LogEntry::new(kind, "fan out"))
                    .expect("dispatch failed");
            }
        }));
    }
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    for records in &children {
        assert_eq!(records.len(), THREADS * PER_THREAD);
    }
    assert_eq!(dispatcher.metrics().delivered(), (THREADS * PER_THREAD) as u64);
}

#[test]
fn test_gate_toggled_while_logging() {
    let sink = MemorySink::default();
    let records = sink.records();
    let logger = Arc::new(Gate::new(sink));

    let toggler = {
        let logger = Arc::clone(&logger);
        thread::spawn(move || {
            for i in 0..500 {
                logger.set_enabled(i % 2 == 0);
                logger.set_filter(if i % 3 == 0 {
                    Filter::AlwaysBlock
                } else {
                    Filter::AlwaysPass
                });
            }
            logger.set_enabled(true);
            logger.set_filter(Filter::AlwaysPass);
        })
    };

    let writers: Vec<_> = (0..4)
        .map(|_| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    logger
                        .log(&LogEntry::new(EventType::WARNING, "toggle"))
                        .expect("log failed");
                }
            })
        })
        .collect();

    toggler.join().expect("Thread panicked");
    for writer in writers {
        writer.join().expect("Thread panicked");
    }

    let metrics = logger.metrics();
    assert_eq!(
        metrics.delivered() + metrics.gate_misses(),
        (4 * PER_THREAD) as u64
    );
    assert_eq!(records.len() as u64, metrics.delivered());
}

/// Sink that looks itself up in the registry on every write
struct RegistryAware {
    registry: Arc<Registry>,
    lookups: Arc<std::sync::atomic::AtomicUsize>,
}

impl Sink for RegistryAware {
    fn internal_log(&mut self, _entry: &LogEntry) -> Result<()> {
        self.registry.is_registered(&ContractId::named("aware"));
        self.lookups
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "aware"
    }
}

#[test]
fn test_resolve_concurrent_with_registry_aware_sink() {
    let registry = Arc::new(Registry::new());
    let lookups = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    registry.register_instance(
        ContractId::named("aware"),
        Arc::new(Gate::new(RegistryAware {
            registry: Arc::clone(&registry),
            lookups: Arc::clone(&lookups),
        })),
    );
    let dispatcher = registry.resolve().unwrap();

    let resolver = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for i in 0..PER_THREAD {
                registry.register_singleton(ContractId::named("churn"), move || {
                    Ok(Gate::new(MemorySink::new(format!("churn-{}", i))))
                });
                registry.resolve().expect("resolve failed");
            }
        })
    };

    let writers: Vec<_> = (0..4)
        .map(|_| {
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    dispatcher
                        .log(&LogEntry::new(EventType::INFORMATION, "aware"))
                        .expect("log failed");
                }
            })
        })
        .collect();

    resolver.join().expect("Thread panicked");
    for writer in writers {
        writer.join().expect("Thread panicked");
    }

    assert_eq!(
        lookups.load(std::sync::atomic::Ordering::SeqCst),
        4 * PER_THREAD
    );
    assert_eq!(dispatcher.child_count(), 2);
    registry.dispose().unwrap();
}
