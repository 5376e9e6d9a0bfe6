//! Basic dispatch example
//!
//! Registers a console sink and an in-memory audit sink, resolves the
//! dispatcher, and shows per-sink gating and buffering.
//!
//! Run with: cargo run --example basic_dispatch

use log_dispatch::prelude::*;
use log_dispatch::{critical, information, verbose, warning};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Log Dispatch - Basic Example ===\n");

    let registry = Registry::new();
    let audit = MemoryRecords::default();
    let audit_shared = audit.clone();

    registry.register_dispatcher_type(|| Dispatcher::builder().name("demo").build());
    registry.register_singleton(ContractId::of::<ConsoleSink>(), || {
        Ok(Gate::new(ConsoleSink::new()))
    });
    registry.register_singleton(ContractId::named("audit"), move || {
        Ok(Gate::new(MemorySink::with_records("audit", audit_shared.clone()))
            .with_filter(Filter::any_mask([EventType::ERROR, EventType::CRITICAL])))
    });

    let dispatcher = registry.resolve()?;

    println!("1. Every sink applies its own filter:");
    verbose!(dispatcher, "Loading configuration")?;
    information!(dispatcher, "Listening on port {}", 8080)?;
    warning!(dispatcher, "Cache at {}% capacity", 91)?;
    critical!(dispatcher, "Storage unavailable")?;
    println!("   audit captured {} entries\n", audit.len());

    println!("2. Dispatcher-level filter hides everything below warnings:");
    dispatcher.set_filter(Filter::any_mask([
        EventType::WARNING,
        EventType::ERROR,
        EventType::CRITICAL,
    ]));
    information!(dispatcher, "Hidden information")?;
    warning!(dispatcher, "Visible warning")?;

    println!("\n3. Buffered entries are delivered on flush:");
    for step in 1..=3 {
        let entry = LogEntry::builder(EventType::WARNING | EventType::START)
            .title(format!("Buffered step {}", step))
            .indent(1, 2)
            .build();
        dispatcher.log_buffered(&entry)?;
    }
    println!("   {} entries waiting", dispatcher.buffered_len());
    dispatcher.flush_buffer()?;

    registry.dispose()?;
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
