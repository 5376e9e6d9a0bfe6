//! Reference sink implementations

pub mod console;
#[cfg(feature = "file")]
pub mod file;
pub mod memory;

pub use console::ConsoleSink;
#[cfg(feature = "file")]
pub use file::FileSink;
pub use memory::{MemoryRecords, MemorySink};

pub use crate::core::Sink;

use crate::core::{LogEntry, TraceOptions};

/// Render an entry as a single line of text
///
/// Diagnostic fields appear only when the entry's trace options selected them.
pub fn render_line(entry: &LogEntry) -> String {
    let mut line = String::new();

    if entry.trace_options().contains(TraceOptions::TIMESTAMP) {
        line.push_str(&format!("[{}] ", entry.timestamp().format("%Y-%m-%d %H:%M:%S%.3f")));
    }
    line.push_str(&format!("[{}]", entry.event_type()));

    let diagnostics = entry.diagnostics();
    if let Some(pid) = diagnostics.process_id {
        line.push_str(&format!(" [pid {}]", pid));
    }
    if let Some(ref thread_id) = diagnostics.thread_id {
        let thread = diagnostics.thread_name.as_ref().unwrap_or(thread_id);
        line.push_str(&format!(" [{}]", thread));
    }

    if entry.source().is_empty() {
        line.push_str(&format!(" {}:", entry.tag()));
    } else {
        line.push_str(&format!(" {}/{}:", entry.source(), entry.tag()));
    }

    line.push(' ');
    line.push_str(&entry.indent());
    if let Some(title) = entry.title() {
        line.push_str(title);
    }

    if !entry.payload().is_empty() {
        let payload: Vec<String> = entry.payload().iter().map(|v| v.to_string()).collect();
        line.push_str(" | ");
        line.push_str(&payload.join(", "));
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EventType;

    #[test]
    fn test_render_minimal_line() {
        let entry = LogEntry::builder(EventType::ERROR | EventType::STOP)
            .trace_options(TraceOptions::empty())
            .source("worker")
            .tag("jobs")
            .title("aborted")
            .payload_item(7)
            .payload_item("timeout")
            .build();

        assert_eq!(render_line(&entry), "[Error|Stop] worker/jobs: aborted | 7, \"timeout\"");
    }

    #[test]
    fn test_render_indent_and_pid() {
        let entry = LogEntry::builder(EventType::VERBOSE)
            .trace_options(TraceOptions::PROCESS_ID)
            .tag("nested")
            .title("child step")
            .indent(1, 2)
            .build();

        let expected = format!("[Verbose] [pid {}] nested:   child step", std::process::id());
        assert_eq!(render_line(&entry), expected);
    }
}
