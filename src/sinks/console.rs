//! Console sink implementation

use super::render_line;
use crate::core::{LogEntry, Result, Sink};
#[cfg(feature = "console")]
use crate::core::EventType;
#[cfg(feature = "console")]
use colored::{Color, Colorize};

pub struct ConsoleSink {
    name: String,
    #[cfg_attr(not(feature = "console"), allow(dead_code))]
    use_colors: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            name: "console".to_string(),
            use_colors: true,
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[cfg(feature = "console")]
    fn color_for(event_type: EventType) -> Color {
        if event_type.contains(EventType::CRITICAL) {
            Color::BrightRed
        } else if event_type.contains(EventType::ERROR) {
            Color::Red
        } else if event_type.contains(EventType::WARNING) {
            Color::Yellow
        } else if event_type.contains(EventType::INFORMATION) {
            Color::Green
        } else {
            Color::BrightBlack
        }
    }

    #[cfg(feature = "console")]
    fn format(&self, entry: &LogEntry) -> String {
        let line = render_line(entry);
        if self.use_colors {
            line.color(Self::color_for(entry.event_type())).to_string()
        } else {
            line
        }
    }

    #[cfg(not(feature = "console"))]
    fn format(&self, entry: &LogEntry) -> String {
        render_line(entry)
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn internal_log(&mut self, entry: &LogEntry) -> Result<()> {
        let output = self.format(entry);

        // Route failures to stderr, others to stdout
        if entry.event_type().is_failure() {
            eprintln!("{}", output);
        } else {
            println!("{}", output);
        }
        Ok(())
    }

    fn dispose(&mut self) -> Result<()> {
        use std::io::Write;
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
