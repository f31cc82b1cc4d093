// src/diag.rs
//
// Leveled diagnostics, injected rather than global.
//
// Every fallible step in the pipeline degrades to a skip plus an event
// on the sink, so callers (and tests) observe failures without parsing
// log text or catching errors.

use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for DiagLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagLevel::Debug => write!(f, "DEBUG"),
            DiagLevel::Info => write!(f, "INFO"),
            DiagLevel::Warn => write!(f, "WARN"),
            DiagLevel::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagEvent {
    pub level: DiagLevel,
    pub text: String,
}

/// Destination for pipeline diagnostics. Shared by reference across a
/// whole build pass, hence `&self`.
pub trait DiagSink {
    fn emit(&self, event: DiagEvent);

    fn log(&self, level: DiagLevel, text: impl Into<String>)
    where
        Self: Sized,
    {
        self.emit(DiagEvent {
            level,
            text: text.into(),
        });
    }
}

pub fn log(sink: &dyn DiagSink, level: DiagLevel, text: impl Into<String>) {
    sink.emit(DiagEvent {
        level,
        text: text.into(),
    });
}

/* ============================================================
   Sinks
   ============================================================ */

/// Discards everything.
pub struct NullSink;

impl DiagSink for NullSink {
    fn emit(&self, _event: DiagEvent) {}
}

/// Writes events at or above `min_level` to stderr.
pub struct StderrSink {
    pub min_level: DiagLevel,
}

impl StderrSink {
    pub fn new(min_level: DiagLevel) -> Self {
        Self { min_level }
    }
}

impl DiagSink for StderrSink {
    fn emit(&self, event: DiagEvent) {
        if event.level >= self.min_level {
            eprintln!("[{}] {}", event.level, event.text);
        }
    }
}

/// Collects events in memory so tests can assert on them.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<DiagEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn contains(&self, level: DiagLevel, needle: &str) -> bool {
        self.events
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.level == level && e.text.contains(needle))
    }
}

impl DiagSink for MemorySink {
    fn emit(&self, event: DiagEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_records_events_in_order() {
        let sink = MemorySink::new();
        log(&sink, DiagLevel::Info, "first");
        log(&sink, DiagLevel::Warn, "second");

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].level, DiagLevel::Info);
        assert_eq!(events[0].text, "first");
        assert_eq!(events[1].level, DiagLevel::Warn);
    }

    #[test]
    fn memory_sink_contains_matches_substring_at_level() {
        let sink = MemorySink::new();
        log(&sink, DiagLevel::Warn, "could not fetch a/b.py");

        assert!(sink.contains(DiagLevel::Warn, "a/b.py"));
        assert!(!sink.contains(DiagLevel::Error, "a/b.py"));
        assert!(!sink.contains(DiagLevel::Warn, "other.py"));
    }

    #[test]
    fn levels_order_by_severity() {
        assert!(DiagLevel::Debug < DiagLevel::Info);
        assert!(DiagLevel::Info < DiagLevel::Warn);
        assert!(DiagLevel::Warn < DiagLevel::Error);
    }
}
