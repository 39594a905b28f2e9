//! Structured diagnostics
//!
//! Components report what they do as named events carrying `key=value`
//! fields. Events go to an [`EventSink`]; the default [`TracingSink`] turns
//! them into `tracing` events, while [`MemorySink`] keeps them around so
//! tests can assert on them.

use std::fmt;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Severity of a diagnostic event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    /// Fine-grained detail (raw replies, discarded items)
    Debug,
    /// Normal progress
    Info,
    /// Degraded behavior: throttles, fallbacks
    Warn,
}

/// A single diagnostic event: a stable name plus ordered fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Dotted event name, e.g. `rate_gate.acquired`
    pub name: &'static str,
    /// Severity
    pub level: EventLevel,
    /// Fields in insertion order
    pub fields: Vec<(&'static str, String)>,
}

impl Event {
    /// Creates an info-level event with no fields
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            level: EventLevel::Info,
            fields: Vec::new(),
        }
    }

    /// Sets the event level
    pub fn level(mut self, level: EventLevel) -> Self {
        self.level = level;
        self
    }

    /// Appends a field
    pub fn with(mut self, key: &'static str, value: impl ToString) -> Self {
        self.fields.push((key, value.to_string()));
        self
    }

    /// Looks up the first field with the given key
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (key, value) in &self.fields {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}

/// Receives diagnostic events
pub trait EventSink: Send + Sync {
    /// Records one event
    fn emit(&self, event: Event);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: Event) {
        match event.level {
            EventLevel::Debug => debug!(target: "terms_analyzer::events", "{}", event),
            EventLevel::Info => info!(target: "terms_analyzer::events", "{}", event),
            EventLevel::Warn => warn!(target: "terms_analyzer::events", "{}", event),
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    /// Creates an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded events
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Returns recorded events with the given name
    pub fn named(&self, name: &str) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.name == name)
            .collect()
    }

    /// Counts recorded events with the given name
    pub fn count(&self, name: &str) -> usize {
        self.named(name).len()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_display() {
        let event = Event::new("rate_gate.acquired")
            .with("request", 3)
            .with("waited_ms", 1500);
        assert_eq!(event.to_string(), "rate_gate.acquired request=3 waited_ms=1500");
        assert_eq!(event.field("request"), Some("3"));
        assert_eq!(event.field("missing"), None);
    }

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.emit(Event::new("a"));
        sink.emit(Event::new("b").level(EventLevel::Warn));
        sink.emit(Event::new("a"));

        let names: Vec<_> = sink.events().iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["a", "b", "a"]);
        assert_eq!(sink.count("a"), 2);
        assert_eq!(sink.named("b")[0].level, EventLevel::Warn);
    }
}
