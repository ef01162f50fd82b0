// crates/telemetry/src/buffer.rs
//! Bounded in-memory event buffer

use crate::event::{EventCategory, TelemetryEvent};
use crate::sink::TelemetrySink;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Append-only ring of recent events
///
/// When full, the oldest event is dropped to make room.
#[derive(Debug)]
pub struct EventBuffer {
    capacity: usize,
    events: Mutex<VecDeque<TelemetryEvent>>,
}

impl EventBuffer {
    /// Creates a buffer holding at most `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<TelemetryEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends an event, evicting the oldest one if the buffer is full
    pub fn push(&self, event: TelemetryEvent) {
        if self.capacity == 0 {
            return;
        }

        let mut events = self.lock();
        while events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Returns all buffered events with the given type
    pub fn by_type(&self, event_type: &str) -> Vec<TelemetryEvent> {
        self.lock()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Returns all buffered events in the given category
    pub fn by_category(&self, category: EventCategory) -> Vec<TelemetryEvent> {
        self.lock()
            .iter()
            .filter(|e| e.category == category)
            .cloned()
            .collect()
    }

    /// Returns a copy of every buffered event, oldest first
    pub fn snapshot(&self) -> Vec<TelemetryEvent> {
        self.lock().iter().cloned().collect()
    }

    /// Removes and returns every buffered event, oldest first
    pub fn flush(&self) -> Vec<TelemetryEvent> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl TelemetrySink for EventBuffer {
    fn record(&self, event: TelemetryEvent) {
        self.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::event_types;

    fn event(event_type: &str, category: EventCategory) -> TelemetryEvent {
        TelemetryEvent::new(event_type, category, serde_json::Value::Null)
    }

    #[test]
    fn test_buffer_drops_oldest_when_full() {
        let buffer = EventBuffer::new(2);
        buffer.push(event("first", EventCategory::Cache));
        buffer.push(event("second", EventCategory::Cache));
        buffer.push(event("third", EventCategory::Cache));

        let types: Vec<_> = buffer.snapshot().into_iter().map(|e| e.event_type).collect();
        assert_eq!(types, vec!["second", "third"]);
    }

    #[test]
    fn test_query_by_type_and_category() {
        let buffer = EventBuffer::new(10);
        buffer.push(event(event_types::CACHE_HIT, EventCategory::Cache));
        buffer.push(event(event_types::CACHE_MISS, EventCategory::Cache));
        buffer.push(event(event_types::RETRY_ATTEMPT, EventCategory::Retry));

        assert_eq!(buffer.by_type(event_types::CACHE_HIT).len(), 1);
        assert_eq!(buffer.by_category(EventCategory::Cache).len(), 2);
        assert_eq!(buffer.by_category(EventCategory::RateLimit).len(), 0);
    }

    #[test]
    fn test_flush_empties_buffer() {
        let buffer = EventBuffer::new(10);
        buffer.push(event("a", EventCategory::Retry));
        buffer.push(event("b", EventCategory::Retry));

        let flushed = buffer.flush();
        assert_eq!(flushed.len(), 2);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_zero_capacity_discards() {
        let buffer = EventBuffer::new(0);
        buffer.push(event("a", EventCategory::Retry));
        assert!(buffer.is_empty());
    }
}
