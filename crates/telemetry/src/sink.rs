// crates/telemetry/src/sink.rs
//! Sink trait and the emitter handle components hold

use crate::event::{EventCategory, TelemetryEvent};
use std::fmt;
use std::sync::Arc;

/// Destination for telemetry events
///
/// Implementations must be cheap and must not block: components call
/// `record` from inside their hot paths.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: TelemetryEvent);
}

/// Forwards events to the `log` facade at debug level
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    target: Option<String>,
}

impl LogSink {
    /// Logs under a custom target instead of this module's path
    pub fn with_target(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
        }
    }
}

impl TelemetrySink for LogSink {
    fn record(&self, event: TelemetryEvent) {
        let target = self.target.as_deref().unwrap_or(module_path!());
        log::debug!(
            target: target,
            "[{}] {} {}",
            event.category,
            event.event_type,
            event.data
        );
    }
}

/// Fans a single event out to several sinks
struct Fanout(Vec<Arc<dyn TelemetrySink>>);

impl TelemetrySink for Fanout {
    fn record(&self, event: TelemetryEvent) {
        for sink in &self.0 {
            sink.record(event.clone());
        }
    }
}

/// Handle used by components to publish events
///
/// A disabled emitter drops every event without allocating.
#[derive(Clone, Default)]
pub struct Emitter {
    sink: Option<Arc<dyn TelemetrySink>>,
}

impl Emitter {
    /// Creates an emitter publishing to `sink`
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Creates an emitter publishing to every sink in `sinks`
    pub fn fanout(sinks: Vec<Arc<dyn TelemetrySink>>) -> Self {
        match sinks.len() {
            0 => Self::disabled(),
            1 => Self {
                sink: sinks.into_iter().next(),
            },
            _ => Self::new(Arc::new(Fanout(sinks))),
        }
    }

    /// Creates an emitter that drops every event
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Publishes an event
    pub fn emit(&self, event_type: &str, category: EventCategory, data: serde_json::Value) {
        if let Some(sink) = &self.sink {
            sink.record(TelemetryEvent::new(event_type, category, data));
        }
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
