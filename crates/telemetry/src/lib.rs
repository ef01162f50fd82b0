// crates/telemetry/src/lib.rs
//! Structured telemetry events for the resilience and cache components
//!
//! Every component reports discrete events shaped as
//! `{type, category, data, timestamp}`. Where those events go is decided by
//! the host through a [`TelemetrySink`]:
//! - [`EventBuffer`] keeps a bounded, queryable history
//! - [`LogSink`] forwards events to the `log` facade
//!
//! # Example
//!
//! ```rust
//! use contentguard_telemetry::{Emitter, EventBuffer, EventCategory};
//! use std::sync::Arc;
//!
//! let buffer = Arc::new(EventBuffer::new(100));
//! let emitter = Emitter::new(buffer.clone());
//! emitter.emit("cache_hit", EventCategory::Cache, serde_json::json!({ "key": "posts" }));
//!
//! assert_eq!(buffer.by_category(EventCategory::Cache).len(), 1);
//! ```

mod buffer;
mod event;
mod sink;

pub use buffer::EventBuffer;
pub use event::{event_types, EventCategory, TelemetryEvent};
pub use sink::{Emitter, LogSink, TelemetrySink};
