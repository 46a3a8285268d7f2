//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! loader / supervisor events
//!     → tracing events (structured fields: path, field, variable, argument)
//!     → LogSink callback (optional, embedder supplied)
//! ```
//!
//! # Design Decisions
//! - The library only emits events; installing a subscriber is the binary's job
//! - The sink is a plain callback so embedders without tracing still see reload failures

pub mod logging;

pub use logging::{noop_sink, tracing_sink, LogSink};
