//! REVU Telemetry
//!
//! Structured logging for the API process. Spans and events go to stdout
//! through `tracing-subscriber`.

pub mod tracer;

pub use tracer::{init_tracer, TelemetryConfig};
