//! Observability setup for Choreo.
//!
//! Structured logging via `tracing`, with optional OpenTelemetry trace
//! export for local development.

pub mod tracing_setup;
