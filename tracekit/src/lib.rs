//! # Tracekit
//!
//! Environment-driven bootstrap for distributed tracing with OpenTelemetry.
//!
//! ## Features
//! - Tracer configuration from the standard `OTEL_*` environment variables
//! - Conditional installation: without an exporter endpoint the process gets
//!   console logging and a no-op shutdown guard instead of a tracer
//! - OTLP span and metrics export for observability backends (Jaeger,
//!   Datadog, etc.)
//! - Pluggable logger bridge for the tracing stack's internal diagnostics
//!
//! ## Usage
//!
//! ```no_run
//! #[tokio::main]
//! async fn main() -> Result<(), tracekit::TelemetryError> {
//!     // Initialize telemetry in your main; hold the guard until shutdown
//!     let guard = tracekit::init_telemetry("my-service")?;
//!
//!     tracekit::info!("service started");
//!
//!     // Flush buffered spans before the process exits
//!     guard.shutdown()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Environment variables
//!
//! - `OTEL_EXPORTER_OTLP_TRACES_ENDPOINT` / `OTEL_EXPORTER_OTLP_ENDPOINT`:
//!   OTLP collector endpoint (e.g. `http://localhost:4317`). Tracing is
//!   installed only when one of these is set.
//! - `OTEL_SDK_DISABLED`: master kill switch.
//! - `OTEL_SERVICE_NAME`: overrides the service name passed in code.
//! - `OTEL_TRACES_SAMPLER` / `OTEL_TRACES_SAMPLER_ARG`: sampler selection.
//! - `OTEL_EXPORTER_OTLP_TIMEOUT`: export timeout in milliseconds.
//! - `TRACEKIT_LOG_SPANS`: also log every exported span batch.
//! - `TRACEKIT_LOG_FORMAT`: console log format (`default`, `pretty`, `json`).
//! - `RUST_LOG`: log level directives for the console layer.

pub mod config;
pub mod error;
pub mod guard;
pub mod init;
pub mod logger;
pub mod span_log;

pub use config::{LogFormat, SamplerConfig, TracerConfig};
pub use error::{Result, TelemetryError};
pub use guard::TracingGuard;
pub use init::{
    init_telemetry, init_telemetry_with_logger, install_tracer, install_tracer_with_exporter,
};
pub use logger::{TracerLogger, TracingLogger};
pub use span_log::LoggingSpanExporter;

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, instrument, trace, warn, Span};

// Re-export the OpenTelemetry global registry used by instrumented call sites
pub use opentelemetry::global;
