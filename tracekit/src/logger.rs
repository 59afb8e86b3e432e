//! Bridges the tracing stack's internal diagnostics to an application logger

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, TelemetryError};

/// Logging capability the install functions require from the host
/// application.
///
/// The tracing stack reports its internal failures (export errors, dropped
/// batches) through a global callback; installation routes that callback
/// through this trait so the diagnostics land in the application's own log
/// stream. The two methods mirror the severities the stack emits.
pub trait TracerLogger: Send + Sync {
    /// Forward a message unmodified at error severity.
    fn error(&self, message: &str);

    /// Forward a message, formatted with standard positional formatting, at
    /// info severity.
    fn info(&self, message: fmt::Arguments<'_>);
}

/// Default logger backed by the `tracing` macros.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl TracerLogger for TracingLogger {
    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }

    fn info(&self, message: fmt::Arguments<'_>) {
        tracing::info!("{message}");
    }
}

/// Route the OpenTelemetry global error callback through the given logger.
pub(crate) fn install_error_bridge(logger: Arc<dyn TracerLogger>) -> Result<()> {
    opentelemetry::global::set_error_handler(move |err| logger.error(&err.to_string()))
        .map_err(|err| TelemetryError::ErrorHandler(err.to_string()))
}
