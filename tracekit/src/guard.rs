//! Shutdown handle for the installed tracer

use opentelemetry::global;
use opentelemetry_sdk::trace::TracerProvider;

use crate::error::Result;

/// Owns the shutdown hook of the installed tracer provider.
///
/// Returned by every install function: when tracing is disabled the guard is
/// a no-op, so callers can hold and shut it down unconditionally. Shutting
/// down consumes the guard, which makes a second invocation unrepresentable.
/// If the guard is dropped without an explicit shutdown, the provider is
/// released from the `Drop` impl instead.
#[derive(Debug)]
pub struct TracingGuard {
    tracer_provider: Option<TracerProvider>,
}

impl TracingGuard {
    pub(crate) fn active(tracer_provider: TracerProvider) -> TracingGuard {
        TracingGuard {
            tracer_provider: Some(tracer_provider),
        }
    }

    /// Guard handed out when tracing is disabled.
    pub(crate) fn noop() -> TracingGuard {
        TracingGuard {
            tracer_provider: None,
        }
    }

    /// Return true if a live tracer stands behind this guard.
    pub fn is_enabled(&self) -> bool {
        self.tracer_provider.is_some()
    }

    /// Export the current batch of spans without shutting down.
    ///
    /// Export failures are routed to the global error handler, where the
    /// logger bridge picks them up.
    pub fn force_flush(&self) {
        if let Some(provider) = self.tracer_provider.as_ref() {
            for result in provider.force_flush() {
                if let Err(err) = result {
                    global::handle_error(err);
                }
            }
        }
    }

    /// Flush buffered spans and release the global tracer.
    ///
    /// Always safe to call; on a no-op guard this does nothing and succeeds.
    pub fn shutdown(mut self) -> Result<()> {
        let Some(provider) = self.tracer_provider.take() else {
            return Ok(());
        };
        let mut first_failure = None;
        for result in provider.force_flush() {
            if let Err(err) = result {
                first_failure.get_or_insert(err);
            }
        }
        drop(provider);
        global::shutdown_tracer_provider();
        match first_failure {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        if self.tracer_provider.take().is_some() {
            global::shutdown_tracer_provider();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_guard_is_safe_to_shut_down() {
        let guard = TracingGuard::noop();
        assert!(!guard.is_enabled());
        guard.force_flush();
        guard.shutdown().unwrap();
    }

    #[test]
    fn active_guard_reports_enabled_and_shuts_down_cleanly() {
        let provider = TracerProvider::builder().build();
        let guard = TracingGuard::active(provider);
        assert!(guard.is_enabled());
        guard.force_flush();
        guard.shutdown().unwrap();
    }
}
