use opentelemetry::metrics::MetricsError;
use opentelemetry::trace::TraceError;

/// Errors surfaced while reading tracer configuration or installing the
/// global telemetry pipelines. All of these are startup-time conditions;
/// the caller decides whether they are fatal.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Telemetry is already initialized for this process")]
    AlreadyInitialized,

    #[error("Tracer installation failed: {0}")]
    Trace(#[from] TraceError),

    #[error("Metrics installation failed: {0}")]
    Metrics(#[from] MetricsError),

    #[error("Subscriber initialization failed: {0}")]
    Subscriber(String),

    #[error("Error handler installation failed: {0}")]
    ErrorHandler(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::Config("bad sampler".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad sampler");
    }

    #[test]
    fn test_error_from_trace() {
        let trace_err = TraceError::Other("collector unreachable".into());
        let err: TelemetryError = trace_err.into();
        assert!(matches!(err, TelemetryError::Trace(_)));
    }

    #[test]
    fn test_result_type() {
        let ok_result: Result<i32> = Ok(42);
        assert_eq!(ok_result.unwrap(), 42);

        let err_result: Result<i32> = Err(TelemetryError::AlreadyInitialized);
        assert!(err_result.is_err());
    }
}
