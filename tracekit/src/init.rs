//! Telemetry initialization and conditional tracer installation

use std::sync::{Arc, OnceLock};

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::export::trace::SpanExporter;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{BatchSpanProcessor, Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, TracerConfig};
use crate::error::{Result, TelemetryError};
use crate::guard::TracingGuard;
use crate::logger::{install_error_bridge, TracerLogger, TracingLogger};
use crate::span_log::LoggingSpanExporter;

// The tracer provider, meter provider and subscriber registries are all
// process-global, so installation may happen once per process lifetime.
static INSTALLED: OnceLock<()> = OnceLock::new();

/// Initialize telemetry from the process environment.
///
/// Reads [`TracerConfig`] from the environment and installs the global
/// tracer if an exporter endpoint is configured; otherwise console logging
/// is set up on its own and a no-op guard is returned. The stack's internal
/// diagnostics go to the `tracing` macros.
///
/// Must be called from within a Tokio runtime when an exporter endpoint is
/// configured: span batches and metrics export on the runtime. Returns
/// [`TelemetryError::AlreadyInitialized`] on a second call in the same
/// process.
///
/// # Arguments
/// * `service_name` - Name of the service for trace identification;
///   `OTEL_SERVICE_NAME` overrides it
///
/// # Example
/// ```no_run
/// #[tokio::main]
/// async fn main() -> Result<(), tracekit::TelemetryError> {
///     let guard = tracekit::init_telemetry("my-service")?;
///     tracekit::info!("service started");
///     guard.shutdown()?;
///     Ok(())
/// }
/// ```
pub fn init_telemetry(service_name: &str) -> Result<TracingGuard> {
    init_telemetry_with_logger(service_name, Arc::new(TracingLogger))
}

/// Same as [`init_telemetry`], but routes the tracing stack's internal
/// error and lifecycle diagnostics through the supplied logger.
pub fn init_telemetry_with_logger(
    service_name: &str,
    logger: Arc<dyn TracerLogger>,
) -> Result<TracingGuard> {
    let config = TracerConfig::from_env()?;
    install_tracer(service_name, &config, logger)
}

/// Conditionally install the global tracer for the given configuration.
///
/// When the configuration carries no exporter endpoint (or the SDK is
/// disabled), installation degrades to console logging plus a no-op guard,
/// and a diagnostic noting the disabled state goes through `logger`. That
/// is a supported configuration, not an error.
///
/// Otherwise this builds the OTLP span pipeline (batched on the Tokio
/// runtime), registers the global tracer and meter providers, wires the
/// subscriber stack with the OpenTelemetry layer, installs the W3C trace
/// context propagator, and bridges the stack's error callback to `logger`.
/// The returned guard owns the tracer provider's shutdown hook.
pub fn install_tracer(
    service_name: &str,
    config: &TracerConfig,
    logger: Arc<dyn TracerLogger>,
) -> Result<TracingGuard> {
    claim_install_slot()?;

    let endpoint = match (config.enabled, config.endpoint.as_deref()) {
        (true, Some(endpoint)) => endpoint.to_string(),
        _ => {
            init_subscriber(config, None)?;
            logger.info(format_args!(
                "tracing disabled: no exporter endpoint configured"
            ));
            return Ok(TracingGuard::noop());
        }
    };

    let service_name = config.resolve_service_name(service_name).to_string();

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint.clone())
        .with_timeout(config.export_timeout)
        .build_span_exporter()?;

    let provider = if config.log_spans {
        build_tracer_provider(LoggingSpanExporter::new(exporter), &service_name, config)
    } else {
        build_tracer_provider(exporter, &service_name, config)
    };
    let tracer = provider.tracer(service_name.clone());
    global::set_tracer_provider(provider.clone());
    global::set_text_map_propagator(TraceContextPropagator::new());

    init_subscriber(config, Some(tracer))?;
    init_metrics(&service_name, &endpoint)?;
    install_error_bridge(logger.clone())?;

    logger.info(format_args!(
        "telemetry initialized: service {service_name:?} exporting to {endpoint}"
    ));
    Ok(TracingGuard::active(provider))
}

/// Install the global tracer with a caller-supplied span exporter.
///
/// Replaces the OTLP pipeline with `exporter` behind a synchronous simple
/// processor, so no Tokio runtime is required and exported spans can be
/// observed directly. The configured endpoint is not consulted: by passing
/// an exporter the caller has already decided to install. The subscriber
/// stack and metrics pipeline are left untouched; spans reach the exporter
/// through the global tracer.
pub fn install_tracer_with_exporter<E>(
    service_name: &str,
    config: &TracerConfig,
    logger: Arc<dyn TracerLogger>,
    exporter: E,
) -> Result<TracingGuard>
where
    E: SpanExporter + 'static,
{
    claim_install_slot()?;

    let service_name = config.resolve_service_name(service_name).to_string();
    let provider = if config.log_spans {
        TracerProvider::builder()
            .with_simple_exporter(LoggingSpanExporter::new(exporter))
            .with_config(trace_config(&service_name, config))
            .build()
    } else {
        TracerProvider::builder()
            .with_simple_exporter(exporter)
            .with_config(trace_config(&service_name, config))
            .build()
    };
    global::set_tracer_provider(provider.clone());
    install_error_bridge(logger)?;

    Ok(TracingGuard::active(provider))
}

fn claim_install_slot() -> Result<()> {
    INSTALLED
        .set(())
        .map_err(|_| TelemetryError::AlreadyInitialized)
}

fn trace_config(service_name: &str, config: &TracerConfig) -> opentelemetry_sdk::trace::Config {
    opentelemetry_sdk::trace::config()
        .with_sampler(config.sampler.to_sampler())
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.to_string(),
        )]))
}

fn build_tracer_provider<E>(exporter: E, service_name: &str, config: &TracerConfig) -> TracerProvider
where
    E: SpanExporter + 'static,
{
    let processor = BatchSpanProcessor::builder(exporter, runtime::Tokio).build();
    TracerProvider::builder()
        .with_span_processor(processor)
        .with_config(trace_config(service_name, config))
        .build()
}

fn init_subscriber(config: &TracerConfig, tracer: Option<Tracer>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let otel_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    let registry = tracing_subscriber::registry().with(filter).with(otel_layer);
    let result = match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
        LogFormat::Default => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    };
    result.map_err(|err| TelemetryError::Subscriber(err.to_string()))
}

fn init_metrics(service_name: &str, endpoint: &str) -> Result<()> {
    let meter_provider = opentelemetry_otlp::new_pipeline()
        .metrics(runtime::Tokio)
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint.to_string()),
        )
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.to_string(),
        )]))
        .build()?;
    global::set_meter_provider(meter_provider);
    Ok(())
}
