//! Span export decorator used by the span-logging toggle

use futures::future::BoxFuture;
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};
use tracing::debug;

/// Wraps a span exporter and logs every span it exports.
///
/// Installed around the OTLP exporter when `TRACEKIT_LOG_SPANS` is set, so
/// exported spans can be followed in the console while debugging a
/// collector setup.
#[derive(Debug)]
pub struct LoggingSpanExporter<S: SpanExporter> {
    exporter: S,
}

impl<S: SpanExporter> LoggingSpanExporter<S> {
    pub fn new(exporter: S) -> LoggingSpanExporter<S> {
        LoggingSpanExporter { exporter }
    }
}

impl<S: SpanExporter> SpanExporter for LoggingSpanExporter<S> {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        for span in &batch {
            debug!(
                name = %span.name,
                trace_id = %span.span_context.trace_id(),
                span_id = %span.span_context.span_id(),
                "exporting span"
            );
        }
        self.exporter.export(batch)
    }

    fn shutdown(&mut self) {
        debug!("shutting down the span exporter");
        self.exporter.shutdown()
    }
}
