//! Tracer configuration read from environment variables
//!
//! The recognized variables follow the OpenTelemetry SDK configuration
//! convention, plus two crate-specific toggles for span logging and console
//! log format. Malformed numeric or enumerated values are configuration
//! errors returned to the caller; boolean toggles parse leniently.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TelemetryError};

/// Master kill switch for the whole SDK.
pub const OTEL_SDK_DISABLED: &str = "OTEL_SDK_DISABLED";
/// Overrides the service name passed to the install functions.
pub const OTEL_SERVICE_NAME: &str = "OTEL_SERVICE_NAME";
/// OTLP collector endpoint for all signals.
pub const OTEL_EXPORTER_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
/// OTLP collector endpoint for spans only; wins over the general endpoint.
pub const OTEL_EXPORTER_OTLP_TRACES_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_TRACES_ENDPOINT";
/// Span export timeout in milliseconds.
pub const OTEL_EXPORTER_OTLP_TIMEOUT: &str = "OTEL_EXPORTER_OTLP_TIMEOUT";
/// Sampler selection, e.g. `parentbased_traceidratio`.
pub const OTEL_TRACES_SAMPLER: &str = "OTEL_TRACES_SAMPLER";
/// Sampling ratio argument for the ratio-based samplers.
pub const OTEL_TRACES_SAMPLER_ARG: &str = "OTEL_TRACES_SAMPLER_ARG";
/// When set, every exported span batch is also logged at debug level.
pub const TRACEKIT_LOG_SPANS: &str = "TRACEKIT_LOG_SPANS";
/// Console log format: `default`, `pretty` or `json`.
pub const TRACEKIT_LOG_FORMAT: &str = "TRACEKIT_LOG_FORMAT";

const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Tracer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracerConfig {
    /// False only when `OTEL_SDK_DISABLED` is set.
    pub enabled: bool,
    /// Service name override from `OTEL_SERVICE_NAME`.
    pub service_name: Option<String>,
    /// OTLP collector endpoint; tracing is installed only when present.
    pub endpoint: Option<String>,
    pub sampler: SamplerConfig,
    pub export_timeout: Duration,
    pub log_spans: bool,
    pub log_format: LogFormat,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: None,
            endpoint: None,
            sampler: SamplerConfig::default(),
            export_timeout: DEFAULT_EXPORT_TIMEOUT,
            log_spans: false,
            log_format: LogFormat::Default,
        }
    }
}

impl TracerConfig {
    /// Read the configuration from the process environment.
    ///
    /// Unset variables fall back to their defaults. Malformed sampler,
    /// ratio, or timeout values return [`TelemetryError::Config`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let sampler = SamplerConfig::parse(
            lookup(OTEL_TRACES_SAMPLER).as_deref(),
            lookup(OTEL_TRACES_SAMPLER_ARG).as_deref(),
        )?;
        let export_timeout = match lookup(OTEL_EXPORTER_OTLP_TIMEOUT) {
            Some(raw) => parse_timeout_millis(&raw)?,
            None => DEFAULT_EXPORT_TIMEOUT,
        };
        Ok(Self {
            enabled: !parse_bool(lookup(OTEL_SDK_DISABLED).as_deref()),
            service_name: lookup(OTEL_SERVICE_NAME),
            endpoint: lookup(OTEL_EXPORTER_OTLP_TRACES_ENDPOINT)
                .or_else(|| lookup(OTEL_EXPORTER_OTLP_ENDPOINT)),
            sampler,
            export_timeout,
            log_spans: parse_bool(lookup(TRACEKIT_LOG_SPANS).as_deref()),
            log_format: LogFormat::parse(lookup(TRACEKIT_LOG_FORMAT).as_deref()),
        })
    }

    /// Return true if a tracer should be installed: the SDK is not disabled
    /// and an exporter endpoint is configured.
    pub fn is_enabled(&self) -> bool {
        self.enabled && self.endpoint.is_some()
    }

    /// The environment override wins over the name passed in code.
    pub fn resolve_service_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.service_name.as_deref().unwrap_or(fallback)
    }
}

/// Sampler selection, mirroring the `OTEL_TRACES_SAMPLER` value space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SamplerConfig {
    AlwaysOn,
    AlwaysOff,
    TraceIdRatio(f64),
    ParentBasedAlwaysOn,
    ParentBasedAlwaysOff,
    ParentBasedTraceIdRatio(f64),
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig::ParentBasedAlwaysOn
    }
}

impl SamplerConfig {
    fn parse(kind: Option<&str>, arg: Option<&str>) -> Result<Self> {
        let Some(kind) = kind else {
            return Ok(SamplerConfig::default());
        };
        match kind {
            "always_on" => Ok(SamplerConfig::AlwaysOn),
            "always_off" => Ok(SamplerConfig::AlwaysOff),
            "traceidratio" => Ok(SamplerConfig::TraceIdRatio(parse_ratio(arg)?)),
            "parentbased_always_on" => Ok(SamplerConfig::ParentBasedAlwaysOn),
            "parentbased_always_off" => Ok(SamplerConfig::ParentBasedAlwaysOff),
            "parentbased_traceidratio" => {
                Ok(SamplerConfig::ParentBasedTraceIdRatio(parse_ratio(arg)?))
            }
            other => Err(TelemetryError::Config(format!(
                "unrecognized sampler {other:?} in {OTEL_TRACES_SAMPLER}"
            ))),
        }
    }

    pub(crate) fn to_sampler(&self) -> opentelemetry_sdk::trace::Sampler {
        use opentelemetry_sdk::trace::Sampler;
        match self {
            SamplerConfig::AlwaysOn => Sampler::AlwaysOn,
            SamplerConfig::AlwaysOff => Sampler::AlwaysOff,
            SamplerConfig::TraceIdRatio(ratio) => Sampler::TraceIdRatioBased(*ratio),
            SamplerConfig::ParentBasedAlwaysOn => Sampler::ParentBased(Box::new(Sampler::AlwaysOn)),
            SamplerConfig::ParentBasedAlwaysOff => {
                Sampler::ParentBased(Box::new(Sampler::AlwaysOff))
            }
            SamplerConfig::ParentBasedTraceIdRatio(ratio) => {
                Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(*ratio)))
            }
        }
    }
}

/// Console log format for the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    Default,
    Pretty,
    Json,
}

impl LogFormat {
    /// Unknown values fall back to the default format.
    fn parse(value: Option<&str>) -> LogFormat {
        match value {
            Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            _ => LogFormat::Default,
        }
    }
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Default => write!(f, "default"),
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

fn parse_bool(value: Option<&str>) -> bool {
    value.map(|v| v == "true" || v == "1").unwrap_or(false)
}

fn parse_ratio(arg: Option<&str>) -> Result<f64> {
    // Per the SDK convention, a ratio sampler without an argument samples everything.
    let Some(raw) = arg else { return Ok(1.0) };
    let ratio: f64 = raw.trim().parse().map_err(|_| {
        TelemetryError::Config(format!(
            "{OTEL_TRACES_SAMPLER_ARG} must be a number, got {raw:?}"
        ))
    })?;
    if !(0.0..=1.0).contains(&ratio) {
        return Err(TelemetryError::Config(format!(
            "{OTEL_TRACES_SAMPLER_ARG} must be within 0.0..=1.0, got {ratio}"
        )));
    }
    Ok(ratio)
}

fn parse_timeout_millis(raw: &str) -> Result<Duration> {
    let millis: u64 = raw.trim().parse().map_err(|_| {
        TelemetryError::Config(format!(
            "{OTEL_EXPORTER_OTLP_TIMEOUT} must be a duration in milliseconds, got {raw:?}"
        ))
    })?;
    Ok(Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |name| map.get(name).map(|v| v.to_string())
    }

    #[test]
    fn empty_environment_yields_disabled_defaults() {
        let config = TracerConfig::from_lookup(&lookup(&[])).unwrap();
        assert_eq!(config, TracerConfig::default());
        assert!(config.enabled);
        assert!(!config.is_enabled());
        assert_eq!(config.export_timeout, Duration::from_millis(10_000));
    }

    #[test]
    fn traces_endpoint_wins_over_general_endpoint() {
        let config = TracerConfig::from_lookup(&lookup(&[
            (OTEL_EXPORTER_OTLP_ENDPOINT, "http://collector:4317"),
            (OTEL_EXPORTER_OTLP_TRACES_ENDPOINT, "http://spans:4317"),
        ]))
        .unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("http://spans:4317"));
        assert!(config.is_enabled());
    }

    #[test]
    fn sdk_disabled_overrides_a_configured_endpoint() {
        let config = TracerConfig::from_lookup(&lookup(&[
            (OTEL_EXPORTER_OTLP_ENDPOINT, "http://collector:4317"),
            (OTEL_SDK_DISABLED, "true"),
        ]))
        .unwrap();
        assert!(!config.enabled);
        assert!(!config.is_enabled());
    }

    #[test]
    fn sampler_names_map_to_variants() {
        let cases = [
            ("always_on", SamplerConfig::AlwaysOn),
            ("always_off", SamplerConfig::AlwaysOff),
            ("parentbased_always_on", SamplerConfig::ParentBasedAlwaysOn),
            ("parentbased_always_off", SamplerConfig::ParentBasedAlwaysOff),
        ];
        for (name, expected) in cases {
            let config =
                TracerConfig::from_lookup(&lookup(&[(OTEL_TRACES_SAMPLER, name)])).unwrap();
            assert_eq!(config.sampler, expected, "sampler {name}");
        }
    }

    #[test]
    fn ratio_sampler_reads_its_argument() {
        let config = TracerConfig::from_lookup(&lookup(&[
            (OTEL_TRACES_SAMPLER, "parentbased_traceidratio"),
            (OTEL_TRACES_SAMPLER_ARG, "0.25"),
        ]))
        .unwrap();
        assert_eq!(config.sampler, SamplerConfig::ParentBasedTraceIdRatio(0.25));
    }

    #[test]
    fn ratio_sampler_without_argument_samples_everything() {
        let config =
            TracerConfig::from_lookup(&lookup(&[(OTEL_TRACES_SAMPLER, "traceidratio")])).unwrap();
        assert_eq!(config.sampler, SamplerConfig::TraceIdRatio(1.0));
    }

    #[test]
    fn unknown_sampler_is_a_configuration_error() {
        let result = TracerConfig::from_lookup(&lookup(&[(OTEL_TRACES_SAMPLER, "coin_flip")]));
        assert!(matches!(result, Err(TelemetryError::Config(_))));
    }

    #[test]
    fn out_of_range_ratio_is_a_configuration_error() {
        let result = TracerConfig::from_lookup(&lookup(&[
            (OTEL_TRACES_SAMPLER, "traceidratio"),
            (OTEL_TRACES_SAMPLER_ARG, "1.5"),
        ]));
        assert!(matches!(result, Err(TelemetryError::Config(_))));
    }

    #[test]
    fn non_numeric_ratio_is_a_configuration_error() {
        let result = TracerConfig::from_lookup(&lookup(&[
            (OTEL_TRACES_SAMPLER, "traceidratio"),
            (OTEL_TRACES_SAMPLER_ARG, "often"),
        ]));
        assert!(matches!(result, Err(TelemetryError::Config(_))));
    }

    #[test]
    fn timeout_parses_as_milliseconds() {
        let config =
            TracerConfig::from_lookup(&lookup(&[(OTEL_EXPORTER_OTLP_TIMEOUT, "250")])).unwrap();
        assert_eq!(config.export_timeout, Duration::from_millis(250));

        let result = TracerConfig::from_lookup(&lookup(&[(OTEL_EXPORTER_OTLP_TIMEOUT, "soon")]));
        assert!(matches!(result, Err(TelemetryError::Config(_))));
    }

    #[test]
    fn boolean_toggles_parse_leniently() {
        let config =
            TracerConfig::from_lookup(&lookup(&[(TRACEKIT_LOG_SPANS, "1")])).unwrap();
        assert!(config.log_spans);

        let config =
            TracerConfig::from_lookup(&lookup(&[(TRACEKIT_LOG_SPANS, "0")])).unwrap();
        assert!(!config.log_spans);
    }

    #[test]
    fn log_format_falls_back_to_default() {
        let config =
            TracerConfig::from_lookup(&lookup(&[(TRACEKIT_LOG_FORMAT, "json")])).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);

        let config =
            TracerConfig::from_lookup(&lookup(&[(TRACEKIT_LOG_FORMAT, "yaml")])).unwrap();
        assert_eq!(config.log_format, LogFormat::Default);
    }

    #[test]
    fn service_name_override_wins() {
        let config =
            TracerConfig::from_lookup(&lookup(&[(OTEL_SERVICE_NAME, "renamed")])).unwrap();
        assert_eq!(config.resolve_service_name("in-code"), "renamed");

        let config = TracerConfig::from_lookup(&lookup(&[])).unwrap();
        assert_eq!(config.resolve_service_name("in-code"), "in-code");
    }
}
