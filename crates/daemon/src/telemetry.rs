//! Logging and tracing setup
//!
//! One subscriber per process: an env filter, a console layer (pretty or
//! JSON), an optional daily-rolling JSON file, and OpenTelemetry export when
//! built with the `telemetry` feature.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default: `playlist_export=info`)
//! - `PLAYLIST_EXPORT_LOG_FORMAT`: `pretty` (default) or `json`
//! - `PLAYLIST_EXPORT_LOG_DIR`: also write JSON logs to this directory
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (e.g., http://localhost:4317)
//! - `OTEL_SERVICE_NAME`: service name (default: the binary name)

use anyhow::{Context, Result};
use playlist_export_core::error::AppError;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

const DEFAULT_FILTER: &str = "playlist_export=info";
const LOG_FILE_PREFIX: &str = "playlist-export.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Development: pretty formatting with colors
    Pretty,
    /// Production: JSON structured logging
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!(
                "Unknown log format '{}' (expected pretty or json)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub format: LogFormat,
    pub log_dir: Option<PathBuf>,
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

impl TelemetryConfig {
    pub fn from_env(default_service_name: &str) -> Result<Self, AppError> {
        Self::from_lookup(&crate::config::env_lookup, default_service_name)
    }

    pub fn from_lookup<F>(lookup: &F, default_service_name: &str) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = match lookup("PLAYLIST_EXPORT_LOG_FORMAT") {
            Some(raw) => raw.trim().parse()?,
            None => LogFormat::Pretty,
        };

        Ok(Self {
            format,
            log_dir: lookup("PLAYLIST_EXPORT_LOG_DIR")
                .filter(|d| !d.is_empty())
                .map(|d| PathBuf::from(shellexpand::tilde(&d).into_owned())),
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|e| !e.is_empty()),
            service_name: lookup("OTEL_SERVICE_NAME")
                .unwrap_or_else(|| default_service_name.to_string()),
        })
    }
}

/// Keeps background writers alive; flushes on drop
pub struct TelemetryGuard {
    _file_guard: Option<WorkerGuard>,
    #[cfg(feature = "telemetry")]
    tracer_provider: Option<opentelemetry_sdk::trace::TracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        #[cfg(feature = "telemetry")]
        {
            if let Some(provider) = self.tracer_provider.take() {
                if let Err(e) = provider.shutdown() {
                    eprintln!("OpenTelemetry shutdown failed: {}", e);
                }
            }
        }
    }
}

/// Install the global subscriber
pub fn init(config: &TelemetryConfig) -> Result<TelemetryGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("Failed to create env filter")?;

    let mut layers: Vec<BoxedLayer> = Vec::new();

    layers.push(match config.format {
        LogFormat::Json => fmt::layer().json().boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
    });

    let file_guard = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    #[cfg(feature = "telemetry")]
    let tracer_provider = match &config.otlp_endpoint {
        Some(endpoint) => {
            let (layer, provider) = otel_layer(endpoint, &config.service_name)?;
            layers.push(layer);
            Some(provider)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    #[cfg(not(feature = "telemetry"))]
    {
        if config.otlp_endpoint.is_some() {
            tracing::warn!("OpenTelemetry endpoint set but feature 'telemetry' not enabled");
            tracing::warn!("Rebuild with: cargo build --features telemetry");
        }
    }

    #[cfg(feature = "telemetry")]
    {
        if tracer_provider.is_some() {
            tracing::info!(
                service_name = %config.service_name,
                endpoint = ?config.otlp_endpoint,
                "OpenTelemetry initialized"
            );
        }
    }

    Ok(TelemetryGuard {
        _file_guard: file_guard,
        #[cfg(feature = "telemetry")]
        tracer_provider,
    })
}

#[cfg(feature = "telemetry")]
fn otel_layer(
    endpoint: &str,
    service_name: &str,
) -> Result<(BoxedLayer, opentelemetry_sdk::trace::TracerProvider)> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::Resource;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("Failed to build OTLP exporter")?;

    let provider = opentelemetry_sdk::trace::TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.to_string(),
        )]))
        .build();

    let tracer = provider.tracer(service_name.to_string());
    let layer = tracing_opentelemetry::layer().with_tracer(tracer).boxed();

    Ok((layer, provider))
}
