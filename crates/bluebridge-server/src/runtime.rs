use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::runtime;
use opentelemetry_sdk::trace::{Sampler, Tracer};
use opentelemetry_sdk::Resource;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::OtelConfig;
use crate::settings;

const SERVICE_NAME: &str = "bluebridge-server";
const DEFAULT_LOG_FILTER: &str = "bluebridge_server=info,tower_http=info,sqlx=warn";

pub(crate) struct OtelGuard {
    tracer: Tracer,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        global::shutdown_tracer_provider();
    }
}

/// Output shape of the fmt layer, picked with `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
    Compact,
}

impl LogFormat {
    fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("json") => Self::Json,
            Some("compact") => Self::Compact,
            _ => Self::Text,
        }
    }
}

fn otel_guard(settings: &settings::Settings) -> Option<OtelGuard> {
    let otel = &settings.config.tracing.otel;
    if !otel.enabled {
        return None;
    }
    // The subscriber is not installed yet, so failures go to stderr.
    init_otel(otel)
        .map(|tracer| OtelGuard { tracer })
        .map_err(|err| eprintln!("otel_init_failed: {err}"))
        .ok()
}

pub(crate) fn init_tracing(
    sentry_enabled: bool,
    settings: &settings::Settings,
) -> Option<OtelGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let format = LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref());
    let guard = otel_guard(settings);

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(sentry_enabled.then(sentry_tracing::layer))
        .with(
            guard
                .as_ref()
                .map(|guard| tracing_opentelemetry::layer().with_tracer(guard.tracer.clone())),
        );
    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true),
            )
            .init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    let sentry = &settings.config.sentry;
    if !sentry.enabled && !sentry.dsn.is_empty() {
        tracing::warn!(event = "config_ignored", field = "sentry.dsn", "sentry dsn set but sentry.enabled is false");
    }
    tracing::debug!(event = "tracing_ready", format = ?format, otel = guard.is_some());
    guard
}

/// Ratios outside `0..=1` fall back to sampling everything.
fn sampling_ratio(configured: Option<f64>) -> f64 {
    match configured {
        Some(ratio) if (0.0..=1.0).contains(&ratio) => ratio,
        Some(ratio) => {
            tracing::warn!(
                event = "otel_sampling_ratio_invalid",
                ratio,
                "sampling_ratio must be between 0 and 1"
            );
            1.0
        }
        None => 1.0,
    }
}

fn init_otel(config: &OtelConfig) -> Result<Tracer, String> {
    let mut exporter = opentelemetry_otlp::new_exporter().http();
    if let Some(endpoint) = config.endpoint.as_deref() {
        exporter = exporter.with_endpoint(endpoint);
    }
    let service_name = config
        .service_name
        .clone()
        .unwrap_or_else(|| SERVICE_NAME.to_string());
    let sampler = Sampler::TraceIdRatioBased(sampling_ratio(config.sampling_ratio));
    let tracer_provider = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_resource(Resource::new(vec![KeyValue::new(
                    "service.name",
                    service_name,
                )]))
                .with_sampler(sampler),
        )
        .install_batch(runtime::Tokio)
        .map_err(|err| format!("otel_install_failed: {err}"))?;
    global::set_text_map_propagator(TraceContextPropagator::new());
    let tracer = tracer_provider.tracer(SERVICE_NAME);
    global::set_tracer_provider(tracer_provider);
    Ok(tracer)
}

pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(event = "shutdown_signal_failed", signal = "CTRL_C", error = %err);
            std::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(
                    event = "shutdown_signal_failed",
                    signal = "SIGTERM",
                    error = %err
                );
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!(
        event = "shutdown_signal_received",
        "Shutdown signal received"
    );
}
