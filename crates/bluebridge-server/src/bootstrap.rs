use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::http::{HeaderValue, Method};
use axum::{middleware, Router};
use bluebridge_db::{connect_postgres_with_max, PgPool};
use opentelemetry::global;
use opentelemetry::propagation::Extractor;
use prometheus::Encoder;
use tokio::sync::Semaphore;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::app::{self, AppState};
use crate::config::{MetricsConfig, ServerRuntimeConfig};
use crate::infra::email::EmailService;
use crate::infra::metrics;
use crate::infra::push::build_push_sender;
use crate::infra::weather::WeatherClient;
use crate::runtime;
use crate::settings;

const KDF_CONCURRENCY: usize = 4;

struct HeaderExtractor<'a>(&'a axum::http::HeaderMap);

impl<'a> Extractor for HeaderExtractor<'a> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|key| key.as_str()).collect()
    }
}

pub fn init_sentry(settings: &settings::Settings) -> Option<sentry::ClientInitGuard> {
    let sentry_enabled = settings.config.sentry.enabled && !settings.config.sentry.dsn.is_empty();
    if !sentry_enabled {
        return None;
    }
    let environment = settings.config.sentry.environment.clone();
    let release = settings.config.sentry.release.clone();
    Some(sentry::init((
        settings.config.sentry.dsn.as_str(),
        sentry::ClientOptions {
            environment: environment.map(Into::into),
            release: release.map(Into::into),
            ..Default::default()
        },
    )))
}

pub(crate) fn init_tracing(
    sentry_enabled: bool,
    settings: &settings::Settings,
) -> Option<runtime::OtelGuard> {
    runtime::init_tracing(sentry_enabled, settings)
}

pub fn log_startup(settings: &settings::Settings) {
    let config = &settings.config;
    if config.server.cors_allowed_origins.is_empty() {
        tracing::warn!(
            event = "cors_permissive",
            "No CORS origins configured; any origin is allowed"
        );
    }
    tracing::info!(
        event = "server_startup",
        addr = %settings.addr,
        config_path = %settings.config_path,
        mode = config.server.mode.label(),
        weather_enabled = config.weather.enabled,
        weather_alerts_enabled = config.weather.alerts_enabled,
        push_provider = ?config.push.provider,
        email_enabled = config.email.enabled,
        otel_enabled = config.tracing.otel.enabled,
        metrics_enabled = config.metrics.enabled,
        "Server configuration loaded"
    );
}

pub fn init_metrics_registry(metrics_config: &MetricsConfig) {
    if !metrics_config.enabled {
        return;
    }
    #[cfg(target_os = "linux")]
    {
        let process_collector = prometheus::process_collector::ProcessCollector::for_self();
        if prometheus::default_registry()
            .register(Box::new(process_collector))
            .is_err()
        {
            tracing::warn!("failed to register process metrics");
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        tracing::warn!("process metrics are only available on linux");
    }
}

pub async fn connect_db(settings: &settings::Settings) -> Result<PgPool, sqlx_core::Error> {
    connect_postgres_with_max(&settings.db_url, settings.db_pool_max).await
}

/// Wires the outbound clients. Fails when an enabled provider is misconfigured.
pub fn build_state(settings: &settings::Settings, db: PgPool) -> Result<AppState, String> {
    let config = settings.config.clone();
    let push = build_push_sender(&config.push).map_err(|err| err.to_string())?;
    let mailer = if config.email.enabled {
        Some(Arc::new(
            EmailService::new(&config.email).map_err(|err| err.to_string())?,
        ))
    } else {
        None
    };
    let weather = WeatherClient::new(&config.weather);

    Ok(AppState {
        db,
        started_at: Instant::now(),
        argon2_semaphore: Arc::new(Semaphore::new(KDF_CONCURRENCY)),
        push,
        mailer,
        weather,
        config,
    })
}

pub fn start_background_tasks(settings: &settings::Settings, state: &AppState) {
    if settings.config.metrics.enabled {
        metrics::start_db_pool_metrics(state.db.clone(), settings.db_pool_max);
    }
}

pub(crate) fn cors_layer(server: &ServerRuntimeConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);
    if server.cors_allowed_origins.is_empty() {
        return base.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = server
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(event = "config_invalid", field = "cors_allowed_origins", value = %origin);
                None
            }
        })
        .collect();
    base.allow_origin(origins)
}

pub fn build_app(settings: &settings::Settings, state: AppState) -> Router {
    let metrics_config = settings.config.metrics.clone();
    let cors = cors_layer(&settings.config.server);
    let request_id_header = axum::http::HeaderName::from_static("x-request-id");
    let mut app = app::build_router(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("unknown");
                let matched = request
                    .extensions()
                    .get::<axum::extract::MatchedPath>()
                    .map(axum::extract::MatchedPath::as_str)
                    .unwrap_or("unmatched");
                let span = tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %matched,
                    request_id = %request_id,
                    user_id = tracing::field::Empty
                );
                let parent = global::get_text_map_propagator(|prop| {
                    prop.extract(&HeaderExtractor(request.headers()))
                });
                span.set_parent(parent);
                span
            }),
        )
        .layer(cors)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(CatchPanicLayer::custom(|err| {
            tracing::error!(event = "panic_recovered", error = ?err, "handler panicked");
            crate::domains::errors::error_response(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            )
        }));
    if metrics_config.enabled {
        app = app.route_layer(middleware::from_fn(metrics::http_metrics));
        let (layer, handle) = axum_prometheus::PrometheusMetricLayer::pair();
        let path = metrics_config.endpoint.clone();
        app = app.layer(layer).route(
            &path,
            axum::routing::get(move || async move {
                let mut body = handle.render();
                let encoder = prometheus::TextEncoder::new();
                let mut buffer = Vec::new();
                if encoder.encode(&prometheus::gather(), &mut buffer).is_ok() && !buffer.is_empty() {
                    body.push('\n');
                    body.push_str(&String::from_utf8_lossy(&buffer));
                }

                let mut response = axum::response::Response::new(axum::body::Body::from(body));
                if let Ok(value) = HeaderValue::from_str(encoder.format_type()) {
                    response
                        .headers_mut()
                        .insert(axum::http::header::CONTENT_TYPE, value);
                }
                response
            }),
        );
    }
    app
}

pub async fn serve(settings: &settings::Settings, app: Router) {
    let addr: SocketAddr = settings.addr;
    tracing::info!(%addr, "listening");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(event = "server_bind_failed", error = %err);
            return;
        }
    };
    if let Err(err) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(runtime::shutdown_signal())
    .await
    {
        tracing::error!(event = "server_failed", error = %err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;

    #[test]
    fn cors_accepts_configured_origins() {
        let mut config = ServerConfig::default();
        config.server.cors_allowed_origins = vec![
            "https://app.bluebridge.example".to_string(),
            "bad\norigin".to_string(),
        ];
        let layer = cors_layer(&config.server);
        assert!(format!("{layer:?}").contains("app.bluebridge.example"));
    }
}
