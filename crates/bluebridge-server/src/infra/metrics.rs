use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use bluebridge_db::PgPool;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, register_int_gauge_vec,
    HistogramVec, IntCounterVec, IntGauge, IntGaugeVec,
};
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::warn;

// A metric that fails to register is skipped; recording into it is a no-op.

fn counter_vec(name: &str, help: &str, labels: &[&str]) -> Option<IntCounterVec> {
    register_int_counter_vec!(name, help, labels)
        .map_err(|err| warn!(event = "metrics_register_failed", metric = name, error = %err))
        .ok()
}

fn gauge_vec(name: &str, help: &str, labels: &[&str]) -> Option<IntGaugeVec> {
    register_int_gauge_vec!(name, help, labels)
        .map_err(|err| warn!(event = "metrics_register_failed", metric = name, error = %err))
        .ok()
}

fn gauge(name: &str, help: &str) -> Option<IntGauge> {
    register_int_gauge!(name, help)
        .map_err(|err| warn!(event = "metrics_register_failed", metric = name, error = %err))
        .ok()
}

fn histogram_vec(name: &str, help: &str, labels: &[&str], buckets: Vec<f64>) -> Option<HistogramVec> {
    register_histogram_vec!(name, help, labels, buckets)
        .map_err(|err| warn!(event = "metrics_register_failed", metric = name, error = %err))
        .ok()
}

fn http_buckets() -> Vec<f64> {
    vec![
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ]
}

fn kdf_buckets() -> Vec<f64> {
    vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0]
}

static AUTH_EVENTS: LazyLock<Option<IntCounterVec>> = LazyLock::new(|| {
    counter_vec(
        "bluebridge_auth_events_total",
        "Authentication events",
        &["event", "result"],
    )
});

static PUSH_MESSAGES: LazyLock<Option<IntCounterVec>> = LazyLock::new(|| {
    counter_vec(
        "bluebridge_push_messages_total",
        "Push messages handed to the provider",
        &["result"],
    )
});

static WEATHER_REQUESTS: LazyLock<Option<IntCounterVec>> = LazyLock::new(|| {
    counter_vec(
        "bluebridge_weather_requests_total",
        "Forecast lookups by data source",
        &["source"],
    )
});

static HTTP_IN_FLIGHT: LazyLock<Option<IntGauge>> =
    LazyLock::new(|| gauge("bluebridge_http_in_flight", "HTTP requests in flight"));

static HTTP_REQUESTS: LazyLock<Option<IntCounterVec>> = LazyLock::new(|| {
    counter_vec(
        "bluebridge_http_requests_total",
        "HTTP requests",
        &["method", "route", "status_class"],
    )
});

static HTTP_LATENCY: LazyLock<Option<HistogramVec>> = LazyLock::new(|| {
    histogram_vec(
        "bluebridge_http_request_duration_seconds",
        "HTTP request latency",
        &["route"],
        http_buckets(),
    )
});

static KDF_WAIT_SECONDS: LazyLock<Option<HistogramVec>> = LazyLock::new(|| {
    histogram_vec(
        "bluebridge_kdf_wait_seconds",
        "Time waiting for a password hashing permit",
        &["operation"],
        kdf_buckets(),
    )
});

static KDF_IN_FLIGHT: LazyLock<Option<IntGauge>> = LazyLock::new(|| {
    gauge(
        "bluebridge_kdf_in_flight",
        "Password hashing operations in flight",
    )
});

static DB_POOL_CONNECTIONS: LazyLock<Option<IntGaugeVec>> = LazyLock::new(|| {
    gauge_vec(
        "bluebridge_db_pool_connections",
        "Database pool connections",
        &["state"],
    )
});

fn inc(counter: &Option<IntCounterVec>, labels: &[&str]) {
    if let Some(counter) = counter {
        counter.with_label_values(labels).inc();
    }
}

/// `event` is one of `register`, `login`, `delete_account`, `token`.
pub fn auth_event(event: &str, result: &str) {
    inc(&AUTH_EVENTS, &[event, result]);
}

pub fn push_messages(result: &str, count: usize) {
    if let Some(counter) = PUSH_MESSAGES.as_ref() {
        counter
            .with_label_values(&[result])
            .inc_by(u64::try_from(count).unwrap_or(u64::MAX));
    }
}

/// `source` is `cache`, `api` or `stale`.
pub fn weather_request(source: &str) {
    inc(&WEATHER_REQUESTS, &[source]);
}

pub async fn http_metrics(req: Request<Body>, next: Next) -> Response {
    let method = req.method().as_str().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or("unmatched")
        .to_string();
    if let Some(gauge) = HTTP_IN_FLIGHT.as_ref() {
        gauge.inc();
    }
    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed().as_secs_f64();
    if let Some(gauge) = HTTP_IN_FLIGHT.as_ref() {
        gauge.dec();
    }
    record_http_request(&method, &route, response.status().as_u16(), elapsed);
    response
}

pub fn record_http_request(method: &str, route: &str, status: u16, duration_seconds: f64) {
    let status_class = match status / 100 {
        1 => "1xx",
        2 => "2xx",
        3 => "3xx",
        4 => "4xx",
        5 => "5xx",
        _ => "unknown",
    };
    inc(&HTTP_REQUESTS, &[method, route, status_class]);
    if let Some(histogram) = HTTP_LATENCY.as_ref() {
        histogram
            .with_label_values(&[route])
            .observe(duration_seconds);
    }
}

pub struct KdfPermit<'a> {
    _permit: tokio::sync::SemaphorePermit<'a>,
}

impl Drop for KdfPermit<'_> {
    fn drop(&mut self) {
        if let Some(gauge) = KDF_IN_FLIGHT.as_ref() {
            gauge.dec();
        }
    }
}

/// Bounds concurrent argon2 work; the permit is released on drop.
pub async fn acquire_kdf_permit<'a>(
    semaphore: &'a Semaphore,
    operation: &str,
) -> Result<KdfPermit<'a>, ()> {
    let start = Instant::now();
    let permit = semaphore.acquire().await.map_err(|_| ())?;
    if let Some(histogram) = KDF_WAIT_SECONDS.as_ref() {
        histogram
            .with_label_values(&[operation])
            .observe(start.elapsed().as_secs_f64());
    }
    if let Some(gauge) = KDF_IN_FLIGHT.as_ref() {
        gauge.inc();
    }
    Ok(KdfPermit { _permit: permit })
}

pub fn start_db_pool_metrics(pool: PgPool, max_connections: u32) {
    let Some(connections) = DB_POOL_CONNECTIONS.as_ref() else {
        return;
    };
    let idle_metric = connections.with_label_values(&["idle"]);
    let active_metric = connections.with_label_values(&["active"]);
    connections
        .with_label_values(&["max"])
        .set(i64::from(max_connections));

    tokio::spawn(async move {
        loop {
            let idle = i64::try_from(pool.num_idle()).unwrap_or(i64::MAX);
            let size = i64::from(pool.size());
            idle_metric.set(idle);
            active_metric.set((size - idle).max(0));
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
    });
}
