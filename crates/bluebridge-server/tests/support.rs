#![allow(dead_code)]

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use bluebridge_db::{migrate, PgPool};
use bluebridge_server::app::{build_router, AppState};
use bluebridge_server::config::ServerConfig;
use bluebridge_server::infra::push::LogPushSender;
use bluebridge_server::infra::weather::WeatherClient;
use serde_json::{json, Value};
use sqlx_core::pool::PoolOptions;
use sqlx_postgres::{PgConnectOptions, Postgres};
use tokio::sync::Semaphore;
use tower::ServiceExt;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

pub fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("bluebridge_server=debug"))
            .with_test_writer()
            .try_init();
    });
}

/// Connects to `TEST_DATABASE_URL`, creates a throwaway schema and migrates it.
pub async fn setup_db() -> PgPool {
    let db_url =
        env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set for Postgres tests");
    let schema = format!("bluebridge_test_{}", Uuid::new_v4().simple());
    let admin_options =
        PgConnectOptions::from_str(&db_url).expect("failed to parse TEST_DATABASE_URL");
    let admin_pool = PoolOptions::new()
        .max_connections(1)
        .connect_with(admin_options.clone())
        .await
        .expect("connect admin pool");

    sqlx_core::query::query::<Postgres>(&format!("CREATE SCHEMA \"{schema}\""))
        .execute(&admin_pool)
        .await
        .expect("create schema");

    let options = admin_options.options([("search_path", schema.as_str())]);
    let pool = PoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("connect test pool");

    migrate(&pool).await.expect("migrate");
    pool
}

/// Pool that never connects. Routes that reject before touching the database
/// can be exercised without Postgres.
pub fn lazy_pool() -> PgPool {
    PoolOptions::new().connect_lazy_with(PgConnectOptions::new())
}

pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.weather.enabled = false;
    config.email.enabled = false;
    config
}

pub fn test_state(db: PgPool, config: ServerConfig) -> AppState {
    AppState {
        db,
        started_at: Instant::now(),
        argon2_semaphore: Arc::new(Semaphore::new(4)),
        push: Arc::new(LogPushSender),
        mailer: None,
        weather: WeatherClient::new(&config.weather),
        config,
    }
}

pub struct TestApp {
    pub app: axum::Router,
    pub pool: PgPool,
}

impl TestApp {
    pub async fn new() -> Self {
        init_tracing();
        let pool = setup_db().await;
        Self::with_pool(pool)
    }

    pub fn offline() -> Self {
        init_tracing();
        Self::with_pool(lazy_pool())
    }

    fn with_pool(pool: PgPool) -> Self {
        let app = build_router(test_state(pool.clone(), test_config()));
        Self { app, pool }
    }

    pub async fn send_json(&self, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("encode json")))
            .expect("request");
        self.dispatch(request).await
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json")
        };
        (status, json)
    }

    /// Registers a user and returns `(userId, loginToken)`.
    pub async fn register(&self, email: &str, password: &str) -> (String, String) {
        let (status, body) = self
            .send_json(
                Method::POST,
                "/api/auth/register",
                json!({
                    "email": email,
                    "password": password,
                    "firstName": "Test",
                    "lastName": "User",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        let user_id = body["data"]["userId"]
            .as_str()
            .expect("userId")
            .to_string();
        let token = body["data"]["loginToken"]
            .as_str()
            .expect("loginToken")
            .to_string();
        (user_id, token)
    }
}
