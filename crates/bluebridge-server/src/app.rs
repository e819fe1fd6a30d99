use std::sync::Arc;
use std::time::Instant;

use axum::extract::DefaultBodyLimit;
use axum::http::{StatusCode, Uri};
use axum::response::Response;
use axum::{Extension, Router};
use bluebridge_db::PgPool;
use tokio::sync::Semaphore;

use crate::config::ServerConfig;
use crate::domains::errors::error_response;
use crate::infra::email::EmailService;
use crate::infra::push::PushSender;
use crate::infra::weather::WeatherClient;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub started_at: Instant,
    pub config: ServerConfig,
    pub argon2_semaphore: Arc<Semaphore>,
    pub push: Arc<dyn PushSender>,
    /// `None` when email delivery is disabled.
    pub mailer: Option<Arc<EmailService>>,
    pub weather: WeatherClient,
}

pub fn build_router(state: AppState) -> Router {
    let extension_state = state.clone();
    let max_body_bytes = state.config.server.max_body_bytes;
    crate::http::router()
        .fallback(not_found)
        .with_state(state)
        .layer(Extension(extension_state))
        .layer(DefaultBodyLimit::max(max_body_bytes))
}

async fn not_found(uri: Uri) -> Response {
    tracing::debug!(event = "route_not_found", path = %uri.path());
    error_response(StatusCode::NOT_FOUND, format!("Path not found: {}", uri.path()))
}
