use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use schemars::JsonSchema;
use serde::Serialize;

use crate::app::AppState;

#[derive(Serialize, JsonSchema)]
pub(crate) struct HealthResponse {
    /// `ok` or `degraded`.
    pub(crate) status: &'static str,
    pub(crate) version: &'static str,
    pub(crate) build_commit: Option<&'static str>,
    pub(crate) uptime_seconds: u64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = match sqlx_core::query::query::<sqlx_postgres::Postgres>("SELECT 1")
        .execute(&state.db)
        .await
    {
        Ok(_) => true,
        Err(err) => {
            tracing::warn!(event = "health_db_ping_failed", error = %err);
            false
        }
    };
    let (code, status) = if db_ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            build_commit: option_env!("GIT_COMMIT"),
            uptime_seconds: state.started_at.elapsed().as_secs(),
        }),
    )
}
