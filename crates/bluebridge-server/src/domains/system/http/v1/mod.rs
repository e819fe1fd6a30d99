use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use bluebridge_core::DataResponse;
use chrono::{SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::Serialize;

use crate::app::AppState;

/// Answered to the mobile client before it talks to the API.
#[derive(Debug, Serialize, JsonSchema)]
pub(crate) struct ServerStatus {
    pub(crate) message: &'static str,
    pub(crate) mode: &'static str,
    pub(crate) status: &'static str,
    pub(crate) timestamp: String,
    pub(crate) version: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/status", get(status))
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(DataResponse::success(ServerStatus {
            message: "Welcome to the BlueBridge API",
            mode: state.config.server.mode.label(),
            status: "Online",
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            version: env!("CARGO_PKG_VERSION"),
        })),
    )
}
