use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bluebridge_core::{BugReportRequest, MessageResponse};

use crate::app::AppState;
use crate::domains::auth::core::JsonBody;
use crate::domains::bugreports::service::{submit, BugReportCommand};
use crate::domains::errors::map_service_error;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(submit_report))
}

#[tracing::instrument(skip(state, payload))]
async fn submit_report(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<BugReportRequest>,
) -> Response {
    let cmd = match BugReportCommand::try_from(payload) {
        Ok(cmd) => cmd,
        Err(err) => return map_service_error(err),
    };
    match submit(&state, cmd).await {
        Ok(_) => (
            StatusCode::OK,
            Json(MessageResponse::success("Bug report submitted")),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}
