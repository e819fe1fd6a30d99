use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use bluebridge_core::DataResponse;

use crate::app::AppState;
use crate::domains::errors::map_service_error;
use crate::domains::statistics::service;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(well_statistics))
}

#[tracing::instrument(skip(state))]
pub(crate) async fn well_statistics(State(state): State<AppState>) -> Response {
    match service::well_statistics(&state).await {
        Ok(stats) => (StatusCode::OK, Json(DataResponse::success(stats))).into_response(),
        Err(err) => map_service_error(err),
    }
}
