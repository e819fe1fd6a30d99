use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{middleware, Json, Router};
use bluebridge_core::{WeatherRequest, WeatherResponse, STATUS_SUCCESS};

use crate::app::AppState;
use crate::domains::auth::core::{token_middleware, JsonBody};
use crate::domains::errors::map_service_error;
use crate::domains::weather::service::{forecast, parse_location};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(weather))
        .route_layer(middleware::from_fn(token_middleware))
}

#[tracing::instrument(skip(state, payload))]
async fn weather(State(state): State<AppState>, JsonBody(payload): JsonBody<WeatherRequest>) -> Response {
    let point = match parse_location(payload.location.as_ref()) {
        Ok(point) => point,
        Err(err) => return map_service_error(err),
    };
    match forecast(&state, point).await {
        Ok(report) => (
            StatusCode::OK,
            Json(WeatherResponse {
                status: STATUS_SUCCESS,
                message: report.message.to_string(),
                data: report.days,
            }),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}
