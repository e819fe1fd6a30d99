use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{middleware, Extension, Json, Router};
use bluebridge_core::{DataResponse, NearbyUsersRequest, User};

use crate::app::AppState;
use crate::domains::auth::core::{token_middleware, JsonBody};
use crate::domains::errors::map_service_error;
use crate::domains::nearby::service::{nearby_users, NearbyUsersCommand};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(find_nearby_users))
        .route_layer(middleware::from_fn(token_middleware))
}

#[tracing::instrument(skip(state, caller, payload))]
async fn find_nearby_users(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    JsonBody(payload): JsonBody<NearbyUsersRequest>,
) -> Response {
    let cmd = match NearbyUsersCommand::parse(
        payload.latitude.as_ref(),
        payload.longitude.as_ref(),
        payload.radius.as_ref(),
    ) {
        Ok(cmd) => cmd,
        Err(err) => return map_service_error(err),
    };
    match nearby_users(&state, &caller, cmd).await {
        Ok(users) => (
            StatusCode::OK,
            Json(DataResponse::with_message(
                "Nearby users retrieved successfully",
                users,
            )),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}
