use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{middleware, Extension, Json, Router};
use bluebridge_core::{
    DataResponse, DeleteAccountRequest, LoginRequest, MessageResponse, PrivateLocationRequest,
    RegisterRequest, UpdateLocationRequest, UpdateProfileRequest, UpdateWaterNeedsRequest, User,
    UserResponse,
};

use crate::app::AppState;
use crate::domains::auth::core::{token_middleware, JsonBody};
use crate::domains::auth::service::{
    self, parse_coordinates, parse_sharing_flag, session_view, Credentials, DeleteAccountCommand,
    RegisterCommand, UpdateProfileCommand,
};
use crate::domains::errors::map_service_error;

/// Account routes mounted under `/api/auth` and `/api/users`.
pub fn router() -> Router<AppState> {
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/delete-account", post(delete_account))
        .route("/update-profile", post(update_profile));

    let protected = Router::new()
        .route("/update-location", post(update_location))
        .route("/update-water-needs", post(update_water_needs))
        .route("/private-location", post(private_location))
        .route_layer(middleware::from_fn(token_middleware));

    public.merge(protected)
}

/// Paths older mobile builds call directly under `/api`.
pub fn legacy_router() -> Router<AppState> {
    let protected = Router::new()
        .route("/update-location", post(update_location))
        .route("/update-water-needs", post(update_water_needs))
        .route_layer(middleware::from_fn(token_middleware));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
}

#[tracing::instrument(skip(state, payload))]
async fn register(State(state): State<AppState>, JsonBody(payload): JsonBody<RegisterRequest>) -> Response {
    let cmd = match RegisterCommand::try_from(payload) {
        Ok(cmd) => cmd,
        Err(err) => return map_service_error(err),
    };
    match service::register(&state, cmd).await {
        Ok(user) => (
            StatusCode::CREATED,
            Json(DataResponse::with_message(
                "Registration successful",
                UserResponse::with_token(&user),
            )),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}

#[tracing::instrument(skip(state, payload))]
async fn login(State(state): State<AppState>, JsonBody(payload): JsonBody<LoginRequest>) -> Response {
    let credentials = match Credentials::try_from(payload) {
        Ok(credentials) => credentials,
        Err(err) => return map_service_error(err),
    };
    match service::login(&state, credentials).await {
        Ok(user) => (
            StatusCode::OK,
            Json(DataResponse::with_message("Login successful", session_view(&user))),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}

#[tracing::instrument(skip(state, payload))]
async fn delete_account(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<DeleteAccountRequest>,
) -> Response {
    let cmd = match DeleteAccountCommand::try_from(payload) {
        Ok(cmd) => cmd,
        Err(err) => return map_service_error(err),
    };
    match service::delete_account(&state, cmd).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::success("Account permanently deleted")),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}

#[tracing::instrument(skip(state, payload))]
async fn update_profile(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<UpdateProfileRequest>,
) -> Response {
    let cmd = match UpdateProfileCommand::try_from(payload) {
        Ok(cmd) => cmd,
        Err(err) => return map_service_error(err),
    };
    match service::update_profile(&state, cmd).await {
        Ok(user) => (
            StatusCode::OK,
            Json(DataResponse::with_message(
                "Profile updated successfully",
                UserResponse::public(&user),
            )),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}

#[tracing::instrument(skip(state, caller, payload))]
async fn update_location(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    JsonBody(payload): JsonBody<UpdateLocationRequest>,
) -> Response {
    let point = match parse_coordinates(payload.latitude.as_ref(), payload.longitude.as_ref()) {
        Ok(point) => point,
        Err(err) => return map_service_error(err),
    };
    match service::update_location(&state, &caller, point).await {
        Ok(location) => (
            StatusCode::OK,
            Json(DataResponse::with_message("Location updated successfully", location)),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}

#[tracing::instrument(skip(state, caller, payload))]
async fn update_water_needs(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    JsonBody(payload): JsonBody<UpdateWaterNeedsRequest>,
) -> Response {
    match service::update_water_needs(&state, &caller, payload.water_needs).await {
        Ok(water_needs) => (
            StatusCode::OK,
            Json(DataResponse::with_message(
                "Water needs updated successfully",
                water_needs,
            )),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}

#[tracing::instrument(skip(state, caller, payload))]
async fn private_location(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    JsonBody(payload): JsonBody<PrivateLocationRequest>,
) -> Response {
    let allow = match parse_sharing_flag(payload.message.as_ref()) {
        Ok(allow) => allow,
        Err(err) => return map_service_error(err),
    };
    match service::set_location_sharing(&state, &caller, allow).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::success(format!(
                "Location sharing preference updated to {allow}."
            ))),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}
