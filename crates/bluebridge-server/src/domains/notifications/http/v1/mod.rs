use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bluebridge_core::{
    non_empty, DataResponse, DeviceTokenRequest, MessageResponse, NotificationStatusQuery,
    NotificationStatusResponse, SendNotificationRequest, SendToTokenRequest, SendToTokenResponse,
    STATUS_SUCCESS,
};

use crate::app::AppState;
use crate::domains::auth::core::JsonBody;
use crate::domains::errors::{error_response, map_service_error, ServiceError};
use crate::domains::notifications::service::{
    notification_status, register_token, send_notification, send_to_token, unregister_token,
    DeviceTokenCommand, SendNotificationCommand, SendToTokenCommand,
};
use crate::infra::push::data_map;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/unregister", post(unregister))
        .route("/send", post(send))
        .route("/status", get(status))
        .route("/send-to-token", post(send_direct))
}

fn device_command(payload: DeviceTokenRequest) -> Result<DeviceTokenCommand, ServiceError> {
    let (Some(email), Some(token)) = (
        non_empty(payload.email.as_deref()),
        non_empty(payload.token.as_deref()),
    ) else {
        return Err(ServiceError::BadRequest("Email and token are required"));
    };
    Ok(DeviceTokenCommand {
        email: email.to_string(),
        token: token.to_string(),
        device_type: payload.device_type.unwrap_or_default(),
    })
}

#[tracing::instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<DeviceTokenRequest>,
) -> Response {
    let result = match device_command(payload) {
        Ok(cmd) => register_token(&state, cmd).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::success("Token registered successfully")),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}

#[tracing::instrument(skip(state, payload))]
async fn unregister(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<DeviceTokenRequest>,
) -> Response {
    let result = match device_command(payload) {
        Ok(cmd) => unregister_token(&state, cmd).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::success("Token unregistered successfully")),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}

#[tracing::instrument(skip(state, payload))]
async fn send(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<SendNotificationRequest>,
) -> Response {
    let cmd = match SendNotificationCommand::parse(
        payload.title.as_deref(),
        payload.message.as_deref(),
        payload.target_emails.as_ref(),
        payload.data.as_ref(),
    ) {
        Ok(cmd) => cmd,
        Err(err) => return map_service_error(err),
    };
    match send_notification(&state, cmd).await {
        Ok(result) => (
            StatusCode::OK,
            Json(DataResponse::with_message("Notifications processed", result)),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}

#[tracing::instrument(skip(state, query))]
async fn status(
    State(state): State<AppState>,
    query: Result<Query<NotificationStatusQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(query)) = query else {
        return error_response(StatusCode::BAD_REQUEST, "Email and token are required");
    };
    let (Some(email), Some(token)) = (
        non_empty(query.email.as_deref()),
        non_empty(query.token.as_deref()),
    ) else {
        return error_response(StatusCode::BAD_REQUEST, "Email and token are required");
    };
    match notification_status(&state, email, token).await {
        Ok(status) => (
            StatusCode::OK,
            Json(NotificationStatusResponse {
                status: STATUS_SUCCESS,
                registered_tokens: status.registered_tokens,
                notifications_enabled: status.notifications_enabled,
            }),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}

#[tracing::instrument(skip(state, payload))]
async fn send_direct(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<SendToTokenRequest>,
) -> Response {
    let (Some(email), Some(token), Some(device_token), Some(title), Some(message)) = (
        non_empty(payload.email.as_deref()),
        non_empty(payload.token.as_deref()),
        non_empty(payload.device_token.as_deref()),
        non_empty(payload.title.as_deref()),
        non_empty(payload.message.as_deref()),
    ) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing required fields");
    };
    let cmd = SendToTokenCommand {
        email: email.to_string(),
        login_token: token.to_string(),
        device_token: device_token.to_string(),
        title: title.to_string(),
        message: message.to_string(),
        data: data_map(payload.data.as_ref()),
    };
    match send_to_token(&state, cmd).await {
        Ok(message_id) => (
            StatusCode::OK,
            Json(SendToTokenResponse {
                status: STATUS_SUCCESS,
                message: "Notification sent successfully".to_string(),
                message_id,
            }),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}
