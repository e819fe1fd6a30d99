use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use bluebridge_core::{non_empty, Identity, TokenCredentials};

use crate::app::AppState;
use crate::domains::auth::core::identity::user_from_login_token;
use crate::domains::errors::{error_response, map_service_error};
use crate::infra::metrics;

/// Authenticates requests that carry `userId` and `loginToken` in their JSON body.
///
/// The body is buffered, inspected, and handed to the handler unchanged. On
/// success the caller's [`Identity`] and full `User` are placed in extensions.
pub async fn token_middleware(request: Request<Body>, next: Next) -> Response {
    let Some(state) = request.extensions().get::<AppState>().cloned() else {
        tracing::error!(event = "auth_state_missing", "AppState extension missing");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
    };

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, state.config.server.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(event = "auth_body_unreadable", error = %err);
            return error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
        }
    };
    let credentials: TokenCredentials = serde_json::from_slice(&bytes).unwrap_or_default();

    let (Some(user_id), Some(login_token)) = (
        non_empty(credentials.user_id.as_deref()),
        non_empty(credentials.login_token.as_deref()),
    ) else {
        metrics::auth_event("token", "missing");
        return error_response(StatusCode::UNAUTHORIZED, "User ID and token required");
    };

    let user = match user_from_login_token(&state, user_id, login_token).await {
        Ok(user) => user,
        Err(err) => {
            metrics::auth_event("token", "rejected");
            tracing::warn!(event = "auth_failed", reason = %err, "Login token rejected");
            return map_service_error(err);
        }
    };
    metrics::auth_event("token", "ok");

    tracing::Span::current().record("user_id", user.user_id.to_string());
    let mut request = Request::from_parts(parts, Body::from(bytes));
    request.extensions_mut().insert(Identity::from_user(&user));
    request.extensions_mut().insert(user);
    next.run(request).await
}
