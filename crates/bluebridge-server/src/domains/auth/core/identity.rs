use bluebridge_core::{normalize_email, User};
use bluebridge_db::repo::UserRepo;
use uuid::Uuid;

use crate::app::AppState;
use crate::domains::errors::ServiceError;

/// Resolves the `userId` + `loginToken` pair carried in request bodies.
/// A malformed id is treated like an unknown user.
pub async fn user_from_login_token(
    state: &AppState,
    user_id: &str,
    login_token: &str,
) -> Result<User, ServiceError> {
    let Ok(user_id) = Uuid::parse_str(user_id.trim()) else {
        return Err(ServiceError::Unauthorized("Invalid token"));
    };
    let user = UserRepo::new(&state.db)
        .get_by_id(user_id)
        .await
        .map_err(|err| {
            tracing::error!(event = "auth_user_lookup_failed", error = %err, "Failed to load user");
            ServiceError::DbError
        })?;
    match user {
        Some(user) if user.token_matches(login_token) => Ok(user),
        _ => Err(ServiceError::Unauthorized("Invalid token")),
    }
}

/// Resolves the email + token pair used by the profile and notification endpoints.
pub async fn user_from_email_token(
    state: &AppState,
    email: &str,
    login_token: &str,
) -> Result<User, ServiceError> {
    let email = normalize_email(email);
    UserRepo::new(&state.db)
        .get_by_email_and_token(&email, login_token.trim())
        .await
        .map_err(|err| {
            tracing::error!(event = "auth_user_lookup_failed", error = %err, "Failed to load user");
            ServiceError::DbError
        })?
        .ok_or(ServiceError::Unauthorized("Invalid credentials"))
}
