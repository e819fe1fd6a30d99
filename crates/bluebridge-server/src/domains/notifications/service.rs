use std::collections::BTreeMap;

use bluebridge_core::{non_empty, normalize_email, DeviceType, SendNotificationResult, User};
use bluebridge_db::repo::{DeviceTokenRepo, UserRepo};
use serde_json::Value;

use crate::app::AppState;
use crate::domains::auth::core::identity::user_from_email_token;
use crate::domains::errors::ServiceError;
use crate::infra::metrics;
use crate::infra::push::{data_map, MulticastOutcome};

pub struct DeviceTokenCommand {
    pub email: String,
    pub token: String,
    pub device_type: DeviceType,
}

/// Who a broadcast goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetUsers {
    /// `targetEmails` was absent, null or `[]`.
    All,
    /// May be empty when every listed entry was unusable; that matches nobody.
    Emails(Vec<String>),
}

pub struct SendNotificationCommand {
    pub title: String,
    pub message: String,
    pub targets: TargetUsers,
    pub data: BTreeMap<String, String>,
}

pub struct SendToTokenCommand {
    pub email: String,
    pub login_token: String,
    pub device_token: String,
    pub title: String,
    pub message: String,
    pub data: BTreeMap<String, String>,
}

pub struct NotificationStatus {
    pub registered_tokens: usize,
    pub notifications_enabled: bool,
}

fn db_error(event: &'static str, err: &sqlx_core::Error) -> ServiceError {
    tracing::error!(event, error = %err, "DB error");
    ServiceError::DbError
}

/// Accepts a missing value or an array. Non-string and blank entries are
/// skipped, but only a literally empty array means every user.
pub fn parse_target_emails(value: Option<&Value>) -> Result<TargetUsers, ServiceError> {
    match value {
        None | Some(Value::Null) => Ok(TargetUsers::All),
        Some(Value::Array(items)) if items.is_empty() => Ok(TargetUsers::All),
        Some(Value::Array(items)) => Ok(TargetUsers::Emails(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(normalize_email)
                .filter(|email| !email.is_empty())
                .collect(),
        )),
        Some(_) => Err(ServiceError::BadRequest("targetEmails must be an array")),
    }
}

impl SendNotificationCommand {
    pub fn parse(
        title: Option<&str>,
        message: Option<&str>,
        target_emails: Option<&Value>,
        data: Option<&Value>,
    ) -> Result<Self, ServiceError> {
        let (Some(title), Some(message)) = (non_empty(title), non_empty(message)) else {
            return Err(ServiceError::BadRequest(
                "Title and message are required fields",
            ));
        };
        Ok(Self {
            title: title.to_string(),
            message: message.to_string(),
            targets: parse_target_emails(target_emails)?,
            data: data_map(data),
        })
    }
}

async fn user_by_email(state: &AppState, email: &str) -> Result<User, ServiceError> {
    UserRepo::new(&state.db)
        .get_by_email(&normalize_email(email))
        .await
        .map_err(|err| db_error("notifications_user_lookup_failed", &err))?
        .ok_or(ServiceError::NotFound("User not found"))
}

pub async fn register_token(state: &AppState, cmd: DeviceTokenCommand) -> Result<(), ServiceError> {
    let user = user_by_email(state, &cmd.email).await?;
    let stored = DeviceTokenRepo::new(&state.db)
        .upsert(user.user_id, &cmd.token, cmd.device_type)
        .await
        .map_err(|err| db_error("device_token_register_failed", &err))?;
    tracing::info!(
        event = "device_token_registered",
        user_id = %user.user_id,
        token_id = %stored.token_id,
        device_type = stored.device_type.as_str()
    );
    Ok(())
}

pub async fn unregister_token(
    state: &AppState,
    cmd: DeviceTokenCommand,
) -> Result<(), ServiceError> {
    let user = user_by_email(state, &cmd.email).await?;
    let removed = DeviceTokenRepo::new(&state.db)
        .delete(user.user_id, &cmd.token)
        .await
        .map_err(|err| db_error("device_token_unregister_failed", &err))?;
    tracing::info!(
        event = "device_token_unregistered",
        user_id = %user.user_id,
        removed
    );
    Ok(())
}

/// Sends to every token and records the outcome. A single token skips the
/// multicast path.
pub async fn deliver(
    state: &AppState,
    tokens: &[String],
    title: &str,
    body: &str,
    data: &BTreeMap<String, String>,
) -> MulticastOutcome {
    let outcome = match tokens {
        [] => MulticastOutcome::default(),
        [token] => match state.push.send(token, title, body, data).await {
            Ok(_) => MulticastOutcome {
                success_count: 1,
                failure_count: 0,
            },
            Err(err) => {
                tracing::warn!(event = "push_send_failed", error = %err);
                MulticastOutcome {
                    success_count: 0,
                    failure_count: 1,
                }
            }
        },
        _ => state.push.send_multicast(tokens, title, body, data).await,
    };
    metrics::push_messages("success", outcome.success_count);
    metrics::push_messages("failure", outcome.failure_count);

    if outcome.success_count > 0 {
        if let Err(err) = DeviceTokenRepo::new(&state.db).touch(tokens).await {
            tracing::warn!(event = "device_token_touch_failed", error = %err);
        }
    }
    outcome
}

pub async fn send_notification(
    state: &AppState,
    cmd: SendNotificationCommand,
) -> Result<SendNotificationResult, ServiceError> {
    let users = UserRepo::new(&state.db);
    let targets = match &cmd.targets {
        TargetUsers::All => users.list_all().await,
        TargetUsers::Emails(emails) if emails.is_empty() => Ok(Vec::new()),
        TargetUsers::Emails(emails) => users.list_by_emails(emails).await,
    }
    .map_err(|err| db_error("notifications_targets_failed", &err))?;
    if targets.is_empty() {
        return Err(ServiceError::NotFound("No matching users found"));
    }

    let user_ids: Vec<_> = targets.iter().map(|user| user.user_id).collect();
    let tokens: Vec<String> = DeviceTokenRepo::new(&state.db)
        .list_active_by_users(&user_ids)
        .await
        .map_err(|err| db_error("notifications_tokens_failed", &err))?
        .into_iter()
        .map(|device| device.token)
        .collect();
    if tokens.is_empty() {
        return Err(ServiceError::NotFound(
            "No active device tokens found for these users",
        ));
    }

    let outcome = deliver(state, &tokens, &cmd.title, &cmd.message, &cmd.data).await;
    tracing::info!(
        event = "notifications_sent",
        users = targets.len(),
        devices = tokens.len(),
        success = outcome.success_count,
        failure = outcome.failure_count
    );
    Ok(SendNotificationResult {
        users_targeted: targets.len(),
        devices_targeted: tokens.len(),
        success_count: outcome.success_count,
        failure_count: outcome.failure_count,
    })
}

pub async fn notification_status(
    state: &AppState,
    email: &str,
    login_token: &str,
) -> Result<NotificationStatus, ServiceError> {
    let user = user_from_email_token(state, email, login_token).await?;
    let tokens = DeviceTokenRepo::new(&state.db)
        .list_by_user(user.user_id)
        .await
        .map_err(|err| db_error("notifications_status_failed", &err))?;
    let active = tokens.iter().filter(|token| token.is_active).count();
    Ok(NotificationStatus {
        registered_tokens: active,
        notifications_enabled: active > 0,
    })
}

/// Returns the provider message id.
pub async fn send_to_token(state: &AppState, cmd: SendToTokenCommand) -> Result<String, ServiceError> {
    let user = user_from_email_token(state, &cmd.email, &cmd.login_token).await?;
    match state
        .push
        .send(&cmd.device_token, &cmd.title, &cmd.message, &cmd.data)
        .await
    {
        Ok(message_id) => {
            metrics::push_messages("success", 1);
            tracing::info!(
                event = "push_sent_to_token",
                user_id = %user.user_id,
                message_id = %message_id
            );
            Ok(message_id)
        }
        Err(err) => {
            metrics::push_messages("failure", 1);
            tracing::warn!(event = "push_send_failed", user_id = %user.user_id, error = %err);
            Err(ServiceError::Upstream(format!(
                "Failed to send notification: {err}"
            )))
        }
    }
}
