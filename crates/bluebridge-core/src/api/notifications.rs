use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::DeviceType;

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTokenRequest {
    pub email: Option<String>,
    pub token: Option<String>,
    #[serde(default)]
    pub device_type: Option<DeviceType>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    pub title: Option<String>,
    pub message: Option<String>,
    /// Must be an array when present. Empty targets every user.
    #[serde(default)]
    pub target_emails: Option<Value>,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct NotificationStatusQuery {
    pub email: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendToTokenRequest {
    pub email: Option<String>,
    pub token: Option<String>,
    pub device_token: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationResult {
    pub users_targeted: usize,
    pub devices_targeted: usize,
    pub success_count: usize,
    pub failure_count: usize,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStatusResponse {
    pub status: &'static str,
    pub registered_tokens: usize,
    pub notifications_enabled: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendToTokenResponse {
    pub status: &'static str,
    pub message: String,
    pub message_id: String,
}
