use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::Numeric;
use crate::{NotificationPreferences, User, UserLocation, UserRole, WaterNeed};

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub location: Option<UserLocation>,
    #[serde(default)]
    pub water_needs: Option<Vec<WaterNeed>>,
    #[serde(default)]
    pub notification_preferences: Option<NotificationPreferences>,
    #[serde(default)]
    pub is_well_owner: Option<bool>,
    #[serde(default)]
    pub theme_preference: Option<i32>,
    #[serde(default)]
    pub device_token: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub login_token: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileLocationInput {
    pub latitude: Option<Numeric>,
    pub longitude: Option<Numeric>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub login_token: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub theme_preference: Option<i32>,
    #[serde(default)]
    pub location: Option<ProfileLocationInput>,
}

/// Fields shared by every body-authenticated request.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenCredentials {
    pub user_id: Option<String>,
    pub login_token: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationRequest {
    pub latitude: Option<Numeric>,
    pub longitude: Option<Numeric>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWaterNeedsRequest {
    pub water_needs: Option<Vec<WaterNeed>>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct PrivateLocationRequest {
    /// Must be the string `"true"` or `"false"`.
    pub message: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub username: Option<String>,
    pub role: UserRole,
    pub location: Option<UserLocation>,
    pub water_needs: Vec<WaterNeed>,
    pub notification_preferences: NotificationPreferences,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_token: Option<String>,
    pub phone_number: Option<String>,
    pub theme_preference: i32,
    pub last_active: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub registration_date: DateTime<Utc>,
    pub is_well_owner: bool,
    pub allow_location_sharing: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    /// Full view returned to the account owner, token included.
    #[must_use]
    pub fn with_token(user: &User) -> Self {
        let mut response = Self::public(user);
        response.login_token = user.login_token.clone();
        response
    }

    #[must_use]
    pub fn public(user: &User) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            role: user.role,
            location: user.location.as_ref().map(|loc| loc.0.clone()),
            water_needs: user.water_needs.0.clone(),
            notification_preferences: user.notification_preferences.0,
            login_token: None,
            phone_number: user.phone_number.clone(),
            theme_preference: user.theme_preference,
            last_active: user.last_active,
            is_active: user.is_active,
            registration_date: user.registration_date,
            is_well_owner: user.is_well_owner,
            allow_location_sharing: user.allow_location_sharing,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NearbyUsersRequest {
    pub latitude: Option<Numeric>,
    pub longitude: Option<Numeric>,
    #[serde(default)]
    pub radius: Option<Numeric>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NearbyUser {
    pub user_id: Uuid,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub water_needs: Vec<WaterNeed>,
    pub distance: f64,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct BugReportRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub extra: Option<serde_json::Value>,
}
