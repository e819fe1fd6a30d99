use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx_core::types::Json;
use uuid::Uuid;

use super::enums::{DeviceType, UserRole};
use crate::GeoPoint;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub username: Option<String>,
    pub role: UserRole,
    pub location: Option<Json<UserLocation>>,
    pub water_needs: Json<Vec<WaterNeed>>,
    pub notification_preferences: Json<NotificationPreferences>,
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

impl User {
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    #[must_use]
    pub fn point(&self) -> Option<GeoPoint> {
        self.location
            .as_ref()
            .map(|loc| GeoPoint::new(loc.latitude, loc.longitude))
    }

    /// Equality check on the stored bearer token. A user without a token never matches.
    #[must_use]
    pub fn token_matches(&self, candidate: &str) -> bool {
        self.login_token
            .as_deref()
            .is_some_and(|token| !candidate.is_empty() && token == candidate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl UserLocation {
    #[must_use]
    pub fn now(point: GeoPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
            last_updated: Some(Utc::now().to_rfc3339()),
        }
    }

    /// Placeholder returned to clients for users who never shared a location.
    #[must_use]
    pub fn never() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            last_updated: Some("never".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WaterNeed {
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub usage_type: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    #[serde(default = "enabled")]
    pub weather_alerts: bool,
    #[serde(default = "enabled")]
    pub well_updates: bool,
    #[serde(default = "enabled")]
    pub nearby_users: bool,
}

const fn enabled() -> bool {
    true
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            weather_alerts: true,
            well_updates: true,
            nearby_users: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WaterQuality {
    #[serde(default = "neutral_ph")]
    pub ph: f64,
    #[serde(default)]
    pub turbidity: f64,
    #[serde(default)]
    pub tds: f64,
}

const fn neutral_ph() -> f64 {
    7.0
}

impl Default for WaterQuality {
    fn default() -> Self {
        Self {
            ph: 7.0,
            turbidity: 0.0,
            tds: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceToken {
    pub token_id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub device_type: DeviceType,
    pub last_used: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Well {
    pub id: i64,
    pub esp_id: String,
    pub well_name: String,
    pub well_owner: Option<String>,
    pub owner_id: Option<Uuid>,
    pub well_location: Option<Json<GeoPoint>>,
    pub well_water_type: String,
    pub well_capacity: f64,
    pub well_water_level: f64,
    pub well_water_consumption: f64,
    pub water_quality: Option<Json<WaterQuality>>,
    pub extra_data: Json<serde_json::Value>,
    pub well_status: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Well {
    #[must_use]
    pub fn point(&self) -> Option<GeoPoint> {
        self.well_location.as_ref().map(|loc| loc.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugReport {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category: String,
    pub extra: Json<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

/// Aggregates over the wells table, before rounding.
#[derive(Debug, Clone, Default)]
pub struct WellAggregates {
    pub total_wells: i64,
    pub avg_capacity: Option<f64>,
    pub avg_water_level: Option<f64>,
    pub avg_consumption: Option<f64>,
    pub total_capacity: Option<f64>,
    pub total_water_level: Option<f64>,
    pub recently_updated: i64,
}
