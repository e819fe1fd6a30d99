use super::*;
use sqlx_core::types::Json;
use uuid::Uuid;

#[test]
fn enum_roundtrips() {
    assert_eq!(
        UserRole::try_from(1).expect("valid user role"),
        UserRole::User
    );
    assert_eq!(UserRole::WellOwner.as_i32(), 3);
    assert_eq!(
        "well_owner".parse::<UserRole>().expect("parse role"),
        UserRole::WellOwner
    );
    assert_eq!(UserRole::Admin.as_str(), "admin");

    assert_eq!(
        DeviceType::try_from(2).expect("valid device type"),
        DeviceType::Ios
    );
    assert_eq!(DeviceType::Web.as_i32(), 3);
    assert_eq!(
        "android".parse::<DeviceType>().expect("parse device type"),
        DeviceType::Android
    );
}

#[test]
fn enum_parse_invalid() {
    assert!(UserRole::try_from(99).is_err());
    assert!("root".parse::<UserRole>().is_err());
    assert!(DeviceType::try_from(0).is_err());
    assert!("blackberry".parse::<DeviceType>().is_err());
}

#[test]
fn enums_serialize_as_snake_case() {
    assert_eq!(
        serde_json::to_value(UserRole::WellOwner).expect("serialize"),
        serde_json::json!("well_owner")
    );
    assert_eq!(
        serde_json::to_value(DeviceType::Ios).expect("serialize"),
        serde_json::json!("ios")
    );
}

#[test]
fn notification_preferences_default_to_enabled() {
    let prefs: NotificationPreferences =
        serde_json::from_value(serde_json::json!({ "wellUpdates": false })).expect("parse");
    assert!(prefs.weather_alerts);
    assert!(!prefs.well_updates);
    assert!(prefs.nearby_users);
    assert!(NotificationPreferences::default().weather_alerts);
}

#[test]
fn water_quality_fills_missing_fields() {
    let quality: WaterQuality =
        serde_json::from_value(serde_json::json!({ "tds": 120 })).expect("parse");
    assert_eq!(quality.ph, 7.0);
    assert_eq!(quality.turbidity, 0.0);
    assert_eq!(quality.tds, 120.0);
}

#[test]
fn water_need_uses_camel_case() {
    let need: WaterNeed = serde_json::from_value(serde_json::json!({
        "amount": 12.5,
        "usageType": "drinking",
        "priority": 1,
        "description": "family"
    }))
    .expect("parse");
    assert_eq!(need.usage_type, "drinking");
    assert_eq!(need.priority, 1);
}

fn sample_user(token: Option<&str>) -> User {
    let now = chrono::Utc::now();
    User {
        user_id: Uuid::new_v4(),
        email: "ana@example.com".to_string(),
        password_hash: "hash".to_string(),
        first_name: "Ana".to_string(),
        last_name: "Diallo".to_string(),
        username: None,
        role: UserRole::User,
        location: Some(Json(UserLocation {
            latitude: 12.0,
            longitude: -1.5,
            last_updated: None,
        })),
        water_needs: Json(Vec::new()),
        notification_preferences: Json(NotificationPreferences::default()),
        login_token: token.map(str::to_string),
        phone_number: None,
        theme_preference: 0,
        last_active: None,
        is_active: true,
        registration_date: now,
        is_well_owner: false,
        allow_location_sharing: true,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn token_match_requires_stored_token() {
    let user = sample_user(Some("abc"));
    assert!(user.token_matches("abc"));
    assert!(!user.token_matches("abd"));
    assert!(!user.token_matches(""));

    let tokenless = sample_user(None);
    assert!(!tokenless.token_matches("abc"));
}

#[test]
fn user_point_and_display_name() {
    let user = sample_user(None);
    assert_eq!(user.point(), Some(crate::GeoPoint::new(12.0, -1.5)));
    assert_eq!(user.display_name(), "Ana Diallo");
}
