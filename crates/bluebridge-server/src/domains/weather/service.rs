use std::collections::BTreeMap;

use bluebridge_core::{DailyForecast, GeoPoint, Numeric, User, WeatherLocationInput};
use bluebridge_db::repo::{DeviceTokenRepo, UserRepo};
use uuid::Uuid;

use crate::app::AppState;
use crate::domains::errors::ServiceError;
use crate::domains::notifications::service::deliver;
use crate::infra::metrics;
use crate::infra::weather::ForecastSource;

const RAIN_THRESHOLD_MM: f64 = 5.0;
const HEAT_THRESHOLD_C: f64 = 35.0;
const WIND_THRESHOLD: f64 = 30.0;
pub const ALERT_TITLE: &str = "Weather Alert";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Rain,
    Heat,
    Wind,
}

impl AlertKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rain => "rain",
            Self::Heat => "heat",
            Self::Wind => "wind",
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Rain => "Rain expected in the next few days. Plan accordingly.",
            Self::Heat => "High temperatures expected. Stay hydrated and take precautions.",
            Self::Wind => "Strong winds expected. Secure outdoor items.",
        }
    }
}

pub struct WeatherReport {
    pub message: &'static str,
    pub days: Vec<DailyForecast>,
}

/// At most one alert per kind, in rain, heat, wind order.
#[must_use]
pub fn evaluate_alerts(days: &[DailyForecast]) -> Vec<AlertKind> {
    let mut alerts = Vec::new();
    if days.iter().any(|day| day.rain_amount > RAIN_THRESHOLD_MM) {
        alerts.push(AlertKind::Rain);
    }
    if days.iter().any(|day| day.temperature > HEAT_THRESHOLD_C) {
        alerts.push(AlertKind::Heat);
    }
    if days.iter().any(|day| day.wind_speed > WIND_THRESHOLD) {
        alerts.push(AlertKind::Wind);
    }
    alerts
}

/// Users that opted into weather alerts and are located within the radius.
#[must_use]
pub fn alert_recipients(users: &[User], center: GeoPoint, radius_km: f64) -> Vec<Uuid> {
    users
        .iter()
        .filter(|user| user.notification_preferences.weather_alerts)
        .filter(|user| {
            user.point()
                .is_some_and(|point| center.distance_km(&point) <= radius_km)
        })
        .map(|user| user.user_id)
        .collect()
}

pub fn parse_location(location: Option<&WeatherLocationInput>) -> Result<GeoPoint, ServiceError> {
    let Some(location) = location else {
        return Err(ServiceError::BadRequest(
            "Location, userId, and loginToken are required",
        ));
    };
    match (
        location.latitude.as_ref().and_then(Numeric::as_f64),
        location.longitude.as_ref().and_then(Numeric::as_f64),
    ) {
        (Some(latitude), Some(longitude)) => Ok(GeoPoint::new(latitude, longitude)),
        _ => Err(ServiceError::BadRequest(
            "Location must include numeric latitude and longitude",
        )),
    }
}

pub async fn forecast(state: &AppState, point: GeoPoint) -> Result<WeatherReport, ServiceError> {
    if !state.config.weather.enabled {
        return Err(ServiceError::Upstream(
            "Weather service is not configured".to_string(),
        ));
    }
    let forecast = state.weather.forecast(point).await.map_err(|err| {
        tracing::warn!(event = "weather_failed", error = %err);
        ServiceError::Upstream(err.to_string())
    })?;
    metrics::weather_request(forecast.source.label());
    tracing::info!(
        event = "weather_forecast",
        source = forecast.source.label(),
        days = forecast.days.len()
    );

    if forecast.source == ForecastSource::Api && state.config.weather.alerts_enabled {
        let state = state.clone();
        let days = forecast.days.clone();
        tokio::spawn(async move {
            send_weather_alerts(&state, point, &days).await;
        });
    }

    let message = match forecast.source {
        ForecastSource::Stale => "Using slightly outdated data",
        ForecastSource::Cache | ForecastSource::Api => "Weather data retrieved successfully",
    };
    Ok(WeatherReport {
        message,
        days: forecast.days,
    })
}

/// Pushes each triggered alert to nearby subscribers. Errors are logged only.
pub async fn send_weather_alerts(state: &AppState, center: GeoPoint, days: &[DailyForecast]) {
    let alerts = evaluate_alerts(days);
    if alerts.is_empty() {
        return;
    }

    let users = match UserRepo::new(&state.db).list_with_location().await {
        Ok(users) => users,
        Err(err) => {
            tracing::error!(event = "weather_alerts_failed", stage = "users", error = %err);
            return;
        }
    };
    let recipients = alert_recipients(&users, center, state.config.weather.alert_radius_km);
    if recipients.is_empty() {
        return;
    }
    let tokens: Vec<String> = match DeviceTokenRepo::new(&state.db)
        .list_active_by_users(&recipients)
        .await
    {
        Ok(tokens) => tokens.into_iter().map(|device| device.token).collect(),
        Err(err) => {
            tracing::error!(event = "weather_alerts_failed", stage = "tokens", error = %err);
            return;
        }
    };
    if tokens.is_empty() {
        return;
    }

    for alert in alerts {
        let mut data = BTreeMap::new();
        data.insert("type".to_string(), "weather_alert".to_string());
        data.insert("alertType".to_string(), alert.as_str().to_string());
        let outcome = deliver(state, &tokens, ALERT_TITLE, alert.message(), &data).await;
        tracing::info!(
            event = "weather_alert_sent",
            alert = alert.as_str(),
            recipients = recipients.len(),
            success = outcome.success_count,
            failure = outcome.failure_count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bluebridge_core::{NotificationPreferences, UserLocation, UserRole};
    use chrono::Utc;
    use sqlx_core::types::Json;

    fn day(temperature: f64, wind_speed: f64, rain_amount: f64) -> DailyForecast {
        DailyForecast {
            date: "2025-06-01".to_string(),
            time: "12:00:00".to_string(),
            temperature,
            feels_like: temperature,
            min_temperature: temperature,
            max_temperature: temperature,
            humidity: 40.0,
            description: "clear sky".to_string(),
            icon: "https://openweathermap.org/img/wn/01d@2x.png".to_string(),
            wind_speed,
            rain_amount,
            pressure: 1012.0,
            wind_direction: 0.0,
        }
    }

    fn user(location: Option<(f64, f64)>, weather_alerts: bool) -> User {
        let now = Utc::now();
        User {
            user_id: Uuid::new_v4(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: String::new(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            username: None,
            role: UserRole::User,
            location: location
                .map(|(lat, lon)| Json(UserLocation::now(GeoPoint::new(lat, lon)))),
            water_needs: Json(Vec::new()),
            notification_preferences: Json(NotificationPreferences {
                weather_alerts,
                ..NotificationPreferences::default()
            }),
            login_token: None,
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
    fn calm_forecast_has_no_alerts() {
        assert!(evaluate_alerts(&[day(20.0, 5.0, 0.0), day(35.0, 30.0, 5.0)]).is_empty());
        assert!(evaluate_alerts(&[]).is_empty());
    }

    #[test]
    fn each_threshold_raises_one_alert() {
        let alerts = evaluate_alerts(&[
            day(36.0, 5.0, 0.0),
            day(20.0, 31.0, 5.1),
            day(38.0, 40.0, 12.0),
        ]);
        assert_eq!(alerts, vec![AlertKind::Rain, AlertKind::Heat, AlertKind::Wind]);
        assert_eq!(alerts[1].as_str(), "heat");
        assert!(alerts[2].message().starts_with("Strong winds"));
    }

    #[test]
    fn recipients_need_opt_in_and_proximity() {
        let center = GeoPoint::new(48.8566, 2.3522);
        let near = user(Some((48.9, 2.4)), true);
        let opted_out = user(Some((48.86, 2.35)), false);
        let far = user(Some((49.5, 2.35)), true);
        let unknown = user(None, true);
        let users = vec![near.clone(), opted_out, far, unknown];
        assert_eq!(alert_recipients(&users, center, 30.0), vec![near.user_id]);
    }

    #[test]
    fn location_must_be_numeric() {
        let location = WeatherLocationInput {
            latitude: Some(Numeric::Text("12.5".to_string())),
            longitude: Some(Numeric::Number(-3.0)),
        };
        assert_eq!(
            parse_location(Some(&location)).expect("point"),
            GeoPoint::new(12.5, -3.0)
        );

        let broken = WeatherLocationInput {
            latitude: Some(Numeric::Text("north".to_string())),
            longitude: Some(Numeric::Number(-3.0)),
        };
        assert!(parse_location(Some(&broken)).is_err());
        let err = parse_location(None).expect_err("missing");
        assert_eq!(err.message(), "Location, userId, and loginToken are required");
    }
}
