use std::collections::HashMap;
use std::time::{Duration, Instant};

use bluebridge_core::{coordinate_key, DailyForecast, GeoPoint};
use chrono::DateTime;
use moka::future::Cache;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::config::WeatherConfig;

const FORECAST_ENTRIES: u32 = 40;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WeatherError {
    #[error("Weather API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Weather service unavailable - please try again later")]
    Unavailable,
    #[error("Weather request failed: {0}")]
    Invalid(String),
    #[error("Weather service is not configured")]
    NotConfigured,
}

/// Where a forecast came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastSource {
    Cache,
    Api,
    /// Provider failed; an expired cache entry was served instead.
    Stale,
}

impl ForecastSource {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Api => "api",
            Self::Stale => "stale",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Forecast {
    pub days: Vec<DailyForecast>,
    pub source: ForecastSource,
}

#[derive(Clone)]
struct CachedForecast {
    days: Vec<DailyForecast>,
    fetched_at: Instant,
}

/// OpenWeather 5-day forecast client with a bounded per-coordinate cache.
///
/// Entries carry their fetch time instead of a cache TTL so an expired one can
/// still be served when the provider is down.
#[derive(Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    ttl: Duration,
    cache: Cache<String, CachedForecast>,
}

impl WeatherClient {
    #[must_use]
    pub fn new(config: &WeatherConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_else(|err| {
                warn!(event = "weather_http_client_failed", error = %err);
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config
                .api_key
                .clone()
                .filter(|value| !value.trim().is_empty()),
            ttl: Duration::from_secs(config.cache_ttl_seconds),
            cache: Cache::builder()
                .max_capacity(config.cache_max_entries)
                .build(),
        }
    }

    /// Fresh cache hit, else provider fetch, else an expired entry for the same key.
    pub async fn forecast(&self, point: GeoPoint) -> Result<Forecast, WeatherError> {
        let key = coordinate_key(&point);
        let cached = self.cache.get(&key).await;
        if let Some(entry) = &cached {
            if entry.fetched_at.elapsed() <= self.ttl {
                return Ok(Forecast {
                    days: entry.days.clone(),
                    source: ForecastSource::Cache,
                });
            }
        }

        match self.fetch(point).await {
            Ok(days) => {
                self.cache
                    .insert(
                        key,
                        CachedForecast {
                            days: days.clone(),
                            fetched_at: Instant::now(),
                        },
                    )
                    .await;
                Ok(Forecast {
                    days,
                    source: ForecastSource::Api,
                })
            }
            Err(err) => {
                warn!(event = "weather_fetch_failed", key = %key, error = %err);
                match cached {
                    Some(entry) => Ok(Forecast {
                        days: entry.days,
                        source: ForecastSource::Stale,
                    }),
                    None => Err(err),
                }
            }
        }
    }

    async fn fetch(&self, point: GeoPoint) -> Result<Vec<DailyForecast>, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::NotConfigured)?;
        let response = self
            .client
            .get(format!("{}/forecast", self.base_url))
            .query(&[
                ("lat", point.latitude.to_string()),
                ("lon", point.longitude.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
                ("cnt", FORECAST_ENTRIES.to_string()),
            ])
            .send()
            .await
            .map_err(|_| WeatherError::Unavailable)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ForecastBody = response
            .json()
            .await
            .map_err(|err| WeatherError::Invalid(err.to_string()))?;
        Ok(aggregate_daily(&body.list))
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastBody {
    #[serde(default)]
    pub(crate) list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastEntry {
    dt: i64,
    main: MainReadings,
    #[serde(default)]
    weather: Vec<Condition>,
    #[serde(default)]
    wind: Wind,
    #[serde(default)]
    rain: Option<Rain>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    feels_like: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
struct Wind {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct Rain {
    #[serde(rename = "3h", default)]
    three_hours: Option<f64>,
}

#[derive(Default)]
struct DayReadings {
    temps: Vec<f64>,
    feels_like: Vec<f64>,
    humidity: Vec<f64>,
    wind: Vec<f64>,
    pressure: Vec<f64>,
    rain: f64,
    descriptions: Vec<String>,
    icon: Option<String>,
}

/// Folds 3-hour entries into one record per UTC date, in first-seen date order.
pub(crate) fn aggregate_daily(entries: &[ForecastEntry]) -> Vec<DailyForecast> {
    let mut order: Vec<String> = Vec::new();
    let mut days: HashMap<String, DayReadings> = HashMap::new();

    for entry in entries {
        let Some(timestamp) = DateTime::from_timestamp(entry.dt, 0) else {
            continue;
        };
        let date = timestamp.format("%Y-%m-%d").to_string();
        let day = days.entry(date.clone()).or_insert_with(|| {
            order.push(date.clone());
            DayReadings::default()
        });
        day.temps.push(entry.main.temp);
        day.feels_like.push(entry.main.feels_like);
        day.humidity.push(entry.main.humidity);
        day.pressure.push(entry.main.pressure);
        day.wind.push(entry.wind.speed);
        day.rain += entry
            .rain
            .as_ref()
            .and_then(|rain| rain.three_hours)
            .unwrap_or(0.0);
        if let Some(condition) = entry.weather.first() {
            if !day.descriptions.contains(&condition.description) {
                day.descriptions.push(condition.description.clone());
            }
            if day.icon.is_none() {
                day.icon = Some(condition.icon.clone());
            }
        }
    }

    order
        .into_iter()
        .filter_map(|date| {
            let day = days.remove(&date)?;
            Some(DailyForecast {
                time: "12:00:00".to_string(),
                temperature: average(&day.temps),
                feels_like: average(&day.feels_like),
                min_temperature: day.temps.iter().copied().fold(f64::INFINITY, f64::min),
                max_temperature: day.temps.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                humidity: average(&day.humidity),
                description: day.descriptions.join(", "),
                icon: format!(
                    "https://openweathermap.org/img/wn/{}@2x.png",
                    day.icon.unwrap_or_default()
                ),
                wind_speed: average(&day.wind),
                rain_amount: day.rain,
                pressure: average(&day.pressure),
                wind_direction: 0.0,
                date,
            })
        })
        .collect()
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entry(dt: i64, temp: f64, description: &str, icon: &str, rain: Option<f64>) -> serde_json::Value {
        let mut value = json!({
            "dt": dt,
            "main": {"temp": temp, "feels_like": temp - 1.0, "humidity": 50, "pressure": 1010},
            "weather": [{"description": description, "icon": icon}],
            "wind": {"speed": 4.0}
        });
        if let Some(mm) = rain {
            value["rain"] = json!({"3h": mm});
        }
        value
    }

    fn sample_body() -> serde_json::Value {
        // 2024-06-01T00:00Z, 03:00Z, then 2024-06-02T00:00Z
        json!({"list": [
            entry(1_717_200_000, 20.0, "clear sky", "01d", None),
            entry(1_717_210_800, 30.0, "light rain", "10d", Some(2.5)),
            entry(1_717_286_400, 10.0, "clear sky", "01n", Some(1.0)),
        ]})
    }

    fn config(base_url: String) -> WeatherConfig {
        WeatherConfig {
            base_url,
            api_key: Some("key".to_string()),
            ..WeatherConfig::default()
        }
    }

    #[test]
    fn aggregates_per_utc_day() {
        let body: ForecastBody = serde_json::from_value(sample_body()).expect("parse");
        let days = aggregate_daily(&body.list);
        assert_eq!(days.len(), 2);

        let first = &days[0];
        assert_eq!(first.date, "2024-06-01");
        assert_eq!(first.time, "12:00:00");
        assert_eq!(first.temperature, 25.0);
        assert_eq!(first.feels_like, 24.0);
        assert_eq!(first.min_temperature, 20.0);
        assert_eq!(first.max_temperature, 30.0);
        assert_eq!(first.description, "clear sky, light rain");
        assert_eq!(first.icon, "https://openweathermap.org/img/wn/01d@2x.png");
        assert_eq!(first.rain_amount, 2.5);
        assert_eq!(first.wind_speed, 4.0);
        assert_eq!(first.pressure, 1010.0);
        assert_eq!(first.wind_direction, 0.0);

        assert_eq!(days[1].date, "2024-06-02");
        assert_eq!(days[1].rain_amount, 1.0);
    }

    #[test]
    fn empty_list_yields_no_days() {
        assert!(aggregate_daily(&[]).is_empty());
    }

    #[tokio::test]
    async fn fetches_then_serves_from_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("appid", "key"))
            .and(query_param("units", "metric"))
            .and(query_param("cnt", "40"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = WeatherClient::new(&config(server.uri()));
        let point = GeoPoint::new(48.8566, 2.3522);
        let first = client.forecast(point).await.expect("forecast");
        assert_eq!(first.source, ForecastSource::Api);
        assert_eq!(first.days.len(), 2);

        // Same two-decimal key.
        let second = client
            .forecast(GeoPoint::new(48.8571, 2.3519))
            .await
            .expect("forecast");
        assert_eq!(second.source, ForecastSource::Cache);
        assert_eq!(second.days, first.days);
    }

    #[tokio::test]
    async fn serves_stale_entry_when_provider_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"cod": 500, "message": "boom"})),
            )
            .mount(&server)
            .await;

        let mut weather_config = config(server.uri());
        weather_config.cache_ttl_seconds = 0;
        let client = WeatherClient::new(&weather_config);
        let point = GeoPoint::new(1.0, 2.0);
        client.forecast(point).await.expect("first fetch");
        tokio::time::sleep(Duration::from_millis(5)).await;

        let stale = client.forecast(point).await.expect("stale");
        assert_eq!(stale.source, ForecastSource::Stale);
        assert_eq!(stale.days.len(), 2);
    }

    #[tokio::test]
    async fn cache_stays_within_its_capacity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .mount(&server)
            .await;

        let mut weather_config = config(server.uri());
        weather_config.cache_ttl_seconds = 0;
        weather_config.cache_max_entries = 50;
        let client = WeatherClient::new(&weather_config);
        for step in 0..501 {
            let point = GeoPoint::new(f64::from(step) * 0.1 - 25.0, 10.0);
            client.forecast(point).await.expect("forecast");
        }
        client.cache.run_pending_tasks().await;
        assert!(
            client.cache.entry_count() <= 50,
            "{} entries cached",
            client.cache.entry_count()
        );
    }

    #[tokio::test]
    async fn provider_error_without_cache_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"cod": 401, "message": "Invalid API key"})),
            )
            .mount(&server)
            .await;

        let client = WeatherClient::new(&config(server.uri()));
        let err = client
            .forecast(GeoPoint::new(3.0, 4.0))
            .await
            .expect_err("error");
        assert_eq!(
            err.to_string(),
            "Weather API error: 401 - Invalid API key"
        );
    }

    #[tokio::test]
    async fn missing_api_key_is_not_configured() {
        let mut weather_config = config("http://127.0.0.1:9".to_string());
        weather_config.api_key = None;
        let client = WeatherClient::new(&weather_config);
        let err = client
            .forecast(GeoPoint::new(3.0, 4.0))
            .await
            .expect_err("error");
        assert_eq!(err, WeatherError::NotConfigured);
    }
}
