use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::Numeric;

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct WeatherLocationInput {
    pub latitude: Option<Numeric>,
    pub longitude: Option<Numeric>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct WeatherRequest {
    pub location: Option<WeatherLocationInput>,
}

/// One calendar day folded from the provider's 3-hour forecast entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    pub date: String,
    pub time: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub humidity: f64,
    pub description: String,
    pub icon: String,
    pub wind_speed: f64,
    pub rain_amount: f64,
    pub pressure: f64,
    pub wind_direction: f64,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct WeatherResponse {
    pub status: &'static str,
    pub message: String,
    pub data: Vec<DailyForecast>,
}
