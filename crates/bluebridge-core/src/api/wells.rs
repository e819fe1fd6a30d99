use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::Numeric;
use crate::{parse_lat_lon, GeoPoint, WaterQuality};

/// `wellLocation` arrives either as `"lat,lon"` or as an object.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum LocationInput {
    Point(GeoPoint),
    Text(String),
}

impl LocationInput {
    #[must_use]
    pub fn to_point(&self) -> Option<GeoPoint> {
        match self {
            Self::Point(point) => Some(*point),
            Self::Text(text) => parse_lat_lon(text),
        }
    }
}

/// `waterQuality` arrives either as a JSON-encoded string or as an object.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum QualityInput {
    Object(WaterQuality),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidQualityJson;

impl QualityInput {
    pub fn to_quality(&self) -> Result<WaterQuality, InvalidQualityJson> {
        match self {
            Self::Object(quality) => Ok(*quality),
            Self::Text(text) => serde_json::from_str(text).map_err(|_| InvalidQualityJson),
        }
    }
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WellFields {
    #[serde(default)]
    pub well_name: Option<String>,
    #[serde(default)]
    pub well_location: Option<LocationInput>,
    #[serde(default)]
    pub well_water_type: Option<String>,
    #[serde(default)]
    pub esp_id: Option<String>,
    #[serde(default)]
    pub well_status: Option<String>,
    #[serde(default)]
    pub well_owner: Option<String>,
    #[serde(default)]
    pub well_capacity: Option<Numeric>,
    #[serde(default)]
    pub well_water_level: Option<Numeric>,
    #[serde(default)]
    pub well_water_consumption: Option<Numeric>,
    #[serde(default)]
    pub water_quality: Option<QualityInput>,
    #[serde(default)]
    pub extra_data: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WaterLevelRequest {
    pub water_level: Option<Numeric>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WaterQualityRequest {
    pub water_quality: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListWellsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub email: Option<String>,
    pub well_name: Option<String>,
    pub well_status: Option<String>,
    pub well_water_type: Option<String>,
    pub well_owner: Option<String>,
    pub esp_id: Option<String>,
    pub min_water_level: Option<f64>,
    pub max_water_level: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius: Option<f64>,
}

/// Compact well representation shared by every wells endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WellSummary {
    pub id: i64,
    pub well_name: String,
    pub well_location: GeoPoint,
    pub well_water_type: String,
    pub esp_id: String,
    pub well_status: String,
    pub well_owner: String,
    pub well_capacity: String,
    pub well_water_level: String,
    pub well_water_consumption: String,
    pub water_quality: WaterQuality,
    pub last_refresh_time: i64,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NearbyWell {
    #[serde(flatten)]
    pub well: WellSummary,
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, Serialize, JsonSchema)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

impl Pagination {
    #[must_use]
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            total,
            page,
            limit,
            pages,
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct WellListResponse {
    pub status: &'static str,
    pub data: Vec<WellSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct WellMutationResponse {
    pub status: &'static str,
    pub message: String,
    pub well: WellSummary,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct WellsResponse<T> {
    pub status: &'static str,
    pub wells: Vec<T>,
}

/// Body returned with HTTP 200 when a single-well lookup misses.
#[derive(Debug, Serialize, JsonSchema)]
pub struct WellMissingResponse {
    pub status: &'static str,
    pub response: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_input_accepts_both_shapes() {
        let text: LocationInput = serde_json::from_str(r#""10.5,-3.25""#).expect("parse");
        assert_eq!(text.to_point(), Some(GeoPoint::new(10.5, -3.25)));

        let object: LocationInput =
            serde_json::from_str(r#"{"latitude": 1.0, "longitude": 2.0}"#).expect("parse");
        assert_eq!(object.to_point(), Some(GeoPoint::new(1.0, 2.0)));

        let bad: LocationInput = serde_json::from_str(r#""nowhere""#).expect("parse");
        assert_eq!(bad.to_point(), None);
    }

    #[test]
    fn quality_input_parses_json_strings() {
        let text: QualityInput =
            serde_json::from_str(r#""{\"ph\": 6.5, \"turbidity\": 1, \"tds\": 300}""#)
                .expect("parse");
        let quality = text.to_quality().expect("quality");
        assert_eq!(quality.ph, 6.5);
        assert_eq!(quality.tds, 300.0);

        let broken: QualityInput = serde_json::from_str(r#""{ph:""#).expect("parse");
        assert_eq!(broken.to_quality(), Err(InvalidQualityJson));
    }

    #[test]
    fn pagination_rounds_pages_up() {
        assert_eq!(Pagination::new(0, 1, 20).pages, 0);
        assert_eq!(Pagination::new(20, 1, 20).pages, 1);
        assert_eq!(Pagination::new(21, 2, 20).pages, 2);
    }

    #[test]
    fn nearby_well_flattens_summary() {
        let well = NearbyWell {
            well: WellSummary {
                id: 1,
                well_name: "North".to_string(),
                well_location: GeoPoint::new(1.0, 2.0),
                well_water_type: "Clean".to_string(),
                esp_id: "esp-1".to_string(),
                well_status: "Active".to_string(),
                well_owner: String::new(),
                well_capacity: "1000".to_string(),
                well_water_level: "500".to_string(),
                well_water_consumption: "0".to_string(),
                water_quality: WaterQuality::default(),
                last_refresh_time: 0,
            },
            distance: 1.25,
        };
        let value = serde_json::to_value(&well).expect("serialize");
        assert_eq!(value["espId"], "esp-1");
        assert_eq!(value["distance"], 1.25);
        assert_eq!(value["waterQuality"]["ph"], 7.0);
    }
}
