use bluebridge_core::constants::wells::{
    DEFAULT_PAGE_SIZE, DEFAULT_WATER_TYPE, MAX_PAGE_SIZE, STATUS_ON_CREATE, STATUS_UNKNOWN,
};
use bluebridge_core::{
    non_empty, round2, GeoPoint, ListWellsQuery, NearbyWell, Numeric, Pagination, User,
    WaterQuality, Well, WellFields, WellSummary, DEFAULT_NEARBY_RADIUS_KM,
};
use bluebridge_db::repo::{WellFilter, WellRepo};
use chrono::Utc;
use serde_json::Value;
use sqlx_core::types::Json;

use crate::app::AppState;
use crate::domains::errors::ServiceError;

pub const MSG_WELL_NOT_FOUND: &str = "Well not found";

pub struct ListWellsCommand {
    pub filter: WellFilter,
    pub page: i64,
    pub limit: i64,
    pub near: Option<(GeoPoint, f64)>,
}

impl From<ListWellsQuery> for ListWellsCommand {
    fn from(query: ListWellsQuery) -> Self {
        let owner = non_empty(query.well_owner.as_deref())
            .or(non_empty(query.email.as_deref()))
            .map(str::to_string);
        let near = match (query.latitude, query.longitude) {
            (Some(latitude), Some(longitude)) => Some((
                GeoPoint::new(latitude, longitude),
                query.radius.unwrap_or(DEFAULT_NEARBY_RADIUS_KM),
            )),
            _ => None,
        };
        Self {
            filter: WellFilter {
                owner,
                name_contains: non_empty(query.well_name.as_deref()).map(str::to_string),
                status: non_empty(query.well_status.as_deref()).map(str::to_string),
                water_type: non_empty(query.well_water_type.as_deref()).map(str::to_string),
                esp_id: non_empty(query.esp_id.as_deref()).map(str::to_string),
                min_water_level: query.min_water_level,
                max_water_level: query.max_water_level,
            },
            page: query.page.unwrap_or(1).max(1),
            limit: query
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            near,
        }
    }
}

pub struct WellPage {
    pub wells: Vec<WellSummary>,
    pub pagination: Pagination,
}

/// Compact view of a well. Missing values fall back to the client defaults.
#[must_use]
pub fn summarize(well: &Well) -> WellSummary {
    let well_status = if well.well_status.trim().is_empty() {
        STATUS_UNKNOWN.to_string()
    } else {
        well.well_status.clone()
    };
    WellSummary {
        id: well.id,
        well_name: well.well_name.clone(),
        well_location: well.point().unwrap_or(GeoPoint::new(0.0, 0.0)),
        well_water_type: well.well_water_type.clone(),
        esp_id: well.esp_id.clone(),
        well_status,
        well_owner: well.well_owner.clone().unwrap_or_default(),
        well_capacity: well.well_capacity.to_string(),
        well_water_level: well.well_water_level.to_string(),
        well_water_consumption: well.well_water_consumption.to_string(),
        water_quality: well
            .water_quality
            .as_ref()
            .map(|quality| quality.0)
            .unwrap_or_default(),
        last_refresh_time: well
            .last_updated
            .map(|at| at.timestamp_millis())
            .unwrap_or(0),
    }
}

fn db_error(event: &'static str, err: &sqlx_core::Error) -> ServiceError {
    tracing::error!(event, error = %err, "DB error");
    ServiceError::DbError
}

fn offset(page: i64, limit: i64) -> i64 {
    (page - 1).saturating_mul(limit)
}

pub async fn list_wells(state: &AppState, cmd: ListWellsCommand) -> Result<WellPage, ServiceError> {
    let repo = WellRepo::new(&state.db);
    let Some((center, radius)) = cmd.near else {
        let total = repo
            .count(&cmd.filter)
            .await
            .map_err(|err| db_error("wells_list_failed", &err))?;
        let wells = repo
            .list(&cmd.filter, Some(cmd.limit), offset(cmd.page, cmd.limit))
            .await
            .map_err(|err| db_error("wells_list_failed", &err))?;
        return Ok(WellPage {
            wells: wells.iter().map(summarize).collect(),
            pagination: Pagination::new(total, cmd.page, cmd.limit),
        });
    };

    // The distance filter runs in memory after the attribute filters.
    let candidates = repo
        .list(&cmd.filter, None, 0)
        .await
        .map_err(|err| db_error("wells_list_failed", &err))?;
    let matching: Vec<WellSummary> = candidates
        .iter()
        .filter(|well| {
            well.point()
                .is_some_and(|point| center.distance_km(&point) <= radius)
        })
        .map(summarize)
        .collect();
    let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);
    let skip = usize::try_from(offset(cmd.page, cmd.limit)).unwrap_or(usize::MAX);
    let take = usize::try_from(cmd.limit).unwrap_or(usize::MAX);
    tracing::debug!(event = "wells_geo_filtered", candidates = candidates.len(), total);
    Ok(WellPage {
        wells: matching.into_iter().skip(skip).take(take).collect(),
        pagination: Pagination::new(total, cmd.page, cmd.limit),
    })
}

pub async fn get_well(state: &AppState, esp_id: &str) -> Result<Option<Well>, ServiceError> {
    WellRepo::new(&state.db)
        .get_by_esp_id(esp_id)
        .await
        .map_err(|err| db_error("wells_get_failed", &err))
}

async fn require_well(repo: &WellRepo<'_>, esp_id: &str) -> Result<Well, ServiceError> {
    repo.get_by_esp_id(esp_id)
        .await
        .map_err(|err| db_error("wells_get_failed", &err))?
        .ok_or(ServiceError::NotFound(MSG_WELL_NOT_FOUND))
}

fn parse_quality(fields: &WellFields) -> Result<Option<WaterQuality>, ServiceError> {
    fields
        .water_quality
        .as_ref()
        .map(|input| input.to_quality())
        .transpose()
        .map_err(|_| ServiceError::BadRequest("Invalid waterQuality JSON"))
}

fn numeric(value: Option<&Numeric>) -> Option<f64> {
    value.and_then(Numeric::as_f64)
}

fn object_or_none(value: Option<&Value>) -> Option<Value> {
    value.filter(|value| value.is_object()).cloned()
}

pub async fn create_well(
    state: &AppState,
    caller: &User,
    fields: WellFields,
) -> Result<Well, ServiceError> {
    let (Some(well_name), Some(esp_id)) = (
        non_empty(fields.well_name.as_deref()),
        non_empty(fields.esp_id.as_deref()),
    ) else {
        return Err(ServiceError::BadRequest("Well name and ESP ID are required"));
    };
    let quality = parse_quality(&fields)?;

    let repo = WellRepo::new(&state.db);
    if repo
        .get_by_esp_id(esp_id)
        .await
        .map_err(|err| db_error("wells_create_failed", &err))?
        .is_some()
    {
        return Err(ServiceError::Conflict("Well with this ESP ID already exists"));
    }

    let now = Utc::now();
    let well = Well {
        id: 0,
        esp_id: esp_id.to_string(),
        well_name: well_name.to_string(),
        well_owner: Some(
            non_empty(fields.well_owner.as_deref())
                .unwrap_or(&caller.email)
                .to_string(),
        ),
        owner_id: Some(caller.user_id),
        well_location: fields
            .well_location
            .as_ref()
            .and_then(|input| input.to_point())
            .map(Json),
        well_water_type: non_empty(fields.well_water_type.as_deref())
            .unwrap_or(DEFAULT_WATER_TYPE)
            .to_string(),
        well_capacity: numeric(fields.well_capacity.as_ref()).unwrap_or(0.0),
        well_water_level: numeric(fields.well_water_level.as_ref()).unwrap_or(0.0),
        well_water_consumption: numeric(fields.well_water_consumption.as_ref()).unwrap_or(0.0),
        water_quality: Some(Json(quality.unwrap_or_default())),
        extra_data: Json(
            object_or_none(fields.extra_data.as_ref())
                .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
        ),
        well_status: non_empty(fields.well_status.as_deref())
            .unwrap_or(STATUS_ON_CREATE)
            .to_string(),
        last_updated: Some(now),
        created_at: now,
        updated_at: now,
    };

    match repo.create(&well).await {
        Ok(created) => {
            tracing::info!(
                event = "well_created",
                esp_id = %created.esp_id,
                owner_id = %caller.user_id,
                "Well created"
            );
            Ok(created)
        }
        Err(err)
            if err
                .as_database_error()
                .is_some_and(|db_err| db_err.is_unique_violation()) =>
        {
            Err(ServiceError::Conflict("Well with this ESP ID already exists"))
        }
        Err(err) => Err(db_error("wells_create_failed", &err)),
    }
}

/// Applies a partial edit. Absent or empty fields keep the stored value.
pub fn apply_fields(well: &mut Well, fields: &WellFields) -> Result<(), ServiceError> {
    if let Some(name) = non_empty(fields.well_name.as_deref()) {
        well.well_name = name.to_string();
    }
    if let Some(point) = fields.well_location.as_ref().and_then(|input| input.to_point()) {
        well.well_location = Some(Json(point));
    }
    if let Some(water_type) = non_empty(fields.well_water_type.as_deref()) {
        well.well_water_type = water_type.to_string();
    }
    if let Some(status) = non_empty(fields.well_status.as_deref()) {
        well.well_status = status.to_string();
    }
    if let Some(owner) = non_empty(fields.well_owner.as_deref()) {
        well.well_owner = Some(owner.to_string());
    }
    if let Some(capacity) = numeric(fields.well_capacity.as_ref()) {
        well.well_capacity = capacity;
    }
    if let Some(level) = numeric(fields.well_water_level.as_ref()) {
        well.well_water_level = level;
    }
    if let Some(consumption) = numeric(fields.well_water_consumption.as_ref()) {
        well.well_water_consumption = consumption;
    }
    if let Some(quality) = parse_quality(fields)? {
        well.water_quality = Some(Json(quality));
    }
    if let Some(extra) = object_or_none(fields.extra_data.as_ref()) {
        well.extra_data = Json(extra);
    }
    Ok(())
}

pub async fn update_well(
    state: &AppState,
    esp_id: &str,
    fields: WellFields,
) -> Result<Well, ServiceError> {
    let repo = WellRepo::new(&state.db);
    let mut well = require_well(&repo, esp_id).await?;
    apply_fields(&mut well, &fields)?;
    let now = Utc::now();
    well.last_updated = Some(now);
    well.updated_at = now;

    let affected = repo
        .update(&well)
        .await
        .map_err(|err| db_error("wells_update_failed", &err))?;
    if affected == 0 {
        return Err(ServiceError::NotFound("Well not found or no changes made"));
    }
    tracing::info!(event = "well_updated", esp_id = %esp_id, "Well updated");
    Ok(well)
}

pub async fn delete_well(state: &AppState, caller: &User, esp_id: &str) -> Result<(), ServiceError> {
    let repo = WellRepo::new(&state.db);
    require_well(&repo, esp_id).await?;
    let deleted = repo
        .delete_by_esp_id(esp_id)
        .await
        .map_err(|err| db_error("wells_delete_failed", &err))?;
    if deleted == 0 {
        return Err(ServiceError::NotFound(
            "Well not found or could not be deleted",
        ));
    }
    tracing::info!(
        event = "well_deleted",
        esp_id = %esp_id,
        user_id = %caller.user_id,
        "Well deleted"
    );
    Ok(())
}

pub async fn wells_by_status(state: &AppState, status: &str) -> Result<Vec<WellSummary>, ServiceError> {
    let wells = WellRepo::new(&state.db)
        .list_by_status(status)
        .await
        .map_err(|err| db_error("wells_by_status_failed", &err))?;
    Ok(wells.iter().map(summarize).collect())
}

pub async fn update_water_level(
    state: &AppState,
    esp_id: &str,
    water_level: Option<Numeric>,
) -> Result<Well, ServiceError> {
    let Some(level) = numeric(water_level.as_ref()) else {
        return Err(ServiceError::BadRequest("Water level is required"));
    };
    let repo = WellRepo::new(&state.db);
    let updated = repo
        .update_water_level(esp_id, level, Utc::now())
        .await
        .map_err(|err| db_error("wells_level_update_failed", &err))?;
    if updated == 0 {
        return Err(ServiceError::NotFound(MSG_WELL_NOT_FOUND));
    }
    tracing::debug!(event = "well_level_updated", esp_id = %esp_id, level);
    require_well(&repo, esp_id).await
}

pub async fn update_water_quality(
    state: &AppState,
    esp_id: &str,
    water_quality: Option<Value>,
) -> Result<Well, ServiceError> {
    let Some(quality) = water_quality
        .filter(Value::is_object)
        .and_then(|value| serde_json::from_value::<WaterQuality>(value).ok())
    else {
        return Err(ServiceError::BadRequest("Water quality object is required"));
    };
    let repo = WellRepo::new(&state.db);
    let updated = repo
        .update_water_quality(esp_id, &quality, Utc::now())
        .await
        .map_err(|err| db_error("wells_quality_update_failed", &err))?;
    if updated == 0 {
        return Err(ServiceError::NotFound(MSG_WELL_NOT_FOUND));
    }
    tracing::debug!(event = "well_quality_updated", esp_id = %esp_id);
    require_well(&repo, esp_id).await
}

/// Parses the three path segments of the nearby route.
pub fn parse_nearby_params(
    latitude: &str,
    longitude: &str,
    radius: &str,
) -> Result<(GeoPoint, f64), ServiceError> {
    let parse = |value: &str| value.trim().parse::<f64>().ok().filter(|v| v.is_finite());
    match (parse(latitude), parse(longitude), parse(radius)) {
        (Some(lat), Some(lon), Some(radius)) => Ok((GeoPoint::new(lat, lon), radius)),
        _ => Err(ServiceError::BadRequest(
            "Latitude, longitude, and radius are required",
        )),
    }
}

/// Wells within `radius_km` of `center`, closest first.
pub fn rank_nearby(wells: &[Well], center: GeoPoint, radius_km: f64) -> Vec<NearbyWell> {
    let mut nearby: Vec<NearbyWell> = wells
        .iter()
        .filter_map(|well| {
            let distance = center.distance_km(&well.point()?);
            (distance <= radius_km).then(|| NearbyWell {
                well: summarize(well),
                distance: round2(distance),
            })
        })
        .collect();
    nearby.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    nearby
}

pub async fn nearby_wells(
    state: &AppState,
    center: GeoPoint,
    radius_km: f64,
) -> Result<Vec<NearbyWell>, ServiceError> {
    let wells = WellRepo::new(&state.db)
        .list_with_location()
        .await
        .map_err(|err| db_error("wells_nearby_failed", &err))?;
    let nearby = rank_nearby(&wells, center, radius_km);
    tracing::debug!(
        event = "wells_nearby",
        scanned = wells.len(),
        matched = nearby.len()
    );
    Ok(nearby)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use uuid::Uuid;

    fn well(esp_id: &str, location: Option<GeoPoint>) -> Well {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().expect("date");
        Well {
            id: 7,
            esp_id: esp_id.to_string(),
            well_name: format!("Well {esp_id}"),
            well_owner: None,
            owner_id: None,
            well_location: location.map(Json),
            well_water_type: "Clean".to_string(),
            well_capacity: 1000.0,
            well_water_level: 85.5,
            well_water_consumption: 0.0,
            water_quality: None,
            extra_data: Json(json!({})),
            well_status: String::new(),
            last_updated: Some(at),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn summary_fills_client_defaults() {
        let summary = summarize(&well("esp-1", None));
        assert_eq!(summary.well_location, GeoPoint::new(0.0, 0.0));
        assert_eq!(summary.well_owner, "");
        assert_eq!(summary.well_status, "Unknown");
        assert_eq!(summary.water_quality, WaterQuality::default());
        assert_eq!(summary.well_capacity, "1000");
        assert_eq!(summary.well_water_level, "85.5");
        assert_eq!(summary.well_water_consumption, "0");
        assert_eq!(summary.last_refresh_time, 1_740_830_400_000);
    }

    #[test]
    fn summary_without_last_update_reports_zero() {
        let mut w = well("esp-2", Some(GeoPoint::new(1.0, 2.0)));
        w.last_updated = None;
        w.well_owner = Some("owner@example.com".to_string());
        let summary = summarize(&w);
        assert_eq!(summary.last_refresh_time, 0);
        assert_eq!(summary.well_owner, "owner@example.com");
        assert_eq!(summary.well_location, GeoPoint::new(1.0, 2.0));
    }

    #[test]
    fn list_command_clamps_paging_and_prefers_well_owner() {
        let query: ListWellsQuery = serde_json::from_value(json!({
            "page": 0,
            "limit": 5000,
            "email": "a@example.com",
            "wellOwner": "b@example.com",
            "wellName": "  ",
            "latitude": 48.8,
            "longitude": 2.3
        }))
        .expect("query");
        let cmd = ListWellsCommand::from(query);
        assert_eq!(cmd.page, 1);
        assert_eq!(cmd.limit, MAX_PAGE_SIZE);
        assert_eq!(cmd.filter.owner.as_deref(), Some("b@example.com"));
        assert_eq!(cmd.filter.name_contains, None);
        let (center, radius) = cmd.near.expect("geo filter");
        assert_eq!(center, GeoPoint::new(48.8, 2.3));
        assert_eq!(radius, DEFAULT_NEARBY_RADIUS_KM);
    }

    #[test]
    fn list_command_needs_both_coordinates_for_geo() {
        let query = ListWellsQuery {
            latitude: Some(1.0),
            limit: Some(0),
            ..ListWellsQuery::default()
        };
        let cmd = ListWellsCommand::from(query);
        assert!(cmd.near.is_none());
        assert_eq!(cmd.limit, 1);
        assert_eq!(cmd.page, 1);
    }

    #[test]
    fn partial_update_keeps_stored_values() {
        let mut w = well("esp-3", Some(GeoPoint::new(1.0, 1.0)));
        w.well_owner = Some("old@example.com".to_string());
        let fields: WellFields = serde_json::from_value(json!({
            "wellName": "",
            "wellLocation": "not a location",
            "wellOwner": "new@example.com",
            "wellCapacity": "2500",
            "wellWaterLevel": 0,
            "waterQuality": {"ph": 6.8, "turbidity": 1.5, "tds": 90},
            "extraData": null
        }))
        .expect("fields");
        apply_fields(&mut w, &fields).expect("apply");
        assert_eq!(w.well_name, "Well esp-3");
        assert_eq!(w.point(), Some(GeoPoint::new(1.0, 1.0)));
        assert_eq!(w.well_owner.as_deref(), Some("new@example.com"));
        assert_eq!(w.well_capacity, 2500.0);
        assert_eq!(w.well_water_level, 0.0);
        assert_eq!(w.water_quality.map(|q| q.0.ph), Some(6.8));
        assert_eq!(w.extra_data.0, json!({}));
    }

    #[test]
    fn partial_update_accepts_location_string() {
        let mut w = well("esp-4", None);
        let fields: WellFields =
            serde_json::from_value(json!({"wellLocation": "10.5, -3"})).expect("fields");
        apply_fields(&mut w, &fields).expect("apply");
        assert_eq!(w.point(), Some(GeoPoint::new(10.5, -3.0)));
    }

    #[test]
    fn partial_update_rejects_broken_quality_json() {
        let mut w = well("esp-5", None);
        let fields: WellFields =
            serde_json::from_value(json!({"waterQuality": "{ph: 7"})).expect("fields");
        let err = apply_fields(&mut w, &fields).expect_err("invalid json");
        assert_eq!(err.message(), "Invalid waterQuality JSON");
    }

    #[test]
    fn nearby_params_must_be_numeric() {
        let (center, radius) = parse_nearby_params("48.85", "2.35", "10").expect("params");
        assert_eq!(center, GeoPoint::new(48.85, 2.35));
        assert_eq!(radius, 10.0);
        assert!(parse_nearby_params("north", "2.35", "10").is_err());
        assert!(parse_nearby_params("48.85", "2.35", "").is_err());
    }

    #[test]
    fn nearby_ranking_filters_and_sorts() {
        let center = GeoPoint::new(48.8566, 2.3522);
        let wells = vec![
            well("far", Some(GeoPoint::new(51.5074, -0.1278))),
            well("close", Some(GeoPoint::new(48.8589, 2.3469))),
            well("nowhere", None),
            well("mid", Some(GeoPoint::new(48.9, 2.4))),
        ];
        let ranked = rank_nearby(&wells, center, 50.0);
        let ids: Vec<&str> = ranked.iter().map(|w| w.well.esp_id.as_str()).collect();
        assert_eq!(ids, vec!["close", "mid"]);
        assert!(ranked[0].distance < ranked[1].distance);
        assert_eq!(ranked[0].distance, round2(ranked[0].distance));
    }

    proptest::proptest! {
        #[test]
        fn nearby_ranking_is_sorted_and_bounded(
            points in proptest::collection::vec((-60.0f64..60.0, -120.0f64..120.0), 0..12),
            radius in 0.0f64..5000.0,
        ) {
            let center = GeoPoint::new(10.0, 10.0);
            let wells: Vec<Well> = points
                .iter()
                .enumerate()
                .map(|(idx, (lat, lon))| well(&format!("esp-{idx}"), Some(GeoPoint::new(*lat, *lon))))
                .collect();
            let ranked = rank_nearby(&wells, center, radius);
            proptest::prop_assert!(ranked.len() <= wells.len());
            proptest::prop_assert!(ranked.windows(2).all(|pair| pair[0].distance <= pair[1].distance));
            for entry in &ranked {
                proptest::prop_assert!(entry.distance <= round2(radius) + 0.01);
            }
        }
    }

    #[test]
    fn owner_id_is_not_exposed_in_summary() {
        let mut w = well("esp-6", None);
        w.owner_id = Some(Uuid::new_v4());
        let value = serde_json::to_value(summarize(&w)).expect("serialize");
        assert!(value.get("ownerId").is_none());
        assert_eq!(value["espId"], "esp-6");
    }
}
