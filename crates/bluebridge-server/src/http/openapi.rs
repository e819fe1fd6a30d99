use aide::axum::{
    routing::{get, patch, post, put},
    ApiRouter,
};
use aide::openapi::{Info, OpenApi};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::Json;
use bluebridge_core::{
    BugReportRequest, DataResponse, DeleteAccountRequest, DeviceTokenRequest, ListWellsQuery,
    LoginRequest, MessageResponse, NearbyUser, NearbyUsersRequest, NearbyWell,
    NotificationStatusQuery, NotificationStatusResponse, PrivateLocationRequest, RegisterRequest,
    SendNotificationRequest, SendNotificationResult, SendToTokenRequest, SendToTokenResponse,
    UpdateLocationRequest, UpdateProfileRequest, UpdateWaterNeedsRequest, UserLocation,
    UserResponse, WaterLevelRequest, WaterNeed, WaterQualityRequest, WeatherRequest,
    WeatherResponse, WellFields, WellListResponse, WellMutationResponse, WellStatistics,
    WellSummary, WellsResponse,
};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::app::AppState;
use crate::domains::errors::ErrorResponse;
use crate::domains::system::http::v1::ServerStatus;
use crate::http::routes::health::HealthResponse;

/// Documentation-only handlers. Each always answers 501 so the router can be
/// walked for schemas without a database.
type Documented<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

#[allow(dead_code)]
#[derive(Deserialize, JsonSchema)]
struct EspIdPath {
    esp_id: String,
}

#[allow(dead_code)]
#[derive(Deserialize, JsonSchema)]
struct StatusPath {
    status: String,
}

#[allow(dead_code)]
#[derive(Deserialize, JsonSchema)]
struct NearbyPath {
    latitude: String,
    longitude: String,
    radius: String,
}

pub fn build_openapi() -> OpenApi {
    let mut api = OpenApi {
        info: Info {
            title: "bluebridge-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..Default::default()
        },
        ..Default::default()
    };

    let _ = doc_router().finish_api(&mut api);
    api
}

fn doc_router() -> ApiRouter<AppState> {
    ApiRouter::new()
        .api_route("/health", get(health))
        .api_route("/status", get(server_status))
        .api_route("/api/wells", get(wells_list).post(wells_create))
        .api_route("/api/wells/stats", get(statistics))
        .api_route("/api/wells/status/:status", get(wells_by_status))
        .api_route(
            "/api/wells/nearby/:latitude/:longitude/:radius",
            get(wells_nearby),
        )
        .api_route("/api/wells/:esp_id", get(wells_get).delete(wells_delete))
        .api_route("/api/wells/:esp_id/update", put(wells_update))
        .api_route("/api/wells/:esp_id/water-level", patch(wells_water_level))
        .api_route("/api/wells/:esp_id/water-quality", patch(wells_water_quality))
        .api_route("/api/auth/register", post(auth_register))
        .api_route("/api/auth/login", post(auth_login))
        .api_route("/api/auth/delete-account", post(auth_delete_account))
        .api_route("/api/auth/update-profile", post(auth_update_profile))
        .api_route("/api/auth/update-location", post(auth_update_location))
        .api_route("/api/auth/update-water-needs", post(auth_update_water_needs))
        .api_route("/api/auth/private-location", post(auth_private_location))
        .api_route("/api/nearby-users", post(nearby_users))
        .api_route("/api/notifications/register", post(notifications_register))
        .api_route("/api/notifications/unregister", post(notifications_unregister))
        .api_route("/api/notifications/send", post(notifications_send))
        .api_route("/api/notifications/status", get(notifications_status))
        .api_route("/api/notifications/send-to-token", post(notifications_send_to_token))
        .api_route("/api/weather", post(weather))
        .api_route("/api/well-statistics", get(statistics))
        .api_route("/api/bugreports", post(bug_report))
}

fn undocumented<T>() -> Documented<T> {
    Err((
        StatusCode::NOT_IMPLEMENTED,
        Json(ErrorResponse::new("documentation only")),
    ))
}

async fn health() -> Documented<HealthResponse> {
    undocumented()
}

async fn server_status() -> Documented<DataResponse<ServerStatus>> {
    undocumented()
}

async fn wells_list(Query(_query): Query<ListWellsQuery>) -> Documented<WellListResponse> {
    undocumented()
}

async fn wells_create(Json(_payload): Json<WellFields>) -> Documented<WellMutationResponse> {
    undocumented()
}

async fn wells_by_status(Path(_path): Path<StatusPath>) -> Documented<WellsResponse<WellSummary>> {
    undocumented()
}

async fn wells_nearby(Path(_path): Path<NearbyPath>) -> Documented<WellsResponse<NearbyWell>> {
    undocumented()
}

async fn wells_get(Path(_path): Path<EspIdPath>) -> Documented<DataResponse<WellSummary>> {
    undocumented()
}

async fn wells_delete(Path(_path): Path<EspIdPath>) -> Documented<MessageResponse> {
    undocumented()
}

async fn wells_update(
    Path(_path): Path<EspIdPath>,
    Json(_payload): Json<WellFields>,
) -> Documented<WellMutationResponse> {
    undocumented()
}

async fn wells_water_level(
    Path(_path): Path<EspIdPath>,
    Json(_payload): Json<WaterLevelRequest>,
) -> Documented<WellMutationResponse> {
    undocumented()
}

async fn wells_water_quality(
    Path(_path): Path<EspIdPath>,
    Json(_payload): Json<WaterQualityRequest>,
) -> Documented<WellMutationResponse> {
    undocumented()
}

async fn auth_register(Json(_payload): Json<RegisterRequest>) -> Documented<DataResponse<UserResponse>> {
    undocumented()
}

async fn auth_login(Json(_payload): Json<LoginRequest>) -> Documented<DataResponse<UserResponse>> {
    undocumented()
}

async fn auth_delete_account(Json(_payload): Json<DeleteAccountRequest>) -> Documented<MessageResponse> {
    undocumented()
}

async fn auth_update_profile(
    Json(_payload): Json<UpdateProfileRequest>,
) -> Documented<DataResponse<UserResponse>> {
    undocumented()
}

async fn auth_update_location(
    Json(_payload): Json<UpdateLocationRequest>,
) -> Documented<DataResponse<UserLocation>> {
    undocumented()
}

async fn auth_update_water_needs(
    Json(_payload): Json<UpdateWaterNeedsRequest>,
) -> Documented<DataResponse<Vec<WaterNeed>>> {
    undocumented()
}

async fn auth_private_location(Json(_payload): Json<PrivateLocationRequest>) -> Documented<MessageResponse> {
    undocumented()
}

async fn nearby_users(Json(_payload): Json<NearbyUsersRequest>) -> Documented<DataResponse<Vec<NearbyUser>>> {
    undocumented()
}

async fn notifications_register(Json(_payload): Json<DeviceTokenRequest>) -> Documented<MessageResponse> {
    undocumented()
}

async fn notifications_unregister(Json(_payload): Json<DeviceTokenRequest>) -> Documented<MessageResponse> {
    undocumented()
}

async fn notifications_send(
    Json(_payload): Json<SendNotificationRequest>,
) -> Documented<DataResponse<SendNotificationResult>> {
    undocumented()
}

async fn notifications_status(
    Query(_query): Query<NotificationStatusQuery>,
) -> Documented<NotificationStatusResponse> {
    undocumented()
}

async fn notifications_send_to_token(
    Json(_payload): Json<SendToTokenRequest>,
) -> Documented<SendToTokenResponse> {
    undocumented()
}

async fn weather(Json(_payload): Json<WeatherRequest>) -> Documented<WeatherResponse> {
    undocumented()
}

async fn statistics() -> Documented<DataResponse<WellStatistics>> {
    undocumented()
}

async fn bug_report(Json(_payload): Json<BugReportRequest>) -> Documented<MessageResponse> {
    undocumented()
}
