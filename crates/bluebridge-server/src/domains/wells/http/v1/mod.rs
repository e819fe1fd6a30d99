use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{middleware, Extension, Json, Router};
use bluebridge_core::{
    DataResponse, ListWellsQuery, MessageResponse, User, WaterLevelRequest, WaterQualityRequest,
    Well, WellFields, WellListResponse, WellMissingResponse, WellMutationResponse, WellsResponse,
    STATUS_ERROR, STATUS_SUCCESS,
};

use crate::app::AppState;
use crate::domains::auth::core::{token_middleware, JsonBody};
use crate::domains::errors::{error_response, map_service_error};
use crate::domains::statistics::http::v1::well_statistics;
use crate::domains::wells::service::{
    create_well, delete_well as delete_well_service, get_well, list_wells as list_service,
    nearby_wells, parse_nearby_params, summarize, update_water_level, update_water_quality,
    update_well, wells_by_status, ListWellsCommand,
};

pub fn router() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_wells))
        .route("/stats", get(well_statistics))
        .route("/status/:status", get(by_status))
        .route("/nearby/:latitude/:longitude/:radius", get(nearby))
        .route("/:esp_id", get(get_by_esp_id))
        .route("/:esp_id/details", get(get_by_esp_id))
        .route("/:esp_id/water-level", patch(set_water_level))
        .route("/:esp_id/water-quality", patch(set_water_quality));

    let protected = Router::new()
        .route("/", post(create))
        .route("/:esp_id", axum::routing::delete(delete_well))
        .route("/delete/:esp_id", post(delete_well))
        .route("/:esp_id/update", put(update))
        .route("/:esp_id/edit", put(update))
        .route_layer(middleware::from_fn(token_middleware));

    public.merge(protected)
}

fn mutation_response(status: StatusCode, message: &str, well: &Well) -> Response {
    (
        status,
        Json(WellMutationResponse {
            status: STATUS_SUCCESS,
            message: message.to_string(),
            well: summarize(well),
        }),
    )
        .into_response()
}

#[tracing::instrument(skip(state, query))]
async fn list_wells(
    State(state): State<AppState>,
    query: Result<Query<ListWellsQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            tracing::debug!(event = "wells_query_rejected", error = %rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, "Invalid query parameters");
        }
    };
    match list_service(&state, ListWellsCommand::from(query)).await {
        Ok(page) => (
            StatusCode::OK,
            Json(WellListResponse {
                status: STATUS_SUCCESS,
                data: page.wells,
                pagination: page.pagination,
            }),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}

#[tracing::instrument(skip(state, caller, payload))]
async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    JsonBody(payload): JsonBody<WellFields>,
) -> Response {
    match create_well(&state, &caller, payload).await {
        Ok(well) => mutation_response(StatusCode::CREATED, "Well created successfully", &well),
        Err(err) => map_service_error(err),
    }
}

/// A miss answers 200 with `{status:"error", response:"no well found"}`.
#[tracing::instrument(skip(state))]
async fn get_by_esp_id(State(state): State<AppState>, Path(esp_id): Path<String>) -> Response {
    match get_well(&state, &esp_id).await {
        Ok(Some(well)) => {
            (StatusCode::OK, Json(DataResponse::success(summarize(&well)))).into_response()
        }
        Ok(None) => (
            StatusCode::OK,
            Json(WellMissingResponse {
                status: STATUS_ERROR,
                response: "no well found",
            }),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}

#[tracing::instrument(skip(state, payload))]
async fn update(
    State(state): State<AppState>,
    Path(esp_id): Path<String>,
    JsonBody(payload): JsonBody<WellFields>,
) -> Response {
    match update_well(&state, &esp_id, payload).await {
        Ok(well) => mutation_response(StatusCode::OK, "Well updated successfully", &well),
        Err(err) => map_service_error(err),
    }
}

#[tracing::instrument(skip(state, caller))]
async fn delete_well(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(esp_id): Path<String>,
) -> Response {
    match delete_well_service(&state, &caller, &esp_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::success("Well deleted successfully")),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}

#[tracing::instrument(skip(state))]
async fn by_status(State(state): State<AppState>, Path(status): Path<String>) -> Response {
    match wells_by_status(&state, &status).await {
        Ok(wells) => (
            StatusCode::OK,
            Json(WellsResponse {
                status: STATUS_SUCCESS,
                wells,
            }),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}

#[tracing::instrument(skip(state, payload))]
async fn set_water_level(
    State(state): State<AppState>,
    Path(esp_id): Path<String>,
    JsonBody(payload): JsonBody<WaterLevelRequest>,
) -> Response {
    match update_water_level(&state, &esp_id, payload.water_level).await {
        Ok(well) => mutation_response(StatusCode::OK, "Water level updated successfully", &well),
        Err(err) => map_service_error(err),
    }
}

#[tracing::instrument(skip(state, payload))]
async fn set_water_quality(
    State(state): State<AppState>,
    Path(esp_id): Path<String>,
    JsonBody(payload): JsonBody<WaterQualityRequest>,
) -> Response {
    match update_water_quality(&state, &esp_id, payload.water_quality).await {
        Ok(well) => mutation_response(StatusCode::OK, "Water quality updated successfully", &well),
        Err(err) => map_service_error(err),
    }
}

#[tracing::instrument(skip(state))]
async fn nearby(
    State(state): State<AppState>,
    Path((latitude, longitude, radius)): Path<(String, String, String)>,
) -> Response {
    let (center, radius_km) = match parse_nearby_params(&latitude, &longitude, &radius) {
        Ok(params) => params,
        Err(err) => return map_service_error(err),
    };
    match nearby_wells(&state, center, radius_km).await {
        Ok(wells) => (
            StatusCode::OK,
            Json(WellsResponse {
                status: STATUS_SUCCESS,
                wells,
            }),
        )
            .into_response(),
        Err(err) => map_service_error(err),
    }
}
