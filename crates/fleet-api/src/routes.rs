use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use fleet_domain::{DeviceService, DeviceSort, DeviceState, SortDirection};

use crate::dto::{
    CreateDeviceRequest, DeviceListResponse, DeviceResponse, PatchDeviceRequest,
    ReplaceDeviceRequest,
};
use crate::error::ApiError;

/// Shared application state.
pub type AppState = Arc<DeviceService>;

/// Build the device API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", device_routes())
        .with_state(state)
}

fn device_routes() -> Router<AppState> {
    Router::new()
        .route("/devices", post(create_device).get(list_devices))
        .route(
            "/devices/{id}",
            get(get_device)
                .put(replace_device)
                .patch(patch_device)
                .delete(delete_device),
        )
        .route("/devices/brand/{brand}", get(list_by_brand))
        .route("/devices/state/{state}", get(list_by_state))
}

async fn create_device(
    State(service): State<AppState>,
    Json(request): Json<CreateDeviceRequest>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let device = service.create_device(request.into()).await?;
    Ok(Json(device.into()))
}

async fn get_device(
    State(service): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let device = service.get_device(&id).await?;
    Ok(Json(device.into()))
}

async fn replace_device(
    State(service): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ReplaceDeviceRequest>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let device = service.replace_device(&id, request.into()).await?;
    Ok(Json(device.into()))
}

async fn patch_device(
    State(service): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PatchDeviceRequest>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let device = service.patch_device(&id, request.into()).await?;
    Ok(Json(device.into()))
}

async fn delete_device(
    State(service): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    service.delete_device(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_by_brand(
    State(service): State<AppState>,
    Path(brand): Path<String>,
) -> Result<Json<DeviceListResponse>, ApiError> {
    let devices = service.list_by_brand(&brand).await?;
    Ok(Json(DeviceListResponse::from_devices(devices)))
}

async fn list_by_state(
    State(service): State<AppState>,
    Path(state): Path<String>,
) -> Result<Json<DeviceListResponse>, ApiError> {
    let state: DeviceState = state
        .parse()
        .map_err(|e: String| ApiError::bad_request(e))?;
    let devices = service.list_by_state(state).await?;
    Ok(Json(DeviceListResponse::from_devices(devices)))
}

#[derive(Debug, Deserialize)]
struct PageParams {
    page: Option<i64>,
    size: Option<i64>,
    /// `field,direction`, e.g. `name,asc`. Defaults to newest first.
    sort: Option<String>,
}

async fn list_devices(
    State(service): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<DeviceListResponse>, ApiError> {
    let (sort, direction) = parse_sort(params.sort.as_deref())?;
    let devices = service
        .list_page(
            params.page.unwrap_or(0),
            params.size.unwrap_or(20),
            sort,
            direction,
        )
        .await?;
    Ok(Json(DeviceListResponse::from_devices(devices)))
}

fn parse_sort(sort: Option<&str>) -> Result<(DeviceSort, SortDirection), ApiError> {
    let Some(sort) = sort else {
        return Ok((DeviceSort::CreationTime, SortDirection::Desc));
    };

    let (field, direction) = match sort.split_once(',') {
        Some((field, direction)) => (field, Some(direction)),
        None => (sort, None),
    };

    let sort_key = match field {
        "name" => DeviceSort::Name,
        "brand" => DeviceSort::Brand,
        "creationTime" => DeviceSort::CreationTime,
        other => {
            return Err(ApiError::bad_request(format!(
                "unknown sort field: {other}"
            )))
        }
    };
    let sort_direction = match direction {
        None | Some("asc") => SortDirection::Asc,
        Some("desc") => SortDirection::Desc,
        Some(other) => {
            return Err(ApiError::bad_request(format!(
                "unknown sort direction: {other}"
            )))
        }
    };

    Ok((sort_key, sort_direction))
}
