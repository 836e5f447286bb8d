//! Vehicle API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::vehicle::{CreateVehicle, UpdateVehicle, Vehicle, VehicleDetails, VehicleQuery},
};

use super::{AppJson, AuthenticatedUser};

/// Page of vehicles
#[derive(Serialize, ToSchema)]
pub struct VehicleListResponse {
    pub items: Vec<VehicleDetails>,
    /// Total number of matching vehicles
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// List vehicles with their availability
#[utoipa::path(
    get,
    path = "/vehicles",
    tag = "vehicles",
    security(("bearer_auth" = [])),
    params(VehicleQuery),
    responses(
        (status = 200, description = "Vehicle list", body = VehicleListResponse)
    )
)]
pub async fn list_vehicles(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<VehicleQuery>,
) -> AppResult<Json<VehicleListResponse>> {
    let (items, total) = state.services.vehicles.list(&query).await?;
    let (per_page, offset) = query.limit_offset();

    Ok(Json(VehicleListResponse {
        items,
        total,
        page: offset / per_page + 1,
        per_page,
    }))
}

/// Get vehicle by ID
#[utoipa::path(
    get,
    path = "/vehicles/{id}",
    tag = "vehicles",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle details", body = VehicleDetails),
        (status = 404, description = "Vehicle not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_vehicle(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<VehicleDetails>> {
    let vehicle = state.services.vehicles.get_by_id(id).await?;
    Ok(Json(vehicle))
}

/// Create vehicle
#[utoipa::path(
    post,
    path = "/vehicles",
    tag = "vehicles",
    security(("bearer_auth" = [])),
    request_body = CreateVehicle,
    responses(
        (status = 201, description = "Vehicle created", body = Vehicle),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Plate number already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_vehicle(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppJson(data): AppJson<CreateVehicle>,
) -> AppResult<(StatusCode, Json<Vehicle>)> {
    claims.require_admin()?;
    let vehicle = state.services.vehicles.create(&data).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// Update vehicle
#[utoipa::path(
    put,
    path = "/vehicles/{id}",
    tag = "vehicles",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Vehicle ID")),
    request_body = UpdateVehicle,
    responses(
        (status = 200, description = "Vehicle updated", body = Vehicle),
        (status = 404, description = "Vehicle not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_vehicle(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    AppJson(data): AppJson<UpdateVehicle>,
) -> AppResult<Json<Vehicle>> {
    claims.require_admin()?;
    let vehicle = state.services.vehicles.update(id, data).await?;
    Ok(Json(vehicle))
}

/// Delete vehicle
#[utoipa::path(
    delete,
    path = "/vehicles/{id}",
    tag = "vehicles",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Vehicle ID")),
    responses(
        (status = 204, description = "Vehicle deleted"),
        (status = 409, description = "Vehicle has rentals", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_vehicle(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;
    state.services.vehicles.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
