//! Rental API endpoints
//!
//! Listing, detail and history reads bring overdue statuses up to date
//! before answering.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::rental::{
        CreateRental, Rental, RentalFilter, RentalOverview, RentalStatus, RentalWithVehicle, UpdateRental,
    },
    models::user::UserClaims,
};

use super::{AppJson, AuthenticatedUser};

#[derive(Serialize, ToSchema)]
pub struct RentalListResponse {
    pub data: Vec<RentalOverview>,
    pub total: usize,
}

async fn list_by(
    state: &crate::AppState,
    claims: &UserClaims,
    filter: RentalFilter,
) -> AppResult<Json<RentalListResponse>> {
    claims.require_admin()?;
    let data = state.services.rentals.list(filter).await?;
    Ok(Json(RentalListResponse {
        total: data.len(),
        data,
    }))
}

/// Owner or admin may act on a rental
async fn require_owner(state: &crate::AppState, claims: &UserClaims, id: i32) -> AppResult<()> {
    let customer_id = state.services.rentals.owner_of(id).await?;
    claims.require_customer(customer_id)
}

/// List all rentals
#[utoipa::path(
    get,
    path = "/rentals",
    tag = "rentals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All rentals, newest first", body = RentalListResponse)
    )
)]
pub async fn list_rentals(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<RentalListResponse>> {
    list_by(&state, &claims, RentalFilter::All).await
}

/// List ongoing rentals
#[utoipa::path(
    get,
    path = "/rentals/ongoing",
    tag = "rentals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Ongoing rentals", body = RentalListResponse)
    )
)]
pub async fn list_ongoing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<RentalListResponse>> {
    list_by(&state, &claims, RentalFilter::Status(RentalStatus::Ongoing)).await
}

/// List overdue rentals
#[utoipa::path(
    get,
    path = "/rentals/overdue",
    tag = "rentals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Overdue rentals", body = RentalListResponse)
    )
)]
pub async fn list_overdue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<RentalListResponse>> {
    list_by(&state, &claims, RentalFilter::Status(RentalStatus::Overdue)).await
}

/// List completed rentals
#[utoipa::path(
    get,
    path = "/rentals/finished",
    tag = "rentals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Completed rentals", body = RentalListResponse)
    )
)]
pub async fn list_finished(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<RentalListResponse>> {
    list_by(&state, &claims, RentalFilter::Status(RentalStatus::Completed)).await
}

/// List cancelled rentals
#[utoipa::path(
    get,
    path = "/rentals/cancelled",
    tag = "rentals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Cancelled rentals", body = RentalListResponse)
    )
)]
pub async fn list_cancelled(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<RentalListResponse>> {
    list_by(&state, &claims, RentalFilter::Status(RentalStatus::Cancelled)).await
}

/// Get rental by ID
#[utoipa::path(
    get,
    path = "/rentals/{id}",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Rental ID")),
    responses(
        (status = 200, description = "Rental details", body = Rental),
        (status = 404, description = "Rental not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_rental(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Rental>> {
    require_owner(&state, &claims, id).await?;
    let rental = state.services.rentals.get(id).await?;
    Ok(Json(rental))
}

/// Rental history of a customer
#[utoipa::path(
    get,
    path = "/rentals/customer/{customer_id}",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(("customer_id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Rentals with vehicle details, newest first", body = Vec<RentalWithVehicle>),
        (status = 404, description = "Customer not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn customer_rentals(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(customer_id): Path<i32>,
) -> AppResult<Json<Vec<RentalWithVehicle>>> {
    claims.require_customer(customer_id)?;
    let rentals = state.services.rentals.customer_history(customer_id).await?;
    Ok(Json(rentals))
}

/// Rent a vehicle
#[utoipa::path(
    post,
    path = "/rentals",
    tag = "rentals",
    security(("bearer_auth" = [])),
    request_body = CreateRental,
    responses(
        (status = 201, description = "Rental created", body = Rental),
        (status = 400, description = "Vehicle rented out, customer overdue, insufficient funds or bad duration", body = crate::error::ErrorResponse),
        (status = 404, description = "Vehicle or customer not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_rental(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppJson(data): AppJson<CreateRental>,
) -> AppResult<(StatusCode, Json<Rental>)> {
    claims.require_customer(data.customer_id)?;
    let rental = state.services.rentals.create(&data).await?;
    Ok((StatusCode::CREATED, Json(rental)))
}

/// Change the status and/or duration of a rental
#[utoipa::path(
    put,
    path = "/rentals/{id}",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Rental ID")),
    request_body = UpdateRental,
    responses(
        (status = 200, description = "Rental updated", body = Rental),
        (status = 400, description = "Invalid status, transition or duration", body = crate::error::ErrorResponse),
        (status = 404, description = "Rental not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_rental(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    AppJson(data): AppJson<UpdateRental>,
) -> AppResult<Json<Rental>> {
    require_owner(&state, &claims, id).await?;
    let rental = state.services.rentals.update(id, &data).await?;
    Ok(Json(rental))
}

/// Cancel an ongoing rental
#[utoipa::path(
    delete,
    path = "/rentals/{id}",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Rental ID")),
    responses(
        (status = 200, description = "Rental cancelled and fee refunded", body = Rental),
        (status = 400, description = "Rental is not ongoing", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel_rental(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Rental>> {
    require_owner(&state, &claims, id).await?;
    let rental = state.services.rentals.cancel(id).await?;
    Ok(Json(rental))
}

/// Return the vehicle of a rental
#[utoipa::path(
    patch,
    path = "/rentals/{id}",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Rental ID")),
    responses(
        (status = 204, description = "Vehicle returned"),
        (status = 400, description = "Rental already ended", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_vehicle(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    require_owner(&state, &claims, id).await?;
    state.services.rentals.complete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
