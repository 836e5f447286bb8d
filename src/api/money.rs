//! Customer balance endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::customer::{Balance, Recharge},
};

use super::{AppJson, AuthenticatedUser};

/// Get a customer's balance
#[utoipa::path(
    get,
    path = "/money/{customer_id}",
    tag = "money",
    security(("bearer_auth" = [])),
    params(("customer_id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Current balance", body = Balance),
        (status = 404, description = "Customer not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_balance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(customer_id): Path<i32>,
) -> AppResult<Json<Balance>> {
    claims.require_customer(customer_id)?;
    let balance = state.services.money.balance(customer_id).await?;
    Ok(Json(balance))
}

/// Add money to a customer's balance
#[utoipa::path(
    post,
    path = "/money/{customer_id}",
    tag = "money",
    security(("bearer_auth" = [])),
    params(("customer_id" = i32, Path, description = "Customer ID")),
    request_body = Recharge,
    responses(
        (status = 200, description = "New balance", body = Balance),
        (status = 400, description = "Amount must be positive", body = crate::error::ErrorResponse)
    )
)]
pub async fn recharge(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(customer_id): Path<i32>,
    AppJson(data): AppJson<Recharge>,
) -> AppResult<Json<Balance>> {
    claims.require_customer(customer_id)?;
    let balance = state.services.money.recharge(customer_id, data.amount).await?;
    Ok(Json(balance))
}
