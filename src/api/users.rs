//! User account endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::user::{ChangePassword, User, UserQuery},
};

use super::{AppJson, AuthenticatedUser};

/// Look up an account by username
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "Matching account", body = User),
        (status = 404, description = "No such user", body = crate::error::ErrorResponse)
    )
)]
pub async fn find_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<User>> {
    claims.require_admin()?;
    let user = state.services.users.find_by_username(&query.username).await?;
    Ok(Json(user))
}

/// Change own password
#[utoipa::path(
    put,
    path = "/users/{id}/password",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = ChangePassword,
    responses(
        (status = 204, description = "Password changed"),
        (status = 401, description = "Current password is incorrect", body = crate::error::ErrorResponse)
    )
)]
pub async fn change_password(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    AppJson(data): AppJson<ChangePassword>,
) -> AppResult<StatusCode> {
    if claims.user_id != id {
        return Err(AppError::Authorization("Only the account owner can change its password".to_string()));
    }
    state.services.users.change_password(id, &data).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete an account and its customer record
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 409, description = "Customer holds a vehicle", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_user(id)?;
    state.services.users.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
