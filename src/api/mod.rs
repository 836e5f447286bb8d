//! API handlers for the car rental REST endpoints

pub mod auth;
pub mod customers;
pub mod health;
pub mod money;
pub mod openapi;
pub mod rentals;
pub mod users;
pub mod vehicles;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use crate::{error::AppError, models::user::UserClaims, AppState};

/// JSON request body; malformed or incomplete bodies answer with the
/// regular error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Request, StatusCode},
        routing::post,
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::models::rental::CreateRental;

    async fn accept(AppJson(data): AppJson<CreateRental>) -> String {
        data.duration_days.to_string()
    }

    async fn post_body(body: &'static str) -> (StatusCode, Value) {
        let app = Router::new().route("/rentals", post(accept));
        let request = Request::post("/rentals")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_missing_field_is_bad_request_json() {
        let (status, body) = post_body(r#"{"vehicle_id": 1, "customer_id": 2}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("duration_days"), "{}", message);
    }

    #[tokio::test]
    async fn test_mistyped_field_is_bad_request_json() {
        let (status, body) =
            post_body(r#"{"vehicle_id": 1, "customer_id": 2, "duration_days": "three"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_valid_body_passes_through() {
        let app = Router::new().route("/rentals", post(accept));
        let request = Request::post("/rentals")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"vehicle_id": 1, "customer_id": 2, "duration_days": 3}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"3");
    }
}
