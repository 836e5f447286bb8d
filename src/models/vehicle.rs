//! Vehicle model and availability derivation

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::rental::RentalStatus;
use crate::error::{AppError, AppResult};

/// Province character, issuing-authority letter, five alphanumerics
static PLATE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\x{4e00}-\x{9fa5}][A-Z][A-Z0-9]{5}$").expect("valid plate regex"));

pub fn validate_price(price_per_day: Decimal) -> AppResult<()> {
    if price_per_day <= Decimal::ZERO {
        return Err(AppError::Validation("Price must be positive".to_string()));
    }
    Ok(())
}

/// Vehicle model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Vehicle {
    pub id: i32,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub brand: String,
    pub model: String,
    pub color: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price_per_day: Decimal,
    pub plate_number: String,
    /// Rental currently holding the vehicle, cleared when it ends
    pub current_rental_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Derived availability, never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Busy,
}

impl Availability {
    /// Busy while the latest rental holds the vehicle; a vehicle that was
    /// never rented is available.
    pub fn from_latest_rental(status: Option<RentalStatus>) -> Self {
        match status {
            Some(status) if status.is_active() => Availability::Busy,
            _ => Availability::Available,
        }
    }
}

/// Vehicle row joined with the status of its latest rental
#[derive(Debug, Clone, FromRow)]
pub struct VehicleRow {
    #[sqlx(flatten)]
    pub vehicle: Vehicle,
    pub latest_rental_status: Option<RentalStatus>,
}

/// Vehicle as served by the API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VehicleDetails {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub availability: Availability,
}

impl From<VehicleRow> for VehicleDetails {
    fn from(row: VehicleRow) -> Self {
        VehicleDetails {
            availability: Availability::from_latest_rental(row.latest_rental_status),
            vehicle: row.vehicle,
        }
    }
}

/// Vehicle query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct VehicleQuery {
    /// Only vehicles that can be rented right now
    pub available: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl VehicleQuery {
    /// (limit, offset) clamped to sane bounds
    pub fn limit_offset(&self) -> (i64, i64) {
        let per_page = self.per_page.unwrap_or(20).clamp(1, 200);
        let page = self.page.unwrap_or(1).max(1);
        (per_page, (page - 1) * per_page)
    }
}

/// Create vehicle request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVehicle {
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 50, message = "Vehicle type cannot be empty"))]
    pub vehicle_type: String,
    #[validate(length(min = 1, max = 50, message = "Brand cannot be empty"))]
    pub brand: String,
    #[validate(length(min = 1, max = 50, message = "Model cannot be empty"))]
    pub model: String,
    #[validate(length(min = 1, max = 20, message = "Color cannot be empty"))]
    pub color: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price_per_day: Decimal,
    #[validate(regex(path = *PLATE_NUMBER, message = "Invalid plate number format"))]
    pub plate_number: String,
}

impl CreateVehicle {
    pub fn check(&self) -> AppResult<()> {
        self.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        validate_price(self.price_per_day)
    }
}

/// Update vehicle request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateVehicle {
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 50, message = "Vehicle type cannot be empty"))]
    pub vehicle_type: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Brand cannot be empty"))]
    pub brand: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Model cannot be empty"))]
    pub model: Option<String>,
    #[validate(length(min = 1, max = 20, message = "Color cannot be empty"))]
    pub color: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub price_per_day: Option<Decimal>,
    #[validate(regex(path = *PLATE_NUMBER, message = "Invalid plate number format"))]
    pub plate_number: Option<String>,
}

impl UpdateVehicle {
    pub fn check(&self) -> AppResult<()> {
        self.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        if let Some(ref vehicle_type) = self.vehicle_type {
            if vehicle_type.trim().is_empty() {
                return Err(AppError::Validation("Vehicle type cannot be empty".to_string()));
            }
        }
        if let Some(price) = self.price_per_day {
            validate_price(price)?;
        }
        Ok(())
    }
}
