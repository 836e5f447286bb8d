//! Customer model and related types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, AppResult};

pub(crate) static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{11}$").expect("valid phone regex"));
pub(crate) static ID_CARD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{17}[\dXx]$").expect("valid id card regex"));

/// Customer model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Customer {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    pub id_card: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Create customer request (admin, for an existing customer account)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCustomer {
    pub user_id: i32,
    #[validate(length(min = 1, max = 50, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(regex(path = *PHONE, message = "Invalid phone number format"))]
    pub phone: String,
    #[validate(length(max = 200, message = "Address is too long"))]
    pub address: Option<String>,
    #[validate(regex(path = *ID_CARD, message = "Invalid ID card format"))]
    pub id_card: String,
}

impl CreateCustomer {
    pub fn check(&self) -> AppResult<()> {
        self.validate()
            .map_err(|e| AppError::Validation(e.to_string()))
    }
}

/// Update customer request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomer {
    #[validate(length(min = 1, max = 50, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(regex(path = *PHONE, message = "Invalid phone number format"))]
    pub phone: Option<String>,
    #[validate(length(max = 200, message = "Address is too long"))]
    pub address: Option<String>,
    #[validate(regex(path = *ID_CARD, message = "Invalid ID card format"))]
    pub id_card: Option<String>,
}

impl UpdateCustomer {
    pub fn check(&self) -> AppResult<()> {
        self.validate()
            .map_err(|e| AppError::Validation(e.to_string()))
    }
}

/// Balance of a customer
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Balance {
    pub customer_id: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub balance: Decimal,
}

/// Recharge request
#[derive(Debug, Deserialize, ToSchema)]
pub struct Recharge {
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
}

pub fn validate_recharge(amount: Decimal) -> AppResult<()> {
    if amount <= Decimal::ZERO {
        return Err(AppError::Validation("Recharge amount must be positive".to_string()));
    }
    if amount.normalize().scale() > 2 {
        return Err(AppError::Validation(
            "Recharge amount cannot have more than two decimal places".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(phone: &str, id_card: &str) -> CreateCustomer {
        CreateCustomer {
            user_id: 1,
            name: "Li Lei".to_string(),
            phone: phone.to_string(),
            address: None,
            id_card: id_card.to_string(),
        }
    }

    #[test]
    fn test_phone_format() {
        let id_card = "110101199003074258";
        assert!(customer("13800138000", id_card).check().is_ok());
        assert!(customer("1380013800", id_card).check().is_err());
        assert!(customer("1380013800a", id_card).check().is_err());
    }

    #[test]
    fn test_id_card_format() {
        let phone = "13800138000";
        assert!(customer(phone, "110101199003074258").check().is_ok());
        assert!(customer(phone, "11010119900307425X").check().is_ok());
        assert!(customer(phone, "11010119900307425x").check().is_ok());
        assert!(customer(phone, "11010119900307425").check().is_err());
        assert!(customer(phone, "1101011990030742AX").check().is_err());
    }

    #[test]
    fn test_invalid_phone_message() {
        match customer("123", "110101199003074258").check() {
            Err(AppError::Validation(msg)) => assert!(msg.contains("Invalid phone number format"), "{}", msg),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_recharge_must_be_positive() {
        assert!(validate_recharge(Decimal::new(1, 2)).is_ok());
        assert!(validate_recharge(Decimal::ZERO).is_err());
        assert!(validate_recharge(Decimal::new(-100, 0)).is_err());
    }

    #[test]
    fn test_recharge_rejects_sub_cent_amounts() {
        assert!(validate_recharge(Decimal::new(1, 3)).is_err());
        assert!(validate_recharge(Decimal::new(10001, 3)).is_err());
        // trailing zeros do not count
        assert!(validate_recharge(Decimal::new(10500, 4)).is_ok());
        assert!(validate_recharge(Decimal::new(100, 0)).is_ok());
    }

    #[test]
    fn test_update_checks_only_present_fields() {
        let update = UpdateCustomer {
            address: Some("1 Main Street".to_string()),
            ..Default::default()
        };
        assert!(update.check().is_ok());

        let update = UpdateCustomer {
            phone: Some("123".to_string()),
            ..Default::default()
        };
        assert!(update.check().is_err());
    }
}
