//! Rental model and the rental status state machine
//!
//! ```text
//!            sweep (now > expected_return_time)
//!   ongoing ─────────────────────────────────▶ overdue
//!     │  │                                       │
//!     │  └──────────── return ──────────┐        │ return
//!     │ cancel                          ▼        ▼
//!     ▼                               completed ◀┘
//!   cancelled
//! ```
//!
//! `completed` and `cancelled` are terminal: neither the status nor the
//! duration of a terminal rental ever changes again.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

pub const DURATION_NOT_POSITIVE: &str = "Duration days must be positive";
pub const DURATION_TOO_LONG: &str = "Duration days cannot exceed 365";
pub const DURATION_ALREADY_ELAPSED: &str = "Duration days must reach past the current time";
pub const FEE_TOO_LARGE: &str = "Total fee exceeds the maximum allowed";

pub const MAX_DURATION_DAYS: i32 = 365;

/// Largest value `rentals.total_fee NUMERIC(10, 2)` holds
fn max_total_fee() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Rental status, stored as the `rental_status` PostgreSQL enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "rental_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    Ongoing,
    Overdue,
    Completed,
    Cancelled,
}

impl RentalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalStatus::Ongoing => "ongoing",
            RentalStatus::Overdue => "overdue",
            RentalStatus::Completed => "completed",
            RentalStatus::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled rentals are frozen
    pub fn is_terminal(&self) -> bool {
        matches!(self, RentalStatus::Completed | RentalStatus::Cancelled)
    }

    /// The vehicle is held by the rental
    pub fn is_active(&self) -> bool {
        matches!(self, RentalStatus::Ongoing | RentalStatus::Overdue)
    }

    /// Decide what a manual status change from `self` to `to` means.
    ///
    /// `overdue` is only ever reached through the sweep, so asking for it
    /// explicitly is rejected like any other illegal edge.
    pub fn plan_change(self, to: RentalStatus) -> AppResult<StatusChange> {
        use RentalStatus::*;

        match (self, to) {
            (from, to) if from == to => Ok(StatusChange::Unchanged),
            (Ongoing | Overdue, Completed) => Ok(StatusChange::Complete),
            (Ongoing, Cancelled) => Ok(StatusChange::Cancel),
            (from, to) => Err(AppError::InvalidTransition { from, to }),
        }
    }
}

impl std::fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RentalStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ongoing" => Ok(RentalStatus::Ongoing),
            "overdue" => Ok(RentalStatus::Overdue),
            "completed" => Ok(RentalStatus::Completed),
            "cancelled" => Ok(RentalStatus::Cancelled),
            _ => Err(AppError::InvalidStatus(s.to_string())),
        }
    }
}

/// Effect of a manual status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Unchanged,
    /// Vehicle returned; the vehicle becomes available
    Complete,
    /// Rental called off while ongoing; the vehicle becomes available
    Cancel,
}

/// Fee for `duration_days` at `price_per_day`
pub fn compute_fee(price_per_day: Decimal, duration_days: i32) -> AppResult<Decimal> {
    price_per_day
        .checked_mul(Decimal::from(duration_days))
        .filter(|fee| *fee <= max_total_fee())
        .ok_or_else(|| AppError::Validation(FEE_TOO_LARGE.to_string()))
}

pub fn expected_return_time(start_time: DateTime<Utc>, duration_days: i32) -> AppResult<DateTime<Utc>> {
    start_time
        .checked_add_signed(Duration::days(i64::from(duration_days)))
        .ok_or_else(|| AppError::Validation(DURATION_TOO_LONG.to_string()))
}

/// Whole days elapsed between `start_time` and `now`
pub fn days_elapsed(start_time: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - start_time).num_days().max(0)
}

pub fn validate_duration(duration_days: i32) -> AppResult<()> {
    if duration_days <= 0 {
        return Err(AppError::Validation(DURATION_NOT_POSITIVE.to_string()));
    }
    if duration_days > MAX_DURATION_DAYS {
        return Err(AppError::Validation(DURATION_TOO_LONG.to_string()));
    }
    Ok(())
}

/// Rental model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Rental {
    pub id: i32,
    pub vehicle_id: i32,
    pub customer_id: i32,
    pub start_time: DateTime<Utc>,
    pub duration_days: i32,
    pub expected_return_time: DateTime<Utc>,
    pub actual_return_time: Option<DateTime<Utc>>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_fee: Decimal,
    pub status: RentalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What an update did, for the caller to reconcile vehicle and balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentalUpdateOutcome {
    pub status_change: StatusChange,
    /// New fee minus old fee, a credit never exceeding the unused days (zero
    /// when the duration did not change)
    pub fee_delta: Decimal,
}

impl Rental {
    /// Ongoing and due before `now`
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.status == RentalStatus::Ongoing && self.expected_return_time < now
    }

    /// Part of the fee covering the days not yet elapsed at `now`
    pub fn unused_fee(&self, now: DateTime<Utc>) -> Decimal {
        let duration = i64::from(self.duration_days);
        let unused = duration - days_elapsed(self.start_time, now).min(duration);
        if unused <= 0 {
            return Decimal::ZERO;
        }
        (self.total_fee * Decimal::from(unused) / Decimal::from(duration)).round_dp(2)
    }

    /// Sweep step for a single rental. Returns true when it flipped.
    pub fn mark_overdue(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_past_due(now) {
            return false;
        }
        self.status = RentalStatus::Overdue;
        self.updated_at = now;
        true
    }

    /// Return the vehicle
    pub fn complete(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        match self.status.plan_change(RentalStatus::Completed)? {
            StatusChange::Complete => {
                self.status = RentalStatus::Completed;
                self.actual_return_time = Some(now);
                self.updated_at = now;
                Ok(())
            }
            // already completed: actual_return_time is never rewritten
            _ => Err(AppError::InvalidTransition {
                from: self.status,
                to: RentalStatus::Completed,
            }),
        }
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        match self.status.plan_change(RentalStatus::Cancelled)? {
            StatusChange::Cancel => {
                self.status = RentalStatus::Cancelled;
                self.updated_at = now;
                Ok(())
            }
            _ => Err(AppError::InvalidTransition {
                from: self.status,
                to: RentalStatus::Cancelled,
            }),
        }
    }

    /// Change the rental length while ongoing; a no-op in any other state.
    ///
    /// The return time is recomputed from the unchanged start time and the fee
    /// from `price_per_day`. The new return time must lie after `now`, and a
    /// shortening never credits more than the unused part of the old fee.
    /// Returns the fee delta.
    pub fn change_duration(
        &mut self,
        duration_days: i32,
        price_per_day: Decimal,
        now: DateTime<Utc>,
    ) -> AppResult<Decimal> {
        if self.status != RentalStatus::Ongoing {
            return Ok(Decimal::ZERO);
        }
        validate_duration(duration_days)?;

        let return_time = expected_return_time(self.start_time, duration_days)?;
        if return_time <= now {
            return Err(AppError::Validation(DURATION_ALREADY_ELAPSED.to_string()));
        }

        let new_fee = compute_fee(price_per_day, duration_days)?;
        let delta = (new_fee - self.total_fee).max(-self.unused_fee(now));

        self.duration_days = duration_days;
        self.expected_return_time = return_time;
        self.total_fee = new_fee;
        self.updated_at = now;

        Ok(delta)
    }

    /// Apply an update request: status first, then duration against the
    /// resulting status.
    pub fn apply_update(
        &mut self,
        status: Option<RentalStatus>,
        duration_days: Option<i32>,
        price_per_day: Decimal,
        now: DateTime<Utc>,
    ) -> AppResult<RentalUpdateOutcome> {
        let status_change = match status {
            Some(target) => match self.status.plan_change(target)? {
                StatusChange::Complete => {
                    self.complete(now)?;
                    StatusChange::Complete
                }
                StatusChange::Cancel => {
                    self.cancel(now)?;
                    StatusChange::Cancel
                }
                StatusChange::Unchanged => StatusChange::Unchanged,
            },
            None => StatusChange::Unchanged,
        };

        let fee_delta = match duration_days {
            Some(days) => self.change_duration(days, price_per_day, now)?,
            None => Decimal::ZERO,
        };

        Ok(RentalUpdateOutcome {
            status_change,
            fee_delta,
        })
    }
}

/// Validated values for a rental insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewRental {
    pub vehicle_id: i32,
    pub customer_id: i32,
    pub start_time: DateTime<Utc>,
    pub duration_days: i32,
    pub expected_return_time: DateTime<Utc>,
    pub total_fee: Decimal,
}

impl NewRental {
    pub fn plan(
        vehicle_id: i32,
        customer_id: i32,
        price_per_day: Decimal,
        duration_days: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        validate_duration(duration_days)?;

        Ok(Self {
            vehicle_id,
            customer_id,
            start_time: now,
            duration_days,
            expected_return_time: expected_return_time(now, duration_days)?,
            total_fee: compute_fee(price_per_day, duration_days)?,
        })
    }
}

/// Rental joined with its vehicle, for a customer's history
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct RentalWithVehicle {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub rental: Rental,
    pub plate_number: String,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub brand: String,
    pub model: String,
    pub color: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price_per_day: Decimal,
}

/// Rental joined with plate number and customer contact, for listings
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct RentalOverview {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub rental: Rental,
    pub plate_number: String,
    pub customer_name: String,
    pub customer_phone: String,
}

/// Listing filters behind `/rentals/*`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RentalFilter {
    All,
    Status(RentalStatus),
}

/// Create rental request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRental {
    pub vehicle_id: i32,
    pub customer_id: i32,
    pub duration_days: i32,
}

/// Update rental request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRental {
    /// ongoing, overdue, completed or cancelled
    pub status: Option<String>,
    pub duration_days: Option<i32>,
}
