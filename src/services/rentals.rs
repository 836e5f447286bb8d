//! Rental lifecycle: creation, status transitions, fee changes and the
//! overdue sweep.
//!
//! Every write runs in one transaction with the rental (and, on creation, the
//! vehicle and customer) locked. Reads that expose rental status run the sweep
//! first so an overdue rental is never reported as ongoing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::{
    error::{AppError, AppResult, VEHICLE_RENTED_OUT},
    models::rental::{
        validate_duration, CreateRental, NewRental, Rental, RentalFilter, RentalOverview, RentalStatus,
        RentalWithVehicle, StatusChange, UpdateRental,
    },
    repository::Repository,
    services::money::MoneyService,
};

pub const CUSTOMER_HAS_OVERDUE: &str = "Customer has overdue rental";

#[derive(Clone)]
pub struct RentalsService {
    repository: Repository,
    money: MoneyService,
}

impl RentalsService {
    pub fn new(repository: Repository, money: MoneyService) -> Self {
        Self { repository, money }
    }

    /// Flip every ongoing rental past due to overdue
    pub async fn sweep_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<i32>> {
        let mut conn = self.repository.acquire().await?;
        let ids = self.repository.rentals_sweep_overdue(&mut conn, now).await?;
        if ids.is_empty() {
            tracing::debug!("Overdue sweep: nothing to update");
        } else {
            tracing::info!(count = ids.len(), rental_ids = ?ids, "Rentals marked overdue");
        }
        Ok(ids)
    }

    /// Sweep before a read; a failed sweep never blocks the read
    async fn refresh_statuses(&self) {
        if let Err(e) = self.sweep_overdue(Utc::now()).await {
            tracing::warn!("Overdue sweep failed: {}", e);
        }
    }

    pub async fn list(&self, filter: RentalFilter) -> AppResult<Vec<RentalOverview>> {
        self.refresh_statuses().await;
        let mut conn = self.repository.acquire().await?;
        self.repository.rentals_list(&mut conn, filter).await
    }

    pub async fn get(&self, id: i32) -> AppResult<Rental> {
        self.refresh_statuses().await;
        let mut conn = self.repository.acquire().await?;
        self.repository.rentals_get(&mut conn, id).await
    }

    /// Rental history of a customer with vehicle details, newest first
    pub async fn customer_history(&self, customer_id: i32) -> AppResult<Vec<RentalWithVehicle>> {
        self.refresh_statuses().await;
        let mut conn = self.repository.acquire().await?;
        self.repository.customers_get(&mut conn, customer_id).await?;
        self.repository.rentals_for_customer(&mut conn, customer_id).await
    }

    /// Customer owning a rental, for access checks
    pub async fn owner_of(&self, id: i32) -> AppResult<i32> {
        let mut conn = self.repository.acquire().await?;
        self.repository.rentals_customer_id(&mut conn, id).await
    }

    /// Rent a vehicle: check availability, the customer's standing and funds,
    /// debit the fee and record the rental.
    pub async fn create(&self, data: &CreateRental) -> AppResult<Rental> {
        validate_duration(data.duration_days)?;

        // an overdue rental of this customer must be visible to the check below
        self.refresh_statuses().await;

        let now = Utc::now();
        let mut tx = self.repository.begin().await?;

        let vehicle = self
            .repository
            .vehicles_get_for_update(&mut tx, data.vehicle_id)
            .await?;
        if self.repository.rentals_vehicle_has_active(&mut tx, vehicle.id).await? {
            return Err(AppError::BusinessRule(VEHICLE_RENTED_OUT.to_string()));
        }

        let customer = self
            .repository
            .customers_get_for_update(&mut tx, data.customer_id)
            .await?;
        if self.repository.rentals_customer_has_overdue(&mut tx, customer.id).await? {
            return Err(AppError::BusinessRule(CUSTOMER_HAS_OVERDUE.to_string()));
        }

        let new_rental = NewRental::plan(vehicle.id, customer.id, vehicle.price_per_day, data.duration_days, now)?;

        self.money.debit(&mut tx, customer.id, new_rental.total_fee).await?;
        let rental = self.repository.rentals_insert(&mut tx, &new_rental).await?;
        self.repository.vehicles_assign_rental(&mut tx, vehicle.id, rental.id).await?;

        tx.commit().await?;

        tracing::info!(
            rental_id = rental.id,
            vehicle_id = rental.vehicle_id,
            customer_id = rental.customer_id,
            total_fee = %rental.total_fee,
            "Rental created"
        );

        Ok(rental)
    }

    /// Apply a status change and/or a duration change.
    ///
    /// The status is applied first; the duration only while the rental is
    /// still ongoing afterwards, and is silently ignored otherwise.
    pub async fn update(&self, id: i32, data: &UpdateRental) -> AppResult<Rental> {
        let status = data
            .status
            .as_deref()
            .map(str::parse::<RentalStatus>)
            .transpose()?;

        let now = Utc::now();
        let mut tx = self.repository.begin().await?;

        let mut rental = self.lock_fresh(&mut tx, id, now).await?;
        let vehicle = self.repository.vehicles_get_row(&mut tx, rental.vehicle_id).await?;

        let outcome = rental.apply_update(status, data.duration_days, vehicle.price_per_day, now)?;

        self.settle(&mut tx, &rental, outcome.status_change, now).await?;

        if outcome.fee_delta > Decimal::ZERO {
            self.money.debit(&mut tx, rental.customer_id, outcome.fee_delta).await?;
        } else if outcome.fee_delta < Decimal::ZERO {
            self.money.credit(&mut tx, rental.customer_id, -outcome.fee_delta).await?;
        }

        let rental = self.repository.rentals_save(&mut tx, &rental).await?;
        tx.commit().await?;

        if outcome.fee_delta != Decimal::ZERO {
            tracing::info!(
                rental_id = rental.id,
                duration_days = rental.duration_days,
                fee_delta = %outcome.fee_delta,
                "Rental duration changed"
            );
        }

        Ok(rental)
    }

    /// Return the vehicle: allowed while ongoing or overdue
    pub async fn complete(&self, id: i32) -> AppResult<Rental> {
        let now = Utc::now();
        let mut tx = self.repository.begin().await?;

        let mut rental = self.lock_fresh(&mut tx, id, now).await?;
        rental.complete(now)?;
        self.settle(&mut tx, &rental, StatusChange::Complete, now).await?;

        let rental = self.repository.rentals_save(&mut tx, &rental).await?;
        tx.commit().await?;
        Ok(rental)
    }

    /// Call off an ongoing rental and refund the days not yet elapsed
    pub async fn cancel(&self, id: i32) -> AppResult<Rental> {
        let now = Utc::now();
        let mut tx = self.repository.begin().await?;

        let mut rental = self.lock_fresh(&mut tx, id, now).await?;
        rental.cancel(now)?;
        self.settle(&mut tx, &rental, StatusChange::Cancel, now).await?;

        let rental = self.repository.rentals_save(&mut tx, &rental).await?;
        tx.commit().await?;
        Ok(rental)
    }

    /// Lock the rental and bring its status up to date with `now`
    async fn lock_fresh(&self, conn: &mut PgConnection, id: i32, now: DateTime<Utc>) -> AppResult<Rental> {
        let mut rental = self.repository.rentals_get_for_update(&mut *conn, id).await?;
        if rental.mark_overdue(now) {
            tracing::debug!(rental_id = rental.id, "Rental found past due");
        }
        Ok(rental)
    }

    /// Side effects of a terminal transition on the vehicle and the balance
    async fn settle(
        &self,
        conn: &mut PgConnection,
        rental: &Rental,
        change: StatusChange,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if change == StatusChange::Unchanged {
            return Ok(());
        }

        let released = self
            .repository
            .vehicles_release(&mut *conn, rental.vehicle_id, rental.id)
            .await?;
        if !released {
            tracing::warn!(
                rental_id = rental.id,
                vehicle_id = rental.vehicle_id,
                "Vehicle was not pointing at the ending rental"
            );
        }

        if change == StatusChange::Cancel {
            let refund = rental.unused_fee(now);
            if refund > Decimal::ZERO {
                self.money.credit(&mut *conn, rental.customer_id, refund).await?;
            }
        }

        tracing::info!(rental_id = rental.id, status = %rental.status, "Rental ended");
        Ok(())
    }
}
