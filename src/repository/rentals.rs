//! Rental domain methods on Repository

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::rental::{NewRental, Rental, RentalFilter, RentalOverview, RentalStatus, RentalWithVehicle},
};

const RENTAL_OVERVIEW: &str = r#"
    SELECT r.*, v.plate_number, c.name AS customer_name, c.phone AS customer_phone
    FROM rentals r
    JOIN vehicles v ON v.id = r.vehicle_id
    JOIN customers c ON c.id = r.customer_id
"#;

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Rental with id {} not found", id))
}

impl Repository {
    /// Flip every ongoing rental past its expected return time to overdue.
    /// Returns the IDs that changed; running it twice changes nothing more.
    pub async fn rentals_sweep_overdue(
        &self,
        conn: &mut PgConnection,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<i32>> {
        let ids: Vec<i32> = sqlx::query_scalar(
            r#"
            UPDATE rentals SET status = 'overdue', updated_at = $1
            WHERE status = 'ongoing' AND expected_return_time < $1
            RETURNING id
            "#,
        )
        .bind(now)
        .fetch_all(&mut *conn)
        .await?;
        Ok(ids)
    }

    /// Rentals with plate number and customer contact, newest first
    pub async fn rentals_list(
        &self,
        conn: &mut PgConnection,
        filter: RentalFilter,
    ) -> AppResult<Vec<RentalOverview>> {
        let rows = match filter {
            RentalFilter::All => {
                sqlx::query_as::<_, RentalOverview>(&format!(
                    "{} ORDER BY r.start_time DESC, r.id DESC",
                    RENTAL_OVERVIEW
                ))
                .fetch_all(&mut *conn)
                .await?
            }
            RentalFilter::Status(status) => {
                sqlx::query_as::<_, RentalOverview>(&format!(
                    "{} WHERE r.status = $1 ORDER BY r.start_time DESC, r.id DESC",
                    RENTAL_OVERVIEW
                ))
                .bind(status)
                .fetch_all(&mut *conn)
                .await?
            }
        };
        Ok(rows)
    }

    pub async fn rentals_get(&self, conn: &mut PgConnection, id: i32) -> AppResult<Rental> {
        sqlx::query_as::<_, Rental>("SELECT * FROM rentals WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Lock a rental row until the end of the transaction
    pub async fn rentals_get_for_update(&self, conn: &mut PgConnection, id: i32) -> AppResult<Rental> {
        sqlx::query_as::<_, Rental>("SELECT * FROM rentals WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Owner of a rental, for access checks
    pub async fn rentals_customer_id(&self, conn: &mut PgConnection, id: i32) -> AppResult<i32> {
        sqlx::query_scalar::<_, i32>("SELECT customer_id FROM rentals WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// A customer's rentals joined with their vehicles, newest first
    pub async fn rentals_for_customer(
        &self,
        conn: &mut PgConnection,
        customer_id: i32,
    ) -> AppResult<Vec<RentalWithVehicle>> {
        let rows = sqlx::query_as::<_, RentalWithVehicle>(
            r#"
            SELECT r.*, v.plate_number, v.vehicle_type, v.brand, v.model, v.color, v.price_per_day
            FROM rentals r
            JOIN vehicles v ON v.id = r.vehicle_id
            WHERE r.customer_id = $1
            ORDER BY r.start_time DESC, r.id DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    /// Whether an ongoing or overdue rental holds the vehicle
    pub async fn rentals_vehicle_has_active(&self, conn: &mut PgConnection, vehicle_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM rentals
                WHERE vehicle_id = $1 AND status IN ('ongoing', 'overdue')
            )
            "#,
        )
        .bind(vehicle_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists)
    }

    pub async fn rentals_customer_has_overdue(&self, conn: &mut PgConnection, customer_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM rentals WHERE customer_id = $1 AND status = 'overdue')",
        )
        .bind(customer_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists)
    }

    /// Insert a new ongoing rental
    pub async fn rentals_insert(&self, conn: &mut PgConnection, data: &NewRental) -> AppResult<Rental> {
        let row = sqlx::query_as::<_, Rental>(
            r#"
            INSERT INTO rentals (
                vehicle_id, customer_id, start_time, duration_days,
                expected_return_time, total_fee, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $3, $3)
            RETURNING *
            "#,
        )
        .bind(data.vehicle_id)
        .bind(data.customer_id)
        .bind(data.start_time)
        .bind(data.duration_days)
        .bind(data.expected_return_time)
        .bind(data.total_fee)
        .bind(RentalStatus::Ongoing)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Persist the mutable fields of a rental
    pub async fn rentals_save(&self, conn: &mut PgConnection, rental: &Rental) -> AppResult<Rental> {
        sqlx::query_as::<_, Rental>(
            r#"
            UPDATE rentals SET
                duration_days = $2,
                expected_return_time = $3,
                actual_return_time = $4,
                total_fee = $5,
                status = $6,
                updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(rental.id)
        .bind(rental.duration_days)
        .bind(rental.expected_return_time)
        .bind(rental.actual_return_time)
        .bind(rental.total_fee)
        .bind(rental.status)
        .bind(rental.updated_at)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found(rental.id))
    }
}
