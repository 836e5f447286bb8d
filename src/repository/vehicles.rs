//! Vehicle domain methods on Repository

use sqlx::PgConnection;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::vehicle::{CreateVehicle, UpdateVehicle, Vehicle, VehicleDetails, VehicleQuery, VehicleRow},
};

/// Vehicles with the status of the rental they currently point at
const VEHICLE_WITH_STATUS: &str = r#"
    SELECT v.*, r.status AS latest_rental_status
    FROM vehicles v
    LEFT JOIN rentals r ON r.id = v.current_rental_id
    WHERE v.deleted_at IS NULL
"#;

fn availability_condition(available: Option<bool>) -> &'static str {
    match available {
        Some(true) => " AND (r.status IS NULL OR r.status NOT IN ('ongoing', 'overdue'))",
        Some(false) => " AND r.status IN ('ongoing', 'overdue')",
        None => "",
    }
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Vehicle with id {} not found", id))
}

impl Repository {
    /// List vehicles with derived availability
    pub async fn vehicles_list(
        &self,
        conn: &mut PgConnection,
        query: &VehicleQuery,
    ) -> AppResult<(Vec<VehicleDetails>, i64)> {
        let (limit, offset) = query.limit_offset();
        let condition = availability_condition(query.available);

        let total: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COUNT(*)
            FROM vehicles v
            LEFT JOIN rentals r ON r.id = v.current_rental_id
            WHERE v.deleted_at IS NULL{}
            "#,
            condition
        ))
        .fetch_one(&mut *conn)
        .await?;

        let rows = sqlx::query_as::<_, VehicleRow>(&format!(
            "{}{} ORDER BY v.id LIMIT $1 OFFSET $2",
            VEHICLE_WITH_STATUS, condition
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

        Ok((rows.into_iter().map(VehicleDetails::from).collect(), total))
    }

    /// Get a vehicle with derived availability
    pub async fn vehicles_get(&self, conn: &mut PgConnection, id: i32) -> AppResult<VehicleDetails> {
        sqlx::query_as::<_, VehicleRow>(&format!("{} AND v.id = $1", VEHICLE_WITH_STATUS))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .map(VehicleDetails::from)
            .ok_or_else(|| not_found(id))
    }

    /// Get a vehicle row, deleted or not (rentals keep pointing at it)
    pub async fn vehicles_get_row(&self, conn: &mut PgConnection, id: i32) -> AppResult<Vehicle> {
        sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Lock a live vehicle row until the end of the transaction
    pub async fn vehicles_get_for_update(&self, conn: &mut PgConnection, id: i32) -> AppResult<Vehicle> {
        sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found(id))
    }

    /// Check if a plate number is used by another live vehicle
    pub async fn vehicles_plate_exists(
        &self,
        conn: &mut PgConnection,
        plate_number: &str,
        exclude_id: Option<i32>,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM vehicles
                WHERE plate_number = $1 AND deleted_at IS NULL
                  AND ($2::int IS NULL OR id != $2)
            )
            "#,
        )
        .bind(plate_number)
        .bind(exclude_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists)
    }

    /// Create vehicle
    pub async fn vehicles_create(&self, conn: &mut PgConnection, data: &CreateVehicle) -> AppResult<Vehicle> {
        let row = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (vehicle_type, brand, model, color, price_per_day, plate_number)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(data.vehicle_type.trim())
        .bind(&data.brand)
        .bind(&data.model)
        .bind(&data.color)
        .bind(data.price_per_day)
        .bind(&data.plate_number)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Update the fields present in `data`
    pub async fn vehicles_update(
        &self,
        conn: &mut PgConnection,
        id: i32,
        data: &UpdateVehicle,
    ) -> AppResult<Vehicle> {
        let mut sets = vec!["updated_at = NOW()".to_string()];
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.vehicle_type, "vehicle_type");
        add_field!(data.brand, "brand");
        add_field!(data.model, "model");
        add_field!(data.color, "color");
        add_field!(data.price_per_day, "price_per_day");
        add_field!(data.plate_number, "plate_number");

        let query = format!(
            "UPDATE vehicles SET {} WHERE id = $1 AND deleted_at IS NULL RETURNING *",
            sets.join(", ")
        );

        let mut builder = sqlx::query_as::<_, Vehicle>(&query).bind(id);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.vehicle_type);
        bind_field!(data.brand);
        bind_field!(data.model);
        bind_field!(data.color);
        bind_field!(data.price_per_day);
        bind_field!(data.plate_number);

        builder
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Point the vehicle at the rental that now holds it
    pub async fn vehicles_assign_rental(
        &self,
        conn: &mut PgConnection,
        vehicle_id: i32,
        rental_id: i32,
    ) -> AppResult<()> {
        sqlx::query("UPDATE vehicles SET current_rental_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(vehicle_id)
            .bind(rental_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Free the vehicle if `rental_id` is the rental holding it
    pub async fn vehicles_release(
        &self,
        conn: &mut PgConnection,
        vehicle_id: i32,
        rental_id: i32,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles SET current_rental_id = NULL, updated_at = NOW()
            WHERE id = $1 AND current_rental_id = $2
            "#,
        )
        .bind(vehicle_id)
        .bind(rental_id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether any rental, in any state, references the vehicle
    pub async fn vehicles_has_rentals(&self, conn: &mut PgConnection, id: i32) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM rentals WHERE vehicle_id = $1)")
                .bind(id)
                .fetch_one(&mut *conn)
                .await?;
        Ok(exists)
    }

    /// Soft-delete a vehicle
    pub async fn vehicles_soft_delete(&self, conn: &mut PgConnection, id: i32) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE vehicles SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_condition() {
        assert_eq!(availability_condition(None), "");
        assert!(availability_condition(Some(true)).contains("NOT IN"));
        assert!(availability_condition(Some(false)).contains("r.status IN"));
    }
}
