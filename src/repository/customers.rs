//! Customer domain methods on Repository

use rust_decimal::Decimal;
use sqlx::PgConnection;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::customer::{CreateCustomer, Customer, UpdateCustomer},
};

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Customer with id {} not found", id))
}

impl Repository {
    /// List live customers
    pub async fn customers_list(&self, conn: &mut PgConnection) -> AppResult<Vec<Customer>> {
        let rows = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE deleted_at IS NULL ORDER BY id",
        )
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    /// Get a live customer by ID
    pub async fn customers_get(&self, conn: &mut PgConnection, id: i32) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Lock a live customer row; balance changes go through here
    pub async fn customers_get_for_update(&self, conn: &mut PgConnection, id: i32) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found(id))
    }

    /// Customer record linked to a user account
    pub async fn customers_get_by_user(
        &self,
        conn: &mut PgConnection,
        user_id: i32,
    ) -> AppResult<Option<Customer>> {
        let row = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn customers_create(&self, conn: &mut PgConnection, data: &CreateCustomer) -> AppResult<Customer> {
        let row = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (user_id, name, phone, address, id_card)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(&data.name)
        .bind(&data.phone)
        .bind(&data.address)
        .bind(&data.id_card)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Update the fields present in `data`
    pub async fn customers_update(
        &self,
        conn: &mut PgConnection,
        id: i32,
        data: &UpdateCustomer,
    ) -> AppResult<Customer> {
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

        add_field!(data.name, "name");
        add_field!(data.phone, "phone");
        add_field!(data.address, "address");
        add_field!(data.id_card, "id_card");

        let query = format!(
            "UPDATE customers SET {} WHERE id = $1 AND deleted_at IS NULL RETURNING *",
            sets.join(", ")
        );

        let mut builder = sqlx::query_as::<_, Customer>(&query).bind(id);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.name);
        bind_field!(data.phone);
        bind_field!(data.address);
        bind_field!(data.id_card);

        builder
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Check if an ID card number belongs to another live customer
    pub async fn customers_id_card_exists(
        &self,
        conn: &mut PgConnection,
        id_card: &str,
        exclude_id: Option<i32>,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM customers
                WHERE UPPER(id_card) = UPPER($1) AND deleted_at IS NULL
                  AND ($2::int IS NULL OR id != $2)
            )
            "#,
        )
        .bind(id_card)
        .bind(exclude_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists)
    }

    /// Check if a phone number belongs to another live customer
    pub async fn customers_phone_exists(
        &self,
        conn: &mut PgConnection,
        phone: &str,
        exclude_id: Option<i32>,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM customers
                WHERE phone = $1 AND deleted_at IS NULL
                  AND ($2::int IS NULL OR id != $2)
            )
            "#,
        )
        .bind(phone)
        .bind(exclude_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists)
    }

    /// Whether the customer still holds a vehicle
    pub async fn customers_has_active_rentals(&self, conn: &mut PgConnection, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM rentals
                WHERE customer_id = $1 AND status IN ('ongoing', 'overdue')
            )
            "#,
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists)
    }

    pub async fn customers_soft_delete(&self, conn: &mut PgConnection, id: i32) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE customers SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    /// Add `delta` (negative for a debit) to the balance, returning the new
    /// balance. The row must already be locked by the caller.
    pub async fn customers_adjust_balance(
        &self,
        conn: &mut PgConnection,
        id: i32,
        delta: Decimal,
    ) -> AppResult<Decimal> {
        sqlx::query_scalar::<_, Decimal>(
            r#"
            UPDATE customers SET balance = balance + $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING balance
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found(id))
    }
}
