//! User domain methods on Repository

use sqlx::PgConnection;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::user::{User, UserRole},
};

impl Repository {
    /// Get a live user by ID
    pub async fn users_get_by_id(&self, conn: &mut PgConnection, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get a live user by username, case-insensitive
    pub async fn users_get_by_username(
        &self,
        conn: &mut PgConnection,
        username: &str,
    ) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(username) = LOWER($1) AND deleted_at IS NULL",
        )
        .bind(username)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(user)
    }

    pub async fn users_username_exists(&self, conn: &mut PgConnection, username: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1) AND deleted_at IS NULL)",
        )
        .bind(username)
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists)
    }

    /// Create a user with an already hashed password
    pub async fn users_create(
        &self,
        conn: &mut PgConnection,
        username: &str,
        password_hash: &str,
        role: UserRole,
    ) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&mut *conn)
        .await?;
        Ok(user)
    }

    pub async fn users_update_password(
        &self,
        conn: &mut PgConnection,
        id: i32,
        password_hash: &str,
    ) -> AppResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .bind(password_hash)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn users_soft_delete(&self, conn: &mut PgConnection, id: i32) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }

    /// Whether at least one live admin account exists
    pub async fn users_admin_exists(&self, conn: &mut PgConnection) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE role = 'admin' AND deleted_at IS NULL)",
        )
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists)
    }
}
