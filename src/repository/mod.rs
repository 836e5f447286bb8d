//! Repository layer for database operations
//!
//! Every method takes the connection it runs on, so a service decides
//! whether a call is part of a transaction (`&mut tx`) or a plain read
//! (`&mut conn` from [`Repository::acquire`]).

pub mod customers;
pub mod rentals;
pub mod users;
pub mod vehicles;

use sqlx::{pool::PoolConnection, Pool, Postgres, Transaction};

use crate::error::AppResult;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Start a transaction; dropping it without commit rolls back
    pub async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    /// Connection for read-only work
    pub async fn acquire(&self) -> AppResult<PoolConnection<Postgres>> {
        Ok(self.pool.acquire().await?)
    }

    /// Connectivity check behind `/ready`
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
