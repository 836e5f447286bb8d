//! Money ledger: customer balances, recharges, rental debits and refunds

use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::{
    error::{AppError, AppResult},
    models::customer::{validate_recharge, Balance},
    repository::Repository,
};

/// Refuse a debit the balance cannot cover
pub fn ensure_funds(balance: Decimal, required: Decimal) -> AppResult<()> {
    if balance < required {
        return Err(AppError::InsufficientFunds { balance, required });
    }
    Ok(())
}

#[derive(Clone)]
pub struct MoneyService {
    repository: Repository,
}

impl MoneyService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn balance(&self, customer_id: i32) -> AppResult<Balance> {
        let mut conn = self.repository.acquire().await?;
        let customer = self.repository.customers_get(&mut conn, customer_id).await?;
        Ok(Balance {
            customer_id: customer.id,
            balance: customer.balance,
        })
    }

    pub async fn recharge(&self, customer_id: i32, amount: Decimal) -> AppResult<Balance> {
        validate_recharge(amount)?;

        let mut tx = self.repository.begin().await?;
        self.repository.customers_get_for_update(&mut tx, customer_id).await?;
        let balance = self
            .repository
            .customers_adjust_balance(&mut tx, customer_id, amount)
            .await?;
        tx.commit().await?;

        tracing::info!(customer_id, %amount, %balance, "Balance recharged");

        Ok(Balance { customer_id, balance })
    }

    /// Take `amount` from the customer inside the caller's transaction
    pub async fn debit(&self, conn: &mut PgConnection, customer_id: i32, amount: Decimal) -> AppResult<Decimal> {
        let customer = self
            .repository
            .customers_get_for_update(&mut *conn, customer_id)
            .await?;
        ensure_funds(customer.balance, amount)?;
        let balance = self
            .repository
            .customers_adjust_balance(&mut *conn, customer_id, -amount)
            .await?;
        tracing::debug!(customer_id, %amount, %balance, "Balance debited");
        Ok(balance)
    }

    /// Give `amount` back to the customer inside the caller's transaction
    pub async fn credit(&self, conn: &mut PgConnection, customer_id: i32, amount: Decimal) -> AppResult<Decimal> {
        let balance = self
            .repository
            .customers_adjust_balance(&mut *conn, customer_id, amount)
            .await?;
        tracing::debug!(customer_id, %amount, %balance, "Balance credited");
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_balance_is_enough() {
        assert!(ensure_funds(Decimal::new(500, 0), Decimal::new(50000, 2)).is_ok());
    }

    #[test]
    fn test_short_balance_is_refused() {
        match ensure_funds(Decimal::new(49999, 2), Decimal::new(500, 0)) {
            Err(AppError::InsufficientFunds { balance, required }) => {
                assert_eq!(balance, Decimal::new(49999, 2));
                assert_eq!(required, Decimal::new(500, 0));
            }
            other => panic!("expected insufficient funds, got {:?}", other),
        }
    }
}
