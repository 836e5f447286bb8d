//! Customer service

use crate::{
    error::{AppError, AppResult},
    models::{
        customer::{CreateCustomer, Customer, UpdateCustomer},
        user::UserRole,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CustomersService {
    repository: Repository,
}

impl CustomersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Customer>> {
        let mut conn = self.repository.acquire().await?;
        self.repository.customers_list(&mut conn).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Customer> {
        let mut conn = self.repository.acquire().await?;
        self.repository.customers_get(&mut conn, id).await
    }

    /// Attach a customer record to an existing customer account
    pub async fn create(&self, data: &CreateCustomer) -> AppResult<Customer> {
        data.check()?;

        let mut tx = self.repository.begin().await?;

        let user = self.repository.users_get_by_id(&mut tx, data.user_id).await?;
        if user.role != UserRole::Customer {
            return Err(AppError::Validation(
                "Customer records can only be attached to customer accounts".to_string(),
            ));
        }
        if self.repository.customers_get_by_user(&mut tx, user.id).await?.is_some() {
            return Err(AppError::Conflict("User already has a customer record".to_string()));
        }
        if self.repository.customers_id_card_exists(&mut tx, &data.id_card, None).await? {
            return Err(AppError::Conflict("ID card already exists".to_string()));
        }
        if self.repository.customers_phone_exists(&mut tx, &data.phone, None).await? {
            return Err(AppError::Conflict("Phone number already exists".to_string()));
        }

        let customer = self.repository.customers_create(&mut tx, data).await?;
        tx.commit().await?;

        tracing::info!(customer_id = customer.id, user_id = customer.user_id, "Customer created");
        Ok(customer)
    }

    pub async fn update(&self, id: i32, data: &UpdateCustomer) -> AppResult<Customer> {
        data.check()?;

        let mut tx = self.repository.begin().await?;
        self.repository.customers_get_for_update(&mut tx, id).await?;

        if let Some(ref id_card) = data.id_card {
            if self.repository.customers_id_card_exists(&mut tx, id_card, Some(id)).await? {
                return Err(AppError::Conflict("ID card already exists".to_string()));
            }
        }
        if let Some(ref phone) = data.phone {
            if self.repository.customers_phone_exists(&mut tx, phone, Some(id)).await? {
                return Err(AppError::Conflict("Phone number already exists".to_string()));
            }
        }

        let customer = self.repository.customers_update(&mut tx, id, data).await?;
        tx.commit().await?;
        Ok(customer)
    }

    /// Soft-delete a customer that holds no vehicle
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;
        self.repository.customers_get_for_update(&mut tx, id).await?;
        if self.repository.customers_has_active_rentals(&mut tx, id).await? {
            return Err(AppError::Conflict(
                "Customer has an active rental and cannot be deleted".to_string(),
            ));
        }
        self.repository.customers_soft_delete(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(customer_id = id, "Customer deleted");
        Ok(())
    }
}
