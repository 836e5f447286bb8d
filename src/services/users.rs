//! Authentication and user account service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        customer::{CreateCustomer, Customer},
        user::{ChangePassword, RegisterUser, User, UserClaims, UserRole},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Create a customer account and its customer record together
    pub async fn register(&self, data: &RegisterUser) -> AppResult<(User, Customer)> {
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let mut tx = self.repository.begin().await?;

        if self.repository.users_username_exists(&mut tx, &data.username).await? {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }
        if self.repository.customers_id_card_exists(&mut tx, &data.id_card, None).await? {
            return Err(AppError::Conflict("ID card already exists".to_string()));
        }
        if self.repository.customers_phone_exists(&mut tx, &data.phone, None).await? {
            return Err(AppError::Conflict("Phone number already exists".to_string()));
        }

        let password_hash = self.hash_password(&data.password)?;
        let user = self
            .repository
            .users_create(&mut tx, &data.username, &password_hash, UserRole::Customer)
            .await?;

        let customer = self
            .repository
            .customers_create(
                &mut tx,
                &CreateCustomer {
                    user_id: user.id,
                    name: data.name.clone(),
                    phone: data.phone.clone(),
                    address: data.address.clone(),
                    id_card: data.id_card.clone(),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(user_id = user.id, customer_id = customer.id, "Customer registered");
        Ok((user, customer))
    }

    /// Verify credentials and issue a bearer token
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let mut conn = self.repository.acquire().await?;

        let user = self
            .repository
            .users_get_by_username(&mut conn, username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            tracing::warn!(username, "Failed login attempt");
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        let customer_id = self
            .repository
            .customers_get_by_user(&mut conn, user.id)
            .await?
            .map(|c| c.id);

        let token = self.create_token(&user, customer_id)?;
        Ok((token, user))
    }

    fn create_token(&self, user: &User, customer_id: Option<i32>) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            role: user.role,
            customer_id,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Token lifetime in seconds
    pub fn token_lifetime(&self) -> i64 {
        self.config.jwt_expiration_hours as i64 * 3600
    }

    /// User and its customer record, if any
    pub async fn profile(&self, user_id: i32) -> AppResult<(User, Option<Customer>)> {
        let mut conn = self.repository.acquire().await?;
        let user = self.repository.users_get_by_id(&mut conn, user_id).await?;
        let customer = self.repository.customers_get_by_user(&mut conn, user.id).await?;
        Ok((user, customer))
    }

    pub async fn find_by_username(&self, username: &str) -> AppResult<User> {
        let mut conn = self.repository.acquire().await?;
        self.repository
            .users_get_by_username(&mut conn, username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))
    }

    pub async fn change_password(&self, user_id: i32, data: &ChangePassword) -> AppResult<()> {
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let mut tx = self.repository.begin().await?;
        let user = self.repository.users_get_by_id(&mut tx, user_id).await?;

        if !self.verify_password(&user, &data.current_password)? {
            return Err(AppError::Authentication("Current password is incorrect".to_string()));
        }

        let password_hash = self.hash_password(&data.new_password)?;
        self.repository
            .users_update_password(&mut tx, user_id, &password_hash)
            .await?;
        tx.commit().await?;

        tracing::info!(user_id, "Password changed");
        Ok(())
    }

    /// Soft-delete a user and its customer record
    pub async fn delete(&self, user_id: i32) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;
        let user = self.repository.users_get_by_id(&mut tx, user_id).await?;

        if let Some(customer) = self.repository.customers_get_by_user(&mut tx, user.id).await? {
            self.repository.customers_get_for_update(&mut tx, customer.id).await?;
            if self.repository.customers_has_active_rentals(&mut tx, customer.id).await? {
                return Err(AppError::Conflict(
                    "Customer has an active rental and cannot be deleted".to_string(),
                ));
            }
            self.repository.customers_soft_delete(&mut tx, customer.id).await?;
        }

        self.repository.users_soft_delete(&mut tx, user.id).await?;
        tx.commit().await?;

        tracing::info!(user_id, "User deleted");
        Ok(())
    }

    /// Seed the configured admin account when no admin exists yet
    pub async fn ensure_admin(&self) -> AppResult<()> {
        let (Some(username), Some(password)) = (
            self.config.admin_username.as_deref(),
            self.config.admin_password.as_deref(),
        ) else {
            return Ok(());
        };

        let mut tx = self.repository.begin().await?;

        if self.repository.users_admin_exists(&mut tx).await? {
            return Ok(());
        }
        if self.repository.users_username_exists(&mut tx, username).await? {
            tracing::warn!(username, "Cannot seed admin: username taken by a customer account");
            return Ok(());
        }

        let password_hash = self.hash_password(password)?;
        let admin = self
            .repository
            .users_create(&mut tx, username, &password_hash, UserRole::Admin)
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = admin.id, username, "Admin account created");
        Ok(())
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service() -> UsersService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        UsersService::new(Repository::new(pool), AuthConfig::default())
    }

    fn user_with_hash(password_hash: String) -> User {
        User {
            id: 1,
            username: "alice".to_string(),
            password_hash,
            role: UserRole::Customer,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let service = service();
        let hash = service.hash_password("secret123").unwrap();
        assert_ne!(hash, "secret123");

        let user = user_with_hash(hash);
        assert!(service.verify_password(&user, "secret123").unwrap());
        assert!(!service.verify_password(&user, "wrong").unwrap());
    }

    #[tokio::test]
    async fn test_token_carries_customer() {
        let service = service();
        let user = user_with_hash(String::new());
        let token = service.create_token(&user, Some(4)).unwrap();
        let claims = UserClaims::from_token(&token, &AuthConfig::default().jwt_secret).unwrap();
        assert_eq!(claims.customer_id, Some(4));
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp - claims.iat, service.token_lifetime());
    }
}
