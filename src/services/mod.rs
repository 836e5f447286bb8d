//! Business logic services

pub mod customers;
pub mod money;
pub mod rentals;
pub mod sweeper;
pub mod users;
pub mod vehicles;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub vehicles: vehicles::VehiclesService,
    pub customers: customers::CustomersService,
    pub users: users::UsersService,
    pub rentals: rentals::RentalsService,
    pub money: money::MoneyService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        let money = money::MoneyService::new(repository.clone());
        Self {
            vehicles: vehicles::VehiclesService::new(repository.clone()),
            customers: customers::CustomersService::new(repository.clone()),
            users: users::UsersService::new(repository.clone(), auth_config),
            rentals: rentals::RentalsService::new(repository, money.clone()),
            money,
        }
    }
}
