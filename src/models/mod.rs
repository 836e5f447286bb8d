//! Data models for the car rental server

pub mod customer;
pub mod rental;
pub mod user;
pub mod vehicle;

// Re-export commonly used types
pub use customer::Customer;
pub use rental::{Rental, RentalStatus};
pub use user::{User, UserClaims, UserRole};
pub use vehicle::{Availability, Vehicle, VehicleDetails};
