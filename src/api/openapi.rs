//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, customers, health, money, rentals, users, vehicles};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Car Rental API",
        version = "0.3.0",
        description = "Car rental management REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Users
        users::find_user,
        users::change_password,
        users::delete_user,
        // Vehicles
        vehicles::list_vehicles,
        vehicles::get_vehicle,
        vehicles::create_vehicle,
        vehicles::update_vehicle,
        vehicles::delete_vehicle,
        // Customers
        customers::list_customers,
        customers::get_customer,
        customers::create_customer,
        customers::update_customer,
        customers::delete_customer,
        // Rentals
        rentals::list_rentals,
        rentals::list_ongoing,
        rentals::list_overdue,
        rentals::list_finished,
        rentals::list_cancelled,
        rentals::get_rental,
        rentals::customer_rentals,
        rentals::create_rental,
        rentals::update_rental,
        rentals::cancel_rental,
        rentals::return_vehicle,
        // Money
        money::get_balance,
        money::recharge,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::ProfileResponse,
            // Users
            crate::models::user::User,
            crate::models::user::UserRole,
            crate::models::user::UserQuery,
            crate::models::user::RegisterUser,
            crate::models::user::ChangePassword,
            // Vehicles
            crate::models::vehicle::Vehicle,
            crate::models::vehicle::VehicleDetails,
            crate::models::vehicle::Availability,
            crate::models::vehicle::VehicleQuery,
            crate::models::vehicle::CreateVehicle,
            crate::models::vehicle::UpdateVehicle,
            vehicles::VehicleListResponse,
            // Customers
            crate::models::customer::Customer,
            crate::models::customer::CreateCustomer,
            crate::models::customer::UpdateCustomer,
            // Rentals
            crate::models::rental::Rental,
            crate::models::rental::RentalStatus,
            crate::models::rental::RentalOverview,
            crate::models::rental::RentalWithVehicle,
            crate::models::rental::CreateRental,
            crate::models::rental::UpdateRental,
            rentals::RentalListResponse,
            // Money
            crate::models::customer::Balance,
            crate::models::customer::Recharge,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and authentication"),
        (name = "users", description = "User accounts"),
        (name = "vehicles", description = "Fleet management"),
        (name = "customers", description = "Customer records"),
        (name = "rentals", description = "Rental lifecycle"),
        (name = "money", description = "Customer balances")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme used by protected endpoints
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
