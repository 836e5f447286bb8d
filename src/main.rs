//! Car Rental Server
//!
//! REST API server for car rental management.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use car_rental_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{sweeper, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("car_rental_server={},tower_http=debug", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Car Rental Server v{}", env!("CARGO_PKG_VERSION"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Database migrations completed");

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    let repository = Repository::new(pool);
    let services = Services::new(repository.clone(), config.auth.clone());

    services.users.ensure_admin().await?;

    if let Some(interval) = config.sweep_interval() {
        sweeper::start_overdue_sweeper(services.rentals.clone(), interval);
    }

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        repository,
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/me", get(api::auth::me))
        // Users
        .route("/users", get(api::users::find_user))
        .route("/users/:id", delete(api::users::delete_user))
        .route("/users/:id/password", put(api::users::change_password))
        // Vehicles
        .route(
            "/vehicles",
            get(api::vehicles::list_vehicles).post(api::vehicles::create_vehicle),
        )
        .route(
            "/vehicles/:id",
            get(api::vehicles::get_vehicle)
                .put(api::vehicles::update_vehicle)
                .delete(api::vehicles::delete_vehicle),
        )
        // Customers
        .route(
            "/customers",
            get(api::customers::list_customers).post(api::customers::create_customer),
        )
        .route(
            "/customers/:id",
            get(api::customers::get_customer)
                .put(api::customers::update_customer)
                .delete(api::customers::delete_customer),
        )
        // Rentals
        .route(
            "/rentals",
            get(api::rentals::list_rentals).post(api::rentals::create_rental),
        )
        .route("/rentals/ongoing", get(api::rentals::list_ongoing))
        .route("/rentals/overdue", get(api::rentals::list_overdue))
        .route("/rentals/finished", get(api::rentals::list_finished))
        .route("/rentals/cancelled", get(api::rentals::list_cancelled))
        .route("/rentals/customer/:customer_id", get(api::rentals::customer_rentals))
        .route(
            "/rentals/:id",
            get(api::rentals::get_rental)
                .put(api::rentals::update_rental)
                .delete(api::rentals::cancel_rental)
                .patch(api::rentals::return_vehicle),
        )
        // Money
        .route(
            "/money/:customer_id",
            get(api::money::get_balance).post(api::money::recharge),
        )
        .with_state(state);

    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api", api_routes)
        .merge(openapi)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}
