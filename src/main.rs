use rusty_booking_ddd::{
    adapters::{
        memory,
        postgres::{PostgresEventStore, PostgresPostRegistry, PostgresReservationLedger},
    },
    api::{handlers::AppState, router::create_router},
    application::booking::ServiceDependencies,
    config::{AppConfig, DEFAULT_LOG_FILTER},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    // Initialize adapters
    let service_deps = match &config.database {
        Some(database) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(database.max_connections)
                .connect(&database.url)
                .await?;

            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Connected to PostgreSQL, migrations applied");

            ServiceDependencies::new(
                Arc::new(PostgresPostRegistry::new(pool.clone())),
                Arc::new(PostgresReservationLedger::new(pool.clone())),
                Arc::new(PostgresEventStore::new(pool)),
            )
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, bookings are kept in memory only");

            ServiceDependencies::new(
                Arc::new(memory::PostRegistry::new()),
                Arc::new(memory::ReservationLedger::new()),
                Arc::new(memory::EventStore::new()),
            )
        }
    };

    // Create application state
    let app_state = Arc::new(AppState { service_deps });

    // Create router
    let app = create_router(app_state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
