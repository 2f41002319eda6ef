use std::net::SocketAddr;
use std::sync::Arc;

use flightdeck_api::{
    app,
    state::{AppState, AuthConfig},
};
use flightdeck_store::catalog_repo::{
    StoreAirportRepository, StoreCrewRepository, StoreFleetRepository, StoreRouteRepository,
};
use flightdeck_store::flight_repo::StoreFlightRepository;
use flightdeck_store::order_repo::StoreOrderRepository;
use flightdeck_store::user_repo::StoreUserRepository;
use flightdeck_store::{Config, DbClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "flightdeck_api=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting Flightdeck API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url).await?;
    db.migrate().await?;
    let pool = db.pool.clone();

    let app_state = AppState {
        users: Arc::new(StoreUserRepository::new(pool.clone())),
        airports: Arc::new(StoreAirportRepository::new(pool.clone())),
        crews: Arc::new(StoreCrewRepository::new(pool.clone())),
        fleet: Arc::new(StoreFleetRepository::new(pool.clone())),
        routes: Arc::new(StoreRouteRepository::new(pool.clone())),
        flights: Arc::new(StoreFlightRepository::new(pool.clone())),
        orders: Arc::new(StoreOrderRepository::new(pool)),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            access_token_minutes: config.auth.access_token_minutes,
            refresh_token_days: config.auth.refresh_token_days,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
