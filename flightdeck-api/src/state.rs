use std::sync::Arc;

use flightdeck_core::repository::{
    AirportRepository, CrewRepository, FleetRepository, FlightRepository, OrderRepository,
    RouteRepository, UserRepository,
};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub access_token_minutes: u64,
    pub refresh_token_days: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub airports: Arc<dyn AirportRepository>,
    pub crews: Arc<dyn CrewRepository>,
    pub fleet: Arc<dyn FleetRepository>,
    pub routes: Arc<dyn RouteRepository>,
    pub flights: Arc<dyn FlightRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub auth: AuthConfig,
}
