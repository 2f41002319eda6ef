use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use flightdeck_core::network::Airport;
use flightdeck_core::repository::{RouteDetail, RouteFilter};

use crate::error::{require_text, AppError};
use crate::middleware::auth::{require_staff, Claims};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/airports", get(list_airports).post(create_airport))
        .route("/airports/{id}", get(get_airport))
        .route("/routes", get(list_routes).post(create_route))
        .route("/routes/{id}", get(get_route))
}

#[derive(Debug, Clone, Serialize)]
pub struct AirportOut {
    pub id: Uuid,
    pub name: String,
    pub closest_big_city: String,
}

impl From<Airport> for AirportOut {
    fn from(airport: Airport) -> Self {
        Self {
            id: airport.id,
            name: airport.name,
            closest_big_city: airport.closest_big_city,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AirportIn {
    name: String,
    closest_big_city: String,
}

#[derive(Debug, Deserialize)]
struct AirportQuery {
    city: Option<String>,
}

/// Create/retrieve shape. Endpoints are referenced by id here.
#[derive(Debug, Serialize)]
struct RouteOut {
    id: Uuid,
    source: Uuid,
    destination: Uuid,
    distance: i32,
}

impl From<&RouteDetail> for RouteOut {
    fn from(detail: &RouteDetail) -> Self {
        Self {
            id: detail.route.id,
            source: detail.route.source_id,
            destination: detail.route.destination_id,
            distance: detail.route.distance,
        }
    }
}

/// List shape. Endpoints collapse to their closest big city.
#[derive(Debug, Clone, Serialize)]
pub struct RouteListOut {
    pub id: Uuid,
    pub source: String,
    pub destination: String,
    pub distance: i32,
}

impl From<RouteDetail> for RouteListOut {
    fn from(detail: RouteDetail) -> Self {
        Self {
            id: detail.route.id,
            source: detail.source.closest_big_city,
            destination: detail.destination.closest_big_city,
            distance: detail.route.distance,
        }
    }
}

#[derive(Debug, Serialize)]
struct RouteDetailOut {
    id: Uuid,
    source: AirportOut,
    destination: AirportOut,
    distance: i32,
}

impl From<RouteDetail> for RouteDetailOut {
    fn from(detail: RouteDetail) -> Self {
        Self {
            id: detail.route.id,
            source: detail.source.into(),
            destination: detail.destination.into(),
            distance: detail.route.distance,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RouteIn {
    source: Uuid,
    destination: Uuid,
    distance: i32,
}

#[derive(Debug, Deserialize)]
struct RouteQuery {
    source: Option<String>,
    destination: Option<String>,
}

async fn create_airport(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<AirportIn>,
) -> Result<(StatusCode, Json<AirportOut>), AppError> {
    require_staff(&claims)?;
    require_text("name", &body.name)?;
    require_text("closest_big_city", &body.closest_big_city)?;

    let airport = state
        .airports
        .create_airport(&body.name, &body.closest_big_city)
        .await?;

    Ok((StatusCode::CREATED, Json(airport.into())))
}

async fn list_airports(
    State(state): State<AppState>,
    Query(query): Query<AirportQuery>,
) -> Result<Json<Vec<AirportOut>>, AppError> {
    let airports = state.airports.list_airports(query.city.as_deref()).await?;
    Ok(Json(airports.into_iter().map(AirportOut::from).collect()))
}

async fn get_airport(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AirportOut>, AppError> {
    let airport = state
        .airports
        .get_airport(id)
        .await?
        .ok_or_else(|| AppError::not_found("airport not found"))?;

    Ok(Json(airport.into()))
}

async fn create_route(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<RouteIn>,
) -> Result<(StatusCode, Json<RouteOut>), AppError> {
    require_staff(&claims)?;
    if body.distance < 1 {
        return Err(AppError::validation_for(
            "distance",
            "Ensure this value is greater than or equal to 1.",
        ));
    }

    let detail = state
        .routes
        .create_route(body.source, body.destination, body.distance)
        .await?;

    Ok((StatusCode::CREATED, Json(RouteOut::from(&detail))))
}

async fn list_routes(
    State(state): State<AppState>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<Vec<RouteListOut>>, AppError> {
    let filter = RouteFilter {
        source: query.source,
        destination: query.destination,
    };
    let routes = state.routes.list_routes(&filter).await?;
    Ok(Json(routes.into_iter().map(RouteListOut::from).collect()))
}

async fn get_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RouteDetailOut>, AppError> {
    let detail = state
        .routes
        .get_route(id)
        .await?
        .ok_or_else(|| AppError::not_found("route not found"))?;

    Ok(Json(detail.into()))
}
