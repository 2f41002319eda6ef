use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use flightdeck_core::crew::Crew;
use flightdeck_core::repository::{FlightDraft, FlightFilter, FlightRecord};
use flightdeck_core::schedule::{validate_schedule, ScheduleChange};
use flightdeck_core::seating::SeatRef;
use flightdeck_core::DomainError;

use crate::crews::CrewOut;
use crate::error::AppError;
use crate::fleet::AirplaneListOut;
use crate::middleware::auth::{require_staff, Claims};
use crate::network::RouteListOut;
use crate::pagination::{PageEnvelope, PageQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/flights", get(list_flights).post(create_flight))
        .route(
            "/flights/{id}",
            get(get_flight).put(update_flight).patch(patch_flight),
        )
}

/// Create/update shape. Everything referenced by id.
#[derive(Debug, Serialize)]
struct FlightOut {
    id: Uuid,
    route: Uuid,
    airplane: Uuid,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    crew: Vec<Uuid>,
}

impl From<&FlightRecord> for FlightOut {
    fn from(record: &FlightRecord) -> Self {
        Self {
            id: record.flight.id,
            route: record.flight.route_id,
            airplane: record.flight.airplane_id,
            departure_time: record.flight.departure_time,
            arrival_time: record.flight.arrival_time,
            crew: record.crew.iter().map(|member| member.id).collect(),
        }
    }
}

/// List shape. Route and airplane collapse to display strings and the
/// remaining seat count rides along.
#[derive(Debug, Clone, Serialize)]
pub struct FlightListOut {
    pub id: Uuid,
    pub route: String,
    pub airplane: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub crew: Vec<String>,
    pub available_places: i64,
}

impl From<FlightRecord> for FlightListOut {
    fn from(record: FlightRecord) -> Self {
        let available_places = record.available_places();
        Self {
            id: record.flight.id,
            route: format!(
                "{} - {}",
                record.route.source.closest_big_city, record.route.destination.closest_big_city
            ),
            airplane: record.airplane.airplane.name,
            departure_time: record.flight.departure_time,
            arrival_time: record.flight.arrival_time,
            crew: record.crew.iter().map(Crew::full_name).collect(),
            available_places,
        }
    }
}

/// Retrieve shape. Nested objects plus the seat map of sold places.
#[derive(Debug, Serialize)]
struct FlightDetailOut {
    id: Uuid,
    route: RouteListOut,
    airplane: AirplaneListOut,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    crew: Vec<CrewOut>,
    taken_places: Vec<SeatRef>,
}

#[derive(Debug, Deserialize)]
struct FlightIn {
    route: Uuid,
    airplane: Uuid,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    #[serde(default)]
    crew: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
struct FlightPatchIn {
    route: Option<Uuid>,
    airplane: Option<Uuid>,
    departure_time: Option<DateTime<Utc>>,
    arrival_time: Option<DateTime<Utc>>,
    crew: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
struct FlightQuery {
    source: Option<String>,
    destination: Option<String>,
    date: Option<NaiveDate>,
}

fn check_window(
    change: ScheduleChange,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
) -> Result<(), AppError> {
    validate_schedule(change, departure_time, arrival_time, Utc::now())
        .map_err(DomainError::Schedule)?;
    Ok(())
}

async fn create_flight(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<FlightIn>,
) -> Result<(StatusCode, Json<FlightOut>), AppError> {
    require_staff(&claims)?;
    check_window(ScheduleChange::Create, body.departure_time, body.arrival_time)?;

    let record = state
        .flights
        .create_flight(FlightDraft {
            route_id: body.route,
            airplane_id: body.airplane,
            departure_time: body.departure_time,
            arrival_time: body.arrival_time,
            crew: body.crew,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(FlightOut::from(&record))))
}

async fn list_flights(
    State(state): State<AppState>,
    Query(query): Query<FlightQuery>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PageEnvelope<FlightListOut>>, AppError> {
    let filter = FlightFilter {
        source: query.source,
        destination: query.destination,
        date: query.date,
    };
    let params = page.params();
    let paged = state.flights.list_flights(&filter, params).await?;

    Ok(Json(PageEnvelope::new(
        params,
        paged.count,
        paged.results.into_iter().map(FlightListOut::from).collect(),
    )))
}

async fn get_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlightDetailOut>, AppError> {
    let record = state
        .flights
        .get_flight(id)
        .await?
        .ok_or_else(|| AppError::not_found("flight not found"))?;
    let taken_places = state.flights.taken_places(id).await?;

    Ok(Json(FlightDetailOut {
        id: record.flight.id,
        route: record.route.into(),
        airplane: record.airplane.into(),
        departure_time: record.flight.departure_time,
        arrival_time: record.flight.arrival_time,
        crew: record.crew.into_iter().map(CrewOut::from).collect(),
        taken_places,
    }))
}

async fn update_flight(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(body): Json<FlightIn>,
) -> Result<Json<FlightOut>, AppError> {
    require_staff(&claims)?;
    check_window(ScheduleChange::Update, body.departure_time, body.arrival_time)?;

    let record = state
        .flights
        .update_flight(
            id,
            FlightDraft {
                route_id: body.route,
                airplane_id: body.airplane,
                departure_time: body.departure_time,
                arrival_time: body.arrival_time,
                crew: body.crew,
            },
        )
        .await?;

    Ok(Json(FlightOut::from(&record)))
}

/// Partial update. Omitted fields keep their stored values, and the merged
/// result is validated as a whole.
async fn patch_flight(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(body): Json<FlightPatchIn>,
) -> Result<Json<FlightOut>, AppError> {
    require_staff(&claims)?;

    let current = state
        .flights
        .get_flight(id)
        .await?
        .ok_or_else(|| AppError::not_found("flight not found"))?;

    let draft = FlightDraft {
        route_id: body.route.unwrap_or(current.flight.route_id),
        airplane_id: body.airplane.unwrap_or(current.flight.airplane_id),
        departure_time: body.departure_time.unwrap_or(current.flight.departure_time),
        arrival_time: body.arrival_time.unwrap_or(current.flight.arrival_time),
        crew: body
            .crew
            .unwrap_or_else(|| current.crew.iter().map(|member| member.id).collect()),
    };
    check_window(ScheduleChange::Update, draft.departure_time, draft.arrival_time)?;

    let record = state.flights.update_flight(id, draft).await?;
    Ok(Json(FlightOut::from(&record)))
}
