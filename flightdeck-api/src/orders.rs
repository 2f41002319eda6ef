use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use flightdeck_core::booking::{SeatRequest, Ticket};
use flightdeck_core::repository::OrderRecord;

use crate::error::AppError;
use crate::flights::FlightListOut;
use crate::middleware::auth::Claims;
use crate::pagination::{PageEnvelope, PageQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/orders", get(list_orders).post(create_order))
}

#[derive(Debug, Deserialize)]
struct OrderIn {
    #[serde(default)]
    tickets: Vec<SeatRequest>,
}

#[derive(Debug, Serialize)]
struct TicketOut {
    id: Uuid,
    row: i32,
    seat: i32,
    flight: Uuid,
}

impl From<Ticket> for TicketOut {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            row: ticket.row,
            seat: ticket.seat,
            flight: ticket.flight_id,
        }
    }
}

/// Create shape. Tickets reference their flight by id.
#[derive(Debug, Serialize)]
struct OrderOut {
    id: Uuid,
    tickets: Vec<TicketOut>,
    created_at: DateTime<Utc>,
}

impl From<OrderRecord> for OrderOut {
    fn from(record: OrderRecord) -> Self {
        Self {
            id: record.order.id,
            tickets: record.tickets.into_iter().map(TicketOut::from).collect(),
            created_at: record.order.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct TicketListOut {
    id: Uuid,
    row: i32,
    seat: i32,
    flight: FlightListOut,
}

/// List shape. Each ticket inlines its flight summary.
#[derive(Debug, Serialize)]
struct OrderListOut {
    id: Uuid,
    tickets: Vec<TicketListOut>,
    user: String,
    created_at: DateTime<Utc>,
}

async fn create_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<OrderIn>,
) -> Result<(StatusCode, Json<OrderOut>), AppError> {
    let record = state
        .orders
        .create_order(claims.user_id()?, &body.tickets)
        .await?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

async fn list_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PageEnvelope<OrderListOut>>, AppError> {
    let params = page.params();
    let paged = state.orders.list_orders(claims.user_id()?, params).await?;

    // Flights repeat across tickets, so each distinct one is fetched once.
    let mut flights: HashMap<Uuid, FlightListOut> = HashMap::new();
    let mut results = Vec::with_capacity(paged.results.len());

    for record in paged.results {
        let mut tickets = Vec::with_capacity(record.tickets.len());
        for ticket in record.tickets {
            let flight = match flights.get(&ticket.flight_id) {
                Some(flight) => flight.clone(),
                None => {
                    let fetched = state
                        .flights
                        .get_flight(ticket.flight_id)
                        .await?
                        .map(FlightListOut::from)
                        .ok_or_else(|| AppError::not_found("flight not found"))?;
                    flights.insert(ticket.flight_id, fetched.clone());
                    fetched
                }
            };
            tickets.push(TicketListOut {
                id: ticket.id,
                row: ticket.row,
                seat: ticket.seat,
                flight,
            });
        }
        results.push(OrderListOut {
            id: record.order.id,
            tickets,
            user: record.user_email,
            created_at: record.order.created_at,
        });
    }

    Ok(Json(PageEnvelope::new(params, paged.count, results)))
}
