use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::seating::SeatError;

/// One requested seat in an order submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatRequest {
    pub row: i32,
    pub seat: i32,
    pub flight: Uuid,
}

/// A sold seat on one flight, owned by exactly one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub row: i32,
    pub seat: i32,
    pub flight_id: Uuid,
    pub order_id: Uuid,
}

/// An atomic grouping of ticket purchases by one user.
///
/// Orders are immutable once created; `created_at` is assigned by the store
/// when the row is persisted, never at request time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Why a single ticket request was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TicketError {
    #[error(transparent)]
    Seat(#[from] SeatError),

    #[error("seat {seat} in row {row} is already taken on this flight")]
    SeatTaken { row: i32, seat: i32 },

    #[error("flight {0} not found")]
    UnknownFlight(Uuid),
}

/// Why an order submission was refused as a whole.
///
/// `position` is the zero-based index into the submitted ticket list, so the
/// API boundary can point at the offending element.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("an order must contain at least one ticket")]
    EmptyOrder,

    #[error("tickets[{position}]: {source}")]
    Ticket { position: usize, source: TicketError },
}

impl BookingError {
    pub fn ticket(position: usize, source: impl Into<TicketError>) -> Self {
        Self::Ticket {
            position,
            source: source.into(),
        }
    }
}

/// Reject an empty submission before any transaction is opened.
pub fn ensure_not_empty(requests: &[SeatRequest]) -> Result<(), BookingError> {
    if requests.is_empty() {
        return Err(BookingError::EmptyOrder);
    }
    Ok(())
}
