use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use flightdeck_core::booking::{self, BookingError, Order, SeatRequest, Ticket, TicketError};
use flightdeck_core::fleet::Airplane;
use flightdeck_core::repository::{OrderRecord, OrderRepository, PageParams, Paged};
use flightdeck_core::seating::validate_seat;
use flightdeck_core::{DomainError, DomainResult};

use crate::database::is_unique_violation;

pub struct StoreOrderRepository {
    pool: PgPool,
}

impl StoreOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn materialize(&self, order_id: Uuid) -> DomainResult<Option<OrderRecord>> {
        let order = sqlx::query_as::<_, OrderDetailRow>(
            "SELECT o.id, o.user_id, o.created_at, u.email
             FROM orders o
             JOIN users u ON u.id = o.user_id
             WHERE o.id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        let Some(order) = order else {
            return Ok(None);
        };

        let tickets = sqlx::query_as::<_, TicketRow>(
            "SELECT id, seat_row, seat, flight_id, order_id
             FROM tickets
             WHERE order_id = $1
             ORDER BY position",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(Some(OrderRecord {
            order: Order {
                id: order.id,
                user_id: order.user_id,
                created_at: order.created_at,
            },
            tickets: tickets.into_iter().map(Ticket::from).collect(),
            user_email: order.email,
        }))
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct OrderDetailRow {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    email: String,
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    seat_row: i32,
    seat: i32,
    flight_id: Uuid,
    order_id: Uuid,
}

impl From<TicketRow> for Ticket {
    fn from(row: TicketRow) -> Self {
        Self {
            id: row.id,
            row: row.seat_row,
            seat: row.seat,
            flight_id: row.flight_id,
            order_id: row.order_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FlightAirplaneRow {
    id: Uuid,
    name: String,
    seat_rows: i32,
    seats_in_row: i32,
    airplane_type_id: Uuid,
}

impl From<FlightAirplaneRow> for Airplane {
    fn from(row: FlightAirplaneRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            rows: row.seat_rows,
            seats_in_row: row.seats_in_row,
            airplane_type_id: row.airplane_type_id,
        }
    }
}

#[async_trait]
impl OrderRepository for StoreOrderRepository {
    async fn create_order(
        &self,
        user_id: Uuid,
        requests: &[SeatRequest],
    ) -> DomainResult<OrderRecord> {
        booking::ensure_not_empty(requests)?;

        let mut tx = self.pool.begin().await.map_err(DomainError::storage)?;

        let user_email: String = sqlx::query_scalar("SELECT email FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(DomainError::storage)?
            .ok_or(DomainError::NotFound("user"))?;

        let order_id = Uuid::new_v4();
        let created_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO orders (id, user_id) VALUES ($1, $2) RETURNING created_at",
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(DomainError::storage)?;

        let mut tickets = Vec::with_capacity(requests.len());
        for (position, request) in requests.iter().enumerate() {
            let airplane = sqlx::query_as::<_, FlightAirplaneRow>(
                "SELECT a.id, a.name, a.seat_rows, a.seats_in_row, a.airplane_type_id
                 FROM airplanes a
                 JOIN flights f ON f.airplane_id = a.id
                 WHERE f.id = $1",
            )
            .bind(request.flight)
            .fetch_optional(&mut *tx)
            .await
            .map_err(DomainError::storage)?
            .map(Airplane::from)
            .ok_or_else(|| {
                BookingError::ticket(position, TicketError::UnknownFlight(request.flight))
            })?;

            validate_seat(request.row, request.seat, &airplane)
                .map_err(|err| BookingError::ticket(position, TicketError::Seat(err)))?;

            let taken: bool = sqlx::query_scalar(
                "SELECT EXISTS(
                     SELECT 1 FROM tickets
                     WHERE flight_id = $1 AND seat_row = $2 AND seat = $3
                 )",
            )
            .bind(request.flight)
            .bind(request.row)
            .bind(request.seat)
            .fetch_one(&mut *tx)
            .await
            .map_err(DomainError::storage)?;
            if taken {
                return Err(BookingError::ticket(
                    position,
                    TicketError::SeatTaken {
                        row: request.row,
                        seat: request.seat,
                    },
                )
                .into());
            }

            // A concurrent order for the same seat trips the unique
            // constraint here even when the pre-check above passed.
            let ticket_id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO tickets (id, seat_row, seat, flight_id, order_id, position)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(ticket_id)
            .bind(request.row)
            .bind(request.seat)
            .bind(request.flight)
            .bind(order_id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    DomainError::from(BookingError::ticket(
                        position,
                        TicketError::SeatTaken {
                            row: request.row,
                            seat: request.seat,
                        },
                    ))
                } else {
                    DomainError::storage(err)
                }
            })?;

            tickets.push(Ticket {
                id: ticket_id,
                row: request.row,
                seat: request.seat,
                flight_id: request.flight,
                order_id,
            });
        }

        tx.commit().await.map_err(DomainError::storage)?;

        Ok(OrderRecord {
            order: Order {
                id: order_id,
                user_id,
                created_at,
            },
            tickets,
            user_email,
        })
    }

    async fn list_orders(
        &self,
        user_id: Uuid,
        page: PageParams,
    ) -> DomainResult<Paged<OrderRecord>> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(DomainError::storage)?;

        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM orders
             WHERE user_id = $1
             ORDER BY created_at DESC, id
             LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.materialize(id).await? {
                results.push(record);
            }
        }

        Ok(Paged { count, results })
    }
}
