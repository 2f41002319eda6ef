use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use flightdeck_core::crew::Crew;
use flightdeck_core::fleet::{Airplane, AirplaneType};
use flightdeck_core::network::{Airport, Route};
use flightdeck_core::repository::{
    AirplaneDetail, FlightDraft, FlightFilter, FlightRecord, FlightRepository, PageParams, Paged,
    RouteDetail,
};
use flightdeck_core::schedule::Flight;
use flightdeck_core::seating::SeatRef;
use flightdeck_core::{DomainError, DomainResult};

pub struct StoreFlightRepository {
    pool: PgPool,
}

impl StoreFlightRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn crew_for_flight(&self, flight_id: Uuid) -> DomainResult<Vec<Crew>> {
        let rows = sqlx::query_as::<_, CrewRow>(
            "SELECT c.id, c.first_name, c.last_name
             FROM crews c
             JOIN flight_crew fc ON fc.crew_id = c.id
             WHERE fc.flight_id = $1
             ORDER BY c.last_name, c.first_name",
        )
        .bind(flight_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(rows
            .into_iter()
            .map(|row| Crew {
                id: row.id,
                first_name: row.first_name,
                last_name: row.last_name,
            })
            .collect())
    }

    async fn record_for(&self, row: FlightRow) -> DomainResult<FlightRecord> {
        let crew = self.crew_for_flight(row.id).await?;
        Ok(row.into_record(crew))
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct CrewRow {
    id: Uuid,
    first_name: String,
    last_name: String,
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    route_id: Uuid,
    distance: i32,
    source_id: Uuid,
    source_name: String,
    source_city: String,
    destination_id: Uuid,
    destination_name: String,
    destination_city: String,
    airplane_id: Uuid,
    airplane_name: String,
    seat_rows: i32,
    seats_in_row: i32,
    airplane_type_id: Uuid,
    airplane_type_name: String,
    booked: i64,
}

impl FlightRow {
    fn into_record(self, crew: Vec<Crew>) -> FlightRecord {
        FlightRecord {
            flight: Flight {
                id: self.id,
                route_id: self.route_id,
                airplane_id: self.airplane_id,
                departure_time: self.departure_time,
                arrival_time: self.arrival_time,
            },
            route: RouteDetail {
                route: Route {
                    id: self.route_id,
                    source_id: self.source_id,
                    destination_id: self.destination_id,
                    distance: self.distance,
                },
                source: Airport {
                    id: self.source_id,
                    name: self.source_name,
                    closest_big_city: self.source_city,
                },
                destination: Airport {
                    id: self.destination_id,
                    name: self.destination_name,
                    closest_big_city: self.destination_city,
                },
            },
            airplane: AirplaneDetail {
                airplane: Airplane {
                    id: self.airplane_id,
                    name: self.airplane_name,
                    rows: self.seat_rows,
                    seats_in_row: self.seats_in_row,
                    airplane_type_id: self.airplane_type_id,
                },
                airplane_type: AirplaneType {
                    id: self.airplane_type_id,
                    name: self.airplane_type_name,
                },
            },
            crew,
            booked: self.booked,
        }
    }
}

const FLIGHT_SELECT: &str = "SELECT f.id, f.departure_time, f.arrival_time,
        r.id AS route_id, r.distance,
        s.id AS source_id, s.name AS source_name, s.closest_big_city AS source_city,
        d.id AS destination_id, d.name AS destination_name, d.closest_big_city AS destination_city,
        a.id AS airplane_id, a.name AS airplane_name, a.seat_rows, a.seats_in_row,
        a.airplane_type_id, t.name AS airplane_type_name,
        (SELECT COUNT(*) FROM tickets tk WHERE tk.flight_id = f.id) AS booked
     FROM flights f
     JOIN routes r ON r.id = f.route_id
     JOIN airports s ON s.id = r.source_id
     JOIN airports d ON d.id = r.destination_id
     JOIN airplanes a ON a.id = f.airplane_id
     JOIN airplane_types t ON t.id = a.airplane_type_id";

const FLIGHT_FILTER: &str = "($1::text IS NULL OR s.closest_big_city ILIKE '%' || $1 || '%')
       AND ($2::text IS NULL OR d.closest_big_city ILIKE '%' || $2 || '%')
       AND ($3::date IS NULL OR (f.departure_time AT TIME ZONE 'UTC')::date = $3)";

#[async_trait]
impl FlightRepository for StoreFlightRepository {
    async fn create_flight(&self, draft: FlightDraft) -> DomainResult<FlightRecord> {
        let mut tx = self.pool.begin().await.map_err(DomainError::storage)?;

        let route_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM routes WHERE id = $1)")
                .bind(draft.route_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(DomainError::storage)?;
        if !route_exists {
            return Err(DomainError::NotFound("route"));
        }

        let airplane_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM airplanes WHERE id = $1)")
                .bind(draft.airplane_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(DomainError::storage)?;
        if !airplane_exists {
            return Err(DomainError::NotFound("airplane"));
        }

        let known_crew: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM crews WHERE id = ANY($1)")
                .bind(&draft.crew)
                .fetch_one(&mut *tx)
                .await
                .map_err(DomainError::storage)?;
        if known_crew != draft.crew.len() as i64 {
            return Err(DomainError::NotFound("crew member"));
        }

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO flights (id, route_id, airplane_id, departure_time, arrival_time)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(draft.route_id)
        .bind(draft.airplane_id)
        .bind(draft.departure_time)
        .bind(draft.arrival_time)
        .execute(&mut *tx)
        .await
        .map_err(DomainError::storage)?;

        for crew_id in &draft.crew {
            sqlx::query("INSERT INTO flight_crew (flight_id, crew_id) VALUES ($1, $2)")
                .bind(id)
                .bind(crew_id)
                .execute(&mut *tx)
                .await
                .map_err(DomainError::storage)?;
        }

        tx.commit().await.map_err(DomainError::storage)?;

        self.get_flight(id)
            .await?
            .ok_or(DomainError::NotFound("flight"))
    }

    async fn update_flight(&self, id: Uuid, draft: FlightDraft) -> DomainResult<FlightRecord> {
        let mut tx = self.pool.begin().await.map_err(DomainError::storage)?;

        let route_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM routes WHERE id = $1)")
                .bind(draft.route_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(DomainError::storage)?;
        if !route_exists {
            return Err(DomainError::NotFound("route"));
        }

        let airplane_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM airplanes WHERE id = $1)")
                .bind(draft.airplane_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(DomainError::storage)?;
        if !airplane_exists {
            return Err(DomainError::NotFound("airplane"));
        }

        let updated = sqlx::query(
            "UPDATE flights
             SET route_id = $2, airplane_id = $3, departure_time = $4, arrival_time = $5
             WHERE id = $1",
        )
        .bind(id)
        .bind(draft.route_id)
        .bind(draft.airplane_id)
        .bind(draft.departure_time)
        .bind(draft.arrival_time)
        .execute(&mut *tx)
        .await
        .map_err(DomainError::storage)?;
        if updated.rows_affected() == 0 {
            return Err(DomainError::NotFound("flight"));
        }

        let known_crew: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM crews WHERE id = ANY($1)")
                .bind(&draft.crew)
                .fetch_one(&mut *tx)
                .await
                .map_err(DomainError::storage)?;
        if known_crew != draft.crew.len() as i64 {
            return Err(DomainError::NotFound("crew member"));
        }

        sqlx::query("DELETE FROM flight_crew WHERE flight_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(DomainError::storage)?;

        for crew_id in &draft.crew {
            sqlx::query("INSERT INTO flight_crew (flight_id, crew_id) VALUES ($1, $2)")
                .bind(id)
                .bind(crew_id)
                .execute(&mut *tx)
                .await
                .map_err(DomainError::storage)?;
        }

        tx.commit().await.map_err(DomainError::storage)?;

        self.get_flight(id)
            .await?
            .ok_or(DomainError::NotFound("flight"))
    }

    async fn get_flight(&self, id: Uuid) -> DomainResult<Option<FlightRecord>> {
        let row = sqlx::query_as::<_, FlightRow>(&format!("{FLIGHT_SELECT} WHERE f.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DomainError::storage)?;

        match row {
            Some(row) => Ok(Some(self.record_for(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_flights(
        &self,
        filter: &FlightFilter,
        page: PageParams,
    ) -> DomainResult<Paged<FlightRecord>> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*)
             FROM flights f
             JOIN routes r ON r.id = f.route_id
             JOIN airports s ON s.id = r.source_id
             JOIN airports d ON d.id = r.destination_id
             WHERE {FLIGHT_FILTER}"
        ))
        .bind(filter.source.as_deref())
        .bind(filter.destination.as_deref())
        .bind(filter.date)
        .fetch_one(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        let rows = sqlx::query_as::<_, FlightRow>(&format!(
            "{FLIGHT_SELECT}
             WHERE {FLIGHT_FILTER}
             ORDER BY f.departure_time, f.id
             LIMIT $4 OFFSET $5"
        ))
        .bind(filter.source.as_deref())
        .bind(filter.destination.as_deref())
        .bind(filter.date)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(self.record_for(row).await?);
        }

        Ok(Paged { count, results })
    }

    async fn available_seats(&self, flight_id: Uuid) -> DomainResult<i64> {
        let available: Option<i64> = sqlx::query_scalar(
            "SELECT (a.seat_rows * a.seats_in_row)::bigint
                    - (SELECT COUNT(*) FROM tickets t WHERE t.flight_id = f.id)
             FROM flights f
             JOIN airplanes a ON a.id = f.airplane_id
             WHERE f.id = $1",
        )
        .bind(flight_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        available.ok_or(DomainError::NotFound("flight"))
    }

    async fn taken_places(&self, flight_id: Uuid) -> DomainResult<Vec<SeatRef>> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM flights WHERE id = $1)")
                .bind(flight_id)
                .fetch_one(&self.pool)
                .await
                .map_err(DomainError::storage)?;
        if !exists {
            return Err(DomainError::NotFound("flight"));
        }

        let rows: Vec<(i32, i32)> = sqlx::query_as(
            "SELECT seat_row, seat FROM tickets WHERE flight_id = $1 ORDER BY seat_row, seat",
        )
        .bind(flight_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(rows
            .into_iter()
            .map(|(row, seat)| SeatRef { row, seat })
            .collect())
    }
}
