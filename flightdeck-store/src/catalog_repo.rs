use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use flightdeck_core::crew::Crew;
use flightdeck_core::fleet::{Airplane, AirplaneType};
use flightdeck_core::network::{Airport, Route};
use flightdeck_core::repository::{
    AirplaneDetail, AirplaneDraft, AirportRepository, CrewDraft, CrewRepository, FleetRepository,
    RouteDetail, RouteFilter, RouteRepository,
};
use flightdeck_core::{DomainError, DomainResult};

// ============================================================================
// Airports
// ============================================================================

pub struct StoreAirportRepository {
    pool: PgPool,
}

impl StoreAirportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct AirportRow {
    id: Uuid,
    name: String,
    closest_big_city: String,
}

impl From<AirportRow> for Airport {
    fn from(row: AirportRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            closest_big_city: row.closest_big_city,
        }
    }
}

#[async_trait]
impl AirportRepository for StoreAirportRepository {
    async fn create_airport(&self, name: &str, closest_big_city: &str) -> DomainResult<Airport> {
        let row = sqlx::query_as::<_, AirportRow>(
            "INSERT INTO airports (id, name, closest_big_city)
             VALUES ($1, $2, $3)
             RETURNING id, name, closest_big_city",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(closest_big_city)
        .fetch_one(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(row.into())
    }

    async fn get_airport(&self, id: Uuid) -> DomainResult<Option<Airport>> {
        let row = sqlx::query_as::<_, AirportRow>(
            "SELECT id, name, closest_big_city FROM airports WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(row.map(Airport::from))
    }

    async fn list_airports(&self, city: Option<&str>) -> DomainResult<Vec<Airport>> {
        let rows = sqlx::query_as::<_, AirportRow>(
            "SELECT id, name, closest_big_city FROM airports
             WHERE $1::text IS NULL OR closest_big_city ILIKE '%' || $1 || '%'
             ORDER BY name",
        )
        .bind(city)
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(rows.into_iter().map(Airport::from).collect())
    }
}

// ============================================================================
// Crews
// ============================================================================

pub struct StoreCrewRepository {
    pool: PgPool,
}

impl StoreCrewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CrewRow {
    id: Uuid,
    first_name: String,
    last_name: String,
}

impl From<CrewRow> for Crew {
    fn from(row: CrewRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}

#[async_trait]
impl CrewRepository for StoreCrewRepository {
    async fn create_crew(&self, draft: CrewDraft) -> DomainResult<Crew> {
        let row = sqlx::query_as::<_, CrewRow>(
            "INSERT INTO crews (id, first_name, last_name)
             VALUES ($1, $2, $3)
             RETURNING id, first_name, last_name",
        )
        .bind(Uuid::new_v4())
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .fetch_one(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(row.into())
    }

    async fn get_crew(&self, id: Uuid) -> DomainResult<Option<Crew>> {
        let row = sqlx::query_as::<_, CrewRow>(
            "SELECT id, first_name, last_name FROM crews WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(row.map(Crew::from))
    }

    async fn list_crew(&self) -> DomainResult<Vec<Crew>> {
        let rows = sqlx::query_as::<_, CrewRow>(
            "SELECT id, first_name, last_name FROM crews ORDER BY last_name, first_name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(rows.into_iter().map(Crew::from).collect())
    }

    async fn update_crew(&self, id: Uuid, draft: CrewDraft) -> DomainResult<Crew> {
        let row = sqlx::query_as::<_, CrewRow>(
            "UPDATE crews SET first_name = $2, last_name = $3
             WHERE id = $1
             RETURNING id, first_name, last_name",
        )
        .bind(id)
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::storage)?
        .ok_or(DomainError::NotFound("crew member"))?;

        Ok(row.into())
    }

    async fn delete_crew(&self, id: Uuid) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM crews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DomainError::storage)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("crew member"));
        }
        Ok(())
    }
}

// ============================================================================
// Fleet (airplane types and airplanes)
// ============================================================================

pub struct StoreFleetRepository {
    pool: PgPool,
}

impl StoreFleetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AirplaneTypeRow {
    id: Uuid,
    name: String,
}

impl From<AirplaneTypeRow> for AirplaneType {
    fn from(row: AirplaneTypeRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AirplaneDetailRow {
    id: Uuid,
    name: String,
    seat_rows: i32,
    seats_in_row: i32,
    airplane_type_id: Uuid,
    airplane_type_name: String,
}

impl From<AirplaneDetailRow> for AirplaneDetail {
    fn from(row: AirplaneDetailRow) -> Self {
        Self {
            airplane: Airplane {
                id: row.id,
                name: row.name,
                rows: row.seat_rows,
                seats_in_row: row.seats_in_row,
                airplane_type_id: row.airplane_type_id,
            },
            airplane_type: AirplaneType {
                id: row.airplane_type_id,
                name: row.airplane_type_name,
            },
        }
    }
}

const AIRPLANE_DETAIL_SELECT: &str = "SELECT a.id, a.name, a.seat_rows, a.seats_in_row,
        a.airplane_type_id, t.name AS airplane_type_name
     FROM airplanes a
     JOIN airplane_types t ON t.id = a.airplane_type_id";

#[async_trait]
impl FleetRepository for StoreFleetRepository {
    async fn create_airplane_type(&self, name: &str) -> DomainResult<AirplaneType> {
        let row = sqlx::query_as::<_, AirplaneTypeRow>(
            "INSERT INTO airplane_types (id, name) VALUES ($1, $2) RETURNING id, name",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(row.into())
    }

    async fn list_airplane_types(&self) -> DomainResult<Vec<AirplaneType>> {
        let rows = sqlx::query_as::<_, AirplaneTypeRow>(
            "SELECT id, name FROM airplane_types ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(rows.into_iter().map(AirplaneType::from).collect())
    }

    async fn create_airplane(&self, draft: AirplaneDraft) -> DomainResult<AirplaneDetail> {
        let airplane_type = sqlx::query_as::<_, AirplaneTypeRow>(
            "SELECT id, name FROM airplane_types WHERE id = $1",
        )
        .bind(draft.airplane_type_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::storage)?
        .ok_or(DomainError::NotFound("airplane type"))?;

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO airplanes (id, name, seat_rows, seats_in_row, airplane_type_id)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(&draft.name)
        .bind(draft.rows)
        .bind(draft.seats_in_row)
        .bind(draft.airplane_type_id)
        .execute(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(AirplaneDetail {
            airplane: Airplane {
                id,
                name: draft.name,
                rows: draft.rows,
                seats_in_row: draft.seats_in_row,
                airplane_type_id: draft.airplane_type_id,
            },
            airplane_type: airplane_type.into(),
        })
    }

    async fn list_airplanes(&self) -> DomainResult<Vec<AirplaneDetail>> {
        let rows = sqlx::query_as::<_, AirplaneDetailRow>(&format!(
            "{AIRPLANE_DETAIL_SELECT} ORDER BY a.name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(rows.into_iter().map(AirplaneDetail::from).collect())
    }
}

// ============================================================================
// Routes
// ============================================================================

pub struct StoreRouteRepository {
    pool: PgPool,
}

impl StoreRouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RouteDetailRow {
    id: Uuid,
    distance: i32,
    source_id: Uuid,
    source_name: String,
    source_city: String,
    destination_id: Uuid,
    destination_name: String,
    destination_city: String,
}

impl From<RouteDetailRow> for RouteDetail {
    fn from(row: RouteDetailRow) -> Self {
        Self {
            route: Route {
                id: row.id,
                source_id: row.source_id,
                destination_id: row.destination_id,
                distance: row.distance,
            },
            source: Airport {
                id: row.source_id,
                name: row.source_name,
                closest_big_city: row.source_city,
            },
            destination: Airport {
                id: row.destination_id,
                name: row.destination_name,
                closest_big_city: row.destination_city,
            },
        }
    }
}

const ROUTE_DETAIL_SELECT: &str = "SELECT r.id, r.distance,
        s.id AS source_id, s.name AS source_name, s.closest_big_city AS source_city,
        d.id AS destination_id, d.name AS destination_name, d.closest_big_city AS destination_city
     FROM routes r
     JOIN airports s ON s.id = r.source_id
     JOIN airports d ON d.id = r.destination_id";

#[async_trait]
impl RouteRepository for StoreRouteRepository {
    async fn create_route(
        &self,
        source_id: Uuid,
        destination_id: Uuid,
        distance: i32,
    ) -> DomainResult<RouteDetail> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO routes (id, source_id, destination_id, distance)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(source_id)
        .bind(destination_id)
        .bind(distance)
        .execute(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                DomainError::NotFound("airport")
            }
            _ => DomainError::storage(err),
        })?;

        self.get_route(id)
            .await?
            .ok_or(DomainError::NotFound("route"))
    }

    async fn get_route(&self, id: Uuid) -> DomainResult<Option<RouteDetail>> {
        let row = sqlx::query_as::<_, RouteDetailRow>(&format!(
            "{ROUTE_DETAIL_SELECT} WHERE r.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(row.map(RouteDetail::from))
    }

    async fn list_routes(&self, filter: &RouteFilter) -> DomainResult<Vec<RouteDetail>> {
        let rows = sqlx::query_as::<_, RouteDetailRow>(&format!(
            "{ROUTE_DETAIL_SELECT}
             WHERE ($1::text IS NULL OR s.closest_big_city ILIKE '%' || $1 || '%')
               AND ($2::text IS NULL OR d.closest_big_city ILIKE '%' || $2 || '%')
             ORDER BY source_city, destination_city"
        ))
        .bind(filter.source.as_deref())
        .bind(filter.destination.as_deref())
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(rows.into_iter().map(RouteDetail::from).collect())
    }
}
