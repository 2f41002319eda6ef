use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::booking::{Order, SeatRequest, Ticket};
use crate::crew::Crew;
use crate::fleet::{Airplane, AirplaneType};
use crate::network::{Airport, Route};
use crate::schedule::Flight;
use crate::seating::SeatRef;
use crate::users::User;
use crate::DomainResult;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page-number pagination, clamped to the configured maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u32,
    pub page_size: u32,
}

impl PageParams {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the unpaged total.
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub count: i64,
    pub results: Vec<T>,
}

#[derive(Debug, Default, Clone)]
pub struct RouteFilter {
    /// Case-insensitive substring over the source airport's city.
    pub source: Option<String>,
    /// Case-insensitive substring over the destination airport's city.
    pub destination: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct FlightFilter {
    pub source: Option<String>,
    pub destination: Option<String>,
    /// Departure calendar date (UTC).
    pub date: Option<NaiveDate>,
}

// ============================================================================
// Composite records (joined shapes the view layer renders from)
// ============================================================================

/// Route joined with both of its airports.
#[derive(Debug, Clone)]
pub struct RouteDetail {
    pub route: Route,
    pub source: Airport,
    pub destination: Airport,
}

/// Airplane joined with its type.
#[derive(Debug, Clone)]
pub struct AirplaneDetail {
    pub airplane: Airplane,
    pub airplane_type: AirplaneType,
}

/// Flight joined with everything its views render, plus the sold-seat count.
///
/// `booked` is computed at query time on every read; availability is never
/// stored or cached.
#[derive(Debug, Clone)]
pub struct FlightRecord {
    pub flight: Flight,
    pub route: RouteDetail,
    pub airplane: AirplaneDetail,
    pub crew: Vec<Crew>,
    pub booked: i64,
}

impl FlightRecord {
    pub fn available_places(&self) -> i64 {
        i64::from(self.airplane.airplane.capacity()) - self.booked
    }
}

/// Order materialized with its tickets in submission order.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub order: Order,
    pub tickets: Vec<Ticket>,
    pub user_email: String,
}

// ============================================================================
// Drafts (validated input shapes handed to the store)
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub is_staff: bool,
}

#[derive(Debug, Clone)]
pub struct CrewDraft {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone)]
pub struct AirplaneDraft {
    pub name: String,
    pub rows: i32,
    pub seats_in_row: i32,
    pub airplane_type_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct FlightDraft {
    pub route_id: Uuid,
    pub airplane_id: Uuid,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub crew: Vec<Uuid>,
}

// ============================================================================
// Repository traits
// ============================================================================

/// Repository trait for account data access.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `DomainError::Conflict("email")` when the address is taken.
    async fn create_user(&self, new_user: NewUser) -> DomainResult<User>;

    async fn get_user(&self, id: Uuid) -> DomainResult<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>>;

    async fn update_user(
        &self,
        id: Uuid,
        email: Option<String>,
        password_hash: Option<String>,
    ) -> DomainResult<User>;
}

/// Repository trait for airport data access.
#[async_trait]
pub trait AirportRepository: Send + Sync {
    async fn create_airport(&self, name: &str, closest_big_city: &str) -> DomainResult<Airport>;

    async fn get_airport(&self, id: Uuid) -> DomainResult<Option<Airport>>;

    /// `city` filters on a case-insensitive substring of `closest_big_city`.
    async fn list_airports(&self, city: Option<&str>) -> DomainResult<Vec<Airport>>;
}

/// Repository trait for crew data access.
#[async_trait]
pub trait CrewRepository: Send + Sync {
    async fn create_crew(&self, draft: CrewDraft) -> DomainResult<Crew>;

    async fn get_crew(&self, id: Uuid) -> DomainResult<Option<Crew>>;

    async fn list_crew(&self) -> DomainResult<Vec<Crew>>;

    async fn update_crew(&self, id: Uuid, draft: CrewDraft) -> DomainResult<Crew>;

    async fn delete_crew(&self, id: Uuid) -> DomainResult<()>;
}

/// Repository trait for airplane-type and airplane data access.
#[async_trait]
pub trait FleetRepository: Send + Sync {
    async fn create_airplane_type(&self, name: &str) -> DomainResult<AirplaneType>;

    async fn list_airplane_types(&self) -> DomainResult<Vec<AirplaneType>>;

    /// Fails with `DomainError::NotFound("airplane type")` on a dangling
    /// type reference.
    async fn create_airplane(&self, draft: AirplaneDraft) -> DomainResult<AirplaneDetail>;

    async fn list_airplanes(&self) -> DomainResult<Vec<AirplaneDetail>>;
}

/// Repository trait for route data access.
#[async_trait]
pub trait RouteRepository: Send + Sync {
    async fn create_route(
        &self,
        source_id: Uuid,
        destination_id: Uuid,
        distance: i32,
    ) -> DomainResult<RouteDetail>;

    async fn get_route(&self, id: Uuid) -> DomainResult<Option<RouteDetail>>;

    async fn list_routes(&self, filter: &RouteFilter) -> DomainResult<Vec<RouteDetail>>;
}

/// Repository trait for flight data access.
#[async_trait]
pub trait FlightRepository: Send + Sync {
    async fn create_flight(&self, draft: FlightDraft) -> DomainResult<FlightRecord>;

    /// Full replacement, crew set included.
    async fn update_flight(&self, id: Uuid, draft: FlightDraft) -> DomainResult<FlightRecord>;

    async fn get_flight(&self, id: Uuid) -> DomainResult<Option<FlightRecord>>;

    async fn list_flights(
        &self,
        filter: &FlightFilter,
        page: PageParams,
    ) -> DomainResult<Paged<FlightRecord>>;

    /// `capacity - count(tickets)`, computed lazily on read.
    async fn available_seats(&self, flight_id: Uuid) -> DomainResult<i64>;

    /// The flight's sold seat map, with no purchaser identity.
    async fn taken_places(&self, flight_id: Uuid) -> DomainResult<Vec<SeatRef>>;
}

/// Repository trait for order placement and retrieval.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Atomically create an order and all of its tickets.
    ///
    /// Requests are processed in submission order inside one transaction;
    /// any failure aborts the whole order. A storage-level uniqueness
    /// violation (two orders racing for one seat) surfaces as the same
    /// `SeatTaken` error as the in-transaction check.
    async fn create_order(
        &self,
        user_id: Uuid,
        requests: &[SeatRequest],
    ) -> DomainResult<OrderRecord>;

    /// Orders owned by `user_id`, newest first.
    async fn list_orders(&self, user_id: Uuid, page: PageParams) -> DomainResult<Paged<OrderRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_defaults_and_clamping() {
        let page = PageParams::default();
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 10);

        let page = PageParams::new(Some(0), Some(500));
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, MAX_PAGE_SIZE);

        let page = PageParams::new(Some(3), Some(25));
        assert_eq!(page.offset(), 50);
        assert_eq!(page.limit(), 25);
    }
}
