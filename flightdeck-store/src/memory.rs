use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use flightdeck_core::booking::{self, BookingError, Order, SeatRequest, Ticket, TicketError};
use flightdeck_core::crew::Crew;
use flightdeck_core::fleet::{Airplane, AirplaneType};
use flightdeck_core::network::{Airport, Route};
use flightdeck_core::repository::{
    AirplaneDetail, AirplaneDraft, AirportRepository, CrewDraft, CrewRepository, FleetRepository,
    FlightDraft, FlightFilter, FlightRecord, FlightRepository, NewUser, OrderRecord,
    OrderRepository, PageParams, Paged, RouteDetail, RouteFilter, RouteRepository, UserRepository,
};
use flightdeck_core::schedule::Flight;
use flightdeck_core::seating::{validate_seat, SeatRef};
use flightdeck_core::users::User;
use flightdeck_core::{DomainError, DomainResult};

/// In-memory store backing the test suite.
///
/// One lock guards all tables, so an order create runs as a single critical
/// section and the whole-order atomicity of the Postgres store carries over.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    airports: HashMap<Uuid, Airport>,
    crews: HashMap<Uuid, Crew>,
    airplane_types: HashMap<Uuid, AirplaneType>,
    airplanes: HashMap<Uuid, Airplane>,
    routes: HashMap<Uuid, Route>,
    flights: HashMap<Uuid, Flight>,
    flight_crew: HashMap<Uuid, Vec<Uuid>>,
    orders: HashMap<Uuid, Order>,
    // Insertion log; list_orders walks it backwards for newest-first.
    order_log: Vec<Uuid>,
    tickets: Vec<Ticket>,
    seat_index: HashSet<(Uuid, i32, i32)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn city_matches(city: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) => city.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

fn paginate<T>(items: Vec<T>, page: PageParams) -> Paged<T> {
    let count = items.len() as i64;
    let results = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    Paged { count, results }
}

fn route_detail(inner: &Inner, route_id: Uuid) -> Option<RouteDetail> {
    let route = inner.routes.get(&route_id)?.clone();
    let source = inner.airports.get(&route.source_id)?.clone();
    let destination = inner.airports.get(&route.destination_id)?.clone();
    Some(RouteDetail {
        route,
        source,
        destination,
    })
}

fn airplane_detail(inner: &Inner, airplane_id: Uuid) -> Option<AirplaneDetail> {
    let airplane = inner.airplanes.get(&airplane_id)?.clone();
    let airplane_type = inner.airplane_types.get(&airplane.airplane_type_id)?.clone();
    Some(AirplaneDetail {
        airplane,
        airplane_type,
    })
}

fn flight_record(inner: &Inner, flight: &Flight) -> DomainResult<FlightRecord> {
    let route = route_detail(inner, flight.route_id)
        .ok_or_else(|| DomainError::Storage("flight references a missing route".into()))?;
    let airplane = airplane_detail(inner, flight.airplane_id)
        .ok_or_else(|| DomainError::Storage("flight references a missing airplane".into()))?;

    let mut crew: Vec<Crew> = inner
        .flight_crew
        .get(&flight.id)
        .into_iter()
        .flatten()
        .filter_map(|id| inner.crews.get(id).cloned())
        .collect();
    crew.sort_by(|a, b| {
        a.last_name
            .cmp(&b.last_name)
            .then_with(|| a.first_name.cmp(&b.first_name))
    });

    let booked = inner
        .tickets
        .iter()
        .filter(|ticket| ticket.flight_id == flight.id)
        .count() as i64;

    Ok(FlightRecord {
        flight: flight.clone(),
        route,
        airplane,
        crew,
        booked,
    })
}

fn order_record(inner: &Inner, order: &Order) -> OrderRecord {
    let tickets = inner
        .tickets
        .iter()
        .filter(|ticket| ticket.order_id == order.id)
        .cloned()
        .collect();
    let user_email = inner
        .users
        .get(&order.user_id)
        .map(|user| user.email.clone())
        .unwrap_or_default();
    OrderRecord {
        order: order.clone(),
        tickets,
        user_email,
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> DomainResult<User> {
        let mut inner = self.inner.lock().await;

        if inner.users.values().any(|user| user.email == new_user.email) {
            return Err(DomainError::Conflict("email"));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            is_staff: new_user.is_staff,
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> DomainResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.values().find(|user| user.email == email).cloned())
    }

    async fn update_user(
        &self,
        id: Uuid,
        email: Option<String>,
        password_hash: Option<String>,
    ) -> DomainResult<User> {
        let mut inner = self.inner.lock().await;

        if let Some(email) = &email {
            let taken = inner
                .users
                .values()
                .any(|user| user.email == *email && user.id != id);
            if taken {
                return Err(DomainError::Conflict("email"));
            }
        }

        let user = inner.users.get_mut(&id).ok_or(DomainError::NotFound("user"))?;
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(password_hash) = password_hash {
            user.password_hash = password_hash;
        }
        Ok(user.clone())
    }
}

#[async_trait]
impl AirportRepository for MemoryStore {
    async fn create_airport(&self, name: &str, closest_big_city: &str) -> DomainResult<Airport> {
        let mut inner = self.inner.lock().await;
        let airport = Airport {
            id: Uuid::new_v4(),
            name: name.to_string(),
            closest_big_city: closest_big_city.to_string(),
        };
        inner.airports.insert(airport.id, airport.clone());
        Ok(airport)
    }

    async fn get_airport(&self, id: Uuid) -> DomainResult<Option<Airport>> {
        let inner = self.inner.lock().await;
        Ok(inner.airports.get(&id).cloned())
    }

    async fn list_airports(&self, city: Option<&str>) -> DomainResult<Vec<Airport>> {
        let inner = self.inner.lock().await;
        let mut airports: Vec<Airport> = inner
            .airports
            .values()
            .filter(|airport| city_matches(&airport.closest_big_city, city))
            .cloned()
            .collect();
        airports.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(airports)
    }
}

#[async_trait]
impl CrewRepository for MemoryStore {
    async fn create_crew(&self, draft: CrewDraft) -> DomainResult<Crew> {
        let mut inner = self.inner.lock().await;
        let crew = Crew {
            id: Uuid::new_v4(),
            first_name: draft.first_name,
            last_name: draft.last_name,
        };
        inner.crews.insert(crew.id, crew.clone());
        Ok(crew)
    }

    async fn get_crew(&self, id: Uuid) -> DomainResult<Option<Crew>> {
        let inner = self.inner.lock().await;
        Ok(inner.crews.get(&id).cloned())
    }

    async fn list_crew(&self) -> DomainResult<Vec<Crew>> {
        let inner = self.inner.lock().await;
        let mut crew: Vec<Crew> = inner.crews.values().cloned().collect();
        crew.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
        });
        Ok(crew)
    }

    async fn update_crew(&self, id: Uuid, draft: CrewDraft) -> DomainResult<Crew> {
        let mut inner = self.inner.lock().await;
        let crew = inner
            .crews
            .get_mut(&id)
            .ok_or(DomainError::NotFound("crew member"))?;
        crew.first_name = draft.first_name;
        crew.last_name = draft.last_name;
        Ok(crew.clone())
    }

    async fn delete_crew(&self, id: Uuid) -> DomainResult<()> {
        let mut inner = self.inner.lock().await;
        inner
            .crews
            .remove(&id)
            .map(|_| ())
            .ok_or(DomainError::NotFound("crew member"))
    }
}

#[async_trait]
impl FleetRepository for MemoryStore {
    async fn create_airplane_type(&self, name: &str) -> DomainResult<AirplaneType> {
        let mut inner = self.inner.lock().await;
        let airplane_type = AirplaneType {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        inner
            .airplane_types
            .insert(airplane_type.id, airplane_type.clone());
        Ok(airplane_type)
    }

    async fn list_airplane_types(&self) -> DomainResult<Vec<AirplaneType>> {
        let inner = self.inner.lock().await;
        let mut types: Vec<AirplaneType> = inner.airplane_types.values().cloned().collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    async fn create_airplane(&self, draft: AirplaneDraft) -> DomainResult<AirplaneDetail> {
        let mut inner = self.inner.lock().await;

        let airplane_type = inner
            .airplane_types
            .get(&draft.airplane_type_id)
            .cloned()
            .ok_or(DomainError::NotFound("airplane type"))?;

        let airplane = Airplane {
            id: Uuid::new_v4(),
            name: draft.name,
            rows: draft.rows,
            seats_in_row: draft.seats_in_row,
            airplane_type_id: draft.airplane_type_id,
        };
        inner.airplanes.insert(airplane.id, airplane.clone());

        Ok(AirplaneDetail {
            airplane,
            airplane_type,
        })
    }

    async fn list_airplanes(&self) -> DomainResult<Vec<AirplaneDetail>> {
        let inner = self.inner.lock().await;
        let mut airplanes: Vec<AirplaneDetail> = inner
            .airplanes
            .keys()
            .filter_map(|id| airplane_detail(&inner, *id))
            .collect();
        airplanes.sort_by(|a, b| a.airplane.name.cmp(&b.airplane.name));
        Ok(airplanes)
    }
}

#[async_trait]
impl RouteRepository for MemoryStore {
    async fn create_route(
        &self,
        source_id: Uuid,
        destination_id: Uuid,
        distance: i32,
    ) -> DomainResult<RouteDetail> {
        let mut inner = self.inner.lock().await;

        let source = inner
            .airports
            .get(&source_id)
            .cloned()
            .ok_or(DomainError::NotFound("airport"))?;
        let destination = inner
            .airports
            .get(&destination_id)
            .cloned()
            .ok_or(DomainError::NotFound("airport"))?;

        let route = Route {
            id: Uuid::new_v4(),
            source_id,
            destination_id,
            distance,
        };
        inner.routes.insert(route.id, route.clone());

        Ok(RouteDetail {
            route,
            source,
            destination,
        })
    }

    async fn get_route(&self, id: Uuid) -> DomainResult<Option<RouteDetail>> {
        let inner = self.inner.lock().await;
        Ok(route_detail(&inner, id))
    }

    async fn list_routes(&self, filter: &RouteFilter) -> DomainResult<Vec<RouteDetail>> {
        let inner = self.inner.lock().await;
        let mut routes: Vec<RouteDetail> = inner
            .routes
            .keys()
            .filter_map(|id| route_detail(&inner, *id))
            .filter(|detail| {
                city_matches(&detail.source.closest_big_city, filter.source.as_deref())
                    && city_matches(
                        &detail.destination.closest_big_city,
                        filter.destination.as_deref(),
                    )
            })
            .collect();
        routes.sort_by(|a, b| {
            a.source
                .closest_big_city
                .cmp(&b.source.closest_big_city)
                .then_with(|| {
                    a.destination
                        .closest_big_city
                        .cmp(&b.destination.closest_big_city)
                })
        });
        Ok(routes)
    }
}

#[async_trait]
impl FlightRepository for MemoryStore {
    async fn create_flight(&self, draft: FlightDraft) -> DomainResult<FlightRecord> {
        let mut inner = self.inner.lock().await;

        if !inner.routes.contains_key(&draft.route_id) {
            return Err(DomainError::NotFound("route"));
        }
        if !inner.airplanes.contains_key(&draft.airplane_id) {
            return Err(DomainError::NotFound("airplane"));
        }
        if draft.crew.iter().any(|id| !inner.crews.contains_key(id)) {
            return Err(DomainError::NotFound("crew member"));
        }

        let flight = Flight {
            id: Uuid::new_v4(),
            route_id: draft.route_id,
            airplane_id: draft.airplane_id,
            departure_time: draft.departure_time,
            arrival_time: draft.arrival_time,
        };
        inner.flights.insert(flight.id, flight.clone());
        inner.flight_crew.insert(flight.id, draft.crew);

        flight_record(&inner, &flight)
    }

    async fn update_flight(&self, id: Uuid, draft: FlightDraft) -> DomainResult<FlightRecord> {
        let mut inner = self.inner.lock().await;

        if !inner.flights.contains_key(&id) {
            return Err(DomainError::NotFound("flight"));
        }
        if !inner.routes.contains_key(&draft.route_id) {
            return Err(DomainError::NotFound("route"));
        }
        if !inner.airplanes.contains_key(&draft.airplane_id) {
            return Err(DomainError::NotFound("airplane"));
        }
        if draft.crew.iter().any(|id| !inner.crews.contains_key(id)) {
            return Err(DomainError::NotFound("crew member"));
        }

        let flight = Flight {
            id,
            route_id: draft.route_id,
            airplane_id: draft.airplane_id,
            departure_time: draft.departure_time,
            arrival_time: draft.arrival_time,
        };
        inner.flights.insert(id, flight.clone());
        inner.flight_crew.insert(id, draft.crew);

        flight_record(&inner, &flight)
    }

    async fn get_flight(&self, id: Uuid) -> DomainResult<Option<FlightRecord>> {
        let inner = self.inner.lock().await;
        match inner.flights.get(&id) {
            Some(flight) => Ok(Some(flight_record(&inner, flight)?)),
            None => Ok(None),
        }
    }

    async fn list_flights(
        &self,
        filter: &FlightFilter,
        page: PageParams,
    ) -> DomainResult<Paged<FlightRecord>> {
        let inner = self.inner.lock().await;

        let mut records = Vec::new();
        for flight in inner.flights.values() {
            let record = flight_record(&inner, flight)?;
            let matches = city_matches(
                &record.route.source.closest_big_city,
                filter.source.as_deref(),
            ) && city_matches(
                &record.route.destination.closest_big_city,
                filter.destination.as_deref(),
            ) && filter
                .date
                .map_or(true, |date| flight.departure_time.date_naive() == date);
            if matches {
                records.push(record);
            }
        }
        records.sort_by(|a, b| {
            a.flight
                .departure_time
                .cmp(&b.flight.departure_time)
                .then_with(|| a.flight.id.cmp(&b.flight.id))
        });

        Ok(paginate(records, page))
    }

    async fn available_seats(&self, flight_id: Uuid) -> DomainResult<i64> {
        let inner = self.inner.lock().await;
        let flight = inner
            .flights
            .get(&flight_id)
            .ok_or(DomainError::NotFound("flight"))?;
        let airplane = inner
            .airplanes
            .get(&flight.airplane_id)
            .ok_or_else(|| DomainError::Storage("flight references a missing airplane".into()))?;

        let booked = inner
            .tickets
            .iter()
            .filter(|ticket| ticket.flight_id == flight_id)
            .count() as i64;
        Ok(i64::from(airplane.capacity()) - booked)
    }

    async fn taken_places(&self, flight_id: Uuid) -> DomainResult<Vec<SeatRef>> {
        let inner = self.inner.lock().await;
        if !inner.flights.contains_key(&flight_id) {
            return Err(DomainError::NotFound("flight"));
        }

        let mut places: Vec<SeatRef> = inner
            .tickets
            .iter()
            .filter(|ticket| ticket.flight_id == flight_id)
            .map(|ticket| SeatRef {
                row: ticket.row,
                seat: ticket.seat,
            })
            .collect();
        places.sort_by_key(|place| (place.row, place.seat));
        Ok(places)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn create_order(
        &self,
        user_id: Uuid,
        requests: &[SeatRequest],
    ) -> DomainResult<OrderRecord> {
        booking::ensure_not_empty(requests)?;

        let mut inner = self.inner.lock().await;

        let user_email = inner
            .users
            .get(&user_id)
            .map(|user| user.email.clone())
            .ok_or(DomainError::NotFound("user"))?;

        let order_id = Uuid::new_v4();
        let mut staged = Vec::with_capacity(requests.len());
        let mut claimed: HashSet<(Uuid, i32, i32)> = HashSet::new();

        for (position, request) in requests.iter().enumerate() {
            let flight = inner.flights.get(&request.flight).ok_or_else(|| {
                BookingError::ticket(position, TicketError::UnknownFlight(request.flight))
            })?;
            let airplane = inner.airplanes.get(&flight.airplane_id).ok_or_else(|| {
                DomainError::Storage("flight references a missing airplane".into())
            })?;

            validate_seat(request.row, request.seat, airplane)
                .map_err(|err| BookingError::ticket(position, TicketError::Seat(err)))?;

            let key = (request.flight, request.row, request.seat);
            if inner.seat_index.contains(&key) || !claimed.insert(key) {
                return Err(BookingError::ticket(
                    position,
                    TicketError::SeatTaken {
                        row: request.row,
                        seat: request.seat,
                    },
                )
                .into());
            }

            staged.push(Ticket {
                id: Uuid::new_v4(),
                row: request.row,
                seat: request.seat,
                flight_id: request.flight,
                order_id,
            });
        }

        // Every ticket checked out; commit the whole order under the lock.
        let order = Order {
            id: order_id,
            user_id,
            created_at: Utc::now(),
        };
        for ticket in &staged {
            inner
                .seat_index
                .insert((ticket.flight_id, ticket.row, ticket.seat));
        }
        inner.tickets.extend(staged.iter().cloned());
        inner.orders.insert(order_id, order.clone());
        inner.order_log.push(order_id);

        Ok(OrderRecord {
            order,
            tickets: staged,
            user_email,
        })
    }

    async fn list_orders(
        &self,
        user_id: Uuid,
        page: PageParams,
    ) -> DomainResult<Paged<OrderRecord>> {
        let inner = self.inner.lock().await;

        let records: Vec<OrderRecord> = inner
            .order_log
            .iter()
            .rev()
            .filter_map(|id| inner.orders.get(id))
            .filter(|order| order.user_id == user_id)
            .map(|order| order_record(&inner, order))
            .collect();

        Ok(paginate(records, page))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;

    struct Seeded {
        flight_id: Uuid,
        user_id: Uuid,
    }

    fn seat(flight: Uuid, row: i32, seat: i32) -> SeatRequest {
        SeatRequest { row, seat, flight }
    }

    async fn seed_flight(store: &MemoryStore) -> Seeded {
        let paris = store.create_airport("airport1", "Paris").await.unwrap();
        let berlin = store.create_airport("airport2", "Berlin").await.unwrap();
        let route = store.create_route(paris.id, berlin.id, 5000).await.unwrap();

        let airplane_type = store.create_airplane_type("type").await.unwrap();
        let airplane = store
            .create_airplane(AirplaneDraft {
                name: "test".to_string(),
                rows: 60,
                seats_in_row: 8,
                airplane_type_id: airplane_type.id,
            })
            .await
            .unwrap();

        let departure = Utc::now() + Duration::days(2);
        let flight = store
            .create_flight(FlightDraft {
                route_id: route.route.id,
                airplane_id: airplane.airplane.id,
                departure_time: departure,
                arrival_time: departure + Duration::hours(3),
                crew: vec![],
            })
            .await
            .unwrap();

        let user = store
            .create_user(NewUser {
                email: "test@user.com".to_string(),
                password_hash: "hash".to_string(),
                is_staff: false,
            })
            .await
            .unwrap();

        Seeded {
            flight_id: flight.flight.id,
            user_id: user.id,
        }
    }

    fn booking_error(err: DomainError) -> BookingError {
        match err {
            DomainError::Booking(err) => err,
            other => panic!("expected a booking error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_booking_reduces_available_seats() {
        let store = MemoryStore::new();
        let seeded = seed_flight(&store).await;

        assert_eq!(store.available_seats(seeded.flight_id).await.unwrap(), 480);

        let record = store
            .create_order(seeded.user_id, &[seat(seeded.flight_id, 1, 1)])
            .await
            .unwrap();
        assert_eq!(record.tickets.len(), 1);
        assert_eq!(record.user_email, "test@user.com");

        assert_eq!(store.available_seats(seeded.flight_id).await.unwrap(), 479);
        assert_eq!(
            store.taken_places(seeded.flight_id).await.unwrap(),
            vec![SeatRef { row: 1, seat: 1 }]
        );
    }

    #[tokio::test]
    async fn test_same_seat_cannot_be_sold_twice() {
        let store = MemoryStore::new();
        let seeded = seed_flight(&store).await;

        store
            .create_order(seeded.user_id, &[seat(seeded.flight_id, 3, 4)])
            .await
            .unwrap();

        let err = store
            .create_order(seeded.user_id, &[seat(seeded.flight_id, 3, 4)])
            .await
            .unwrap_err();
        assert_eq!(
            booking_error(err),
            BookingError::Ticket {
                position: 0,
                source: TicketError::SeatTaken { row: 3, seat: 4 },
            }
        );

        let orders = store
            .list_orders(seeded.user_id, PageParams::default())
            .await
            .unwrap();
        assert_eq!(orders.count, 1);
    }

    #[tokio::test]
    async fn test_rejected_order_leaves_nothing_behind() {
        let store = MemoryStore::new();
        let seeded = seed_flight(&store).await;

        // Third ticket is out of bounds, so the first two must not survive.
        let err = store
            .create_order(
                seeded.user_id,
                &[
                    seat(seeded.flight_id, 1, 1),
                    seat(seeded.flight_id, 1, 2),
                    seat(seeded.flight_id, 0, 1),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(
            booking_error(err),
            BookingError::Ticket { position: 2, .. }
        ));

        assert_eq!(store.available_seats(seeded.flight_id).await.unwrap(), 480);
        assert!(store.taken_places(seeded.flight_id).await.unwrap().is_empty());

        let orders = store
            .list_orders(seeded.user_id, PageParams::default())
            .await
            .unwrap();
        assert_eq!(orders.count, 0);
    }

    #[tokio::test]
    async fn test_duplicate_seat_within_one_submission() {
        let store = MemoryStore::new();
        let seeded = seed_flight(&store).await;

        let err = store
            .create_order(
                seeded.user_id,
                &[seat(seeded.flight_id, 2, 2), seat(seeded.flight_id, 2, 2)],
            )
            .await
            .unwrap_err();
        assert_eq!(
            booking_error(err),
            BookingError::Ticket {
                position: 1,
                source: TicketError::SeatTaken { row: 2, seat: 2 },
            }
        );

        assert_eq!(store.available_seats(seeded.flight_id).await.unwrap(), 480);
    }

    #[tokio::test]
    async fn test_unknown_flight_in_submission() {
        let store = MemoryStore::new();
        let seeded = seed_flight(&store).await;
        let ghost = Uuid::new_v4();

        let err = store
            .create_order(
                seeded.user_id,
                &[seat(seeded.flight_id, 1, 1), seat(ghost, 1, 1)],
            )
            .await
            .unwrap_err();
        assert_eq!(
            booking_error(err),
            BookingError::Ticket {
                position: 1,
                source: TicketError::UnknownFlight(ghost),
            }
        );

        assert_eq!(store.available_seats(seeded.flight_id).await.unwrap(), 480);
    }

    #[tokio::test]
    async fn test_empty_submission_is_rejected() {
        let store = MemoryStore::new();
        let seeded = seed_flight(&store).await;

        let err = store.create_order(seeded.user_id, &[]).await.unwrap_err();
        assert_eq!(booking_error(err), BookingError::EmptyOrder);
    }

    #[tokio::test]
    async fn test_concurrent_orders_for_one_seat() {
        let store = Arc::new(MemoryStore::new());
        let seeded = seed_flight(&store).await;

        let first = tokio::spawn({
            let store = Arc::clone(&store);
            let flight_id = seeded.flight_id;
            let user_id = seeded.user_id;
            async move { store.create_order(user_id, &[seat(flight_id, 5, 5)]).await }
        });
        let second = tokio::spawn({
            let store = Arc::clone(&store);
            let flight_id = seeded.flight_id;
            let user_id = seeded.user_id;
            async move { store.create_order(user_id, &[seat(flight_id, 5, 5)]).await }
        });

        let first = first.await.unwrap();
        let second = second.await.unwrap();

        assert!(
            first.is_ok() ^ second.is_ok(),
            "exactly one racer may win the seat"
        );
        assert_eq!(store.available_seats(seeded.flight_id).await.unwrap(), 479);
    }

    #[tokio::test]
    async fn test_orders_are_scoped_to_their_user() {
        let store = MemoryStore::new();
        let seeded = seed_flight(&store).await;
        let other = store
            .create_user(NewUser {
                email: "other@user.com".to_string(),
                password_hash: "hash".to_string(),
                is_staff: false,
            })
            .await
            .unwrap();

        store
            .create_order(seeded.user_id, &[seat(seeded.flight_id, 1, 1)])
            .await
            .unwrap();
        store
            .create_order(other.id, &[seat(seeded.flight_id, 1, 2)])
            .await
            .unwrap();

        let mine = store
            .list_orders(seeded.user_id, PageParams::default())
            .await
            .unwrap();
        assert_eq!(mine.count, 1);
        assert_eq!(mine.results[0].user_email, "test@user.com");

        let theirs = store
            .list_orders(other.id, PageParams::default())
            .await
            .unwrap();
        assert_eq!(theirs.count, 1);
        assert_eq!(theirs.results[0].user_email, "other@user.com");
    }

    #[tokio::test]
    async fn test_order_listing_is_newest_first_and_paged() {
        let store = MemoryStore::new();
        let seeded = seed_flight(&store).await;

        for row in 1..=3 {
            store
                .create_order(seeded.user_id, &[seat(seeded.flight_id, row, 1)])
                .await
                .unwrap();
        }

        let page = store
            .list_orders(seeded.user_id, PageParams::new(Some(1), Some(2)))
            .await
            .unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(page.results.len(), 2);
        // Newest first: the last order placed was for row 3.
        assert_eq!(page.results[0].tickets[0].row, 3);

        let page = store
            .list_orders(seeded.user_id, PageParams::new(Some(2), Some(2)))
            .await
            .unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].tickets[0].row, 1);
    }

    #[tokio::test]
    async fn test_flight_filters() {
        let store = MemoryStore::new();
        let seeded = seed_flight(&store).await;

        let all = store
            .list_flights(&FlightFilter::default(), PageParams::default())
            .await
            .unwrap();
        assert_eq!(all.count, 1);

        // Substring match on the source city is case-insensitive.
        let from_paris = store
            .list_flights(
                &FlightFilter {
                    source: Some("par".to_string()),
                    ..Default::default()
                },
                PageParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(from_paris.count, 1);
        assert_eq!(from_paris.results[0].flight.id, seeded.flight_id);

        let from_nowhere = store
            .list_flights(
                &FlightFilter {
                    source: Some("Reykjavik".to_string()),
                    ..Default::default()
                },
                PageParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(from_nowhere.count, 0);

        let departure_date = (Utc::now() + Duration::days(2)).date_naive();
        let on_date = store
            .list_flights(
                &FlightFilter {
                    date: Some(departure_date),
                    ..Default::default()
                },
                PageParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(on_date.count, 1);

        let wrong_date = store
            .list_flights(
                &FlightFilter {
                    date: Some(departure_date + Duration::days(30)),
                    ..Default::default()
                },
                PageParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(wrong_date.count, 0);
    }

    #[tokio::test]
    async fn test_airport_city_filter() {
        let store = MemoryStore::new();
        seed_flight(&store).await;

        let all = store.list_airports(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let paris = store.list_airports(Some("PARIS")).await.unwrap();
        assert_eq!(paris.len(), 1);
        assert_eq!(paris[0].closest_big_city, "Paris");
    }

    #[tokio::test]
    async fn test_crew_update_and_delete() {
        let store = MemoryStore::new();
        let crew = store
            .create_crew(CrewDraft {
                first_name: "Amelia".to_string(),
                last_name: "Earhart".to_string(),
            })
            .await
            .unwrap();

        let updated = store
            .update_crew(
                crew.id,
                CrewDraft {
                    first_name: "Amy".to_string(),
                    last_name: "Johnson".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.full_name(), "Amy Johnson");

        store.delete_crew(crew.id).await.unwrap();
        assert!(store.get_crew(crew.id).await.unwrap().is_none());

        let err = store.delete_crew(crew.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound("crew member")));
    }

    #[tokio::test]
    async fn test_available_seats_for_unknown_flight() {
        let store = MemoryStore::new();
        seed_flight(&store).await;

        let err = store.available_seats(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound("flight")));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        let seeded = seed_flight(&store).await;

        let err = store
            .create_user(NewUser {
                email: "test@user.com".to_string(),
                password_hash: "hash".to_string(),
                is_staff: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict("email")));

        // The existing account is untouched.
        let user = store.get_user(seeded.user_id).await.unwrap().unwrap();
        assert_eq!(user.email, "test@user.com");
    }
}
