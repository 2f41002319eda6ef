use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scheduled departure of one airplane over one route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    pub route_id: Uuid,
    pub airplane_id: Uuid,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
}

/// Whether a schedule change targets a new flight or an existing one.
///
/// The two cases carry genuinely different departure policies, so the guard
/// branches on this explicitly instead of applying one uniform rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleChange {
    Create,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("flights must be created no later than a day before departure")]
    DepartureTooSoon,

    #[error("departure time must be in future")]
    DepartureNotInFuture,

    #[error("arrival time must be later than departure time")]
    ArrivalBeforeDeparture,
}

/// Validate a flight's time window.
///
/// New flights need at least one day of lead time; updates only need the
/// departure to still be in the future. The departure rule is checked before
/// the arrival-after-departure rule in both cases.
pub fn validate_schedule(
    change: ScheduleChange,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), ScheduleError> {
    match change {
        ScheduleChange::Create => {
            if departure_time < now + Duration::days(1) {
                return Err(ScheduleError::DepartureTooSoon);
            }
        }
        ScheduleChange::Update => {
            if departure_time <= now {
                return Err(ScheduleError::DepartureNotInFuture);
            }
        }
    }

    if arrival_time <= departure_time {
        return Err(ScheduleError::ArrivalBeforeDeparture);
    }

    Ok(())
}
