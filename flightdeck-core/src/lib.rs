pub mod booking;
pub mod crew;
pub mod fleet;
pub mod network;
pub mod repository;
pub mod schedule;
pub mod seating;
pub mod users;

/// Top-level error for every fallible domain operation.
///
/// Validation variants stay client-correctable; `Storage` covers backend
/// failures whose details must not leak past the API boundary.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error(transparent)]
    Booking(#[from] booking::BookingError),

    #[error(transparent)]
    Schedule(#[from] schedule::ScheduleError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} is already in use")]
    Conflict(&'static str),

    #[error("storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
