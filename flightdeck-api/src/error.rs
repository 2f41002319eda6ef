use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use flightdeck_core::booking::{BookingError, TicketError};
use flightdeck_core::DomainError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError {
        message: String,
        field: Option<String>,
    },
    NotFoundError {
        message: String,
        field: Option<String>,
    },
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }

    pub fn validation_for(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFoundError {
            message: message.into(),
            field: None,
        }
    }
}

/// Reject blank text input with a field-scoped validation error.
pub fn require_text(field: &'static str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation_for(field, "This field may not be blank."));
    }
    Ok(())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, field) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::ValidationError { message, field } => {
                (StatusCode::BAD_REQUEST, message, field)
            }
            AppError::NotFoundError { message, field } => (StatusCode::NOT_FOUND, message, field),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": error_message,
        });
        if let Some(field) = field {
            body["field"] = json!(field);
        }

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

/// Every booking refusal points at the offending ticket via `field`, so a
/// client can highlight the exact element of its submission.
impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::EmptyOrder => AppError::ValidationError {
                message: err.to_string(),
                field: Some("tickets".to_string()),
            },
            BookingError::Ticket { position, source } => {
                let field = Some(format!("tickets[{position}]"));
                match source {
                    TicketError::UnknownFlight(_) => AppError::NotFoundError {
                        message: source.to_string(),
                        field,
                    },
                    _ => AppError::ValidationError {
                        message: source.to_string(),
                        field,
                    },
                }
            }
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Booking(err) => err.into(),
            DomainError::Schedule(err) => AppError::validation(err.to_string()),
            DomainError::NotFound(_) => AppError::not_found(err.to_string()),
            // A taken email reads as a field error on the form, not a 409.
            DomainError::Conflict(what) => {
                AppError::validation_for(what, err.to_string())
            }
            DomainError::Storage(msg) => AppError::InternalServerError(msg),
        }
    }
}
