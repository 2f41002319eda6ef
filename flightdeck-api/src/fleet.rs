use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use flightdeck_core::fleet::AirplaneType;
use flightdeck_core::repository::{AirplaneDetail, AirplaneDraft};

use crate::error::{require_text, AppError};
use crate::middleware::auth::{require_staff, Claims};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/airplane_types",
            get(list_airplane_types).post(create_airplane_type),
        )
        .route("/airplanes", get(list_airplanes).post(create_airplane))
}

#[derive(Debug, Clone, Serialize)]
pub struct AirplaneTypeOut {
    pub id: Uuid,
    pub name: String,
}

impl From<AirplaneType> for AirplaneTypeOut {
    fn from(airplane_type: AirplaneType) -> Self {
        Self {
            id: airplane_type.id,
            name: airplane_type.name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AirplaneTypeIn {
    name: String,
}

/// Create shape. The type is referenced by id.
#[derive(Debug, Serialize)]
struct AirplaneOut {
    id: Uuid,
    name: String,
    rows: i32,
    seats_in_row: i32,
    airplane_type: Uuid,
}

impl From<&AirplaneDetail> for AirplaneOut {
    fn from(detail: &AirplaneDetail) -> Self {
        Self {
            id: detail.airplane.id,
            name: detail.airplane.name.clone(),
            rows: detail.airplane.rows,
            seats_in_row: detail.airplane.seats_in_row,
            airplane_type: detail.airplane_type.id,
        }
    }
}

/// List shape with the computed capacity and the type inlined.
#[derive(Debug, Clone, Serialize)]
pub struct AirplaneListOut {
    pub id: Uuid,
    pub name: String,
    pub rows: i32,
    pub seats_in_row: i32,
    pub capacity: i32,
    pub airplane_type: AirplaneTypeOut,
}

impl From<AirplaneDetail> for AirplaneListOut {
    fn from(detail: AirplaneDetail) -> Self {
        let capacity = detail.airplane.capacity();
        Self {
            id: detail.airplane.id,
            name: detail.airplane.name,
            rows: detail.airplane.rows,
            seats_in_row: detail.airplane.seats_in_row,
            capacity,
            airplane_type: detail.airplane_type.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AirplaneIn {
    name: String,
    rows: i32,
    seats_in_row: i32,
    airplane_type: Uuid,
}

fn check_dimension(field: &'static str, value: i32) -> Result<(), AppError> {
    if value < 1 {
        return Err(AppError::validation_for(
            field,
            "Ensure this value is greater than or equal to 1.",
        ));
    }
    Ok(())
}

async fn create_airplane_type(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<AirplaneTypeIn>,
) -> Result<(StatusCode, Json<AirplaneTypeOut>), AppError> {
    require_staff(&claims)?;
    require_text("name", &body.name)?;

    let airplane_type = state.fleet.create_airplane_type(&body.name).await?;
    Ok((StatusCode::CREATED, Json(airplane_type.into())))
}

async fn list_airplane_types(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<AirplaneTypeOut>>, AppError> {
    require_staff(&claims)?;
    let types = state.fleet.list_airplane_types().await?;
    Ok(Json(types.into_iter().map(AirplaneTypeOut::from).collect()))
}

async fn create_airplane(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<AirplaneIn>,
) -> Result<(StatusCode, Json<AirplaneOut>), AppError> {
    require_staff(&claims)?;
    require_text("name", &body.name)?;
    check_dimension("rows", body.rows)?;
    check_dimension("seats_in_row", body.seats_in_row)?;

    let detail = state
        .fleet
        .create_airplane(AirplaneDraft {
            name: body.name,
            rows: body.rows,
            seats_in_row: body.seats_in_row,
            airplane_type_id: body.airplane_type,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(AirplaneOut::from(&detail))))
}

async fn list_airplanes(
    State(state): State<AppState>,
) -> Result<Json<Vec<AirplaneListOut>>, AppError> {
    let airplanes = state.fleet.list_airplanes().await?;
    Ok(Json(
        airplanes.into_iter().map(AirplaneListOut::from).collect(),
    ))
}
