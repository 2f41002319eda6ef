use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use flightdeck_core::crew::Crew;
use flightdeck_core::repository::CrewDraft;

use crate::error::{require_text, AppError};
use crate::middleware::auth::{require_staff, Claims};
use crate::state::AppState;

/// Crew management is an admin-only surface, reads included.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/crews", get(list_crew).post(create_crew))
        .route(
            "/crews/{id}",
            get(get_crew)
                .put(update_crew)
                .patch(patch_crew)
                .delete(delete_crew),
        )
}

#[derive(Debug, Clone, Serialize)]
pub struct CrewOut {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
}

impl From<Crew> for CrewOut {
    fn from(crew: Crew) -> Self {
        Self {
            id: crew.id,
            first_name: crew.first_name,
            last_name: crew.last_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CrewIn {
    first_name: String,
    last_name: String,
}

#[derive(Debug, Deserialize)]
struct CrewPatchIn {
    first_name: Option<String>,
    last_name: Option<String>,
}

fn draft_from(body: CrewIn) -> Result<CrewDraft, AppError> {
    require_text("first_name", &body.first_name)?;
    require_text("last_name", &body.last_name)?;
    Ok(CrewDraft {
        first_name: body.first_name,
        last_name: body.last_name,
    })
}

async fn create_crew(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<CrewIn>,
) -> Result<(StatusCode, Json<CrewOut>), AppError> {
    require_staff(&claims)?;
    let crew = state.crews.create_crew(draft_from(body)?).await?;
    Ok((StatusCode::CREATED, Json(crew.into())))
}

async fn list_crew(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<CrewOut>>, AppError> {
    require_staff(&claims)?;
    let crew = state.crews.list_crew().await?;
    Ok(Json(crew.into_iter().map(CrewOut::from).collect()))
}

async fn get_crew(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<CrewOut>, AppError> {
    require_staff(&claims)?;
    let crew = state
        .crews
        .get_crew(id)
        .await?
        .ok_or_else(|| AppError::not_found("crew member not found"))?;

    Ok(Json(crew.into()))
}

async fn update_crew(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(body): Json<CrewIn>,
) -> Result<Json<CrewOut>, AppError> {
    require_staff(&claims)?;
    let crew = state.crews.update_crew(id, draft_from(body)?).await?;
    Ok(Json(crew.into()))
}

async fn patch_crew(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(body): Json<CrewPatchIn>,
) -> Result<Json<CrewOut>, AppError> {
    require_staff(&claims)?;

    let current = state
        .crews
        .get_crew(id)
        .await?
        .ok_or_else(|| AppError::not_found("crew member not found"))?;

    let draft = draft_from(CrewIn {
        first_name: body.first_name.unwrap_or(current.first_name),
        last_name: body.last_name.unwrap_or(current.last_name),
    })?;

    let crew = state.crews.update_crew(id, draft).await?;
    Ok(Json(crew.into()))
}

async fn delete_crew(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_staff(&claims)?;
    state.crews.delete_crew(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
