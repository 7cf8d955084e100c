//! Public competition endpoints, served through the response cache.
//!
//! - GET /api/v1/competitions
//! - GET /api/v1/competitions/:id
//!
//! Only approved competitions are visible. Admin status changes invalidate
//! the cached entries (see `services::admin`).

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::AppState;
use crate::db::models::Competition;
use crate::db::queries;
use crate::errors::{AppError, ErrorResponse};
use crate::services::admin::CompetitionStatus;
use crate::services::cache::{competition_key, COMPETITION_LIST_KEY};

/// Competition as shown publicly (no organizer contact or review notes).
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicCompetition {
    pub id: Uuid,
    pub name: String,
    pub event_id: Uuid,
    pub event_name: String,
}

impl From<Competition> for PublicCompetition {
    fn from(c: Competition) -> Self {
        Self {
            id: c.id,
            name: c.name,
            event_id: c.event_id,
            event_name: c.event_name,
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize response: {}", e)))
}

/// List approved competitions.
#[utoipa::path(
    get,
    path = "/api/v1/competitions",
    tag = "Competitions",
    responses(
        (status = 200, description = "Approved competitions", body = Vec<PublicCompetition>),
    )
)]
pub async fn list_competitions(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    if let Some(cached) = state.cache.get(COMPETITION_LIST_KEY).await {
        return Ok(Json(cached));
    }

    let competitions =
        queries::list_competitions(&state.pool, Some(CompetitionStatus::Approved.as_str())).await?;
    let items: Vec<PublicCompetition> = competitions
        .into_iter()
        .map(PublicCompetition::from)
        .collect();

    let value = to_json(&items)?;
    state.cache.insert(COMPETITION_LIST_KEY, value.clone()).await;
    Ok(Json(value))
}

/// Get an approved competition.
#[utoipa::path(
    get,
    path = "/api/v1/competitions/{id}",
    tag = "Competitions",
    params(("id" = Uuid, Path, description = "Competition UUID")),
    responses(
        (status = 200, description = "Competition", body = PublicCompetition),
        (status = 404, description = "Competition not found or not approved", body = ErrorResponse),
    )
)]
pub async fn get_competition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let key = competition_key(id);
    if let Some(cached) = state.cache.get(&key).await {
        return Ok(Json(cached));
    }

    let competition = queries::get_competition(&state.pool, id)
        .await?
        .filter(|c| c.status == CompetitionStatus::Approved.as_str())
        .ok_or_else(|| AppError::NotFound(format!("Competition {} not found", id)))?;

    let value = to_json(&PublicCompetition::from(competition))?;
    state.cache.insert(key, value.clone()).await;
    Ok(Json(value))
}
