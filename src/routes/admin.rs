//! Admin competition review and dashboard endpoints.
//!
//! - GET   /api/v1/admin/competitions?status=pending
//! - POST  /api/v1/admin/competitions/:id/approve
//! - POST  /api/v1/admin/competitions/:id/reject
//! - PATCH /api/v1/admin/competitions/:id/status
//! - GET   /api/v1/admin/dashboard

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::AppState;
use crate::db::models::Competition;
use crate::errors::{AppError, ErrorResponse};
use crate::services::admin::{self, CompetitionStatus, DashboardStats};

#[derive(Debug, Deserialize, IntoParams)]
pub struct CompetitionListQuery {
    /// Only return competitions in this status
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectRequest {
    /// Why the competition was rejected (shown to the organizer)
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusChangeRequest {
    /// Target status: pending, approved, rejected or cancelled
    pub status: String,
}

/// Competition as seen by admins.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminCompetition {
    pub id: Uuid,
    pub name: String,
    pub event_id: Uuid,
    pub event_name: String,
    pub organizer_email: String,
    /// Raw stored status (normally one of the `CompetitionStatus` values)
    pub status: String,
    pub rejection_reason: Option<String>,
    /// Submission time (RFC 3339)
    pub created_at: String,
    /// Last change (RFC 3339)
    pub updated_at: String,
}

impl From<Competition> for AdminCompetition {
    fn from(c: Competition) -> Self {
        Self {
            id: c.id,
            name: c.name,
            event_id: c.event_id,
            event_name: c.event_name,
            organizer_email: c.organizer_email,
            status: c.status,
            rejection_reason: c.rejection_reason,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

/// List competitions for review, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/admin/competitions",
    tag = "Admin",
    params(CompetitionListQuery),
    responses(
        (status = 200, description = "Competitions", body = Vec<AdminCompetition>),
        (status = 400, description = "Unknown status filter", body = ErrorResponse),
    )
)]
pub async fn list_competitions(
    State(state): State<AppState>,
    Query(params): Query<CompetitionListQuery>,
) -> Result<Json<Vec<AdminCompetition>>, AppError> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<CompetitionStatus>)
        .transpose()?;
    let competitions = admin::list_competitions(&state.pool, status).await?;
    Ok(Json(competitions.into_iter().map(AdminCompetition::from).collect()))
}

/// Approve a pending competition.
#[utoipa::path(
    post,
    path = "/api/v1/admin/competitions/{id}/approve",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Competition UUID")),
    responses(
        (status = 200, description = "Competition approved", body = AdminCompetition),
        (status = 404, description = "Competition not found", body = ErrorResponse),
        (status = 409, description = "Competition is not pending", body = ErrorResponse),
    )
)]
pub async fn approve_competition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdminCompetition>, AppError> {
    let competition = admin::approve_competition(&state.pool, &state.cache, id).await?;
    Ok(Json(competition.into()))
}

/// Reject a pending competition with a reason.
#[utoipa::path(
    post,
    path = "/api/v1/admin/competitions/{id}/reject",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Competition UUID")),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Competition rejected", body = AdminCompetition),
        (status = 400, description = "Missing or overlong reason", body = ErrorResponse),
        (status = 404, description = "Competition not found", body = ErrorResponse),
        (status = 409, description = "Competition is not pending", body = ErrorResponse),
    )
)]
pub async fn reject_competition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RejectRequest>,
) -> Result<Json<AdminCompetition>, AppError> {
    let competition = admin::reject_competition(&state.pool, &state.cache, id, &body.reason).await?;
    Ok(Json(competition.into()))
}

/// Move a competition to another status along the allowed transitions.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/competitions/{id}/status",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Competition UUID")),
    request_body = StatusChangeRequest,
    responses(
        (status = 200, description = "Status changed", body = AdminCompetition),
        (status = 400, description = "Unknown status, or rejection without reason", body = ErrorResponse),
        (status = 404, description = "Competition not found", body = ErrorResponse),
        (status = 409, description = "Transition not allowed", body = ErrorResponse),
    )
)]
pub async fn change_competition_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusChangeRequest>,
) -> Result<Json<AdminCompetition>, AppError> {
    let next: CompetitionStatus = body.status.parse()?;
    let competition = admin::change_competition_status(&state.pool, &state.cache, id, next).await?;
    Ok(Json(competition.into()))
}

/// Dashboard counts for competitions and editions.
#[utoipa::path(
    get,
    path = "/api/v1/admin/dashboard",
    tag = "Admin",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats),
    )
)]
pub async fn get_dashboard(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(admin::dashboard_stats(&state.pool).await?))
}
