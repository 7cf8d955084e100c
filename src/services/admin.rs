//! Competition review workflow and dashboard statistics.
//!
//! Organizers submit competitions as `pending`; admins approve, reject, or
//! move them along the transition table in `CompetitionStatus`. Every
//! successful change invalidates the public cache entries for the
//! competition and the competition list.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::{Competition, StatusCount};
use crate::db::queries;
use crate::errors::AppError;
use crate::services::cache::ResponseCache;

/// Longest accepted rejection reason, in characters.
const MAX_REJECTION_REASON_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl CompetitionStatus {
    pub const ALL: [CompetitionStatus; 4] = [
        CompetitionStatus::Pending,
        CompetitionStatus::Approved,
        CompetitionStatus::Rejected,
        CompetitionStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Allowed admin transitions. Cancelled is terminal.
    pub fn can_transition_to(&self, next: CompetitionStatus) -> bool {
        use CompetitionStatus::*;
        matches!(
            (*self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Approved, Pending)
                | (Approved, Cancelled)
                | (Rejected, Pending)
        )
    }
}

impl fmt::Display for CompetitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompetitionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Unknown competition status '{}' (expected one of: pending, approved, rejected, cancelled)",
                    s
                ))
            })
    }
}

/// Dashboard numbers for the admin home page.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_competitions: i64,
    pub pending_competitions: i64,
    pub approved_competitions: i64,
    pub rejected_competitions: i64,
    pub cancelled_competitions: i64,
    pub total_editions: i64,
    /// Editions whose historical weather has been stored
    pub editions_with_weather: i64,
    /// Editions starting after now
    pub upcoming_editions: i64,
}

/// Validate a move from `current` to `next`.
pub fn check_transition(
    current: CompetitionStatus,
    next: CompetitionStatus,
) -> Result<(), AppError> {
    if current == next {
        return Err(AppError::InvalidTransition(format!(
            "competition is already {}",
            current
        )));
    }
    if !current.can_transition_to(next) {
        return Err(AppError::InvalidTransition(format!(
            "cannot move a competition from {} to {}",
            current, next
        )));
    }
    Ok(())
}

/// Trim and bound a rejection reason; blank reasons are refused.
pub fn normalize_rejection_reason(reason: &str) -> Result<String, AppError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::BadRequest(
            "A rejection reason is required".to_string(),
        ));
    }
    if reason.chars().count() > MAX_REJECTION_REASON_CHARS {
        return Err(AppError::BadRequest(format!(
            "Rejection reason must be at most {} characters",
            MAX_REJECTION_REASON_CHARS
        )));
    }
    Ok(reason.to_string())
}

pub async fn list_competitions(
    pool: &PgPool,
    status: Option<CompetitionStatus>,
) -> Result<Vec<Competition>, AppError> {
    Ok(queries::list_competitions(pool, status.as_ref().map(CompetitionStatus::as_str)).await?)
}

pub async fn approve_competition(
    pool: &PgPool,
    cache: &ResponseCache,
    id: Uuid,
) -> Result<Competition, AppError> {
    transition(pool, cache, id, |current| {
        if current != CompetitionStatus::Pending {
            return Err(AppError::InvalidTransition(format!(
                "only pending competitions can be approved (current: {})",
                current
            )));
        }
        Ok((CompetitionStatus::Approved, None))
    })
    .await
}

pub async fn reject_competition(
    pool: &PgPool,
    cache: &ResponseCache,
    id: Uuid,
    reason: &str,
) -> Result<Competition, AppError> {
    let reason = normalize_rejection_reason(reason)?;
    transition(pool, cache, id, move |current| {
        if current != CompetitionStatus::Pending {
            return Err(AppError::InvalidTransition(format!(
                "only pending competitions can be rejected (current: {})",
                current
            )));
        }
        Ok((CompetitionStatus::Rejected, Some(reason)))
    })
    .await
}

pub async fn change_competition_status(
    pool: &PgPool,
    cache: &ResponseCache,
    id: Uuid,
    next: CompetitionStatus,
) -> Result<Competition, AppError> {
    if next == CompetitionStatus::Rejected {
        return Err(AppError::BadRequest(
            "Rejecting a competition requires a reason; use the reject endpoint".to_string(),
        ));
    }
    transition(pool, cache, id, |current| {
        check_transition(current, next)?;
        Ok((next, None))
    })
    .await
}

/// Load, validate via `decide`, conditionally update, then invalidate caches.
///
/// `decide` maps the current status to the new status and rejection reason.
async fn transition<F>(
    pool: &PgPool,
    cache: &ResponseCache,
    id: Uuid,
    decide: F,
) -> Result<Competition, AppError>
where
    F: FnOnce(CompetitionStatus) -> Result<(CompetitionStatus, Option<String>), AppError>,
{
    let competition = queries::get_competition(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Competition {} not found", id)))?;
    let current: CompetitionStatus = competition.status.parse().map_err(|_| {
        AppError::InternalError(format!(
            "Competition {} has unknown status '{}'",
            id, competition.status
        ))
    })?;

    let (next, reason) = decide(current)?;

    let updated = queries::update_competition_status(
        pool,
        id,
        current.as_str(),
        next.as_str(),
        reason.as_deref(),
    )
    .await?
    .ok_or_else(|| {
        AppError::InvalidTransition(format!(
            "competition {} changed status concurrently; reload and retry",
            id
        ))
    })?;

    cache.invalidate_competition(id).await;
    tracing::info!("Competition {} moved from {} to {}", id, current, next);

    Ok(updated)
}

/// Assemble dashboard numbers; the two count queries run concurrently.
pub async fn dashboard_stats(pool: &PgPool) -> Result<DashboardStats, AppError> {
    let (by_status, edition_counts) = futures::try_join!(
        queries::count_competitions_by_status(pool),
        queries::count_editions(pool, Utc::now()),
    )?;

    Ok(summarize(&by_status, edition_counts))
}

fn summarize(by_status: &[StatusCount], edition_counts: (i64, i64, i64)) -> DashboardStats {
    let (total_editions, editions_with_weather, upcoming_editions) = edition_counts;
    let count_for = |status: CompetitionStatus| {
        by_status
            .iter()
            .find(|row| row.status == status.as_str())
            .map(|row| row.count)
            .unwrap_or(0)
    };

    DashboardStats {
        total_competitions: by_status.iter().map(|row| row.count).sum(),
        pending_competitions: count_for(CompetitionStatus::Pending),
        approved_competitions: count_for(CompetitionStatus::Approved),
        rejected_competitions: count_for(CompetitionStatus::Rejected),
        cancelled_competitions: count_for(CompetitionStatus::Cancelled),
        total_editions,
        editions_with_weather,
        upcoming_editions,
    }
}
