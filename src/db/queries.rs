use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Competition, EditionContext, EditionWeatherRow, StatusCount};
use crate::services::weather::EditionWeather;

const COMPETITION_COLUMNS: &str = "c.id, c.event_id, ev.name AS event_name, c.name, \
     c.organizer_email, c.status, c.rejection_reason, c.created_at, c.updated_at";

/// List competitions for the admin panel, newest first, optionally by status.
pub async fn list_competitions(
    pool: &PgPool,
    status: Option<&str>,
) -> Result<Vec<Competition>, sqlx::Error> {
    sqlx::query_as::<_, Competition>(&format!(
        "SELECT {COMPETITION_COLUMNS}
         FROM competitions c
         JOIN events ev ON ev.id = c.event_id
         WHERE ($1::TEXT IS NULL OR c.status = $1)
         ORDER BY c.created_at DESC"
    ))
    .bind(status)
    .fetch_all(pool)
    .await
}

/// Get a single competition by ID.
pub async fn get_competition(pool: &PgPool, id: Uuid) -> Result<Option<Competition>, sqlx::Error> {
    sqlx::query_as::<_, Competition>(&format!(
        "SELECT {COMPETITION_COLUMNS}
         FROM competitions c
         JOIN events ev ON ev.id = c.event_id
         WHERE c.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Set a competition's status.
///
/// The `WHERE status = $2` clause makes the update conditional on the status
/// the caller validated against; `None` means another request changed it first.
pub async fn update_competition_status(
    pool: &PgPool,
    id: Uuid,
    expected_status: &str,
    new_status: &str,
    rejection_reason: Option<&str>,
) -> Result<Option<Competition>, sqlx::Error> {
    sqlx::query_as::<_, Competition>(&format!(
        "WITH updated AS (
             UPDATE competitions
             SET status = $3, rejection_reason = $4, updated_at = NOW()
             WHERE id = $1 AND status = $2
             RETURNING *
         )
         SELECT {COMPETITION_COLUMNS}
         FROM updated c
         JOIN events ev ON ev.id = c.event_id"
    ))
    .bind(id)
    .bind(expected_status)
    .bind(new_status)
    .bind(rejection_reason)
    .fetch_optional(pool)
    .await
}

/// Number of competitions per status.
pub async fn count_competitions_by_status(pool: &PgPool) -> Result<Vec<StatusCount>, sqlx::Error> {
    sqlx::query_as::<_, StatusCount>(
        "SELECT status, COUNT(*) AS count FROM competitions GROUP BY status ORDER BY status",
    )
    .fetch_all(pool)
    .await
}

/// Edition totals: all, with weather fetched, starting after `now`.
pub async fn count_editions(pool: &PgPool, now: DateTime<Utc>) -> Result<(i64, i64, i64), sqlx::Error> {
    sqlx::query_as::<_, (i64, i64, i64)>(
        "SELECT COUNT(*),
                COUNT(*) FILTER (WHERE weather_fetched),
                COUNT(*) FILTER (WHERE start_date > $1)
         FROM editions",
    )
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Load an edition with its competition and event ancestry.
pub async fn get_edition_context(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<EditionContext>, sqlx::Error> {
    sqlx::query_as::<_, EditionContext>(
        "SELECT e.id, e.year, e.start_date, e.location, e.weather_fetched,
                c.name AS competition_name, ev.location AS event_location
         FROM editions e
         JOIN competitions c ON c.id = e.competition_id
         JOIN events ev ON ev.id = c.event_id
         WHERE e.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Load an edition's stored weather with minimal competition context.
pub async fn get_edition_weather(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<EditionWeatherRow>, sqlx::Error> {
    sqlx::query_as::<_, EditionWeatherRow>(
        "SELECT e.id, e.year, e.start_date, e.weather, e.weather_fetched,
                c.id AS competition_id, c.name AS competition_name
         FROM editions e
         JOIN competitions c ON c.id = e.competition_id
         WHERE e.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Store computed weather and mark the edition as fetched (single-row update).
pub async fn save_edition_weather(
    pool: &PgPool,
    id: Uuid,
    weather: &EditionWeather,
) -> Result<Option<EditionWeatherRow>, sqlx::Error> {
    sqlx::query_as::<_, EditionWeatherRow>(
        "WITH updated AS (
             UPDATE editions
             SET weather = $2, weather_fetched = TRUE, updated_at = NOW()
             WHERE id = $1
             RETURNING id, year, start_date, weather, weather_fetched, competition_id
         )
         SELECT u.id, u.year, u.start_date, u.weather, u.weather_fetched,
                c.id AS competition_id, c.name AS competition_name
         FROM updated u
         JOIN competitions c ON c.id = u.competition_id",
    )
    .bind(id)
    .bind(Json(weather))
    .fetch_optional(pool)
    .await
}
