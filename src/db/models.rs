use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::services::weather::EditionWeather;

/// Competition row as listed in the admin panel.
#[derive(Debug, Clone, FromRow)]
pub struct Competition {
    pub id: Uuid,
    pub event_id: Uuid,
    pub event_name: String,
    pub name: String,
    pub organizer_email: String,
    /// One of `pending`, `approved`, `rejected`, `cancelled`.
    pub status: String,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An edition joined with the competition/event context the weather
/// pipeline needs (fallback location, display name).
#[derive(Debug, Clone, FromRow)]
pub struct EditionContext {
    pub id: Uuid,
    pub year: i32,
    pub start_date: DateTime<Utc>,
    pub location: Option<String>,
    pub weather_fetched: bool,
    pub competition_name: String,
    pub event_location: Option<String>,
}

/// Edition fields touched by the weather pipeline, plus minimal
/// competition context for display.
#[derive(Debug, Clone, FromRow)]
pub struct EditionWeatherRow {
    pub id: Uuid,
    pub year: i32,
    pub start_date: DateTime<Utc>,
    pub weather: Option<Json<EditionWeather>>,
    pub weather_fetched: bool,
    pub competition_id: Uuid,
    pub competition_name: String,
}

/// Competition count for one status (dashboard).
#[derive(Debug, Clone, FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}
