//! Edition weather HTTP endpoints (admin).
//!
//! - POST /api/v1/admin/editions/:id/weather?force=bool
//! - GET  /api/v1/admin/editions/:id/weather

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::AppState;
use crate::db::models::EditionWeatherRow;
use crate::errors::{AppError, ErrorResponse};
use crate::services::edition_weather;
use crate::services::weather::EditionWeather;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct FetchWeatherQuery {
    /// Fetch again even if weather is already stored
    #[serde(default)]
    pub force: bool,
}

/// Edition fields relevant to weather, with its competition.
#[derive(Debug, Serialize, ToSchema)]
pub struct EditionSummary {
    /// Edition UUID
    pub id: Uuid,
    /// Edition year
    pub year: i32,
    /// Edition start in ISO 8601 / RFC 3339 format
    pub start_date: String,
    /// Whether historical weather has been stored
    pub weather_fetched: bool,
    /// Parent competition UUID
    pub competition_id: Uuid,
    /// Parent competition name
    pub competition_name: String,
}

impl From<&EditionWeatherRow> for EditionSummary {
    fn from(row: &EditionWeatherRow) -> Self {
        Self {
            id: row.id,
            year: row.year,
            start_date: row.start_date.to_rfc3339(),
            weather_fetched: row.weather_fetched,
            competition_id: row.competition_id,
            competition_name: row.competition_name.clone(),
        }
    }
}

/// Response for a successful weather fetch.
#[derive(Debug, Serialize, ToSchema)]
pub struct FetchWeatherResponse {
    pub edition: EditionSummary,
    pub weather: EditionWeather,
}

/// Stored weather for an edition; `weather` is null until fetched.
#[derive(Debug, Serialize, ToSchema)]
pub struct EditionWeatherResponse {
    pub edition: EditionSummary,
    pub weather: Option<EditionWeather>,
}

impl From<EditionWeatherRow> for EditionWeatherResponse {
    fn from(row: EditionWeatherRow) -> Self {
        Self {
            edition: EditionSummary::from(&row),
            weather: row.weather.map(|json| json.0),
        }
    }
}

/// Fetch and store the historical weather for an edition.
///
/// Looks up hourly observations for the edition's start day at the edition
/// (or event) location, reduces them to a daily summary and stores it.
/// Refuses to fetch twice unless `force=true`.
#[utoipa::path(
    post,
    path = "/api/v1/admin/editions/{id}/weather",
    tag = "Editions",
    params(
        ("id" = Uuid, Path, description = "Edition UUID"),
        FetchWeatherQuery,
    ),
    responses(
        (status = 200, description = "Weather fetched and stored", body = FetchWeatherResponse),
        (status = 400, description = "Already fetched, future edition, or no location", body = ErrorResponse),
        (status = 404, description = "Edition not found or no archive data", body = ErrorResponse),
        (status = 500, description = "Malformed location or archive failure", body = ErrorResponse),
    )
)]
pub async fn fetch_edition_weather(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<FetchWeatherQuery>,
) -> Result<Json<FetchWeatherResponse>, AppError> {
    let fetched = edition_weather::fetch_weather_for_edition(
        &state.pool,
        &state.archive_client,
        &state.geo_parser,
        id,
        params.force,
    )
    .await?;

    Ok(Json(FetchWeatherResponse {
        edition: EditionSummary::from(&fetched.edition),
        weather: fetched.weather,
    }))
}

/// Get the stored weather for an edition.
#[utoipa::path(
    get,
    path = "/api/v1/admin/editions/{id}/weather",
    tag = "Editions",
    params(
        ("id" = Uuid, Path, description = "Edition UUID"),
    ),
    responses(
        (status = 200, description = "Stored weather (null if not fetched yet)", body = EditionWeatherResponse),
        (status = 404, description = "Edition not found", body = ErrorResponse),
    )
)]
pub async fn get_edition_weather(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EditionWeatherResponse>, AppError> {
    let row = edition_weather::get_edition_weather(&state.pool, id).await?;
    Ok(Json(EditionWeatherResponse::from(row)))
}
