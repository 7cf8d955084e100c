//! Historical weather for competition editions.
//!
//! An edition starts UNFETCHED (`weather_fetched = false`). A successful
//! fetch stores the day's summary and moves it to FETCHED; after that only a
//! forced fetch calls the archive again.
//!
//! Steps run strictly in order: preconditions, coordinates, archive call,
//! aggregation, single-row write-back. Concurrent fetches for the same
//! edition are not serialized; both may reach the archive and the last write
//! wins.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{EditionContext, EditionWeatherRow};
use crate::db::queries;
use crate::errors::AppError;
use crate::services::geo::{GeoPoint, GeoPointParser};
use crate::services::open_meteo::ArchiveClient;
use crate::services::weather::{aggregate_day, EditionWeather};

/// Result of a successful fetch: the updated edition and the computed weather.
#[derive(Debug, Clone)]
pub struct FetchedEditionWeather {
    pub edition: EditionWeatherRow,
    pub weather: EditionWeather,
}

/// Reject fetches that are redundant or cannot have data yet.
///
/// The already-fetched check runs first so a forced flag is the only way
/// past a stored result, whatever the date.
pub fn check_fetch_preconditions(
    edition: &EditionContext,
    force: bool,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if edition.weather_fetched && !force {
        return Err(AppError::AlreadyFetched(edition.id));
    }
    if edition.start_date > now {
        return Err(AppError::FutureDate(edition.id));
    }
    Ok(())
}

/// Edition location if set, otherwise the event's.
pub fn resolve_coordinates(
    edition: &EditionContext,
    parser: &impl GeoPointParser,
) -> Result<GeoPoint, AppError> {
    let geometry = edition
        .location
        .as_deref()
        .or(edition.event_location.as_deref())
        .ok_or(AppError::NoLocation(edition.id))?;
    parser.parse(geometry)
}

/// Everything between loading the edition and persisting the result.
pub async fn compute_edition_weather(
    edition: &EditionContext,
    force: bool,
    now: DateTime<Utc>,
    parser: &impl GeoPointParser,
    client: &ArchiveClient,
) -> Result<EditionWeather, AppError> {
    check_fetch_preconditions(edition, force, now)?;
    let point = resolve_coordinates(edition, parser)?;

    let date = edition.start_date.date_naive();
    let hourly = client
        .fetch_day(point.latitude, point.longitude, date)
        .await?;

    Ok(aggregate_day(date, &hourly))
}

/// Fetch, aggregate and store the historical weather for an edition.
pub async fn fetch_weather_for_edition(
    pool: &PgPool,
    client: &ArchiveClient,
    parser: &impl GeoPointParser,
    edition_id: Uuid,
    force: bool,
) -> Result<FetchedEditionWeather, AppError> {
    let edition = queries::get_edition_context(pool, edition_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Edition {} not found", edition_id)))?;

    let weather = compute_edition_weather(&edition, force, Utc::now(), parser, client).await?;

    let updated = queries::save_edition_weather(pool, edition_id, &weather)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Edition {} not found", edition_id)))?;

    tracing::info!(
        "Stored weather for edition {} ({} {}): {:?}, {} mm",
        edition_id,
        edition.competition_name,
        edition.year,
        weather.condition,
        weather.precipitation
    );

    Ok(FetchedEditionWeather {
        edition: updated,
        weather,
    })
}

/// Read an edition's stored weather. No side effects.
pub async fn get_edition_weather(
    pool: &PgPool,
    edition_id: Uuid,
) -> Result<EditionWeatherRow, AppError> {
    queries::get_edition_weather(pool, edition_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Edition {} not found", edition_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::geo::WktPointParser;
    use crate::services::weather::WeatherCondition;
    use chrono::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn now() -> DateTime<Utc> {
        "2024-06-01T12:00:00Z".parse().unwrap()
    }

    fn edition() -> EditionContext {
        EditionContext {
            id: Uuid::new_v4(),
            year: 2024,
            start_date: "2024-05-12T07:30:00Z".parse().unwrap(),
            location: Some("POINT(-3.7038 40.4168)".to_string()),
            weather_fetched: false,
            competition_name: "Trail de la Sierra".to_string(),
            event_location: Some("POINT(2.1734 41.3851)".to_string()),
        }
    }

    fn client(server: &MockServer) -> ArchiveClient {
        ArchiveClient::new(&server.uri(), std::time::Duration::from_secs(5)).unwrap()
    }

    fn archive_body(precipitation: &[f64], cloud_cover: f64) -> serde_json::Value {
        let hours = precipitation.len();
        serde_json::json!({
            "hourly": {
                "time": (0..hours).map(|h| format!("2024-05-12T{:02}:00", h)).collect::<Vec<_>>(),
                "temperature_2m": vec![18.0; hours],
                "relative_humidity_2m": vec![60.0; hours],
                "precipitation": precipitation,
                "surface_pressure": vec![940.0; hours],
                "cloud_cover": vec![cloud_cover; hours],
                "wind_speed_10m": vec![8.0; hours],
                "wind_direction_10m": vec![180.0; hours]
            }
        })
    }

    /// A server that fails the test on drop if the archive is called.
    async fn silent_archive() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_preconditions_pass_for_unfetched_past_edition() {
        assert!(check_fetch_preconditions(&edition(), false, now()).is_ok());
    }

    #[test]
    fn test_already_fetched_without_force_fails() {
        let mut e = edition();
        e.weather_fetched = true;
        assert!(matches!(
            check_fetch_preconditions(&e, false, now()),
            Err(AppError::AlreadyFetched(id)) if id == e.id
        ));
    }

    #[test]
    fn test_force_allows_refetch() {
        let mut e = edition();
        e.weather_fetched = true;
        assert!(check_fetch_preconditions(&e, true, now()).is_ok());
    }

    #[test]
    fn test_future_edition_fails() {
        let mut e = edition();
        e.start_date = now() + Duration::days(3);
        assert!(matches!(
            check_fetch_preconditions(&e, true, now()),
            Err(AppError::FutureDate(_))
        ));
    }

    #[test]
    fn test_edition_starting_now_is_not_future() {
        let mut e = edition();
        e.start_date = now();
        assert!(check_fetch_preconditions(&e, false, now()).is_ok());
    }

    #[test]
    fn test_coordinates_prefer_edition_location() {
        let point = resolve_coordinates(&edition(), &WktPointParser).unwrap();
        assert_eq!(point, GeoPoint { longitude: -3.7038, latitude: 40.4168 });
    }

    #[test]
    fn test_coordinates_fall_back_to_event() {
        let mut e = edition();
        e.location = None;
        let point = resolve_coordinates(&e, &WktPointParser).unwrap();
        assert_eq!(point, GeoPoint { longitude: 2.1734, latitude: 41.3851 });
    }

    #[test]
    fn test_no_location_anywhere() {
        let mut e = edition();
        e.location = None;
        e.event_location = None;
        assert!(matches!(
            resolve_coordinates(&e, &WktPointParser),
            Err(AppError::NoLocation(_))
        ));
    }

    #[test]
    fn test_malformed_location_is_format_error() {
        let mut e = edition();
        e.location = Some("SRID=4326;POINT(-3.7 40.4)".to_string());
        assert!(matches!(
            resolve_coordinates(&e, &WktPointParser),
            Err(AppError::LocationFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_already_fetched_makes_no_archive_call() {
        let server = silent_archive().await;
        let mut e = edition();
        e.weather_fetched = true;

        let err = compute_edition_weather(&e, false, now(), &WktPointParser, &client(&server))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyFetched(_)));
    }

    #[tokio::test]
    async fn test_future_date_checked_before_location() {
        let server = silent_archive().await;
        let mut e = edition();
        e.start_date = now() + Duration::hours(1);
        e.location = None;
        e.event_location = None;

        let err = compute_edition_weather(&e, false, now(), &WktPointParser, &client(&server))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FutureDate(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_compute_uses_start_day_and_classifies_rain() {
        let server = MockServer::start().await;
        let mut precipitation = vec![0.0; 24];
        precipitation[14] = 9.0;
        precipitation[15] = 6.0;
        Mock::given(method("GET"))
            .and(path("/v1/archive"))
            .and(query_param("latitude", "40.4168"))
            .and(query_param("longitude", "-3.7038"))
            .and(query_param("start_date", "2024-05-12"))
            .and(query_param("end_date", "2024-05-12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(&precipitation, 50.0)))
            .expect(1)
            .mount(&server)
            .await;

        let weather = compute_edition_weather(&edition(), false, now(), &WktPointParser, &client(&server))
            .await
            .unwrap();

        assert_eq!(weather.date.to_string(), "2024-05-12");
        assert_eq!(weather.precipitation, 15.0);
        assert_eq!(weather.cloud_cover, 50);
        assert_eq!(weather.condition, WeatherCondition::Rainy);
        assert_eq!(weather.temperature.avg, 18.0);
    }

    #[tokio::test]
    async fn test_forced_refetch_calls_archive_with_event_location() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("latitude", "41.3851"))
            .and(query_param("longitude", "2.1734"))
            .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(&[0.0; 24], 20.0)))
            .expect(1)
            .mount(&server)
            .await;

        let mut e = edition();
        e.weather_fetched = true;
        e.location = None;

        let weather = compute_edition_weather(&e, true, now(), &WktPointParser, &client(&server))
            .await
            .unwrap();
        assert_eq!(weather.condition, WeatherCondition::Sunny);
    }

    #[tokio::test]
    async fn test_archive_not_found_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = compute_edition_weather(&edition(), false, now(), &WktPointParser, &client(&server))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::WeatherUnavailable(_)), "{:?}", err);
    }
}
