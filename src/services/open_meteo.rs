//! Open-Meteo historical archive client.
//!
//! Fetches one day of hourly observations for a coordinate.
//! See: https://open-meteo.com/en/docs/historical-weather-api

use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

use crate::errors::AppError;

/// Hourly variables requested from the archive, in response-key form.
pub const HOURLY_VARIABLES: [&str; 7] = [
    "temperature_2m",
    "relative_humidity_2m",
    "precipitation",
    "surface_pressure",
    "cloud_cover",
    "wind_speed_10m",
    "wind_direction_10m",
];

/// Client for the Open-Meteo archive API.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    client: reqwest::Client,
    base_url: String,
}

/// One day of hourly observations. All series are aligned with `time`;
/// missing observations are `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation: Vec<Option<f64>>,
    #[serde(default)]
    pub surface_pressure: Vec<Option<f64>>,
    #[serde(default)]
    pub cloud_cover: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_direction_10m: Vec<Option<f64>>,
}

impl HourlySeries {
    fn has_temperature(&self) -> bool {
        self.temperature_2m.iter().any(Option::is_some)
    }
}

// --- Open-Meteo JSON response types ---

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    hourly: Option<HourlySeries>,
}

#[derive(Debug, Deserialize)]
struct ArchiveErrorBody {
    reason: Option<String>,
}

impl ArchiveClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the hourly series for a single calendar day at a coordinate.
    ///
    /// Uses `timezone=auto` so hours are bucketed by the location's local day.
    pub async fn fetch_day(
        &self,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
    ) -> Result<HourlySeries, AppError> {
        let url = format!("{}/v1/archive", self.base_url);
        let day = date.format("%Y-%m-%d").to_string();
        let query = [
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("start_date", day.clone()),
            ("end_date", day),
            ("hourly", HOURLY_VARIABLES.join(",")),
            ("timezone", "auto".to_string()),
        ];

        tracing::debug!(
            "Requesting archive weather for ({}, {}) on {}",
            latitude,
            longitude,
            date
        );

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::WeatherFetch(format!("archive request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::WeatherUnavailable(format!(
                "no archive data for ({}, {}) on {}",
                latitude, longitude, date
            )));
        }

        if !status.is_success() {
            // Open-Meteo explains rejected requests in a JSON `reason` field.
            let reason = response
                .json::<ArchiveErrorBody>()
                .await
                .ok()
                .and_then(|body| body.reason);
            return Err(AppError::WeatherFetch(match reason {
                Some(reason) => format!("archive returned HTTP {}: {}", status, reason),
                None => format!("archive returned HTTP {}", status),
            }));
        }

        let body: ArchiveResponse = response
            .json()
            .await
            .map_err(|e| AppError::WeatherFetch(format!("archive JSON parse error: {}", e)))?;

        let hourly = body.hourly.ok_or_else(|| {
            AppError::WeatherUnavailable(format!(
                "archive response for {} has no hourly data",
                date
            ))
        })?;

        if !hourly.has_temperature() {
            return Err(AppError::WeatherUnavailable(format!(
                "archive has no temperature observations for {}",
                date
            )));
        }

        tracing::debug!(
            "Archive returned {} hourly observations for {}",
            hourly.time.len(),
            date
        );

        Ok(hourly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 12).unwrap()
    }

    fn client(server: &MockServer) -> ArchiveClient {
        ArchiveClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn archive_body() -> serde_json::Value {
        serde_json::json!({
            "latitude": 40.4,
            "longitude": -3.7,
            "timezone": "Europe/Madrid",
            "hourly": {
                "time": ["2024-05-12T00:00", "2024-05-12T01:00", "2024-05-12T02:00"],
                "temperature_2m": [14.2, null, 12.8],
                "relative_humidity_2m": [70, 72, 75],
                "precipitation": [0.0, 0.4, null],
                "surface_pressure": [944.1, 944.3, 944.0],
                "cloud_cover": [20, 40, null],
                "wind_speed_10m": [5.4, 6.1, 7.0],
                "wind_direction_10m": [350, 10, 0]
            }
        })
    }

    #[test]
    fn test_hourly_series_accepts_nulls() {
        let series: HourlySeries = serde_json::from_value(archive_body()["hourly"].clone()).unwrap();
        assert_eq!(series.time.len(), 3);
        assert_eq!(series.temperature_2m, vec![Some(14.2), None, Some(12.8)]);
        assert_eq!(series.precipitation[2], None);
    }

    #[tokio::test]
    async fn test_fetch_day_sends_archive_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/archive"))
            .and(query_param("latitude", "40.4168"))
            .and(query_param("longitude", "-3.7038"))
            .and(query_param("start_date", "2024-05-12"))
            .and(query_param("end_date", "2024-05-12"))
            .and(query_param("hourly", HOURLY_VARIABLES.join(",")))
            .and(query_param("timezone", "auto"))
            .respond_with(ResponseTemplate::new(200).set_body_json(archive_body()))
            .expect(1)
            .mount(&server)
            .await;

        let series = client(&server)
            .fetch_day(40.4168, -3.7038, day())
            .await
            .unwrap();
        assert_eq!(series.cloud_cover, vec![Some(20.0), Some(40.0), None]);
    }

    #[tokio::test]
    async fn test_fetch_day_404_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client(&server).fetch_day(0.0, 0.0, day()).await.unwrap_err();
        assert!(matches!(err, AppError::WeatherUnavailable(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_fetch_day_without_hourly_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "latitude": 0.0, "longitude": 0.0 })),
            )
            .mount(&server)
            .await;

        let err = client(&server).fetch_day(0.0, 0.0, day()).await.unwrap_err();
        assert!(matches!(err, AppError::WeatherUnavailable(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_fetch_day_all_null_temperature_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hourly": {
                    "time": ["2024-05-12T00:00", "2024-05-12T01:00"],
                    "temperature_2m": [null, null]
                }
            })))
            .mount(&server)
            .await;

        let err = client(&server).fetch_day(0.0, 0.0, day()).await.unwrap_err();
        assert!(matches!(err, AppError::WeatherUnavailable(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_fetch_day_bad_request_keeps_reason() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": true,
                "reason": "Parameter 'start_date' is out of allowed range"
            })))
            .mount(&server)
            .await;

        let err = client(&server).fetch_day(0.0, 0.0, day()).await.unwrap_err();
        match err {
            AppError::WeatherFetch(msg) => assert!(msg.contains("out of allowed range"), "{}", msg),
            other => panic!("expected WeatherFetch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_day_server_error_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server).fetch_day(0.0, 0.0, day()).await.unwrap_err();
        assert!(matches!(err, AppError::WeatherFetch(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_fetch_day_malformed_json_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server).fetch_day(0.0, 0.0, day()).await.unwrap_err();
        assert!(matches!(err, AppError::WeatherFetch(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_fetch_day_transport_failure_is_fetch_error() {
        // Nothing listens on the discard port.
        let client = ArchiveClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.fetch_day(0.0, 0.0, day()).await.unwrap_err();
        assert!(matches!(err, AppError::WeatherFetch(_)), "{:?}", err);
    }
}
