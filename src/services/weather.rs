//! Daily weather summary for an edition.
//!
//! Reduces one day of hourly archive observations into an `EditionWeather`.
//! Everything here is pure; the caller owns the I/O.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::helpers::{round_1dp, round_to_i64};
use crate::services::open_meteo::HourlySeries;

/// Daily precipitation (mm) above which a day counts as rainy.
const RAINY_PRECIPITATION_MM: f64 = 10.0;
/// Average cloud cover (%) above which a dry day counts as cloudy.
const CLOUDY_COVER_PCT: f64 = 75.0;
/// Average cloud cover (%) above which a dry day counts as partly cloudy.
const PARTLY_CLOUDY_COVER_PCT: f64 = 30.0;

/// Categorical weather condition for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Rainy,
    LightRain,
    Cloudy,
    PartlyCloudy,
    Sunny,
}

impl WeatherCondition {
    /// Classify a day. Precipitation always outranks cloud cover.
    pub fn classify(precipitation_mm: f64, cloud_cover_pct: f64) -> Self {
        if precipitation_mm > RAINY_PRECIPITATION_MM {
            Self::Rainy
        } else if precipitation_mm > 0.0 {
            Self::LightRain
        } else if cloud_cover_pct > CLOUDY_COVER_PCT {
            Self::Cloudy
        } else if cloud_cover_pct > PARTLY_CLOUDY_COVER_PCT {
            Self::PartlyCloudy
        } else {
            Self::Sunny
        }
    }

    /// Display label shown in the admin UI.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rainy => "Lluvioso",
            Self::LightRain => "Lluvia ligera",
            Self::Cloudy => "Nublado",
            Self::PartlyCloudy => "Parcialmente nublado",
            Self::Sunny => "Soleado",
        }
    }
}

/// 8-point compass direction, clockwise from north.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum CompassDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

const COMPASS_POINTS: [CompassDirection; 8] = [
    CompassDirection::N,
    CompassDirection::NE,
    CompassDirection::E,
    CompassDirection::SE,
    CompassDirection::S,
    CompassDirection::SW,
    CompassDirection::W,
    CompassDirection::NW,
];

impl CompassDirection {
    /// Nearest compass point for a bearing in degrees (any sign or magnitude).
    pub fn from_degrees(degrees: f64) -> Self {
        let sector = round_to_i64(degrees / 45.0).rem_euclid(8);
        COMPASS_POINTS[sector as usize]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TemperatureSummary {
    /// Mean air temperature in Celsius
    pub avg: f64,
    /// Lowest hourly temperature in Celsius
    pub min: f64,
    /// Highest hourly temperature in Celsius
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WindSummary {
    /// Mean wind speed in km/h
    pub speed: f64,
    /// Mean wind direction in degrees (0 = north, 90 = east)
    pub direction: i64,
    pub direction_text: CompassDirection,
}

/// Historical weather for one edition day. Stored verbatim in the
/// `editions.weather` JSON column, hence the camelCase keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditionWeather {
    /// Calendar day the summary covers
    #[schema(value_type = String, example = "2024-05-12")]
    pub date: NaiveDate,
    pub temperature: TemperatureSummary,
    pub condition: WeatherCondition,
    /// Label paired with `condition`
    pub condition_text: String,
    /// Total precipitation in mm
    pub precipitation: f64,
    pub wind: WindSummary,
    /// Mean relative humidity in percent
    pub humidity: i64,
    /// Mean surface pressure in hPa
    pub pressure: i64,
    /// Mean cloud cover in percent
    pub cloud_cover: i64,
    pub fetched_at: DateTime<Utc>,
}

/// Mean of the non-null entries, or 0 when there are none.
pub fn average(series: &[Option<f64>]) -> f64 {
    let (sum, count) = series
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Sum of the series with nulls counted as 0.
fn total(series: &[Option<f64>]) -> f64 {
    series.iter().flatten().sum()
}

/// Min and max over the non-null entries, `None` if every entry is null.
fn min_max(series: &[Option<f64>]) -> Option<(f64, f64)> {
    series.iter().flatten().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Reduce one day of hourly observations to a daily summary.
pub fn aggregate_day(date: NaiveDate, hourly: &HourlySeries) -> EditionWeather {
    let temp_avg = average(&hourly.temperature_2m);
    // All-null series: min and max collapse to the average.
    let (temp_min, temp_max) = min_max(&hourly.temperature_2m).unwrap_or((temp_avg, temp_avg));

    let precipitation = total(&hourly.precipitation);
    let cloud_cover = average(&hourly.cloud_cover);
    let wind_direction = average(&hourly.wind_direction_10m);

    let condition = WeatherCondition::classify(precipitation, cloud_cover);

    EditionWeather {
        date,
        temperature: TemperatureSummary {
            avg: round_1dp(temp_avg),
            min: round_1dp(temp_min),
            max: round_1dp(temp_max),
        },
        condition,
        condition_text: condition.label().to_string(),
        precipitation: round_1dp(precipitation),
        wind: WindSummary {
            speed: round_1dp(average(&hourly.wind_speed_10m)),
            direction: round_to_i64(wind_direction),
            direction_text: CompassDirection::from_degrees(wind_direction),
        },
        humidity: round_to_i64(average(&hourly.relative_humidity_2m)),
        pressure: round_to_i64(average(&hourly.surface_pressure)),
        cloud_cover: round_to_i64(cloud_cover),
        fetched_at: Utc::now(),
    }
}
