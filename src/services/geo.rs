//! Point-geometry parsing for edition and event locations.
//!
//! Locations are stored as WKT point text, `POINT(<lon> <lat>)`. The
//! `GeoPointParser` trait keeps the weather pipeline independent of that
//! encoding.

use regex::Regex;
use std::sync::LazyLock;

use crate::errors::AppError;

/// `POINT(<lon> <lat>)` with plain signed decimals, case-insensitive.
static WKT_POINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*POINT\s*\(\s*([+-]?[0-9]+(?:\.[0-9]+)?)\s+([+-]?[0-9]+(?:\.[0-9]+)?)\s*\)\s*$")
        .expect("valid regex")
});

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

/// Turns a stored geometry value into a coordinate pair.
pub trait GeoPointParser {
    fn parse(&self, geometry: &str) -> Result<GeoPoint, AppError>;
}

/// Parser for WKT point text such as `POINT(-3.7038 40.4168)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WktPointParser;

impl GeoPointParser for WktPointParser {
    fn parse(&self, geometry: &str) -> Result<GeoPoint, AppError> {
        parse_wkt_point(geometry)
    }
}

fn parse_wkt_point(geometry: &str) -> Result<GeoPoint, AppError> {
    let invalid = || AppError::LocationFormat(format!("expected POINT(lon lat), got '{}'", geometry));

    let caps = WKT_POINT_RE.captures(geometry).ok_or_else(invalid)?;
    let longitude: f64 = caps[1].parse().map_err(|_| invalid())?;
    let latitude: f64 = caps[2].parse().map_err(|_| invalid())?;

    Ok(GeoPoint {
        longitude,
        latitude,
    })
}
