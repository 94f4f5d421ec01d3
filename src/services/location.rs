//! Viewer location: position lookup plus reverse geocoding

use serde::Deserialize;

use super::{get_text, http_agent};
use crate::config::AppConfig;
use crate::error::{FetchError, LocationError};
use crate::models::Location;

#[derive(Debug, Deserialize)]
struct IpPosition {
    #[serde(default)]
    status: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ReverseGeocode {
    #[serde(default)]
    error: Option<String>,
    address: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    country_code: Option<String>,
}

/// Resolve the viewer's location. No retries; the caller decides what to
/// show when this fails.
pub fn locate(config: &AppConfig) -> Result<Location, LocationError> {
    let agent = http_agent(config.fetch_timeout());

    let (latitude, longitude) = match config.manual_location {
        Some(manual) => (manual.latitude, manual.longitude),
        None => {
            let body = get_text(&agent, &config.geolocation_url, &[], &config.user_agent)
                .map_err(|e| {
                    tracing::warn!(error = %e, "position lookup failed");
                    LocationError::PositionUnavailable
                })?;
            parse_ip_position(&body).map_err(|e| {
                tracing::warn!(error = %e, "position lookup returned no coordinates");
                LocationError::PositionUnavailable
            })?
        }
    };

    let query = [
        ("format", "json".to_string()),
        ("lat", latitude.to_string()),
        ("lon", longitude.to_string()),
        ("accept-language", "en".to_string()),
    ];
    get_text(&agent, &config.geocoding_url, &query, &config.user_agent)
        .and_then(|body| parse_reverse_geocode(&body, latitude, longitude))
        .map_err(|e| {
            tracing::warn!(error = %e, "reverse geocoding failed");
            LocationError::GeocodingFailed
        })
}

pub(crate) fn parse_ip_position(body: &str) -> Result<(f64, f64), FetchError> {
    let position: IpPosition = serde_json::from_str(body)?;
    if let Some(status) = position.status.as_deref() {
        if status != "success" {
            return Err(FetchError::invalid(format!("lookup status {}", status)));
        }
    }
    position
        .lat
        .zip(position.lon)
        .ok_or_else(|| FetchError::invalid("missing lat/lon"))
}

pub(crate) fn parse_reverse_geocode(
    body: &str,
    latitude: f64,
    longitude: f64,
) -> Result<Location, FetchError> {
    let data: ReverseGeocode = serde_json::from_str(body)?;
    if let Some(error) = data.error {
        return Err(FetchError::invalid(format!("reverse geocoding error: {}", error)));
    }
    let address = data
        .address
        .ok_or_else(|| FetchError::invalid("no address in response"))?;

    let city = address
        .city
        .or(address.town)
        .or(address.village)
        .unwrap_or_else(|| "Unknown Area".to_string());
    let country = address
        .country_code
        .map(|code| code.to_uppercase())
        .unwrap_or_else(|| "N/A".to_string());

    Ok(Location {
        latitude,
        longitude,
        city,
        country,
    })
}
