//! Live weather from Open-Meteo

use chrono::NaiveDate;
use serde::Deserialize;

use super::{get_text, http_agent};
use crate::config::AppConfig;
use crate::error::FetchError;
use crate::models::{ForecastDay, Location, WeatherData, WeatherIcon};

const FORECAST_DAYS: usize = 5;

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<Current>,
    daily: Option<Daily>,
}

#[derive(Debug, Deserialize)]
struct Current {
    temperature_2m: f64,
    apparent_temperature: f64,
    weather_code: u16,
}

#[derive(Debug, Deserialize)]
struct Daily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    weather_code: Vec<u16>,
    #[serde(default)]
    temperature_2m_max: Vec<f64>,
}

/// WMO weather interpretation code to pictogram
pub fn icon_for_code(code: u16) -> WeatherIcon {
    match code {
        0 => WeatherIcon::Sun,
        1..=3 => WeatherIcon::CloudSun,
        45 | 48 => WeatherIcon::Cloud, // fog
        51..=67 => WeatherIcon::Rain,
        71..=77 => WeatherIcon::Snow,
        80..=82 => WeatherIcon::Rain,
        85..=86 => WeatherIcon::Snow,
        95..=u16::MAX => WeatherIcon::Rain, // thunderstorm
        _ => WeatherIcon::Cloud,
    }
}

/// WMO weather interpretation code to a short description
pub fn condition_for_code(code: u16) -> &'static str {
    match code {
        0 => "Clear Sky",
        1 => "Mainly Clear",
        2 => "Partly Cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Rime Fog",
        51 => "Light Drizzle",
        53 => "Drizzle",
        55 => "Dense Drizzle",
        56 => "Light Freezing Drizzle",
        57 => "Dense Freezing Drizzle",
        61 => "Light Rain",
        63 => "Rain",
        65 => "Heavy Rain",
        66 => "Light Freezing Rain",
        67 => "Heavy Freezing Rain",
        71 => "Light Snow",
        73 => "Snow",
        75 => "Heavy Snow",
        77 => "Snow Grains",
        80 => "Light Showers",
        81 => "Showers",
        82 => "Heavy Showers",
        85 => "Light Snow Showers",
        86 => "Heavy Snow Showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm, Hail",
        99 => "Thunderstorm, Heavy Hail",
        _ => "Mixed",
    }
}

/// Current weather and a five day forecast for `location`.
///
/// Without a location the default record is returned. Any failure returns
/// the default record relabelled with the known city.
pub fn get_weather(location: Option<&Location>, config: &AppConfig) -> WeatherData {
    let Some(location) = location else {
        return WeatherData::default();
    };

    match fetch(location, config) {
        Ok(weather) => weather,
        Err(e) => {
            tracing::warn!(
                city = %location.city,
                error = %e,
                "live weather unavailable, using default"
            );
            fallback_for(&location.city)
        }
    }
}

fn fetch(location: &Location, config: &AppConfig) -> Result<WeatherData, FetchError> {
    let agent = http_agent(config.fetch_timeout());
    let query = [
        ("latitude", location.latitude.to_string()),
        ("longitude", location.longitude.to_string()),
        ("current", "temperature_2m,apparent_temperature,weather_code".to_string()),
        ("daily", "weather_code,temperature_2m_max".to_string()),
        ("timezone", "auto".to_string()),
        ("forecast_days", FORECAST_DAYS.to_string()),
    ];
    let body = get_text(&agent, &config.weather_url, &query, &config.user_agent)?;
    parse_forecast(&body, &location.city)
}

/// Default record carrying the viewer's city
pub fn fallback_for(city: &str) -> WeatherData {
    WeatherData {
        city: city.to_uppercase(),
        ..WeatherData::default()
    }
}

pub(crate) fn parse_forecast(body: &str, city: &str) -> Result<WeatherData, FetchError> {
    let data: ForecastResponse = serde_json::from_str(body)?;
    let (Some(current), Some(daily)) = (data.current, data.daily) else {
        return Err(FetchError::invalid("forecast without current or daily block"));
    };
    if daily.time.is_empty() {
        return Err(FetchError::invalid("forecast without days"));
    }

    let forecast = daily
        .time
        .iter()
        .take(FORECAST_DAYS)
        .enumerate()
        .map(|(i, date)| {
            let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map(|d| d.format("%a").to_string().to_uppercase())
                .map_err(|_| FetchError::invalid(format!("bad forecast date {}", date)))?;
            let temp = daily
                .temperature_2m_max
                .get(i)
                .ok_or_else(|| FetchError::invalid("missing daily temperature"))?;
            // Days without a code show cloud
            let icon = daily
                .weather_code
                .get(i)
                .copied()
                .map(icon_for_code)
                .unwrap_or(WeatherIcon::Cloud);
            Ok(ForecastDay {
                day,
                temp: temp.round() as i32,
                icon,
            })
        })
        .collect::<Result<Vec<_>, FetchError>>()?;

    let temperature = current.temperature_2m.round() as i32;
    Ok(WeatherData {
        city: city.to_uppercase(),
        temperature,
        feels_like: current.apparent_temperature.round() as i32,
        location_specific_temp: temperature,
        condition: condition_for_code(current.weather_code).to_string(),
        icon: icon_for_code(current.weather_code),
        forecast,
    })
}
