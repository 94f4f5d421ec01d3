//! Data models for the Teevo dashboard

use serde::{Deserialize, Serialize};

/// Where the viewer is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub country: String, // ISO 3166-1 alpha-2, uppercase, or "N/A"
}

/// Weather pictogram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherIcon {
    Sun,
    Cloud,
    Rain,
    Snow,
    Wind,
    CloudSun,
}

impl WeatherIcon {
    /// Glyph used by the weather panel
    pub fn glyph(&self) -> &'static str {
        match self {
            WeatherIcon::Sun => "☀",
            WeatherIcon::Cloud => "☁",
            WeatherIcon::Rain => "🌧",
            WeatherIcon::Snow => "❄",
            WeatherIcon::Wind => "🌬",
            WeatherIcon::CloudSun => "⛅",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub day: String, // "MON"
    pub temp: i32,
    pub icon: WeatherIcon,
}

/// Normalized weather record shown in the side panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub city: String,
    pub temperature: i32,
    pub feels_like: i32,
    pub location_specific_temp: i32,
    pub condition: String,
    pub icon: WeatherIcon,
    pub forecast: Vec<ForecastDay>,
}

impl Default for WeatherData {
    fn default() -> Self {
        let day = |day: &str, temp, icon| ForecastDay {
            day: day.to_string(),
            temp,
            icon,
        };
        Self {
            city: "SCARBOROUGH".to_string(),
            temperature: -1,
            feels_like: -8,
            location_specific_temp: 0,
            condition: "Cloudy".to_string(),
            icon: WeatherIcon::Cloud,
            forecast: vec![
                day("MON", 1, WeatherIcon::Cloud),
                day("TUE", 3, WeatherIcon::Rain),
                day("WED", 3, WeatherIcon::Rain),
                day("THU", -8, WeatherIcon::CloudSun),
                day("FRI", -4, WeatherIcon::CloudSun),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: String,
    pub headline: String,
    #[serde(default, rename = "subHeadline", skip_serializing_if = "Option::is_none")]
    pub sub_headline: Option<String>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TravelRoute {
    pub id: String,
    pub name: String,
    pub location: String,
    pub now_minutes: u32,
    pub normal_minutes: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrafficCamera {
    pub id: String,
    pub name: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stock {
    pub id: String,
    pub symbol: String,
    pub price: f64,
    pub change: f64,
}
