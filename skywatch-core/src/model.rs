use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::units;

/// Timestamp pattern of [`ForecastPoint::timestamp`].
pub const FORECAST_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Latest current-conditions snapshot. Temperatures are Celsius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub location_name: String,
    pub condition_main: String,
    pub condition_description: String,
    pub icon_code: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity_percent: i32,
    pub pressure_hpa: i32,
    pub wind_speed_mps: f64,
    pub wind_direction_deg: i32,
}

impl CurrentWeather {
    pub fn theme(&self) -> WeatherTheme {
        WeatherTheme::from_condition(&self.condition_main)
    }
}

/// One step of the hourly forecast, in provider order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub condition_main: String,
    pub condition_description: String,
    pub icon_code: String,
    pub humidity_percent: i32,
    pub pressure_hpa: i32,
    pub wind_speed_mps: f64,
}

impl ForecastPoint {
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, FORECAST_TIMESTAMP_FORMAT).ok()
    }

    pub fn hour(&self) -> Option<u32> {
        self.parsed_timestamp().map(|dt| dt.hour())
    }
}

/// Index of the first point at `hour`, or 0 when none matches.
pub fn current_hour_index(points: &[ForecastPoint], hour: u32) -> usize {
    points
        .iter()
        .position(|p| p.hour() == Some(hour))
        .unwrap_or(0)
}

/// Display-unit temperatures of a forecast, with bounds for graphing.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureTrend {
    pub values: Vec<f64>,
    pub min: f64,
    pub max: f64,
}

pub fn temperature_trend(points: &[ForecastPoint], use_fahrenheit: bool) -> Option<TemperatureTrend> {
    if points.is_empty() {
        return None;
    }

    let values: Vec<f64> = points
        .iter()
        .map(|p| units::to_display(p.temperature, use_fahrenheit))
        .collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(TemperatureTrend { values, min, max })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AirQualitySample {
    /// 1 = Good … 5 = Very Poor.
    pub aqi: u8,
    pub co: f64,
    pub no: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    pub nh3: f64,
}

impl AirQualitySample {
    pub fn level(&self) -> AqiLevel {
        AqiLevel::from_index(self.aqi)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AqiLevel {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
    Unknown,
}

impl AqiLevel {
    pub fn from_index(aqi: u8) -> Self {
        match aqi {
            1 => AqiLevel::Good,
            2 => AqiLevel::Fair,
            3 => AqiLevel::Moderate,
            4 => AqiLevel::Poor,
            5 => AqiLevel::VeryPoor,
            _ => AqiLevel::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AqiLevel::Good => "Good",
            AqiLevel::Fair => "Fair",
            AqiLevel::Moderate => "Moderate",
            AqiLevel::Poor => "Poor",
            AqiLevel::VeryPoor => "Very Poor",
            AqiLevel::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for AqiLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual/ambient theme derived from the provider's primary condition keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherTheme {
    Thunderstorm,
    Rain,
    Clear,
    Clouds,
    Atmosphere,
    Snow,
    None,
}

impl WeatherTheme {
    pub fn from_condition(condition_main: &str) -> Self {
        match condition_main.to_lowercase().as_str() {
            "thunderstorm" => WeatherTheme::Thunderstorm,
            "drizzle" | "rain" => WeatherTheme::Rain,
            "clear" => WeatherTheme::Clear,
            "clouds" => WeatherTheme::Clouds,
            "atmosphere" => WeatherTheme::Atmosphere,
            "snow" => WeatherTheme::Snow,
            _ => WeatherTheme::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherTheme::Thunderstorm => "thunderstorm",
            WeatherTheme::Rain => "rain",
            WeatherTheme::Clear => "clear",
            WeatherTheme::Clouds => "clouds",
            WeatherTheme::Atmosphere => "atmosphere",
            WeatherTheme::Snow => "snow",
            WeatherTheme::None => "none",
        }
    }

    /// Only rain and thunderstorm come with an ambience track.
    pub fn has_ambience(&self) -> bool {
        matches!(self, WeatherTheme::Rain | WeatherTheme::Thunderstorm)
    }
}

/// User preferences. Process-lifetime in the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub notifications_enabled: bool,
    pub use_fahrenheit: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            use_fahrenheit: false,
        }
    }
}
