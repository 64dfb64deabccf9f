//! Plain-text rendering of a [`SyncState`]. Units are converted here and
//! nowhere else.

use std::fmt::{self, Write};

use skywatch_core::{
    ForecastPoint, SyncState,
    model::{current_hour_index, temperature_trend},
    state::{FailureKind, LoadFailure, LoadSource},
    units::{format_temperature, unit_symbol},
};

const COMPASS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

pub fn compass_point(degrees: i32) -> &'static str {
    let normalized = degrees.rem_euclid(360) as f64;
    let index = ((normalized / 22.5).round() as usize) % COMPASS.len();
    COMPASS[index]
}

pub fn describe_failure(failure: &LoadFailure) -> String {
    let what = match failure.source {
        LoadSource::Weather => "current weather",
        LoadSource::Forecast => "forecast",
        LoadSource::AirQuality => "air quality",
    };
    let why = match failure.kind {
        FailureKind::Transport => "network error".to_string(),
        FailureKind::Status(404) => "location not found".to_string(),
        FailureKind::Status(401) => "API key rejected".to_string(),
        FailureKind::Status(code) => format!("provider returned status {code}"),
        FailureKind::Decode => "unexpected response from provider".to_string(),
        FailureKind::Resolution => "could not resolve coordinates".to_string(),
    };
    format!("Could not load {what}: {why}.")
}

fn hour_label(point: &ForecastPoint) -> String {
    point
        .parsed_timestamp()
        .map(|dt| dt.format("%-I %p").to_string())
        .unwrap_or_else(|| point.timestamp.clone())
}

/// Render the state; the forecast starts at `now_hour` and shows `hours` entries.
pub fn render(state: &SyncState, hours: usize, now_hour: u32) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_report(&mut out, state, hours, now_hour)?;
    Ok(out)
}

fn write_report(out: &mut String, state: &SyncState, hours: usize, now_hour: u32) -> fmt::Result {
    let fahrenheit = state.preferences.use_fahrenheit;

    match &state.weather {
        Some(w) => {
            writeln!(out, "{}: {} ({})", w.location_name, w.condition_main, w.condition_description)?;
            writeln!(
                out,
                "  Temperature  {} (feels like {})",
                format_temperature(w.temperature, fahrenheit),
                format_temperature(w.feels_like, fahrenheit)
            )?;
            writeln!(out, "  Humidity     {}%", w.humidity_percent)?;
            writeln!(
                out,
                "  Wind         {:.1} m/s from {}° ({})",
                w.wind_speed_mps,
                w.wind_direction_deg,
                compass_point(w.wind_direction_deg)
            )?;
            writeln!(out, "  Pressure     {} hPa", w.pressure_hpa)?;
        }
        None => writeln!(out, "No current weather available.")?,
    }

    match &state.air_quality {
        Some(aq) => writeln!(out, "  Air quality  {} (AQI {})", aq.level(), aq.aqi)?,
        None => writeln!(out, "  Air quality  N/A")?,
    }

    if !state.forecast.is_empty() {
        write_forecast(out, state, hours, now_hour)?;
    }

    if let Some(failure) = &state.last_error {
        writeln!(out, "\n{}", describe_failure(failure))?;
    }
    Ok(())
}

fn write_forecast(out: &mut String, state: &SyncState, hours: usize, now_hour: u32) -> fmt::Result {
    let fahrenheit = state.preferences.use_fahrenheit;
    let start = current_hour_index(&state.forecast, now_hour);

    writeln!(out, "\nHourly forecast")?;
    for point in state.forecast.iter().skip(start).take(hours) {
        writeln!(
            out,
            "  {:>5}  {:>5}  {}, {}",
            hour_label(point),
            format_temperature(point.temperature, fahrenheit),
            point.condition_main,
            point.condition_description
        )?;
    }

    if let Some(trend) = temperature_trend(&state.forecast, fahrenheit) {
        let symbol = unit_symbol(fahrenheit);
        writeln!(
            out,
            "  Range  {}{symbol} .. {}{symbol}",
            trend.min.round() as i64,
            trend.max.round() as i64
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skywatch_core::{AirQualitySample, CurrentWeather, Preferences};

    fn point(ts: &str, temp: f64) -> ForecastPoint {
        ForecastPoint {
            timestamp: ts.to_string(),
            temperature: temp,
            feels_like: temp,
            condition_main: "Clouds".to_string(),
            condition_description: "few clouds".to_string(),
            icon_code: "02d".to_string(),
            humidity_percent: 60,
            pressure_hpa: 1010,
            wind_speed_mps: 3.0,
        }
    }

    fn state() -> SyncState {
        SyncState {
            weather: Some(CurrentWeather {
                location_name: "Paris".to_string(),
                condition_main: "Clear".to_string(),
                condition_description: "clear sky".to_string(),
                icon_code: "01d".to_string(),
                temperature: 21.3,
                feels_like: 20.6,
                humidity_percent: 40,
                pressure_hpa: 1018,
                wind_speed_mps: 3.6,
                wind_direction_deg: 250,
            }),
            forecast: vec![
                point("2024-06-01 09:00:00", 18.0),
                point("2024-06-01 12:00:00", 21.0),
                point("2024-06-01 15:00:00", 24.0),
            ],
            air_quality: Some(AirQualitySample {
                aqi: 2,
                co: 200.0,
                no: 0.0,
                no2: 5.0,
                o3: 60.0,
                so2: 1.0,
                pm2_5: 4.0,
                pm10: 6.0,
                nh3: 0.5,
            }),
            forecast_loading: false,
            preferences: Preferences::default(),
            last_error: None,
        }
    }

    #[test]
    fn compass_points() {
        assert_eq!(compass_point(0), "N");
        assert_eq!(compass_point(250), "WSW");
        assert_eq!(compass_point(359), "N");
        assert_eq!(compass_point(-90), "W");
    }

    #[test]
    fn renders_celsius_report_from_current_hour() {
        let text = render(&state(), 2, 12).expect("render");

        assert!(text.contains("Paris: Clear (clear sky)"));
        assert!(text.contains("Temperature  21°C (feels like 21°C)"));
        assert!(text.contains("Air quality  Fair (AQI 2)"));
        assert!(text.contains("12 PM"));
        assert!(text.contains("3 PM"));
        assert!(!text.contains("9 AM"));
        assert!(text.contains("Range  18°C .. 24°C"));
    }

    #[test]
    fn renders_fahrenheit_when_selected() {
        let mut s = state();
        s.preferences.use_fahrenheit = true;

        let text = render(&s, 3, 9).expect("render");
        assert!(text.contains("Temperature  70°F"));
        assert!(text.contains("Range  64°F .. 75°F"));
    }

    #[test]
    fn empty_state_reports_failure_reason() {
        let s = SyncState {
            weather: None,
            forecast: Vec::new(),
            air_quality: None,
            forecast_loading: false,
            preferences: Preferences::default(),
            last_error: Some(LoadFailure {
                source: LoadSource::Weather,
                kind: FailureKind::Status(404),
            }),
        };

        let text = render(&s, 5, 0).expect("render");
        assert!(text.contains("No current weather available."));
        assert!(text.contains("Air quality  N/A"));
        assert!(text.contains("Could not load current weather: location not found."));
        assert!(!text.contains("Hourly forecast"));
    }
}
