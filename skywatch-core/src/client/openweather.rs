use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use crate::{
    error::RemoteError,
    model::{AirQualitySample, Coordinates, CurrentWeather, ForecastPoint},
};

use super::WeatherClient;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

const WEATHER_PATH: &str = "/data/2.5/weather";
const FORECAST_PATH: &str = "/data/2.5/forecast";
const AIR_POLLUTION_PATH: &str = "/data/2.5/air_pollution";

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Client,
    base_url: String,
}

impl Default for OpenWeatherClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenWeatherClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, RemoteError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(endpoint, %url, "sending OpenWeather request");

        let res = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| RemoteError::Transport { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| RemoteError::Transport { endpoint, source })?;

        if !status.is_success() {
            return Err(RemoteError::Status {
                endpoint,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| RemoteError::Decode { endpoint, source })
    }
}

fn coordinate_query(coords: Coordinates, api_key: &str, metric: bool) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("lat", coords.latitude.to_string()),
        ("lon", coords.longitude.to_string()),
        ("appid", api_key.to_string()),
    ];
    if metric {
        query.push(("units", "metric".to_string()));
    }
    query
}

fn city_query(city: &str, api_key: &str) -> Vec<(&'static str, String)> {
    vec![
        ("q", city.to_string()),
        ("appid", api_key.to_string()),
        ("units", "metric".to_string()),
    ]
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: i32,
    pressure: i32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    #[serde(default)]
    deg: i32,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt_txt: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwAqiMain {
    aqi: u8,
}

#[derive(Debug, Deserialize)]
struct OwAqiComponents {
    co: f64,
    no: f64,
    no2: f64,
    o3: f64,
    so2: f64,
    pm2_5: f64,
    pm10: f64,
    nh3: f64,
}

#[derive(Debug, Deserialize)]
struct OwAirQualityEntry {
    main: OwAqiMain,
    components: OwAqiComponents,
}

#[derive(Debug, Deserialize)]
struct OwAirQualityResponse {
    list: Vec<OwAirQualityEntry>,
}

/// Primary condition of a response; providers can send an empty list.
fn primary_condition(weather: Vec<OwWeather>) -> (String, String, String) {
    weather
        .into_iter()
        .next()
        .map(|w| (w.main, w.description, w.icon))
        .unwrap_or_else(|| ("Unknown".to_string(), String::new(), String::new()))
}

impl OwCurrentResponse {
    fn into_model(self) -> CurrentWeather {
        let (condition_main, condition_description, icon_code) = primary_condition(self.weather);

        CurrentWeather {
            location_name: self.name,
            condition_main,
            condition_description,
            icon_code,
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            humidity_percent: self.main.humidity,
            pressure_hpa: self.main.pressure,
            wind_speed_mps: self.wind.speed,
            wind_direction_deg: self.wind.deg,
        }
    }
}

impl OwForecastEntry {
    fn into_model(self) -> ForecastPoint {
        let (condition_main, condition_description, icon_code) = primary_condition(self.weather);

        ForecastPoint {
            timestamp: self.dt_txt,
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            condition_main,
            condition_description,
            icon_code,
            humidity_percent: self.main.humidity,
            pressure_hpa: self.main.pressure,
            wind_speed_mps: self.wind.speed,
        }
    }
}

impl OwAirQualityEntry {
    fn into_model(self) -> AirQualitySample {
        let c = self.components;
        AirQualitySample {
            aqi: self.main.aqi,
            co: c.co,
            no: c.no,
            no2: c.no2,
            o3: c.o3,
            so2: c.so2,
            pm2_5: c.pm2_5,
            pm10: c.pm10,
            nh3: c.nh3,
        }
    }
}

#[async_trait]
impl WeatherClient for OpenWeatherClient {
    #[instrument(skip(self, api_key), level = "debug")]
    async fn fetch_current_by_coordinates(
        &self,
        coords: Coordinates,
        api_key: &str,
    ) -> Result<CurrentWeather, RemoteError> {
        let parsed: OwCurrentResponse = self
            .get_json("OpenWeather current", WEATHER_PATH, &coordinate_query(coords, api_key, true))
            .await?;
        Ok(parsed.into_model())
    }

    #[instrument(skip(self, api_key), level = "debug")]
    async fn fetch_current_by_city(
        &self,
        city: &str,
        api_key: &str,
    ) -> Result<CurrentWeather, RemoteError> {
        let parsed: OwCurrentResponse = self
            .get_json("OpenWeather current", WEATHER_PATH, &city_query(city, api_key))
            .await?;
        Ok(parsed.into_model())
    }

    #[instrument(skip(self, api_key), level = "debug")]
    async fn fetch_forecast_by_coordinates(
        &self,
        coords: Coordinates,
        api_key: &str,
    ) -> Result<Vec<ForecastPoint>, RemoteError> {
        let parsed: OwForecastResponse = self
            .get_json("OpenWeather forecast", FORECAST_PATH, &coordinate_query(coords, api_key, true))
            .await?;
        Ok(parsed.list.into_iter().map(OwForecastEntry::into_model).collect())
    }

    #[instrument(skip(self, api_key), level = "debug")]
    async fn fetch_forecast_by_city(
        &self,
        city: &str,
        api_key: &str,
    ) -> Result<Vec<ForecastPoint>, RemoteError> {
        let parsed: OwForecastResponse = self
            .get_json("OpenWeather forecast", FORECAST_PATH, &city_query(city, api_key))
            .await?;
        Ok(parsed.list.into_iter().map(OwForecastEntry::into_model).collect())
    }

    #[instrument(skip(self, api_key), level = "debug")]
    async fn fetch_air_quality(
        &self,
        coords: Coordinates,
        api_key: &str,
    ) -> Result<Vec<AirQualitySample>, RemoteError> {
        let parsed: OwAirQualityResponse = self
            .get_json(
                "OpenWeather air pollution",
                AIR_POLLUTION_PATH,
                &coordinate_query(coords, api_key, false),
            )
            .await?;
        Ok(parsed.list.into_iter().map(OwAirQualityEntry::into_model).collect())
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn current_body() -> serde_json::Value {
        json!({
            "name": "Paris",
            "weather": [{"main": "Rain", "description": "light rain", "icon": "10d"}],
            "main": {"temp": 12.4, "feels_like": 11.1, "humidity": 81, "pressure": 1009},
            "wind": {"speed": 4.6, "deg": 230},
            "dt": 1714572000
        })
    }

    #[tokio::test]
    async fn current_by_city_maps_fields_and_keeps_celsius() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(WEATHER_PATH))
            .and(query_param("q", "Paris"))
            .and(query_param("appid", "KEY"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url(&server.uri());
        let weather = client.fetch_current_by_city("Paris", "KEY").await.expect("current weather");

        assert_eq!(weather.location_name, "Paris");
        assert_eq!(weather.condition_main, "Rain");
        assert_eq!(weather.condition_description, "light rain");
        assert_eq!(weather.icon_code, "10d");
        assert_eq!(weather.temperature, 12.4);
        assert_eq!(weather.feels_like, 11.1);
        assert_eq!(weather.humidity_percent, 81);
        assert_eq!(weather.pressure_hpa, 1009);
        assert_eq!(weather.wind_direction_deg, 230);
    }

    #[tokio::test]
    async fn current_by_coordinates_sends_lat_lon() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(WEATHER_PATH))
            .and(query_param("lat", "48.8566"))
            .and(query_param("lon", "2.3522"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url(&server.uri());
        let weather = client
            .fetch_current_by_coordinates(Coordinates::new(48.8566, 2.3522), "KEY")
            .await
            .expect("current weather");
        assert_eq!(weather.location_name, "Paris");
    }

    #[tokio::test]
    async fn city_not_found_is_a_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(WEATHER_PATH))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"cod": "404", "message": "city not found"})),
            )
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url(&server.uri());
        let err = client.fetch_current_by_city("Atlantis", "KEY").await.unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("city not found"));
    }

    #[tokio::test]
    async fn malformed_json_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FORECAST_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url(&server.uri());
        let err = client.fetch_forecast_by_city("Paris", "KEY").await.unwrap_err();
        assert!(matches!(err, RemoteError::Decode { .. }));
    }

    #[tokio::test]
    async fn forecast_keeps_provider_order() {
        let server = MockServer::start().await;
        let entry = |ts: &str, temp: f64| {
            json!({
                "dt_txt": ts,
                "main": {"temp": temp, "feels_like": temp, "humidity": 70, "pressure": 1012},
                "weather": [{"main": "Clouds", "description": "few clouds", "icon": "02d"}],
                "wind": {"speed": 3.0, "deg": 90}
            })
        };
        Mock::given(method("GET"))
            .and(path(FORECAST_PATH))
            .and(query_param("lat", "51.5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "city": {"name": "London", "country": "GB"},
                "list": [entry("2024-05-01 12:00:00", 15.0), entry("2024-05-01 15:00:00", 17.5)]
            })))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url(&server.uri());
        let points = client
            .fetch_forecast_by_coordinates(Coordinates::new(51.5, -0.12), "KEY")
            .await
            .expect("forecast");

        let stamps: Vec<&str> = points.iter().map(|p| p.timestamp.as_str()).collect();
        assert_eq!(stamps, ["2024-05-01 12:00:00", "2024-05-01 15:00:00"]);
        assert_eq!(points[1].temperature, 17.5);
    }

    #[tokio::test]
    async fn air_quality_empty_list_is_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(AIR_POLLUTION_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"list": []})))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url(&server.uri());
        let samples = client
            .fetch_air_quality(Coordinates::new(0.0, 0.0), "KEY")
            .await
            .expect("air quality");
        assert!(samples.is_empty());
    }

    #[tokio::test]
    async fn air_quality_maps_components() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(AIR_POLLUTION_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "list": [{
                    "main": {"aqi": 2},
                    "components": {"co": 201.9, "no": 0.0, "no2": 0.8, "o3": 68.6,
                                   "so2": 0.6, "pm2_5": 0.5, "pm10": 0.6, "nh3": 0.1}
                }]
            })))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url(&server.uri());
        let samples = client
            .fetch_air_quality(Coordinates::new(48.8566, 2.3522), "KEY")
            .await
            .expect("air quality");

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].aqi, 2);
        assert_eq!(samples[0].co, 201.9);
        assert_eq!(samples[0].pm2_5, 0.5);
    }

    #[test]
    fn empty_weather_array_maps_to_unknown() {
        let (main, description, icon) = primary_condition(Vec::new());
        assert_eq!(main, "Unknown");
        assert!(description.is_empty());
        assert!(icon.is_empty());
    }

    #[test]
    fn truncate_body_caps_long_bodies() {
        let long = "x".repeat(500);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.len(), 203);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
