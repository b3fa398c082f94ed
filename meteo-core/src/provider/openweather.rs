use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    WeatherError,
    model::{CanonicalWeather, ConditionEntry, ForecastDay, MainReadings, SunTimes, Wind},
    units,
};

use super::{ProviderId, WeatherProvider, parse_json, send, status_error};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/";

const ID: ProviderId = ProviderId::OpenWeather;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn with_base_url(api_key: String, base_url: &str, http: Client) -> Self {
        Self { api_key, base_url: base_url.to_string(), http }
    }

    fn endpoint(&self) -> String {
        format!("{}/weather", self.base_url.trim_end_matches('/'))
    }

    async fn fetch_weather(&self, city: &str) -> Result<CanonicalWeather, WeatherError> {
        let url = self.endpoint();
        tracing::debug!(provider = %ID, city, %url, "requesting current weather");

        let request = self.http.get(&url).query(&[
            ("q", city),
            ("units", "metric"),
            ("lang", "ru"),
            ("appid", self.api_key.as_str()),
        ]);
        let (status, body) = send(ID, request).await?;

        match status {
            StatusCode::UNAUTHORIZED => {
                return Err(WeatherError::InvalidCredential { provider: ID });
            }
            StatusCode::NOT_FOUND => return Err(WeatherError::city_not_found(city)),
            status if !status.is_success() => return Err(status_error(ID, status, &body)),
            _ => {}
        }

        let payload: Value = parse_json(ID, &body)?;

        // OpenWeatherMap can answer 200 and still carry an error code in the body.
        match embedded_status(&payload) {
            Some(404) => return Err(WeatherError::city_not_found(city)),
            Some(401) => return Err(WeatherError::InvalidCredential { provider: ID }),
            Some(code) if code != 200 => {
                let message = payload
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unexpected status");
                return Err(WeatherError::upstream(ID, format!("cod {code}: {message}")));
            }
            _ => {}
        }

        let parsed: OwCurrentResponse = serde_json::from_value(payload)
            .map_err(|err| WeatherError::upstream(ID, format!("unexpected payload: {err}")))?;

        parsed.into_canonical()
    }
}

/// `cod` arrives either as a number or as a numeric string.
fn embedded_status(payload: &Value) -> Option<i64> {
    match payload.get("cod")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: Option<String>,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: i32,
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    sys: OwSys,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
    visibility: Option<f64>,
    clouds: Option<OwClouds>,
}

impl OwCurrentResponse {
    fn into_canonical(self) -> Result<CanonicalWeather, WeatherError> {
        if self.weather.is_empty() {
            return Err(WeatherError::upstream(ID, "response contained no weather conditions"));
        }

        let conditions = self
            .weather
            .into_iter()
            .map(|w| ConditionEntry { id: w.id, main: w.main, description: w.description, icon: w.icon })
            .collect();

        let wind = self.wind.and_then(|w| match (w.speed, w.deg) {
            (Some(speed), Some(deg)) => Some(Wind { speed, deg: units::normalize_degrees(deg) }),
            _ => None,
        });

        Ok(CanonicalWeather {
            name: self.name,
            country: self.sys.country.unwrap_or_default(),
            main: MainReadings {
                temp: self.main.temp,
                feels_like: self.main.feels_like,
                temp_min: self.main.temp_min,
                temp_max: self.main.temp_max,
                pressure: units::round_pressure(self.main.pressure),
                humidity: units::clamp_percent(self.main.humidity),
            },
            wind,
            visibility: self.visibility.map(|v| v.max(0.0).round() as u32),
            clouds: self.clouds.and_then(|c| c.all).map(units::clamp_percent),
            sys: SunTimes { sunrise: self.sys.sunrise, sunset: self.sys.sunset },
            conditions,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ID
    }

    async fn fetch_current(&self, city: &str) -> Result<CanonicalWeather, WeatherError> {
        self.fetch_weather(city).await
    }

    /// The free current-weather endpoint has no daily forecast.
    async fn fetch_forecast(&self, _city: &str) -> Vec<ForecastDay> {
        Vec::new()
    }
}
