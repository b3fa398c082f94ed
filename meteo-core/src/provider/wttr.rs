use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::{
    WeatherError,
    condition::{CodeFamily, classify},
    locale,
    model::{CanonicalWeather, ForecastDay, MainReadings, SunTimes, Wind},
    units,
};

use super::{ProviderId, WeatherProvider, degrade_forecast, parse_json, send, status_error};

pub const DEFAULT_BASE_URL: &str = "https://wttr.in/";

const ID: ProviderId = ProviderId::Wttr;

/// wttr.in's `j1` feed carries no astronomy we rely on; sunrise and sunset
/// are pinned to these local wall-clock times instead.
const SYNTHETIC_SUNRISE: (u32, u32) = (6, 0);
const SYNTHETIC_SUNSET: (u32, u32) = (18, 0);
const MIDDAY_SLOT: &str = "1200";

#[derive(Debug, Deserialize)]
struct WtValue {
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WtCurrent {
    #[serde(rename = "temp_C")]
    temp_c: String,
    #[serde(rename = "FeelsLikeC")]
    feels_like_c: String,
    humidity: String,
    pressure: String,
    weather_code: String,
    windspeed_kmph: Option<String>,
    winddir_degree: Option<String>,
    visibility: Option<String>,
    cloudcover: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WtArea {
    #[serde(default)]
    area_name: Vec<WtValue>,
    #[serde(default)]
    country: Vec<WtValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WtHour {
    time: String,
    weather_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WtDay {
    date: String,
    #[serde(rename = "maxtempC")]
    max_temp_c: String,
    #[serde(rename = "mintempC")]
    min_temp_c: String,
    #[serde(default)]
    hourly: Vec<WtHour>,
}

#[derive(Debug, Deserialize)]
struct WtResponse {
    #[serde(default)]
    current_condition: Vec<WtCurrent>,
    #[serde(default)]
    nearest_area: Vec<WtArea>,
    #[serde(default)]
    weather: Vec<WtDay>,
}

#[derive(Debug, Clone)]
pub struct WttrProvider {
    base_url: String,
    http: Client,
}

impl WttrProvider {
    pub fn with_base_url(base_url: &str, http: Client) -> Self {
        Self { base_url: base_url.to_string(), http }
    }

    /// The city goes into the path, percent-encoded as a single segment.
    fn url_for(&self, city: &str) -> Result<Url, WeatherError> {
        let mut url = Url::parse(&self.base_url).map_err(|err| {
            WeatherError::Configuration(format!("invalid wttr base URL '{}': {err}", self.base_url))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                WeatherError::Configuration(format!(
                    "wttr base URL '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push(city);

        url.query_pairs_mut().append_pair("format", "j1").append_pair("lang", "ru");
        Ok(url)
    }

    async fn fetch_payload(&self, city: &str) -> Result<WtResponse, WeatherError> {
        let url = self.url_for(city)?;
        tracing::debug!(provider = %ID, city, %url, "requesting aggregated weather");

        let (status, body) = send(ID, self.http.get(url)).await?;

        if status == StatusCode::NOT_FOUND {
            return Err(WeatherError::city_not_found(city));
        }
        if !status.is_success() {
            return Err(status_error(ID, status, &body));
        }

        parse_json(ID, &body)
    }

    async fn forecast(&self, city: &str) -> Result<Vec<ForecastDay>, WeatherError> {
        let payload = self.fetch_payload(city).await?;
        build_forecast_days(&payload.weather)
    }
}

fn number(field: &str, raw: &str) -> Result<f64, WeatherError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| WeatherError::upstream(ID, format!("field {field} is not numeric: '{raw}'")))
}

fn optional_number(raw: Option<&String>) -> Option<f64> {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
}

fn code(field: &str, raw: &str) -> Result<i32, WeatherError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| WeatherError::upstream(ID, format!("field {field} is not an integer: '{raw}'")))
}

fn first_value(values: &[WtValue]) -> Option<String> {
    values
        .first()
        .map(|v| v.value.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn build_current(city: &str, payload: WtResponse) -> Result<CanonicalWeather, WeatherError> {
    let current = payload
        .current_condition
        .first()
        .ok_or_else(|| WeatherError::upstream(ID, "payload has no current_condition"))?;

    let temp = number("temp_C", &current.temp_c)?;
    let today = payload.weather.first();

    let (temp_min, temp_max) = match today {
        Some(day) => (number("mintempC", &day.min_temp_c)?, number("maxtempC", &day.max_temp_c)?),
        None => (temp, temp),
    };

    let date = today
        .and_then(|day| NaiveDate::parse_from_str(day.date.trim(), "%Y-%m-%d").ok())
        .unwrap_or_else(|| Local::now().date_naive());
    let sys = synthetic_sun_times(date)?;

    let wind = match (
        optional_number(current.windspeed_kmph.as_ref()),
        optional_number(current.winddir_degree.as_ref()),
    ) {
        (Some(kmph), Some(deg)) => {
            Some(Wind { speed: units::kmh_to_mps(kmph), deg: units::normalize_degrees(deg) })
        }
        _ => None,
    };

    let area = payload.nearest_area.first();
    let name = area
        .and_then(|a| first_value(&a.area_name))
        .unwrap_or_else(|| city.to_string());
    let country = area.and_then(|a| first_value(&a.country)).unwrap_or_default();

    Ok(CanonicalWeather {
        name,
        country,
        main: MainReadings {
            temp,
            feels_like: number("FeelsLikeC", &current.feels_like_c)?,
            temp_min,
            temp_max,
            pressure: units::round_pressure(number("pressure", &current.pressure)?),
            humidity: units::clamp_percent(number("humidity", &current.humidity)?),
        },
        wind,
        visibility: optional_number(current.visibility.as_ref()).map(units::km_to_m),
        clouds: optional_number(current.cloudcover.as_ref()).map(units::clamp_percent),
        sys,
        conditions: vec![classify(CodeFamily::Wwo, code("weatherCode", &current.weather_code)?)],
    })
}

fn synthetic_sun_times(date: NaiveDate) -> Result<SunTimes, WeatherError> {
    let at = |(hour, minute): (u32, u32)| {
        units::local_clock_to_epoch(date, hour, minute).ok_or_else(|| {
            WeatherError::upstream(ID, format!("{date} {hour:02}:{minute:02} has no local time"))
        })
    };

    Ok(SunTimes { sunrise: at(SYNTHETIC_SUNRISE)?, sunset: at(SYNTHETIC_SUNSET)? })
}

fn build_forecast_days(days: &[WtDay]) -> Result<Vec<ForecastDay>, WeatherError> {
    days.iter()
        .filter_map(|day| {
            let slot = day
                .hourly
                .iter()
                .find(|hour| hour.time.trim() == MIDDAY_SLOT)
                .or_else(|| day.hourly.first())?;
            Some((day, slot))
        })
        .map(|(day, slot)| -> Result<ForecastDay, WeatherError> {
            let condition = classify(CodeFamily::Wwo, code("weatherCode", &slot.weather_code)?);
            Ok(ForecastDay {
                date: locale::label_for_iso_date(&day.date),
                temp_min: number("mintempC", &day.min_temp_c)?,
                temp_max: number("maxtempC", &day.max_temp_c)?,
                main: condition.main,
                description: condition.description,
                icon: condition.icon,
            })
        })
        .collect()
}

#[async_trait]
impl WeatherProvider for WttrProvider {
    fn id(&self) -> ProviderId {
        ID
    }

    async fn fetch_current(&self, city: &str) -> Result<CanonicalWeather, WeatherError> {
        let payload = self.fetch_payload(city).await?;
        build_current(city, payload)
    }

    async fn fetch_forecast(&self, city: &str) -> Vec<ForecastDay> {
        degrade_forecast(ID, city, self.forecast(city).await)
    }
}
