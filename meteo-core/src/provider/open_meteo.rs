use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    WeatherError,
    condition::{CodeFamily, classify},
    geocoding::Geocoder,
    locale,
    model::{CanonicalWeather, ForecastDay, GeocodeResult, MainReadings, SunTimes, Wind},
    units,
};

use super::{ProviderId, WeatherProvider, degrade_forecast, parse_json, send, status_error};

pub const FORECAST_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";

const ID: ProviderId = ProviderId::OpenMeteo;
const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
weather_code,surface_pressure,wind_speed_10m,wind_direction_10m,cloud_cover,visibility";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,sunrise,sunset";
const FORECAST_DAYS: usize = 7;

/// Visibility reported when the upstream leaves it out.
const CLEAR_VISIBILITY_M: u32 = 10_000;

#[derive(Debug, Serialize)]
struct ForecastQuery<'a> {
    latitude: f64,
    longitude: f64,
    current: &'a str,
    daily: &'a str,
    timezone: &'a str,
    forecast_days: usize,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    #[serde(default)]
    utc_offset_seconds: i32,
    current: Option<OmCurrent>,
    daily: Option<OmDaily>,
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: f64,
    apparent_temperature: f64,
    relative_humidity_2m: f64,
    surface_pressure: f64,
    weather_code: i32,
    wind_speed_10m: Option<f64>,
    wind_direction_10m: Option<f64>,
    cloud_cover: Option<f64>,
    visibility: Option<f64>,
}

/// Open-Meteo fills days it has no data for with `null`.
#[derive(Debug, Deserialize)]
struct OmDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    weather_code: Vec<Option<i32>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    sunrise: Vec<Option<String>>,
    #[serde(default)]
    sunset: Vec<Option<String>>,
}

fn first<T: Copy>(values: &[Option<T>]) -> Option<T> {
    values.first().copied().flatten()
}

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    geocoder: Geocoder,
    endpoint: String,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn with_endpoint(geocoder: Geocoder, endpoint: &str, http: Client) -> Self {
        Self { geocoder, endpoint: endpoint.to_string(), http }
    }

    /// Geocode first, then one combined current + daily request.
    /// A geocoding failure stops the chain before the weather request.
    async fn fetch_payload(&self, city: &str) -> Result<(GeocodeResult, OmResponse), WeatherError> {
        let location = self.geocoder.resolve(city).await?;

        let query = ForecastQuery {
            latitude: location.latitude,
            longitude: location.longitude,
            current: CURRENT_FIELDS,
            daily: DAILY_FIELDS,
            timezone: "auto",
            forecast_days: FORECAST_DAYS,
        };

        tracing::debug!(provider = %ID, city, endpoint = %self.endpoint, "requesting forecast");

        let (status, body) = send(ID, self.http.get(&self.endpoint).query(&query)).await?;
        if !status.is_success() {
            return Err(status_error(ID, status, &body));
        }

        let payload = parse_json(ID, &body)?;
        Ok((location, payload))
    }

    async fn forecast(&self, city: &str) -> Result<Vec<ForecastDay>, WeatherError> {
        let (_, payload) = self.fetch_payload(city).await?;
        match payload.daily {
            Some(daily) => build_forecast_days(daily),
            None => Ok(Vec::new()),
        }
    }
}

fn build_current(
    location: GeocodeResult,
    payload: OmResponse,
) -> Result<CanonicalWeather, WeatherError> {
    let current = payload
        .current
        .ok_or_else(|| WeatherError::upstream(ID, "payload has no current block"))?;
    let daily = payload
        .daily
        .ok_or_else(|| WeatherError::upstream(ID, "payload has no daily block"))?;

    let offset = payload.utc_offset_seconds;
    let sun_time = |values: &[Option<String>], field: &str| {
        values
            .first()
            .and_then(Option::as_deref)
            .and_then(|value| units::local_iso_to_epoch(value, offset))
            .ok_or_else(|| WeatherError::upstream(ID, format!("payload has no usable daily.{field}")))
    };
    let sunrise = sun_time(&daily.sunrise, "sunrise")?;
    let sunset = sun_time(&daily.sunset, "sunset")?;

    let temp = current.temperature_2m;
    let wind = Wind {
        speed: units::kmh_to_mps(current.wind_speed_10m.unwrap_or(0.0)),
        deg: units::normalize_degrees(current.wind_direction_10m.unwrap_or(0.0)),
    };

    Ok(CanonicalWeather {
        name: location.name,
        country: location.country,
        main: MainReadings {
            temp,
            feels_like: current.apparent_temperature,
            temp_min: first(&daily.temperature_2m_min).unwrap_or(temp),
            temp_max: first(&daily.temperature_2m_max).unwrap_or(temp),
            pressure: units::round_pressure(current.surface_pressure),
            humidity: units::clamp_percent(current.relative_humidity_2m),
        },
        wind: Some(wind),
        visibility: Some(
            current.visibility.map(|v| v.max(0.0).round() as u32).unwrap_or(CLEAR_VISIBILITY_M),
        ),
        clouds: Some(units::clamp_percent(current.cloud_cover.unwrap_or(0.0))),
        sys: SunTimes { sunrise, sunset },
        conditions: vec![classify(CodeFamily::Wmo, current.weather_code)],
    })
}

fn build_forecast_days(daily: OmDaily) -> Result<Vec<ForecastDay>, WeatherError> {
    let length = daily.time.len();

    if daily.weather_code.len() != length
        || daily.temperature_2m_max.len() != length
        || daily.temperature_2m_min.len() != length
    {
        return Err(WeatherError::upstream(ID, "daily arrays length mismatch"));
    }

    let days = (0..length.min(FORECAST_DAYS))
        .filter_map(|index| {
            let (Some(code), Some(temp_min), Some(temp_max)) = (
                daily.weather_code[index],
                daily.temperature_2m_min[index],
                daily.temperature_2m_max[index],
            ) else {
                tracing::debug!(provider = %ID, date = %daily.time[index], "skipping day with gaps");
                return None;
            };

            let condition = classify(CodeFamily::Wmo, code);
            Some(ForecastDay {
                date: locale::label_for_iso_date(&daily.time[index]),
                temp_min,
                temp_max,
                main: condition.main,
                description: condition.description,
                icon: condition.icon,
            })
        })
        .collect();

    Ok(days)
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    fn id(&self) -> ProviderId {
        ID
    }

    async fn fetch_current(&self, city: &str) -> Result<CanonicalWeather, WeatherError> {
        let (location, payload) = self.fetch_payload(city).await?;
        build_current(location, payload)
    }

    async fn fetch_forecast(&self, city: &str) -> Vec<ForecastDay> {
        degrade_forecast(ID, city, self.forecast(city).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> GeocodeResult {
        GeocodeResult {
            name: "Берлин".into(),
            country: "DE".into(),
            latitude: 52.52,
            longitude: 13.41,
        }
    }

    fn payload(body: &str) -> OmResponse {
        serde_json::from_str(body).expect("payload")
    }

    const FULL: &str = r#"{
        "utc_offset_seconds": 7200,
        "current": {
            "temperature_2m": 18.3,
            "apparent_temperature": 17.1,
            "relative_humidity_2m": 55,
            "surface_pressure": 1008.7,
            "weather_code": 2,
            "wind_speed_10m": 18.0,
            "wind_direction_10m": 270,
            "cloud_cover": 40,
            "visibility": 24140
        },
        "daily": {
            "time": ["2024-05-01", "2024-05-02"],
            "weather_code": [2, 61],
            "temperature_2m_max": [21.4, 17.0],
            "temperature_2m_min": [9.8, 11.2],
            "sunrise": ["2024-05-01T05:34", "2024-05-02T05:32"],
            "sunset": ["2024-05-01T20:39", "2024-05-02T20:41"]
        }
    }"#;

    #[test]
    fn builds_current_from_full_payload() {
        let weather = build_current(location(), payload(FULL)).expect("current");

        assert_eq!(weather.name, "Берлин");
        assert_eq!(weather.country, "DE");
        assert_eq!(weather.main.temp, 18.3);
        assert_eq!(weather.main.feels_like, 17.1);
        assert_eq!(weather.main.temp_min, 9.8);
        assert_eq!(weather.main.temp_max, 21.4);
        assert_eq!(weather.main.pressure, 1009);
        assert_eq!(weather.main.humidity, 55);
        let wind = weather.wind.as_ref().expect("wind");
        assert!((wind.speed - 5.0).abs() < 1e-9);
        assert_eq!(wind.deg, 270);
        assert_eq!(weather.visibility, Some(24_140));
        assert_eq!(weather.clouds, Some(40));
        // 05:34 at UTC+2 is 03:34Z
        assert_eq!(weather.sys.sunrise, 1_714_534_440);
        assert_eq!(weather.conditions[0].main, "Clouds");
    }

    #[test]
    fn synthesizes_missing_optional_fields() {
        let body = r#"{
            "utc_offset_seconds": 0,
            "current": {
                "temperature_2m": 5.0,
                "apparent_temperature": 2.0,
                "relative_humidity_2m": 90,
                "surface_pressure": 1020.2,
                "weather_code": 45
            },
            "daily": {
                "time": ["2024-01-10"],
                "weather_code": [45],
                "temperature_2m_max": [6.0],
                "temperature_2m_min": [1.0],
                "sunrise": ["2024-01-10T08:05"],
                "sunset": ["2024-01-10T16:10"]
            }
        }"#;

        let weather = build_current(location(), payload(body)).expect("current");
        assert_eq!(weather.wind, Some(Wind { speed: 0.0, deg: 0 }));
        assert_eq!(weather.visibility, Some(CLEAR_VISIBILITY_M));
        assert_eq!(weather.clouds, Some(0));
        assert_eq!(weather.conditions[0].main, "Fog");
    }

    #[test]
    fn missing_sunrise_is_upstream_error() {
        let body = r#"{
            "current": {
                "temperature_2m": 5.0, "apparent_temperature": 2.0,
                "relative_humidity_2m": 90, "surface_pressure": 1020.2, "weather_code": 0
            },
            "daily": { "time": [], "weather_code": [], "temperature_2m_max": [], "temperature_2m_min": [] }
        }"#;

        let err = build_current(location(), payload(body)).unwrap_err();
        assert!(err.to_string().contains("daily.sunrise"));
    }

    #[test]
    fn forecast_days_are_labeled_and_classified() {
        let days = build_forecast_days(payload(FULL).daily.unwrap()).expect("days");

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, "Ср, 1 Май");
        assert_eq!(days[0].temp_max, 21.4);
        assert_eq!(days[1].main, "Rain");
        assert_eq!(days[1].icon, "10d");
    }

    const GAPPY: &str = r#"{
        "utc_offset_seconds": 0,
        "current": {
            "temperature_2m": 7.5, "apparent_temperature": 5.0,
            "relative_humidity_2m": 80, "surface_pressure": 1001.0, "weather_code": 3
        },
        "daily": {
            "time": ["2024-05-01", "2024-05-02", "2024-05-03"],
            "weather_code": [3, null, 61],
            "temperature_2m_max": [12.0, null, 14.5],
            "temperature_2m_min": [null, 4.0, 6.0],
            "sunrise": ["2024-05-01T05:34", null, "2024-05-03T05:30"],
            "sunset": ["2024-05-01T20:39", null, "2024-05-03T20:43"]
        }
    }"#;

    #[test]
    fn nulls_in_daily_arrays_do_not_break_current() {
        let weather = build_current(location(), payload(GAPPY)).expect("current");

        assert_eq!(weather.main.temp_max, 12.0);
        assert_eq!(weather.main.temp_min, 7.5);
        assert_eq!(weather.sys.sunrise, 1_714_541_640);
    }

    #[test]
    fn forecast_skips_days_with_nulls() {
        let days = build_forecast_days(payload(GAPPY).daily.unwrap()).expect("days");

        let dates: Vec<_> = days.iter().map(|day| day.date.as_str()).collect();
        assert_eq!(dates, ["Пт, 3 Май"]);
        assert_eq!(days[0].temp_min, 6.0);
        assert_eq!(days[0].main, "Rain");
    }

    #[test]
    fn forecast_rejects_mismatched_lengths() {
        let daily = OmDaily {
            time: vec!["2024-05-01".into(), "2024-05-02".into()],
            weather_code: vec![Some(1)],
            temperature_2m_max: vec![Some(1.0), Some(2.0)],
            temperature_2m_min: vec![Some(0.0), Some(1.0)],
            sunrise: vec![],
            sunset: vec![],
        };

        let err = build_forecast_days(daily).unwrap_err();
        assert!(err.to_string().contains("length mismatch"));
    }

    #[test]
    fn forecast_is_capped_at_seven_days() {
        let n = 10;
        let daily = OmDaily {
            time: (1..=n).map(|d| format!("2024-05-{d:02}")).collect(),
            weather_code: vec![Some(0); n],
            temperature_2m_max: vec![Some(20.0); n],
            temperature_2m_min: vec![Some(10.0); n],
            sunrise: vec![],
            sunset: vec![],
        };

        assert_eq!(build_forecast_days(daily).unwrap().len(), FORECAST_DAYS);
    }
}
