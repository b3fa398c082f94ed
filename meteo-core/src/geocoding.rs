//! Free-text city lookup against the Open-Meteo geocoding API.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    WeatherError,
    model::GeocodeResult,
    provider::{self, ProviderId},
};

pub const GEOCODING_ENDPOINT: &str = "https://geocoding-api.open-meteo.com/v1/search";

#[derive(Debug, Serialize)]
struct GeocodeQuery<'a> {
    name: &'a str,
    count: u8,
    language: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeHit>,
}

#[derive(Debug, Deserialize)]
struct GeocodeHit {
    name: String,
    latitude: f64,
    longitude: f64,
    country_code: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    http: Client,
    endpoint: String,
}

impl Geocoder {
    pub fn new(http: Client) -> Self {
        Self::with_endpoint(http, GEOCODING_ENDPOINT)
    }

    pub fn with_endpoint(http: Client, endpoint: &str) -> Self {
        Self { http, endpoint: endpoint.to_string() }
    }

    pub async fn resolve(&self, city: &str) -> Result<GeocodeResult, WeatherError> {
        let query = GeocodeQuery { name: city, count: 1, language: "ru", format: "json" };

        tracing::debug!(city, endpoint = %self.endpoint, "geocoding city");

        let (status, body) =
            provider::send(ProviderId::OpenMeteo, self.http.get(&self.endpoint).query(&query))
                .await?;

        if !status.is_success() {
            return Err(WeatherError::Network(format!(
                "geocoding request failed with status {}: {}",
                status,
                provider::truncate_body(&body)
            )));
        }

        let location = parse_geocode_response(&body, city)?;
        tracing::debug!(
            city,
            name = %location.name,
            lat = location.latitude,
            lon = location.longitude,
            "geocoded"
        );

        Ok(location)
    }
}

fn parse_geocode_response(body: &str, city: &str) -> Result<GeocodeResult, WeatherError> {
    let payload: GeocodeResponse = provider::parse_json(ProviderId::OpenMeteo, body)?;

    let Some(hit) = payload.results.into_iter().next() else {
        return Err(WeatherError::city_not_found(city));
    };

    let name = match hit.name.trim() {
        "" => city.to_string(),
        name => name.to_string(),
    };

    let country = hit
        .country_code
        .or(hit.country)
        .map(|value| value.trim().to_string())
        .unwrap_or_default();

    Ok(GeocodeResult { name, country, latitude: hit.latitude, longitude: hit.longitude })
}
