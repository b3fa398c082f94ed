use crate::{
    CanonicalWeather, ForecastDay, WeatherError,
    config::ProviderConfig,
    geocoding::Geocoder,
    provider::{open_meteo::OpenMeteoProvider, openweather::OpenWeatherProvider, wttr::WttrProvider},
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use std::{convert::TryFrom, fmt::Debug};

pub mod open_meteo;
pub mod openweather;
pub mod wttr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// OpenWeatherMap, addressed by city name, requires an API key.
    OpenWeather,
    /// Open-Meteo, addressed by coordinates obtained from its geocoder.
    OpenMeteo,
    /// wttr.in aggregated JSON feed.
    Wttr,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::OpenMeteo => "openmeteo",
            ProviderId::Wttr => "wttr",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::OpenMeteo, ProviderId::Wttr]
    }

    pub fn requires_credential(&self) -> bool {
        matches!(self, ProviderId::OpenWeather)
    }

    pub fn supports_forecast(&self) -> bool {
        !matches!(self, ProviderId::OpenWeather)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "openmeteo" => Ok(ProviderId::OpenMeteo),
            "wttr" => Ok(ProviderId::Wttr),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, openmeteo, wttr."
            )),
        }
    }
}

/// A weather backend normalized into the canonical schema.
///
/// `fetch_forecast` has no error channel: forecast data is supplementary, so
/// implementations log the failure and hand back an empty list instead.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn fetch_current(&self, city: &str) -> Result<CanonicalWeather, WeatherError>;

    async fn fetch_forecast(&self, city: &str) -> Vec<ForecastDay>;
}

/// Build the adapter selected by `config`.
///
/// Refuses to build the credentialed adapter without a key, so a missing key
/// is reported before anything touches the network.
pub fn provider_from_config(
    config: &ProviderConfig,
) -> Result<Box<dyn WeatherProvider>, WeatherError> {
    let http = Client::new();

    let boxed: Box<dyn WeatherProvider> = match config.provider {
        ProviderId::OpenWeather => {
            let api_key = config.credential().ok_or_else(|| {
                WeatherError::Configuration(format!(
                    "No API key configured for provider '{}'. \
                     Run `meteo configure {}` or set METEO_API_KEY.",
                    config.provider, config.provider
                ))
            })?;
            let base_url = config.base_url.as_deref().unwrap_or(openweather::DEFAULT_BASE_URL);
            Box::new(OpenWeatherProvider::with_base_url(api_key.to_owned(), base_url, http))
        }
        ProviderId::OpenMeteo => {
            let geocoder = match config.geocoding_url.as_deref() {
                Some(endpoint) => Geocoder::with_endpoint(http.clone(), endpoint),
                None => Geocoder::new(http.clone()),
            };
            let endpoint = config.base_url.as_deref().unwrap_or(open_meteo::FORECAST_ENDPOINT);
            Box::new(OpenMeteoProvider::with_endpoint(geocoder, endpoint, http))
        }
        ProviderId::Wttr => {
            let base_url = config.base_url.as_deref().unwrap_or(wttr::DEFAULT_BASE_URL);
            Box::new(WttrProvider::with_base_url(base_url, http))
        }
    };

    Ok(boxed)
}

/// Sends `request` and returns the status with the full body.
///
/// Only transport problems are errors here; status interpretation is left to
/// the caller because every upstream signals failures differently.
pub(crate) async fn send(
    provider: ProviderId,
    request: RequestBuilder,
) -> Result<(StatusCode, String), WeatherError> {
    let res = request.send().await.map_err(|err| {
        WeatherError::Network(format!("request to {provider} failed: {err}"))
    })?;

    tracing::debug!(%provider, url = %res.url(), status = %res.status(), "upstream responded");

    let status = res.status();
    let body = res.text().await.map_err(|err| {
        WeatherError::Network(format!("failed to read {provider} response body: {err}"))
    })?;

    Ok((status, body))
}

pub(crate) fn parse_json<T: DeserializeOwned>(
    provider: ProviderId,
    body: &str,
) -> Result<T, WeatherError> {
    serde_json::from_str(body)
        .map_err(|err| WeatherError::upstream(provider, format!("unexpected payload: {err}")))
}

pub(crate) fn status_error(provider: ProviderId, status: StatusCode, body: &str) -> WeatherError {
    WeatherError::upstream(
        provider,
        format!("request failed with status {}: {}", status, truncate_body(body)),
    )
}

/// Forecast failures never reach the caller; they are logged and flattened.
pub(crate) fn degrade_forecast(
    provider: ProviderId,
    city: &str,
    result: Result<Vec<ForecastDay>, WeatherError>,
) -> Vec<ForecastDay> {
    result.unwrap_or_else(|err| {
        tracing::warn!(%provider, city, error = %err, "forecast unavailable, returning empty list");
        Vec::new()
    })
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}
