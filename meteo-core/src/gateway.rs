use crate::{
    CanonicalWeather, ForecastDay, WeatherError,
    config::ProviderConfig,
    provider::{ProviderId, WeatherProvider, provider_from_config},
};

/// The single entry point callers use to get weather for a city.
///
/// One adapter is chosen at construction and used for every call afterwards.
/// Errors from `fetch_current` are passed through exactly as the adapter
/// produced them.
///
/// `city` is expected to be trimmed and non-empty; validating input is the
/// caller's job.
#[derive(Debug)]
pub struct WeatherGateway {
    provider: Box<dyn WeatherProvider>,
}

impl WeatherGateway {
    pub fn new(config: ProviderConfig) -> Result<Self, WeatherError> {
        let provider = provider_from_config(&config)?;
        tracing::info!(provider = %provider.id(), "weather gateway ready");
        Ok(Self { provider })
    }

    /// Wrap an already constructed adapter.
    pub fn from_provider(provider: Box<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_id(&self) -> ProviderId {
        self.provider.id()
    }

    pub async fn fetch_current(&self, city: &str) -> Result<CanonicalWeather, WeatherError> {
        self.provider.fetch_current(city).await
    }

    /// Up to seven days, oldest first. Empty when the provider has no
    /// forecast or the forecast could not be fetched.
    pub async fn fetch_forecast(&self, city: &str) -> Vec<ForecastDay> {
        self.provider.fetch_forecast(city).await
    }
}
