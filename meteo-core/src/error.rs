use thiserror::Error;

use crate::provider::ProviderId;

/// Every failure the gateway can surface to its caller.
///
/// `Display` is an English diagnostic meant for logs; [`WeatherError::user_message`]
/// is the localized text shown to the person who typed the city name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WeatherError {
    #[error("city not found: {city}")]
    CityNotFound { city: String },

    #[error("credential rejected by provider '{provider}'")]
    InvalidCredential { provider: ProviderId },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("{provider} upstream error: {message}")]
    Upstream { provider: ProviderId, message: String },
}

impl WeatherError {
    pub fn city_not_found(city: &str) -> Self {
        WeatherError::CityNotFound { city: city.to_string() }
    }

    pub fn upstream(provider: ProviderId, message: impl Into<String>) -> Self {
        WeatherError::Upstream { provider, message: message.into() }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::CityNotFound { .. } => "Город не найден. Попробуйте другой город.",
            WeatherError::InvalidCredential { .. } => {
                "Неверный API-ключ. Проверьте настройки провайдера."
            }
            WeatherError::Configuration(_) => {
                "Провайдер погоды не настроен. Укажите API-ключ или выберите другого провайдера."
            }
            WeatherError::Network(_) => {
                "Ошибка при получении данных. Проверьте подключение к интернету."
            }
            WeatherError::Upstream { .. } => "Ошибка запроса",
        }
    }
}
