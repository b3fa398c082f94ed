//! Core library for the `meteo` CLI.
//!
//! This crate defines:
//! - A gateway over three interchangeable weather providers
//! - Geocoding for coordinate-addressed providers
//! - Code classification and unit normalization into one canonical schema
//! - Configuration & credentials handling
//!
//! It is used by `meteo-cli`, but can also be reused by other binaries or services.

pub mod condition;
pub mod config;
pub mod error;
pub mod gateway;
pub mod geocoding;
pub mod locale;
pub mod model;
pub mod provider;
pub mod units;

pub use config::{Config, ProviderConfig, ProviderSettings};
pub use error::WeatherError;
pub use gateway::WeatherGateway;
pub use model::{CanonicalWeather, ConditionEntry, ForecastDay, GeocodeResult, MainReadings};
pub use provider::{ProviderId, WeatherProvider};
