use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::provider::ProviderId;

pub const ENV_PROVIDER: &str = "METEO_PROVIDER";
pub const ENV_API_KEY: &str = "METEO_API_KEY";
pub const ENV_API_BASE: &str = "METEO_API_BASE";

/// Everything the gateway needs to pick and build one adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider: ProviderId,
    pub credential: Option<String>,
    /// Overrides the provider's weather endpoint.
    pub base_url: Option<String>,
    /// Overrides the geocoding endpoint of coordinate-addressed providers.
    pub geocoding_url: Option<String>,
}

impl ProviderConfig {
    pub fn new(provider: ProviderId) -> Self {
        Self { provider, credential: None, base_url: None, geocoding_url: None }
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_geocoding_url(mut self, geocoding_url: impl Into<String>) -> Self {
        self.geocoding_url = Some(geocoding_url.into());
        self
    }

    /// The credential, if one is set and not blank.
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref().map(str::trim).filter(|key| !key.is_empty())
    }
}

/// Per-provider settings stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProviderSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id: "openweather", "openmeteo" or "wttr".
    pub default_provider: Option<String>,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderSettings>,
}

impl Config {
    /// The provider to use when the caller didn't name one.
    ///
    /// An explicit `default_provider` wins; otherwise OpenWeatherMap is picked
    /// when it has a key and the keyless Open-Meteo when it doesn't.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        if let Some(id) = self.default_provider.as_deref() {
            return ProviderId::try_from(id);
        }

        if self.is_provider_configured(ProviderId::OpenWeather) {
            Ok(ProviderId::OpenWeather)
        } else {
            Ok(ProviderId::OpenMeteo)
        }
    }

    pub fn provider_settings(&self, id: ProviderId) -> Option<&ProviderSettings> {
        self.providers.get(id.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "meteo", "meteo-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay `METEO_*` environment variables on top of the file contents.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::apply_env`] with an injectable variable lookup.
    ///
    /// The key and base URL always target OpenWeatherMap, whichever provider
    /// ends up selected.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(provider) = non_blank(ENV_PROVIDER) {
            let id = ProviderId::try_from(provider.as_str())
                .with_context(|| format!("Invalid {ENV_PROVIDER} value"))?;
            self.set_default_provider(id);
        }

        if let Some(key) = non_blank(ENV_API_KEY) {
            self.settings_mut(ProviderId::OpenWeather).api_key = Some(key);
        }

        if let Some(base) = non_blank(ENV_API_BASE) {
            self.settings_mut(ProviderId::OpenWeather).base_url = Some(base);
        }

        Ok(())
    }

    /// Convenience helper: set/replace a provider API key and optionally set default provider.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.settings_mut(provider_id).api_key = Some(api_key);

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    pub fn set_provider_base_url(&mut self, provider_id: ProviderId, base_url: Option<String>) {
        self.settings_mut(provider_id).base_url = base_url;
    }

    /// Returns API key for a provider, if present and not blank.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_settings(provider_id)
            .and_then(|cfg| cfg.api_key.as_deref())
            .filter(|key| !key.trim().is_empty())
    }

    /// Keyless providers are always usable.
    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        !provider_id.requires_credential() || self.provider_api_key(provider_id).is_some()
    }

    /// Build the gateway's [`ProviderConfig`] for `id` from the stored settings.
    pub fn provider_config(&self, id: ProviderId) -> ProviderConfig {
        let settings = self.provider_settings(id).cloned().unwrap_or_default();

        ProviderConfig {
            provider: id,
            credential: settings.api_key,
            base_url: settings.base_url,
            geocoding_url: None,
        }
    }

    fn settings_mut(&mut self, id: ProviderId) -> &mut ProviderSettings {
        self.providers.entry(id.as_str().to_string()).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            pairs.iter().find(|(key, _)| *key == name).map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn default_provider_falls_back_to_open_meteo_without_key() {
        let cfg = Config::default();
        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenMeteo);
    }

    #[test]
    fn default_provider_prefers_openweather_when_key_present() {
        let mut cfg = Config::default();
        cfg.providers.insert(
            "openweather".into(),
            ProviderSettings { api_key: Some("KEY".into()), base_url: None },
        );

        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenWeather);
    }

    #[test]
    fn default_provider_rejects_unknown_id() {
        let cfg = Config { default_provider: Some("bogus".into()), ..Config::default() };
        assert!(cfg.default_provider_id().is_err());
    }

    #[test]
    fn set_api_key_and_default_for_provider() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::OpenWeather);

        let key = cfg.provider_api_key(ProviderId::OpenWeather);
        assert_eq!(key, Some("OPEN_KEY"));
        assert!(cfg.is_provider_configured(ProviderId::OpenWeather));
    }

    #[test]
    fn blank_key_is_not_configured() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "  ".into());

        assert_eq!(cfg.provider_api_key(ProviderId::OpenWeather), None);
        assert!(!cfg.is_provider_configured(ProviderId::OpenWeather));
        assert!(cfg.is_provider_configured(ProviderId::Wttr));
    }

    #[test]
    fn set_default_provider_overrides_default() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());
        cfg.set_default_provider(ProviderId::Wttr);

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::Wttr);
    }

    #[test]
    fn env_overrides_provider_key_and_base() {
        let mut cfg = Config::default();
        cfg.apply_env_with(env(&[
            (ENV_PROVIDER, "openweather"),
            (ENV_API_KEY, "ENV_KEY"),
            (ENV_API_BASE, "http://localhost:9000/"),
        ]))
        .unwrap();

        let provider = cfg.provider_config(ProviderId::OpenWeather);
        assert_eq!(provider.credential(), Some("ENV_KEY"));
        assert_eq!(provider.base_url.as_deref(), Some("http://localhost:9000/"));
        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenWeather);
    }

    #[test]
    fn env_base_url_targets_openweather_even_without_key() {
        let mut cfg = Config::default();
        cfg.apply_env_with(env(&[(ENV_API_BASE, "https://api.openweathermap.org/data/2.5/")]))
            .unwrap();

        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenMeteo);
        assert_eq!(cfg.provider_config(ProviderId::OpenMeteo).base_url, None);
        assert_eq!(
            cfg.provider_config(ProviderId::OpenWeather).base_url.as_deref(),
            Some("https://api.openweathermap.org/data/2.5/")
        );
    }

    #[test]
    fn env_base_url_ignores_other_default_provider() {
        let mut cfg = Config { default_provider: Some("wttr".into()), ..Config::default() };
        cfg.apply_env_with(env(&[(ENV_API_BASE, "http://localhost:9000/")])).unwrap();

        assert_eq!(cfg.provider_config(ProviderId::Wttr).base_url, None);
        assert_eq!(
            cfg.provider_config(ProviderId::OpenWeather).base_url.as_deref(),
            Some("http://localhost:9000/")
        );
    }

    #[test]
    fn env_with_invalid_provider_fails() {
        let mut cfg = Config::default();
        let err = cfg.apply_env_with(env(&[(ENV_PROVIDER, "nope")])).unwrap_err();
        assert!(err.to_string().contains(ENV_PROVIDER));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut cfg = Config::default();
        cfg.apply_env_with(env(&[(ENV_PROVIDER, ""), (ENV_API_KEY, " ")])).unwrap();

        assert!(cfg.default_provider.is_none());
        assert!(cfg.providers.is_empty());
    }

    #[test]
    fn provider_config_carries_stored_settings() {
        let mut cfg = Config::default();
        cfg.set_provider_base_url(ProviderId::Wttr, Some("http://mirror/".into()));

        let provider = cfg.provider_config(ProviderId::Wttr);
        assert_eq!(provider.provider, ProviderId::Wttr);
        assert_eq!(provider.credential(), None);
        assert_eq!(provider.base_url.as_deref(), Some("http://mirror/"));
    }

    #[test]
    fn config_toml_roundtrip_keeps_providers() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "KEY".into());

        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.default_provider.as_deref(), Some("openweather"));
        assert_eq!(parsed.provider_api_key(ProviderId::OpenWeather), Some("KEY"));
    }
}
