use anyhow::{Context, anyhow, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{Password, Text};
use meteo_core::{Config, ProviderId, WeatherError, WeatherGateway};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteo", version, about = "Current weather and forecast for a city")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials and endpoint for a provider.
    Configure {
        /// Provider id: "openweather", "openmeteo" or "wttr".
        provider: String,
    },

    /// Show current weather and the forecast for a city.
    Show {
        /// City name; several words are joined with spaces.
        #[arg(required = true)]
        city: Vec<String>,

        /// Use this provider instead of the configured default.
        #[arg(long)]
        provider: Option<String>,

        /// Print machine-readable JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// List providers and whether they are ready to use.
    Providers,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Show { city, provider, json } => show(&city.join(" "), provider, json).await,
            Command::Providers => providers(),
        }
    }
}

fn load_config() -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    config.apply_env()?;
    Ok(config)
}

fn describe(err: WeatherError) -> anyhow::Error {
    anyhow!("{}\n({err})", err.user_message())
}

async fn show(city: &str, provider: Option<String>, json: bool) -> anyhow::Result<()> {
    let city = city.trim();
    if city.is_empty() {
        bail!("City name must not be empty.");
    }

    let config = load_config()?;
    let id = match provider.as_deref() {
        Some(raw) => ProviderId::try_from(raw)?,
        None => config.default_provider_id()?,
    };
    tracing::debug!(provider = %id, city, "showing weather");

    let gateway = WeatherGateway::new(config.provider_config(id)).map_err(describe)?;
    let weather = gateway.fetch_current(city).await.map_err(describe)?;
    let forecast = gateway.fetch_forecast(city).await;

    let output = if json {
        render::render_json(gateway.provider_id(), &weather, &forecast)?
    } else {
        render::render_text(&weather, &forecast, Local::now().date_naive(), &Local)?
    };
    print!("{output}");
    if json {
        println!();
    }

    Ok(())
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    if id.requires_credential() {
        let key = Password::new(&format!("API key for {id}:"))
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?;
        if key.trim().is_empty() {
            bail!("API key must not be empty.");
        }
        config.upsert_provider_api_key(id, key.trim().to_string());
    } else if config.default_provider.is_none() {
        config.set_default_provider(id);
    }

    let base_url = Text::new("Base URL (leave empty for the default):")
        .prompt()
        .context("Failed to read base URL")?;
    let base_url = Some(base_url.trim().to_string()).filter(|url| !url.is_empty());
    config.set_provider_base_url(id, base_url);

    config.save()?;
    println!("Saved {id} settings to {}", Config::config_file_path()?.display());

    Ok(())
}

fn providers() -> anyhow::Result<()> {
    let config = load_config()?;
    let default = config.default_provider_id().ok();

    for id in ProviderId::all() {
        let marker = if Some(*id) == default { "*" } else { " " };
        let status = if config.is_provider_configured(*id) { "ready" } else { "needs API key" };
        let forecast = if id.supports_forecast() { "current + forecast" } else { "current only" };
        println!("{marker} {:<12} {:<14} {forecast}", id.as_str(), status);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_joins_multi_word_city() {
        let cli = Cli::try_parse_from(["meteo", "show", "New", "York", "--provider", "wttr"])
            .expect("parse");

        match cli.command {
            Command::Show { city, provider, json } => {
                assert_eq!(city.join(" "), "New York");
                assert_eq!(provider.as_deref(), Some("wttr"));
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn show_requires_a_city() {
        assert!(Cli::try_parse_from(["meteo", "show"]).is_err());
    }

    #[tokio::test]
    async fn show_rejects_blank_city_before_loading_anything() {
        let err = show("   ", None, false).await.unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }
}
