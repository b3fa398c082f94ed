//! Text and JSON output for `meteo show`.
//!
//! Temperatures are rounded to whole degrees here and nowhere else.

use chrono::{DateTime, NaiveDate, TimeZone};
use meteo_core::{CanonicalWeather, ForecastDay, ProviderId, locale};
use std::fmt::{self, Display, Write};

/// Above this the weather counts as warm.
const WARM_THRESHOLD_C: f64 = 16.0;

fn degrees(value: f64) -> i64 {
    value.round() as i64
}

fn clock<Tz>(epoch: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    DateTime::from_timestamp(epoch, 0)
        .map(|dt| dt.with_timezone(tz).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

pub fn is_warm(weather: &CanonicalWeather) -> bool {
    weather.main.temp > WARM_THRESHOLD_C
}

pub fn render_text<Tz>(
    weather: &CanonicalWeather,
    forecast: &[ForecastDay],
    today: NaiveDate,
    tz: &Tz,
) -> Result<String, fmt::Error>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();
    write_current(&mut out, weather, today, tz)?;
    write_forecast(&mut out, forecast)?;
    Ok(out)
}

fn write_current<Tz>(
    out: &mut impl Write,
    weather: &CanonicalWeather,
    today: NaiveDate,
    tz: &Tz,
) -> fmt::Result
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let main = &weather.main;

    if weather.country.is_empty() {
        writeln!(out, "{}", weather.name)?;
    } else {
        writeln!(out, "{}, {}", weather.name, weather.country)?;
    }
    writeln!(out, "{}\n", locale::full_date_label(today))?;

    let condition = weather
        .primary_condition()
        .map(|c| format!("{} ({})", c.main, c.description))
        .unwrap_or_default();
    let warm = if is_warm(weather) { "  [тепло]" } else { "" };
    writeln!(out, "{}°c  {}{}", degrees(main.temp), condition, warm)?;
    writeln!(
        out,
        "Ощущается как {}°, мин. {}° / макс. {}°",
        degrees(main.feels_like),
        degrees(main.temp_min),
        degrees(main.temp_max)
    )?;
    writeln!(out, "Влажность {}%, давление {} гПа", main.humidity, main.pressure)?;

    if let Some(wind) = &weather.wind {
        writeln!(out, "Ветер {:.1} м/с, {}°", wind.speed, wind.deg)?;
    }
    if let Some(visibility) = weather.visibility {
        writeln!(out, "Видимость {:.1} км", f64::from(visibility) / 1000.0)?;
    }
    if let Some(clouds) = weather.clouds {
        writeln!(out, "Облачность {clouds}%")?;
    }
    writeln!(
        out,
        "Восход {}, закат {}",
        clock(weather.sys.sunrise, tz),
        clock(weather.sys.sunset, tz)
    )
}

fn write_forecast(out: &mut impl Write, forecast: &[ForecastDay]) -> fmt::Result {
    if forecast.is_empty() {
        return Ok(());
    }

    writeln!(out, "\nПрогноз на {} дн.", forecast.len())?;
    for day in forecast {
        writeln!(
            out,
            "{:<16} {:>4}° / {:>4}°  {}",
            day.date,
            degrees(day.temp_max),
            degrees(day.temp_min),
            day.description
        )?;
    }
    Ok(())
}

pub fn render_json(
    provider: ProviderId,
    weather: &CanonicalWeather,
    forecast: &[ForecastDay],
) -> anyhow::Result<String> {
    let value = serde_json::json!({
        "provider": provider,
        "current": weather,
        "forecast": forecast,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}
