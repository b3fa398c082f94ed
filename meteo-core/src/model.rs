use serde::{Deserialize, Serialize};

/// One classified weather phenomenon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionEntry {
    /// Provider-native numeric code the entry was derived from.
    pub id: i32,
    /// Canonical category label, e.g. "Clear", "Clouds", "Rain".
    pub main: String,
    pub description: String,
    /// Icon token in the OpenWeatherMap icon set, e.g. "01d".
    pub icon: String,
}

/// Temperatures in °C, humidity in percent, pressure in hPa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: i32,
    pub humidity: u8,
}

/// Wind exists only as a complete pair; speed in m/s, direction in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    pub deg: u16,
}

/// Sunrise and sunset as UTC epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunTimes {
    pub sunrise: i64,
    pub sunset: i64,
}

/// Current conditions in the shape every provider is normalized into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalWeather {
    pub name: String,
    pub country: String,
    pub main: MainReadings,
    pub wind: Option<Wind>,
    /// Meters.
    pub visibility: Option<u32>,
    /// Cloud cover in percent.
    pub clouds: Option<u8>,
    pub sys: SunTimes,
    /// Never empty; the first entry is the primary condition.
    pub conditions: Vec<ConditionEntry>,
}

impl CanonicalWeather {
    pub fn primary_condition(&self) -> Option<&ConditionEntry> {
        self.conditions.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// Display label, e.g. "Пн, 12 Май".
    pub date: String,
    pub temp_min: f64,
    pub temp_max: f64,
    pub main: String,
    pub description: String,
    pub icon: String,
}

/// Output of the geocoder; lives only for the duration of one fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}
