//! Unit conversions from provider-native values into the canonical schema.
//!
//! Temperatures are never rounded here; that happens at display time.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

const ISO_LOCAL_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

pub fn kmh_to_mps(kmh: f64) -> f64 {
    kmh / 3.6
}

pub fn km_to_m(km: f64) -> u32 {
    if !km.is_finite() || km <= 0.0 {
        return 0;
    }
    (km * 1000.0).round() as u32
}

pub fn round_pressure(hpa: f64) -> i32 {
    hpa.round() as i32
}

pub fn clamp_percent(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.clamp(0.0, 100.0).round() as u8
}

/// Folds any degree value into `0..360`.
pub fn normalize_degrees(deg: f64) -> u16 {
    if !deg.is_finite() {
        return 0;
    }
    (deg.round() as i64).rem_euclid(360) as u16
}

/// Converts an ISO-8601 local date-time without offset (`2024-05-01T05:31`)
/// into UTC epoch seconds, given the location's offset from UTC.
pub fn local_iso_to_epoch(value: &str, utc_offset_seconds: i32) -> Option<i64> {
    let value = value.trim();
    let naive = ISO_LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())?;

    Some(naive.and_utc().timestamp() - i64::from(utc_offset_seconds))
}

/// Epoch seconds for a wall-clock time on `date` in the machine's local zone.
pub fn local_clock_to_epoch(date: NaiveDate, hour: u32, minute: u32) -> Option<i64> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    Local
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.timestamp())
}
