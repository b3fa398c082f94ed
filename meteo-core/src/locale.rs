//! Russian date labels used by forecast entries and the CLI header.

use chrono::{Datelike, NaiveDate};

pub const MONTHS: [&str; 12] = [
    "Январь", "Февраль", "Март", "Апрель", "Май", "Июнь", "Июль", "Август", "Сентябрь",
    "Октябрь", "Ноябрь", "Декабрь",
];

pub const DAYS: [&str; 7] =
    ["Воскресенье", "Понедельник", "Вторник", "Среда", "Четверг", "Пятница", "Суббота"];

const SHORT_DAYS: [&str; 7] = ["Вс", "Пн", "Вт", "Ср", "Чт", "Пт", "Сб"];

/// "Суббота, 18 Октябрь 2026"
pub fn full_date_label(date: NaiveDate) -> String {
    format!(
        "{}, {} {} {}",
        DAYS[date.weekday().num_days_from_sunday() as usize],
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

/// "Сб, 18 Октябрь"
pub fn short_date_label(date: NaiveDate) -> String {
    format!(
        "{}, {} {}",
        SHORT_DAYS[date.weekday().num_days_from_sunday() as usize],
        date.day(),
        MONTHS[date.month0() as usize]
    )
}

/// Short label for a `YYYY-MM-DD` string; unparseable input is returned as-is.
pub fn label_for_iso_date(value: &str) -> String {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map(short_date_label)
        .unwrap_or_else(|_| value.trim().to_string())
}
