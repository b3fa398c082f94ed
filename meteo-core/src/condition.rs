//! Provider-specific numeric weather codes mapped onto canonical conditions.
//!
//! Each code family is an ordered table of inclusive upper bounds. Lookup walks
//! the table top to bottom and the first row whose bound covers the code wins.
//! Codes past the last row resolve to a plain "Clear".

use crate::model::ConditionEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeFamily {
    /// WMO weather interpretation codes (Open-Meteo).
    Wmo,
    /// WorldWeatherOnline codes as served by wttr.in.
    Wwo,
}

#[derive(Debug, Clone, Copy)]
struct CodeRange {
    upper: i32,
    main: &'static str,
    description: &'static str,
    icon: &'static str,
}

const fn row(
    upper: i32,
    main: &'static str,
    description: &'static str,
    icon: &'static str,
) -> CodeRange {
    CodeRange { upper, main, description, icon }
}

const DEFAULT: CodeRange = row(i32::MAX, "Clear", "ясно", "01d");

const WMO_TABLE: &[CodeRange] = &[
    row(0, "Clear", "ясно", "01d"),
    row(3, "Clouds", "облачно", "03d"),
    row(49, "Fog", "туман", "50d"),
    row(59, "Drizzle", "морось", "09d"),
    row(69, "Rain", "дождь", "10d"),
    row(79, "Snow", "снег", "13d"),
    row(84, "Rain", "ливень", "09d"),
    row(86, "Snow", "снегопад", "13d"),
    row(99, "Thunderstorm", "гроза", "11d"),
];

const WWO_TABLE: &[CodeRange] = &[
    row(113, "Clear", "ясно", "01d"),
    row(116, "Clouds", "переменная облачность", "02d"),
    row(122, "Clouds", "пасмурно", "04d"),
    row(143, "Fog", "дымка", "50d"),
    row(176, "Rain", "местами дождь", "10d"),
    row(185, "Snow", "местами снег с дождём", "13d"),
    row(200, "Thunderstorm", "местами грозы", "11d"),
    row(230, "Snow", "метель", "13d"),
    row(260, "Fog", "туман", "50d"),
    row(284, "Drizzle", "морось", "09d"),
    row(314, "Rain", "дождь", "10d"),
    row(338, "Snow", "снег", "13d"),
    row(359, "Rain", "ливень", "09d"),
    row(377, "Snow", "снегопад", "13d"),
    row(395, "Thunderstorm", "гроза", "11d"),
];

impl CodeFamily {
    fn table(self) -> &'static [CodeRange] {
        match self {
            CodeFamily::Wmo => WMO_TABLE,
            CodeFamily::Wwo => WWO_TABLE,
        }
    }
}

pub fn classify(family: CodeFamily, code: i32) -> ConditionEntry {
    let range = family
        .table()
        .iter()
        .find(|range| code <= range.upper)
        .unwrap_or(&DEFAULT);

    ConditionEntry {
        id: code,
        main: range.main.to_string(),
        description: range.description.to_string(),
        icon: range.icon.to_string(),
    }
}
