//! Date formats and relative-date windows
//!
//! Absolute bounds are rendered with one of the tokens the editor offers.
//! Relative bounds use the search engine's date math: `now`, `now-<N>d`,
//! `now+<N>d`.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::filter::Comparator;

/// Date math anchor
pub const NOW: &str = "now";

const PAST_PREFIX: &str = "now-";
const FUTURE_PREFIX: &str = "now+";

/// Filter-tree serialization of a date without time of day
const RULE_DATE_PATTERN: &str = "%d/%m/%Y";

/// Filter-tree serialization of a date with time of day
const RULE_DATETIME_PATTERN: &str = "%d/%m/%Y %H:%M:%S";

/// Date format tokens offered to users
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum DateFormat {
    #[default]
    #[serde(rename = "yyyy-MM-ddTHH:mm:ss")]
    IsoDateTime,
    #[serde(rename = "yyyy-MM-ddTHH:mm:ssZ")]
    IsoDateTimeOffset,
    #[serde(rename = "yyyy-MM-dd")]
    IsoDate,
    #[serde(rename = "dd-MMMM-yyyy")]
    DayMonthNameYear,
    #[serde(rename = "yyyy/MM/dd")]
    SlashDate,
    #[serde(rename = "shortDate")]
    ShortDate,
}

impl DateFormat {
    /// Every token, in the order the editor offers them
    pub const ALL: [DateFormat; 6] = [
        DateFormat::IsoDateTime,
        DateFormat::IsoDateTimeOffset,
        DateFormat::IsoDate,
        DateFormat::DayMonthNameYear,
        DateFormat::SlashDate,
        DateFormat::ShortDate,
    ];

    pub fn is_default(&self) -> bool {
        *self == DateFormat::default()
    }

    /// Token string as persisted in the filter tree
    pub fn token(&self) -> &'static str {
        match self {
            DateFormat::IsoDateTime => "yyyy-MM-ddTHH:mm:ss",
            DateFormat::IsoDateTimeOffset => "yyyy-MM-ddTHH:mm:ssZ",
            DateFormat::IsoDate => "yyyy-MM-dd",
            DateFormat::DayMonthNameYear => "dd-MMMM-yyyy",
            DateFormat::SlashDate => "yyyy/MM/dd",
            DateFormat::ShortDate => "shortDate",
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            DateFormat::IsoDateTime => "%Y-%m-%dT%H:%M:%S",
            DateFormat::IsoDateTimeOffset => "%Y-%m-%dT%H:%M:%S%z",
            DateFormat::IsoDate => "%Y-%m-%d",
            DateFormat::DayMonthNameYear => "%d-%B-%Y",
            DateFormat::SlashDate => "%Y/%m/%d",
            // en-US short form: M/d/yy
            DateFormat::ShortDate => "%-m/%-d/%y",
        }
    }

    /// Render a date with this token
    pub fn format(&self, date: &RuleDate) -> String {
        match self {
            // Rule dates are UTC, so the offset is always +0000
            DateFormat::IsoDateTimeOffset => date.0.and_utc().format(self.pattern()).to_string(),
            _ => date.0.format(self.pattern()).to_string(),
        }
    }

    /// Parse a bound rendered with this token
    ///
    /// Only accepts input this token would render back byte for byte, so a
    /// detected format re-encodes to the same string.
    pub fn parse(&self, input: &str) -> Option<RuleDate> {
        let parsed = match self {
            DateFormat::IsoDateTime => NaiveDateTime::parse_from_str(input, self.pattern()).ok(),
            DateFormat::IsoDateTimeOffset => DateTime::parse_from_str(input, self.pattern())
                .ok()
                .map(|dt| dt.naive_utc()),
            _ => NaiveDate::parse_from_str(input, self.pattern())
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN)),
        }?;
        let date = RuleDate(parsed);
        (self.format(&date) == input).then_some(date)
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Date selected in a rule (naive, read as UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct RuleDate(pub NaiveDateTime);

impl RuleDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(|d| Self(d.and_time(NaiveTime::MIN)))
    }

    pub fn from_ymd_hms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_opt(hour, minute, second)
            .map(Self)
    }

    pub fn is_midnight(&self) -> bool {
        self.0.time() == NaiveTime::MIN
    }

    /// Read the filter-tree form: `DD/MM/YYYY`, `DD/MM/YYYY HH:MM:SS`,
    /// RFC 3339 or a plain `YYYY-MM-DD`
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, RULE_DATETIME_PATTERN) {
            return Some(Self(dt));
        }
        if let Ok(d) = NaiveDate::parse_from_str(input, RULE_DATE_PATTERN) {
            return Some(Self(d.and_time(NaiveTime::MIN)));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Some(Self(dt.naive_utc()));
        }
        NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .ok()
            .map(|d| Self(d.and_time(NaiveTime::MIN)))
    }
}

impl fmt::Display for RuleDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_midnight() {
            write!(f, "{}", self.0.format(RULE_DATE_PATTERN))
        } else {
            write!(f, "{}", self.0.format(RULE_DATETIME_PATTERN))
        }
    }
}

impl TryFrom<String> for RuleDate {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid rule date: {}", value))
    }
}

impl From<RuleDate> for String {
    fn from(date: RuleDate) -> Self {
        date.to_string()
    }
}

/// Read an absolute date bound from a query
///
/// Returns the token that renders the bound exactly, when there is one.
/// Otherwise falls back to the `YYYY-MM-DD` prefix before any `T`.
pub fn parse_bound(bound: &str) -> Option<(RuleDate, Option<DateFormat>)> {
    if let Some((date, format)) = DateFormat::ALL
        .iter()
        .find_map(|format| format.parse(bound).map(|d| (d, *format)))
    {
        return Some((date, Some(format)));
    }

    let day = bound.split('T').next()?;
    let mut parts = day.split('-');
    let year = parts.next()?.trim().parse().ok()?;
    let month = parts.next()?.trim().parse().ok()?;
    let day = parts.next()?.trim().parse().ok()?;
    RuleDate::from_ymd(year, month, day).map(|d| (d, None))
}

/// N-day window anchored at now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeWindow {
    Last(u64),
    Next(u64),
}

impl RelativeWindow {
    /// Range bounds for this window, `gte` first
    pub fn bounds(&self) -> Map<String, JsonValue> {
        let (gte, lte) = match self {
            RelativeWindow::Last(days) => (format!("{}{}d", PAST_PREFIX, days), NOW.to_string()),
            RelativeWindow::Next(days) => (NOW.to_string(), format!("{}{}d", FUTURE_PREFIX, days)),
        };
        let mut bounds = Map::new();
        bounds.insert(Comparator::Gte.key().to_string(), JsonValue::String(gte));
        bounds.insert(Comparator::Lte.key().to_string(), JsonValue::String(lte));
        bounds
    }

    /// Recognize a two-sided window from its `gte` and `lte` bounds
    ///
    /// A `gte` containing `now-` is a past window; one merely containing
    /// `now` is a future window whose length sits in `lte`. Returns None
    /// for absolute ranges. The day count is None when it does not parse.
    pub fn detect(gte: &str, lte: Option<&str>) -> Option<(RelativeKind, Option<u64>)> {
        if gte.contains(PAST_PREFIX) {
            return Some((RelativeKind::Last, parse_day_count(gte, PAST_PREFIX)));
        }
        if gte.contains(NOW) {
            let days = lte.and_then(|lte| parse_day_count(lte, FUTURE_PREFIX));
            return Some((RelativeKind::Next, days));
        }
        None
    }
}

/// Direction of a relative window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeKind {
    Last,
    Next,
}

/// Integer between `prefix` and the following `d`
fn parse_day_count(bound: &str, prefix: &str) -> Option<u64> {
    let rest = bound.split(prefix).nth(1)?;
    let count = rest.split('d').next()?.trim_start();
    let digits: String = count.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> RuleDate {
        RuleDate::from_ymd_hms(2024, 3, 5, 14, 7, 9).unwrap()
    }

    #[test]
    fn test_formats_every_token() {
        let date = sample();
        let rendered: Vec<String> = DateFormat::ALL.iter().map(|f| f.format(&date)).collect();
        assert_eq!(
            rendered,
            vec![
                "2024-03-05T14:07:09",
                "2024-03-05T14:07:09+0000",
                "2024-03-05",
                "05-March-2024",
                "2024/03/05",
                "3/5/24",
            ]
        );
    }

    #[test]
    fn test_token_serde_uses_exact_strings() {
        let value = serde_json::to_value(DateFormat::ALL).unwrap();
        assert_eq!(
            value,
            json!([
                "yyyy-MM-ddTHH:mm:ss",
                "yyyy-MM-ddTHH:mm:ssZ",
                "yyyy-MM-dd",
                "dd-MMMM-yyyy",
                "yyyy/MM/dd",
                "shortDate"
            ])
        );
        let parsed: DateFormat = serde_json::from_value(json!("dd-MMMM-yyyy")).unwrap();
        assert_eq!(parsed, DateFormat::DayMonthNameYear);
    }

    #[test]
    fn test_parse_bound_detects_format() {
        let midnight = RuleDate::from_ymd(2024, 3, 5).unwrap();
        for format in DateFormat::ALL {
            let rendered = format.format(&midnight);
            assert_eq!(
                parse_bound(&rendered),
                Some((midnight, Some(format))),
                "token {}",
                format
            );
        }
    }

    #[test]
    fn test_parse_bound_keeps_time_of_day() {
        assert_eq!(
            parse_bound("2024-03-05T14:07:09"),
            Some((sample(), Some(DateFormat::IsoDateTime)))
        );
    }

    #[test]
    fn test_parse_bound_falls_back_to_iso_prefix() {
        let (date, format) = parse_bound("2024-03-05T14:07:09.123Z").unwrap();
        assert_eq!(date, RuleDate::from_ymd(2024, 3, 5).unwrap());
        assert_eq!(format, None);
    }

    #[test]
    fn test_parse_bound_rejects_garbage() {
        assert_eq!(parse_bound("yesterday"), None);
        assert_eq!(parse_bound("2024-13-40"), None);
    }

    #[test]
    fn test_rule_date_serializes_day_first() {
        let date = RuleDate::from_ymd(2024, 3, 5).unwrap();
        assert_eq!(serde_json::to_value(date).unwrap(), json!("05/03/2024"));
        assert_eq!(
            serde_json::to_value(sample()).unwrap(),
            json!("05/03/2024 14:07:09")
        );
    }

    #[test]
    fn test_rule_date_accepts_browser_dates() {
        let date: RuleDate = serde_json::from_value(json!("2024-03-05T14:07:09.000Z")).unwrap();
        assert_eq!(date, sample());
        let date: RuleDate = serde_json::from_value(json!("05/03/2024")).unwrap();
        assert_eq!(date, RuleDate::from_ymd(2024, 3, 5).unwrap());
        assert!(serde_json::from_value::<RuleDate>(json!("soon")).is_err());
    }

    #[test]
    fn test_relative_window_bounds() {
        assert_eq!(
            JsonValue::Object(RelativeWindow::Last(7).bounds()),
            json!({"gte": "now-7d", "lte": "now"})
        );
        assert_eq!(
            JsonValue::Object(RelativeWindow::Next(3).bounds()),
            json!({"gte": "now", "lte": "now+3d"})
        );
    }

    #[test]
    fn test_detects_relative_windows() {
        assert_eq!(
            RelativeWindow::detect("now-7d", Some("now")),
            Some((RelativeKind::Last, Some(7)))
        );
        assert_eq!(
            RelativeWindow::detect("now", Some("now+30d")),
            Some((RelativeKind::Next, Some(30)))
        );
        assert_eq!(
            RelativeWindow::detect("now", None),
            Some((RelativeKind::Next, None))
        );
        assert_eq!(RelativeWindow::detect("2024-01-01", Some("2024-02-01")), None);
    }

    #[test]
    fn test_day_count_reads_leading_digits() {
        assert_eq!(parse_day_count("now-12d", PAST_PREFIX), Some(12));
        assert_eq!(parse_day_count("now-12d/d", PAST_PREFIX), Some(12));
        assert_eq!(parse_day_count("now-d", PAST_PREFIX), None);
        assert_eq!(parse_day_count("now", FUTURE_PREFIX), None);
    }
}
