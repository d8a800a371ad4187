//! Date helper functions

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Locale, TimeZone};
use chrono_tz::Tz;
use std::fmt::Write as _;

use crate::error::{BlogError, Result};

/// A resolved date display setting: locale, timezone and chrono pattern
#[derive(Debug, Clone)]
pub struct DateFormat {
    locale: Locale,
    timezone: Tz,
    pattern: String,
}

impl DateFormat {
    /// Build from config values. `format` is a Moment.js-style pattern.
    pub fn new(locale: &str, timezone: &str, format: &str) -> Result<Self> {
        let locale = parse_locale(locale)?;
        let timezone: Tz = timezone
            .parse()
            .map_err(|_| BlogError::Config(format!("unknown timezone: {}", timezone)))?;

        let pattern = moment_to_chrono_format(format);
        if StrftimeItems::new_with_locale(&pattern, locale).any(|i| matches!(i, Item::Error)) {
            return Err(BlogError::Config(format!("invalid date format: {}", format)));
        }

        Ok(Self {
            locale,
            timezone,
            pattern,
        })
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self {
            locale: Locale::pt_BR,
            timezone: Tz::UTC,
            pattern: moment_to_chrono_format("DD MMM YYYY"),
        }
    }
}

fn parse_locale(name: &str) -> Result<Locale> {
    let locale = match name.replace('-', "_").as_str() {
        "pt_BR" | "pt" => Locale::pt_BR,
        "pt_PT" => Locale::pt_PT,
        "en_US" | "en" => Locale::en_US,
        "en_GB" => Locale::en_GB,
        "es_ES" | "es" => Locale::es_ES,
        "fr_FR" | "fr" => Locale::fr_FR,
        "de_DE" | "de" => Locale::de_DE,
        "it_IT" | "it" => Locale::it_IT,
        _ => return Err(BlogError::Config(format!("unsupported locale: {}", name))),
    };
    Ok(locale)
}

/// Parse a content-source timestamp.
///
/// Accepts RFC 3339 as well as the `2021-03-25T19:25:28+0000` form
/// (offset without a colon) the CMS emits.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map_err(|_| BlogError::MalformedTimestamp(Some(raw.to_string())))
}

/// Format a publication timestamp for display, e.g. `19 abr 2021`.
///
/// Fails with `MalformedTimestamp` on a null or unparseable value instead
/// of returning a placeholder; callers guard the null case themselves.
pub fn format_publication_date(timestamp: Option<&str>, format: &DateFormat) -> Result<String> {
    let raw = timestamp.ok_or(BlogError::MalformedTimestamp(None))?;
    let date = parse_timestamp(raw)?.with_timezone(&format.timezone);
    let mut out = String::new();
    write!(out, "{}", date.format_localized(&format.pattern, format.locale))
        .map_err(|_| BlogError::Config(format!("invalid date format: {}", format.pattern)))?;
    Ok(out)
}

/// Format a date using Moment.js-compatible format string
///
/// # Examples
/// ```ignore
/// format_date(&date, "YYYY-MM-DD") // -> "2024-01-15"
/// ```
pub fn format_date<Tz2: TimeZone>(date: &DateTime<Tz2>, format: &str) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    let chrono_format = moment_to_chrono_format(format);
    date.format(&chrono_format).to_string()
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz2: TimeZone>(date: &DateTime<Tz2>) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    // Longest patterns first within each category
    let replacements = [
        // Year
        ("YYYY", "%Y"),
        ("YY", "%y"),
        // Month
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        // Day of month
        ("DDDD", "%j"),
        ("DD", "%d"),
        // Hour
        ("HH", "%H"),
        ("hh", "%I"),
        // Minute (after MM is gone)
        ("mm", "%M"),
        ("ss", "%S"),
        // Day of week
        ("dddd", "%A"),
        ("ddd", "%a"),
        ("ZZ", "%z"),
        ("SSS", "%3f"),
    ];

    let mut result = format.to_string();

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}
