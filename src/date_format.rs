/// Date format detection and date reformatting
///
/// Forensic reports print timestamps as `D.D.YYYY HH:MM:SS`, but whether the
/// first component is the day or the month depends on the device locale. The
/// detector samples the whole document once and picks one order for every
/// date in it.
use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

lazy_static! {
    static ref DATE_TOKEN: Regex =
        Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4}) (\d{2}):(\d{2}):(\d{2})\b").expect("date pattern is valid");
}

/// Canonical output representation of every reformatted date
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which of the two leading date components is the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateOrder {
    MonthFirst,
    DayFirst,
}

impl DateOrder {
    /// chrono format string for dates in this order
    pub fn format_str(&self) -> &'static str {
        match self {
            DateOrder::MonthFirst => "%m.%d.%Y %H:%M:%S",
            DateOrder::DayFirst => "%d.%m.%Y %H:%M:%S",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "month-first" | "mdy" => Ok(DateOrder::MonthFirst),
            "day-first" | "dmy" => Ok(DateOrder::DayFirst),
            other => Err(format!("Unknown date order '{}' (expected month-first or day-first)", other)),
        }
    }
}

/// A date that could not be read with the document's format
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a {expected} date")]
pub struct DateError {
    pub value: String,
    pub expected: &'static str,
}

/// Result of sampling a document for dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFormat {
    pub order: DateOrder,
    /// True when a sample proved the order; false when month-first was assumed
    pub detected: bool,
}

impl Default for DateFormat {
    fn default() -> Self {
        DateFormat { order: DateOrder::MonthFirst, detected: false }
    }
}

impl DateFormat {
    pub fn forced(order: DateOrder) -> Self {
        DateFormat { order, detected: true }
    }

    /// Reparse one date and print it in the canonical format.
    ///
    /// Values already in canonical form pass through unchanged, so
    /// reformatting is idempotent.
    pub fn reformat(&self, value: &str) -> Result<String, DateError> {
        let value = value.trim();
        NaiveDateTime::parse_from_str(value, self.order.format_str())
            .or_else(|_| NaiveDateTime::parse_from_str(value, CANONICAL_FORMAT))
            .map(|dt| dt.format(CANONICAL_FORMAT).to_string())
            .map_err(|_| DateError { value: value.to_string(), expected: self.order.format_str() })
    }
}

/// Inspect the document's dates and decide the day/month order.
///
/// The first date whose components can only be read one way decides the
/// order for the whole document. Documents with no such date are read
/// month-first.
pub fn detect(doc: &str) -> DateFormat {
    for caps in DATE_TOKEN.captures_iter(doc) {
        let first: u32 = caps[1].parse().unwrap_or(0);
        let second: u32 = caps[2].parse().unwrap_or(0);

        if first > 12 && second <= 12 {
            debug!("Date '{}' is day-first", &caps[0]);
            return DateFormat { order: DateOrder::DayFirst, detected: true };
        }
        if second > 12 && first <= 12 {
            debug!("Date '{}' is month-first", &caps[0]);
            return DateFormat { order: DateOrder::MonthFirst, detected: true };
        }
    }

    debug!("No unambiguous date found, assuming month-first");
    DateFormat::default()
}
