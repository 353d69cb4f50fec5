//! Tolerant typed coercion shared by the workbook and CSV paths.
//!
//! Every function maps a [`RawCell`] to `Some(valid value)` or `None`; nothing
//! here fails, and no function returns `NaN` or an empty string.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};

use crate::constants::ingest::{EXCEL_SERIAL_MAX, EXCEL_SERIAL_MIN};
use crate::data::{CandidateType, PipelineStatus};
use crate::source::row_view::RawCell;

const DATETIME_FORMATS: [&str; 10] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d-%b-%Y %H:%M",
];

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Trimmed non-empty text; numbers render without a trailing `.0`.
pub fn to_text(cell: &RawCell) -> Option<String> {
    let text = match cell {
        RawCell::Empty => return None,
        RawCell::Text(text) => text.trim().to_string(),
        RawCell::Number(value) => format_plain_number(*value)?,
        RawCell::Bool(value) => value.to_string(),
        RawCell::DateTime(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
    };
    if text.is_empty() { None } else { Some(text) }
}

/// Finite number; text may carry thousands separators.
pub fn to_number(cell: &RawCell) -> Option<f64> {
    let value = match cell {
        RawCell::Number(value) => *value,
        RawCell::Text(text) => {
            let cleaned = text.trim().replace(',', "");
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// `Y`/`YES`/`TRUE` and `N`/`NO`/`FALSE`, case-insensitive.
pub fn to_yes_no(cell: &RawCell) -> Option<bool> {
    if let RawCell::Bool(value) = cell {
        return Some(*value);
    }
    let text = to_text(cell)?.to_ascii_uppercase();
    match text.as_str() {
        "Y" | "YES" | "TRUE" => Some(true),
        "N" | "NO" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Date/time from a decoded cell, an Excel serial, or common text layouts.
pub fn to_datetime(cell: &RawCell) -> Option<NaiveDateTime> {
    match cell {
        RawCell::DateTime(value) => Some(*value),
        RawCell::Number(serial) => excel_serial_to_datetime(*serial),
        RawCell::Text(text) => parse_datetime_text(text.trim()),
        _ => None,
    }
}

/// `Internal`/`External` by case-insensitive substring.
pub fn to_candidate_type(cell: &RawCell) -> Option<CandidateType> {
    let lower = to_text(cell)?.to_lowercase();
    if lower.contains("internal") {
        Some(CandidateType::Internal)
    } else if lower.contains("external") {
        Some(CandidateType::External)
    } else {
        None
    }
}

/// One of the three pipeline statuses, exact label after trimming; anything else is unknown.
pub fn to_status(cell: &RawCell) -> Option<PipelineStatus> {
    let text = to_text(cell)?;
    PipelineStatus::ALL
        .into_iter()
        .find(|status| status.as_str() == text)
}

/// Convert an Excel serial day number (1900 date system) to a timestamp.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(EXCEL_SERIAL_MIN..=EXCEL_SERIAL_MAX).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

fn parse_datetime_text(text: &str) -> Option<NaiveDateTime> {
    if text.is_empty() {
        return None;
    }
    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return Some(value.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(value) = NaiveDateTime::parse_from_str(text, format) {
            return Some(value);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn format_plain_number(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        Some(format!("{}", value as i64))
    } else {
        Some(format!("{value}"))
    }
}
