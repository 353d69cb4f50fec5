//! Display formatting for metric values (en-US grouping, fixed decimals).

use serde::Serialize;

/// Display rule applied to a metric's numeric value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ValueFormat {
    /// Grouped number with fixed decimals.
    Number { digits: usize },
    /// Percentage (value already on a 0-100 scale).
    Percent { digits: usize },
    /// Days with one decimal.
    Days,
    /// Hours with one decimal.
    Hours,
    /// Minutes with one decimal.
    Minutes,
    /// US dollars without decimals.
    Currency,
    /// Rating on a five-point scale.
    RatingOutOfFive,
    /// `1 : x` ratio.
    Ratio,
}

impl ValueFormat {
    /// Render `value` for display.
    pub fn render(self, value: f64) -> String {
        match self {
            ValueFormat::Number { digits } => group_thousands(value, digits),
            ValueFormat::Percent { digits } => format_percent(value, digits),
            ValueFormat::Days => format!("{} days", group_thousands(value, 1)),
            ValueFormat::Hours => format!("{} hrs", group_thousands(value, 1)),
            ValueFormat::Minutes => format!("{} mins", group_thousands(value, 1)),
            ValueFormat::Currency => format_currency(value),
            ValueFormat::RatingOutOfFive => format!("{} / 5", group_thousands(value, 1)),
            ValueFormat::Ratio => format!("1 : {}", group_thousands(value, 1)),
        }
    }
}

/// Fixed-decimal number with comma thousands separators.
pub fn group_thousands(value: f64, digits: usize) -> String {
    let fixed = format!("{:.*}", digits, value.abs());
    let (integer, fraction) = match fixed.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (fixed.as_str(), None),
    };
    let mut grouped = String::with_capacity(fixed.len() + integer.len() / 3 + 1);
    for (idx, ch) in integer.chars().enumerate() {
        if idx > 0 && (integer.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    let is_zero = fixed.chars().all(|ch| ch == '0' || ch == '.');
    if value.is_sign_negative() && !is_zero {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// `<value>%` with fixed decimals.
pub fn format_percent(value: f64, digits: usize) -> String {
    format!("{}%", group_thousands(value, digits))
}

/// `$4,000` style currency, no decimals.
pub fn format_currency(value: f64) -> String {
    let grouped = group_thousands(value.abs(), 0);
    if value < 0.0 && grouped != "0" {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
