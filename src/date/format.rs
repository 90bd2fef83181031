//! Canonical display text for [`DateValue`].
//!
//! The output of [`format_date`] is accepted by `parse_date_string` and parses
//! back to an equal value, so display text doubles as canonical input.

use super::{DateValue, DEFAULT_VARIANCE};

const MONTH_ABBREVS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Three-letter English abbreviation for a 1-based month.
pub fn month_abbrev(month: u32) -> Option<&'static str> {
    let idx = month.checked_sub(1)? as usize;
    MONTH_ABBREVS.get(idx).copied()
}

pub fn format_date(value: &DateValue) -> String {
    match value {
        DateValue::Exact { year, month, day, .. } => match (month, day) {
            (Some(m), Some(d)) => match month_abbrev(*m) {
                Some(name) => format!("{} {} {}", d, name, year),
                None => format!("{}/{}/{}", d, m, year),
            },
            (Some(m), None) => match month_abbrev(*m) {
                Some(name) => format!("{} {}", name, year),
                None => format!("{}/{}", m, year),
            },
            (None, _) => year.to_string(),
        },
        DateValue::Approximate { year, variance, .. } => {
            if *variance == DEFAULT_VARIANCE {
                format!("c. {}", year)
            } else {
                format!("{} ±{}", year, variance)
            }
        }
        DateValue::Unknown { text, .. } => text.clone(),
        DateValue::UnknownAcknowledged { .. } => "Unknown".to_string(),
        DateValue::Alive { .. } => "Living".to_string(),
    }
}
