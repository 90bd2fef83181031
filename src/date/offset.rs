//! Dates expressed relative to another date ("+4d", "-2 weeks", "+1y").

use chrono::{Datelike, Days, Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::DateValue;

static OFFSET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-])?\s*(\d{1,6})\s*(d|days?|w|weeks?|m|months?|y|years?)$").expect("valid offset regex")
});

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetUnit {
    Days,
    Weeks,
    Months,
    Years,
}

/// A parsed offset; `amount` is signed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DateOffset {
    pub amount: i64,
    pub unit: OffsetUnit,
}

pub fn parse_offset(text: &str) -> Option<DateOffset> {
    let t = text.trim().to_lowercase();
    let caps = OFFSET_RE.captures(&t)?;
    let magnitude: i64 = caps[2].parse().ok()?;
    let amount = match caps.get(1).map(|m| m.as_str()) {
        Some("-") => -magnitude,
        _ => magnitude,
    };
    let unit = match caps[3].chars().next()? {
        'd' => OffsetUnit::Days,
        'w' => OffsetUnit::Weeks,
        'm' => OffsetUnit::Months,
        _ => OffsetUnit::Years,
    };
    Some(DateOffset { amount, unit })
}

/// Resolve `offset_text` against `base`.
///
/// Exact bases use calendar arithmetic and must be precise enough for the
/// unit (days and weeks need a full date, months need a month). Approximate
/// bases move by whole years. Anything that can't be resolved comes back as
/// `Unknown` carrying the offset text.
pub fn resolve_offset(offset_text: &str, base: &DateValue) -> DateValue {
    let unresolved = || DateValue::unknown(offset_text);
    let Some(offset) = parse_offset(offset_text) else {
        return unresolved();
    };

    let resolved = match base {
        DateValue::Exact { year, month, day, .. } => shift_exact(*year, *month, *day, offset),
        DateValue::Approximate { year, variance, .. } => shift_approximate(*year, *variance, offset),
        DateValue::Unknown { .. } | DateValue::UnknownAcknowledged { .. } | DateValue::Alive { .. } => None,
    };
    resolved.unwrap_or_else(unresolved)
}

fn shift_exact(year: i32, month: Option<u32>, day: Option<u32>, offset: DateOffset) -> Option<DateValue> {
    match offset.unit {
        OffsetUnit::Days | OffsetUnit::Weeks => {
            let date = NaiveDate::from_ymd_opt(year, month?, day?)?;
            let days = match offset.unit {
                OffsetUnit::Weeks => offset.amount.checked_mul(7)?,
                _ => offset.amount,
            };
            let shifted = add_days(date, days)?;
            exact_from(shifted, true, true)
        }
        OffsetUnit::Months | OffsetUnit::Years if month.is_some() => {
            let months = match offset.unit {
                OffsetUnit::Years => offset.amount.checked_mul(12)?,
                _ => offset.amount,
            };
            let date = NaiveDate::from_ymd_opt(year, month?, day.unwrap_or(1))?;
            let shifted = add_months(date, months)?;
            exact_from(shifted, true, day.is_some())
        }
        OffsetUnit::Years => {
            let y = year.checked_add(i32::try_from(offset.amount).ok()?)?;
            (y >= 1).then(|| DateValue::exact(y, None, None))
        }
        OffsetUnit::Months => None,
    }
}

fn shift_approximate(year: i32, variance: u32, offset: DateOffset) -> Option<DateValue> {
    let years = match offset.unit {
        OffsetUnit::Years => offset.amount,
        OffsetUnit::Months => offset.amount / 12,
        OffsetUnit::Weeks => offset.amount.checked_mul(7)? / 365,
        OffsetUnit::Days => offset.amount / 365,
    };
    let y = year.checked_add(i32::try_from(years).ok()?)?;
    (y >= 1).then(|| DateValue::approximate(y, variance))
}

fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let n = Days::new(days.unsigned_abs());
    if days >= 0 { date.checked_add_days(n) } else { date.checked_sub_days(n) }
}

fn add_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let n = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 { date.checked_add_months(n) } else { date.checked_sub_months(n) }
}

fn exact_from(date: NaiveDate, keep_month: bool, keep_day: bool) -> Option<DateValue> {
    if date.year() < 1 {
        return None;
    }
    let month = keep_month.then(|| date.month());
    let day = keep_day.then(|| date.day());
    Some(DateValue::exact(date.year(), month, day))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("+2d"), Some(DateOffset { amount: 2, unit: OffsetUnit::Days }));
        assert_eq!(parse_offset("-3 weeks"), Some(DateOffset { amount: -3, unit: OffsetUnit::Weeks }));
        assert_eq!(parse_offset("+1 Month"), Some(DateOffset { amount: 1, unit: OffsetUnit::Months }));
        assert_eq!(parse_offset("4y"), Some(DateOffset { amount: 4, unit: OffsetUnit::Years }));
        assert_eq!(parse_offset("+2 fortnights"), None);
        assert_eq!(parse_offset(""), None);
    }

    #[test]
    fn test_days_from_exact() {
        let base = DateValue::exact(1900, Some(1), Some(1));
        assert_eq!(resolve_offset("+2d", &base), DateValue::exact(1900, Some(1), Some(3)));
        assert_eq!(resolve_offset("+31d", &base), DateValue::exact(1900, Some(2), Some(1)));
        assert_eq!(resolve_offset("-1d", &base), DateValue::exact(1899, Some(12), Some(31)));
        assert_eq!(resolve_offset("+1w", &base), DateValue::exact(1900, Some(1), Some(8)));
    }

    #[test]
    fn test_months_and_years() {
        let base = DateValue::exact(1900, Some(1), Some(31));
        assert_eq!(resolve_offset("+1m", &base), DateValue::exact(1900, Some(2), Some(28)));
        assert_eq!(resolve_offset("+2y", &base), DateValue::exact(1902, Some(1), Some(31)));

        let month_only = DateValue::exact(1900, Some(11), None);
        assert_eq!(resolve_offset("+3m", &month_only), DateValue::exact(1901, Some(2), None));

        let year_only = DateValue::exact(1900, None, None);
        assert_eq!(resolve_offset("+5y", &year_only), DateValue::exact(1905, None, None));
    }

    #[test]
    fn test_insufficient_precision() {
        let year_only = DateValue::exact(1900, None, None);
        assert!(resolve_offset("+2d", &year_only).is_unknown());
        assert!(resolve_offset("+2m", &year_only).is_unknown());
    }

    #[test]
    fn test_approximate_base() {
        let base = DateValue::approximate(1850, 5);
        assert_eq!(resolve_offset("+10y", &base), DateValue::approximate(1860, 5));
        assert_eq!(resolve_offset("+4d", &base), DateValue::approximate(1850, 5));
        assert_eq!(resolve_offset("+24m", &base), DateValue::approximate(1852, 5));
    }

    #[test]
    fn test_non_concrete_base() {
        assert_eq!(resolve_offset("+2d", &DateValue::unknown("")), DateValue::unknown("+2d"));
        assert!(resolve_offset("+2d", &DateValue::unknown_acknowledged()).is_unknown());
        assert!(resolve_offset("+2d", &DateValue::alive()).is_unknown());
    }

    #[test]
    fn test_bad_offset_text() {
        let base = DateValue::exact(1900, Some(1), Some(1));
        assert_eq!(resolve_offset("soon", &base), DateValue::unknown("soon"));
    }
}
