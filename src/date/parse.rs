// Free-text date grammar.
//
// Recognized, first match wins:
//   ?, unknown, unk                 -> UnknownAcknowledged
//   alive, living                   -> Alive
//   1850+-5, 1850±5, 1850 +/- 5     -> Approximate (explicit variance)
//   c. 1850, circa 1850, ~1850, about 1850, abt 1850, ca. 1850
//                                   -> Approximate (variance 5)
//   1850                            -> Exact (year)
//   1850-03, 1850-03-15             -> Exact (ISO)
//   3/1850                          -> Exact (month, year)
//   15/3/1850                       -> Exact (day, month, year)
//   Mar 1850, March 1850            -> Exact (month, year)
//   15 Mar 1850                     -> Exact (day, month, year)
//   March 15, 1850                  -> Exact (day, month, year)
// Everything else -> Unknown with the original text.
//
// Matching is case-insensitive and tolerant of repeated whitespace.
// Years are any positive i32 and variances any u32; digits out of range
// give Unknown. Month/day values are calendar-checked (31 Feb 1850 is
// Unknown), so a full date must also lie in chrono's year range.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{DateValue, DEFAULT_VARIANCE};

const UNKNOWN_MARKERS: &[&str] = &["?", "unknown", "unk"];
const LIVING_MARKERS: &[&str] = &["alive", "living"];

static VARIANCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*(?:\+/-|\+-|±)\s*(\d+)$").expect("valid variance regex"));
static CIRCA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:circa|about|abt\.?|ca\.?|c\.?|~)\s*(\d+)$").expect("valid circa regex"));
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)$").expect("valid year regex"));
static ISO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4,})-(\d{1,2})(?:-(\d{1,2}))?$").expect("valid iso regex"));
static NUMERIC_MY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d+)$").expect("valid m/y regex"));
static NUMERIC_DMY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d+)$").expect("valid d/m/y regex"));
static MONTH_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z]+)\.?\s+(\d+)$").expect("valid month-year regex"));
static DAY_MONTH_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})\s+([a-z]+)\.?,?\s+(\d+)$").expect("valid day-month-year regex"));
static MONTH_DAY_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z]+)\.?\s+(\d{1,2}),?\s+(\d+)$").expect("valid month-day-year regex"));

const MONTH_NAMES: &[(&str, u32)] = &[
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("sept", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
];

/// Look up a month by full English name, "sept", or 3-letter abbreviation.
pub(crate) fn month_from_name(name: &str) -> Option<u32> {
    let name = name.to_ascii_lowercase();
    MONTH_NAMES.iter().find_map(|(full, n)| {
        let matches = *full == name || (name.len() == 3 && full.starts_with(name.as_str()));
        matches.then_some(*n)
    })
}

pub fn parse_date_string(text: &str) -> DateValue {
    let normalized = normalize(text);
    let t = normalized.as_str();

    if UNKNOWN_MARKERS.contains(&t) {
        return DateValue::unknown_acknowledged();
    }
    if LIVING_MARKERS.contains(&t) {
        return DateValue::alive();
    }

    parse_approximate(t)
        .or_else(|| parse_exact(t))
        .unwrap_or_else(|| DateValue::unknown(text))
}

/// Trim, lowercase and collapse internal whitespace runs to one space.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn parse_approximate(t: &str) -> Option<DateValue> {
    if let Some(caps) = VARIANCE_RE.captures(t) {
        let year = parse_year(&caps[1])?;
        let variance: u32 = caps[2].parse().ok()?;
        return Some(DateValue::approximate(year, variance));
    }
    if let Some(caps) = CIRCA_RE.captures(t) {
        let year = parse_year(&caps[1])?;
        return Some(DateValue::approximate(year, DEFAULT_VARIANCE));
    }
    None
}

fn parse_exact(t: &str) -> Option<DateValue> {
    if let Some(caps) = YEAR_RE.captures(t) {
        return exact(&caps[1], None, None);
    }
    if let Some(caps) = ISO_RE.captures(t) {
        let day = caps.get(3).map(|m| m.as_str());
        return exact(&caps[1], Some(&caps[2]), day);
    }
    if let Some(caps) = NUMERIC_MY_RE.captures(t) {
        return exact(&caps[2], Some(&caps[1]), None);
    }
    if let Some(caps) = NUMERIC_DMY_RE.captures(t) {
        return exact(&caps[3], Some(&caps[2]), Some(&caps[1]));
    }
    if let Some(caps) = MONTH_YEAR_RE.captures(t) {
        let month = month_from_name(&caps[1])?;
        return exact_named(&caps[2], month, None);
    }
    if let Some(caps) = DAY_MONTH_YEAR_RE.captures(t) {
        let month = month_from_name(&caps[2])?;
        return exact_named(&caps[3], month, Some(&caps[1]));
    }
    if let Some(caps) = MONTH_DAY_YEAR_RE.captures(t) {
        let month = month_from_name(&caps[1])?;
        return exact_named(&caps[3], month, Some(&caps[2]));
    }
    None
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    (year >= 1).then_some(year)
}

fn exact(year: &str, month: Option<&str>, day: Option<&str>) -> Option<DateValue> {
    let month = match month {
        Some(m) => Some(m.parse::<u32>().ok()?),
        None => None,
    };
    build_exact(parse_year(year)?, month, day)
}

fn exact_named(year: &str, month: u32, day: Option<&str>) -> Option<DateValue> {
    build_exact(parse_year(year)?, Some(month), day)
}

fn build_exact(year: i32, month: Option<u32>, day: Option<&str>) -> Option<DateValue> {
    let day = match day {
        Some(d) => Some(d.parse::<u32>().ok()?),
        None => None,
    };
    if let Some(m) = month {
        if !(1..=12).contains(&m) {
            return None;
        }
        if let Some(d) = day {
            NaiveDate::from_ymd_opt(year, m, d)?;
        }
    }
    Some(DateValue::exact(year, month, day))
}
