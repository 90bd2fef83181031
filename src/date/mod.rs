// Genealogical date values.
//
// Supports:
// - exact dates with optional month/day ("1850", "Mar 1850", "15 Mar 1850")
// - approximate years with a variance ("c. 1850", "1850 ±3")
// - unknown text (kept verbatim for diagnostics)
// - acknowledged unknown ("?") and living markers
//
// Submodules:
// - parse: free text -> DateValue
// - format: DateValue -> canonical display text
// - offset: "+4d" style dates relative to another date
//
// Nothing in here fails: bad input degrades to DateValue::Unknown.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

mod format;
mod offset;
mod parse;

pub use format::{format_date, month_abbrev};
pub use offset::{parse_offset, resolve_offset, DateOffset, OffsetUnit};
pub use parse::parse_date_string;

/// Variance used when a circa-style prefix gives no explicit spread.
pub const DEFAULT_VARIANCE: u32 = 5;

/// A date of varying certainty.
///
/// Every variant carries `display`, the output of [`format_date`] at
/// construction time. Build values through the constructors so the cache
/// stays in sync. Decoding goes through the same constructors, so a stored
/// `display` is never trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", from = "Value")]
pub enum DateValue {
    Exact {
        year: i32,
        month: Option<u32>,
        day: Option<u32>,
        display: String,
    },
    Approximate {
        year: i32,
        variance: u32,
        display: String,
    },
    /// Unparsed input, preserved as written
    Unknown { text: String, display: String },
    /// The user confirmed there is no known date
    UnknownAcknowledged { display: String },
    /// Known to be living, no date
    Alive { display: String },
}

impl Default for DateValue {
    fn default() -> Self {
        DateValue::unknown("")
    }
}

impl DateValue {
    pub fn exact(year: i32, month: Option<u32>, day: Option<u32>) -> Self {
        // A day without a month has nowhere to go
        let day = month.and(day);
        let mut v = DateValue::Exact { year, month, day, display: String::new() };
        v.refresh_display();
        v
    }

    pub fn approximate(year: i32, variance: u32) -> Self {
        let mut v = DateValue::Approximate { year, variance, display: String::new() };
        v.refresh_display();
        v
    }

    pub fn unknown(text: impl Into<String>) -> Self {
        let mut v = DateValue::Unknown { text: text.into(), display: String::new() };
        v.refresh_display();
        v
    }

    pub fn unknown_acknowledged() -> Self {
        let mut v = DateValue::UnknownAcknowledged { display: String::new() };
        v.refresh_display();
        v
    }

    pub fn alive() -> Self {
        let mut v = DateValue::Alive { display: String::new() };
        v.refresh_display();
        v
    }

    fn refresh_display(&mut self) {
        let text = format_date(self);
        match self {
            DateValue::Exact { display, .. }
            | DateValue::Approximate { display, .. }
            | DateValue::Unknown { display, .. }
            | DateValue::UnknownAcknowledged { display }
            | DateValue::Alive { display } => *display = text,
        }
    }

    /// Cached display string.
    pub fn display(&self) -> &str {
        match self {
            DateValue::Exact { display, .. }
            | DateValue::Approximate { display, .. }
            | DateValue::Unknown { display, .. }
            | DateValue::UnknownAcknowledged { display }
            | DateValue::Alive { display } => display,
        }
    }

    /// Best-known year, if any.
    pub fn year(&self) -> Option<i32> {
        match self {
            DateValue::Exact { year, .. } | DateValue::Approximate { year, .. } => Some(*year),
            DateValue::Unknown { .. } | DateValue::UnknownAcknowledged { .. } | DateValue::Alive { .. } => None,
        }
    }

    /// True for values that pin down a point in time (exact or approximate).
    pub fn is_concrete(&self) -> bool {
        matches!(self, DateValue::Exact { .. } | DateValue::Approximate { .. })
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, DateValue::Unknown { .. })
    }
}

/// Stored shape of a date; `display` is ignored and rebuilt.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StoredDate {
    Exact {
        year: i32,
        #[serde(default)]
        month: Option<u32>,
        #[serde(default)]
        day: Option<u32>,
    },
    Approximate {
        year: i32,
        #[serde(default = "default_variance")]
        variance: u32,
    },
    Unknown {
        #[serde(default)]
        text: String,
    },
    UnknownAcknowledged {},
    Alive {},
}

fn default_variance() -> u32 {
    DEFAULT_VARIANCE
}

impl From<StoredDate> for DateValue {
    fn from(stored: StoredDate) -> Self {
        match stored {
            StoredDate::Exact { year, month, day } => DateValue::exact(year, month, day),
            StoredDate::Approximate { year, variance } => DateValue::approximate(year, variance),
            StoredDate::Unknown { text } => DateValue::unknown(text),
            StoredDate::UnknownAcknowledged {} => DateValue::unknown_acknowledged(),
            StoredDate::Alive {} => DateValue::alive(),
        }
    }
}

/// Tolerant decode: structured dates, free text, or bare years. Anything
/// unreadable is an empty Unknown so one bad date can't sink a whole graph.
impl From<Value> for DateValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => DateValue::default(),
            Value::String(text) => parse_date_string(&text),
            Value::Number(n) => parse_date_string(&n.to_string()),
            other => match StoredDate::deserialize(other) {
                Ok(stored) => stored.into(),
                Err(e) => {
                    warn!("unreadable date ({}); treating it as unknown", e);
                    DateValue::default()
                }
            },
        }
    }
}
