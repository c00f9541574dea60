//! Scalar field values and the coercion rules every stage shares.
//!
//! Records arrive schema-less, so a field is one of a small set of scalar
//! kinds. Stages never guess silently: each coercion below answers `None`
//! when the value is present but of the wrong kind.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Leading `YYYY-MM-DD`; anything may follow (time, offset, garbage).
static DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("date prefix pattern"));

/// Datetime layouts tried after RFC 3339, all read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// One scalar field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Present but empty (JSON `null`, or a nested value with no scalar form).
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(DateTime<Utc>),
}

impl Value {
    /// `Null` behaves exactly like an absent field.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric reading of the value: numbers as-is, text that parses as a
    /// finite float. Booleans and dates are not numbers.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => parse_number(s),
            _ => None,
        }
    }

    /// Calendar instant for dates and date-like text.
    pub fn to_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Text(s) if is_date_like(s) => parse_instant(s),
            _ => None,
        }
    }

    /// Ordering of kinds when two values share no common comparison.
    fn kind_rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Number(_) => 1,
            Value::Date(_) => 2,
            Value::Text(_) => 3,
            Value::Null => 4,
        }
    }

    /// Native ordering of the underlying scalar. Values of different kinds
    /// are ordered by kind.
    pub fn native_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }

    /// Build a value from a JSON node. Arrays and objects have no scalar
    /// form and become `Null`.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => Value::Null,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => {
                if is_integral(*n) {
                    serde_json::Value::from(*n as i64)
                } else {
                    serde_json::Number::from_f64(*n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null)
                }
            }
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Date(d) => serde_json::Value::String(format_instant(d)),
        }
    }
}

/// The natural string representation: what a length rule measures and what
/// export writes into a cell. `Null` renders as the empty string.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) if is_integral(*n) => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => f.write_str(&format_instant(d)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from_json)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

/// Text that reads as a finite number. Blank text is not a number.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Does the text start with a `YYYY-MM-DD` prefix?
pub fn is_date_like(s: &str) -> bool {
    DATE_PREFIX.is_match(s)
}

/// Parse date-like text into an instant. Offsets are honoured; naive
/// datetimes and bare dates are read as UTC.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    let day = NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok()?;
    day.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
}

fn format_instant(d: &DateTime<Utc>) -> String {
    d.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn is_integral(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_number_display_drops_trailing_zero() {
        assert_eq!(Value::Number(5.0).to_string(), "5");
        assert_eq!(Value::Number(-12.0).to_string(), "-12");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
    }

    #[test]
    fn test_null_displays_empty() {
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn test_to_number_reads_numeric_text() {
        assert_eq!(Value::from(" 42 ").to_number(), Some(42.0));
        assert_eq!(Value::from("1.5e2").to_number(), Some(150.0));
        assert_eq!(Value::from("").to_number(), None);
        assert_eq!(Value::from("NaN").to_number(), None);
        assert_eq!(Value::from("inf").to_number(), None);
        assert_eq!(Value::from("abc").to_number(), None);
        assert_eq!(Value::Bool(true).to_number(), None);
    }

    #[test]
    fn test_date_like_requires_leading_ymd() {
        assert!(is_date_like("2024-03-01"));
        assert!(is_date_like("2024-03-01T10:00:00Z"));
        assert!(!is_date_like("01/03/2024"));
        assert!(!is_date_like(" 2024-03-01"));
    }

    #[test]
    fn test_parse_instant_variants() {
        let midnight = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_instant("2024-03-01"), Some(midnight));
        assert_eq!(parse_instant("2024-03-01T00:00:00Z"), Some(midnight));
        assert_eq!(parse_instant("2024-03-01T03:00:00+03:00"), Some(midnight));
        assert_eq!(
            parse_instant("2024-03-01T10:30"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap())
        );
        // Trailing junk falls back to the date prefix.
        assert_eq!(parse_instant("2024-03-01 garbage"), Some(midnight));
        assert_eq!(parse_instant("2024-13-45"), None);
    }

    #[test]
    fn test_from_json_flattens_nested_to_null() {
        let v = Value::from_json(serde_json::json!([1, 2]));
        assert!(v.is_null());
        let v = Value::from_json(serde_json::json!({"a": 1}));
        assert!(v.is_null());
    }

    #[test]
    fn test_to_json_keeps_integers_integral() {
        assert_eq!(Value::Number(3.0).to_json(), serde_json::json!(3));
        assert_eq!(Value::Number(3.25).to_json(), serde_json::json!(3.25));
    }

    #[test]
    fn test_native_cmp_across_kinds_is_by_kind() {
        assert_eq!(
            Value::Number(100.0).native_cmp(&Value::from("1")),
            Ordering::Less
        );
        assert_eq!(
            Value::Bool(true).native_cmp(&Value::Number(0.0)),
            Ordering::Less
        );
        assert_eq!(Value::Bool(false).native_cmp(&Value::Bool(true)), Ordering::Less);
    }
}
