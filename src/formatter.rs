//! Date and time formatting
//!
//! Patterns use the ICU letters PostgreSQL-facing code is usually written
//! with (`yyyy-MM-dd HH:mm:ss`). Text between single quotes is copied as is.

use std::fmt::Write;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use type_mapping::PostgresValue;

use crate::errors::CodecError;

pub const DATETIME_PATTERN: &str = "yyyy-MM-dd HH:mm:ss";
pub const DATE_PATTERN: &str = "yyyy-MM-dd";
pub const TIME_PATTERN: &str = "HH:mm:ss";

/// Formats temporal values for date, time and timestamp columns
pub trait DateTimeFormatter: Send + Sync {
    fn format(&self, value: &PostgresValue, pattern: &str) -> Result<String, CodecError>;
}

/// chrono-backed formatter.
///
/// Accepts `Date`, `Time` and `Timestamp` values, unix seconds as `Integer`,
/// and text in any form the timestamp, date or time parsers understand.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChronoFormatter;

struct ChronoPattern {
    format: String,
    uses_date: bool,
    uses_time: bool,
}

impl ChronoFormatter {
    fn translate(pattern: &str) -> Result<ChronoPattern, CodecError> {
        let chars: Vec<char> = pattern.chars().collect();
        let mut out = ChronoPattern {
            format: String::new(),
            uses_date: false,
            uses_time: false,
        };

        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c.is_ascii_alphabetic() {
                let run = chars[i..].iter().take_while(|&&next| next == c).count();
                let (token, is_date) = match (c, run) {
                    ('y', 4) => ("%Y", true),
                    ('y', 2) => ("%y", true),
                    ('M', 2) => ("%m", true),
                    ('d', 2) => ("%d", true),
                    ('H', 2) => ("%H", false),
                    ('m', 2) => ("%M", false),
                    ('s', 2) => ("%S", false),
                    _ => {
                        return Err(CodecError::Encode(format!(
                            "unsupported pattern token '{}' in '{}'",
                            c.to_string().repeat(run),
                            pattern
                        )))
                    }
                };
                out.format.push_str(token);
                if is_date {
                    out.uses_date = true;
                } else {
                    out.uses_time = true;
                }
                i += run;
            } else if c == '\'' {
                let literal: String = chars[i + 1..].iter().take_while(|&&next| next != '\'').collect();
                out.format.push_str(&literal.replace('%', "%%"));
                i += literal.chars().count() + 2;
            } else {
                if c == '%' {
                    out.format.push('%');
                }
                out.format.push(c);
                i += 1;
            }
        }

        Ok(out)
    }
}

impl DateTimeFormatter for ChronoFormatter {
    fn format(&self, value: &PostgresValue, pattern: &str) -> Result<String, CodecError> {
        let chrono_pattern = Self::translate(pattern)?;
        let temporal = Temporal::from_value(value)?;

        let mut out = String::new();
        let written = match temporal {
            Temporal::Timestamp(ts) => write!(out, "{}", ts.format(&chrono_pattern.format)),
            Temporal::Date(d) if chrono_pattern.uses_time => {
                write!(out, "{}", d.and_time(NaiveTime::default()).format(&chrono_pattern.format))
            }
            Temporal::Date(d) => write!(out, "{}", d.format(&chrono_pattern.format)),
            Temporal::Time(_) if chrono_pattern.uses_date => {
                return Err(CodecError::Encode(format!(
                    "cannot format a time of day with date pattern '{}'",
                    pattern
                )))
            }
            Temporal::Time(t) => write!(out, "{}", t.format(&chrono_pattern.format)),
        };
        written.map_err(|_| CodecError::Encode(format!("cannot format {:?} as '{}'", value, pattern)))?;

        Ok(out)
    }
}

enum Temporal {
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl Temporal {
    fn from_value(value: &PostgresValue) -> Result<Self, CodecError> {
        match value {
            PostgresValue::Date(d) => Ok(Temporal::Date(*d)),
            PostgresValue::Time(t) => Ok(Temporal::Time(*t)),
            PostgresValue::Timestamp(ts) => Ok(Temporal::Timestamp(*ts)),
            PostgresValue::Integer(secs) => DateTime::from_timestamp(*secs, 0)
                .map(|dt| Temporal::Timestamp(dt.naive_utc()))
                .ok_or_else(|| CodecError::Encode(format!("unix time {} is out of range", secs))),
            PostgresValue::Text(s) => parse_timestamp(s)
                .map(Temporal::Timestamp)
                .or_else(|| parse_date(s).map(Temporal::Date))
                .or_else(|| parse_time(s).map(Temporal::Time))
                .ok_or_else(|| CodecError::Encode(format!("'{}' is not a date or time", s))),
            other => Err(CodecError::UnsupportedType(format!(
                "cannot format {:?} as a date or time",
                other
            ))),
        }
    }
}

pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

pub(crate) fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    // timetz carries a trailing UTC offset after the seconds
    let without_offset = match s.rfind(['+', '-']) {
        Some(pos) if pos >= 5 => &s[..pos],
        _ => s,
    };
    ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(without_offset, fmt).ok())
}

pub(crate) fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"]
                .iter()
                .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.naive_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 0)
            .unwrap()
    }

    #[test]
    fn test_fixed_patterns() {
        let value = PostgresValue::Timestamp(timestamp());
        assert_eq!(
            ChronoFormatter.format(&value, DATETIME_PATTERN).unwrap(),
            "2024-03-09 07:05:00"
        );
        assert_eq!(ChronoFormatter.format(&value, DATE_PATTERN).unwrap(), "2024-03-09");
        assert_eq!(ChronoFormatter.format(&value, TIME_PATTERN).unwrap(), "07:05:00");
    }

    #[test]
    fn test_date_with_datetime_pattern_is_midnight() {
        let value = PostgresValue::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(
            ChronoFormatter.format(&value, DATETIME_PATTERN).unwrap(),
            "2024-03-09 00:00:00"
        );
    }

    #[test]
    fn test_time_with_date_pattern_fails() {
        let value = PostgresValue::Time(NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(ChronoFormatter.format(&value, TIME_PATTERN).unwrap(), "00:00:00");
        assert!(matches!(
            ChronoFormatter.format(&value, DATE_PATTERN),
            Err(CodecError::Encode(_))
        ));
    }

    #[test]
    fn test_unix_seconds_and_text() {
        assert_eq!(
            ChronoFormatter
                .format(&PostgresValue::Integer(0), DATETIME_PATTERN)
                .unwrap(),
            "1970-01-01 00:00:00"
        );
        assert_eq!(
            ChronoFormatter
                .format(&PostgresValue::Text("2024-03-09T07:05:00".to_string()), DATE_PATTERN)
                .unwrap(),
            "2024-03-09"
        );
        assert!(ChronoFormatter
            .format(&PostgresValue::Text("soon".to_string()), DATE_PATTERN)
            .is_err());
    }

    #[test]
    fn test_quoted_literals_and_unsupported_tokens() {
        let value = PostgresValue::Timestamp(timestamp());
        assert_eq!(
            ChronoFormatter.format(&value, "yyyy-MM-dd'T'HH:mm").unwrap(),
            "2024-03-09T07:05"
        );
        assert!(matches!(
            ChronoFormatter.format(&value, "EEEE"),
            Err(CodecError::Encode(_))
        ));
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_time("10:30:00+05:30"), NaiveTime::from_hms_opt(10, 30, 0));
        assert_eq!(
            parse_time("10:30:00.25"),
            NaiveTime::from_hms_milli_opt(10, 30, 0, 250)
        );
        assert_eq!(parse_timestamp("2024-03-09 07:05:00"), Some(timestamp()));
        assert_eq!(parse_timestamp("2024-03-09 09:05:00+02"), Some(timestamp()));
        assert_eq!(parse_date("2024-13-01"), None);
    }
}
