//! Field codecs: raw storage values into typed field values.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Value;

/// A raw value the codec does not accept.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("expected {expected}, found {found}")]
pub struct DecodeError {
    pub expected: &'static str,
    pub found: String,
}

impl DecodeError {
    fn new(expected: &'static str, raw: &Value) -> Self {
        Self {
            expected,
            found: format!("{} {}", raw.type_name(), raw),
        }
    }
}

/// Converts a raw column value into a typed field value.
///
/// `Null` always decodes to `Null`; codecs only see present values.
pub trait FieldCodec: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
    fn decode(&self, raw: &Value) -> Result<Value, DecodeError>;
}

/// Codecs available to every catalog by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinCodec {
    Integer,
    Real,
    Text,
    Boolean,
    #[serde(rename = "datetime")]
    DateTime,
    Json,
    Blob,
}

impl BuiltinCodec {
    pub const ALL: [BuiltinCodec; 7] = [
        BuiltinCodec::Integer,
        BuiltinCodec::Real,
        BuiltinCodec::Text,
        BuiltinCodec::Boolean,
        BuiltinCodec::DateTime,
        BuiltinCodec::Json,
        BuiltinCodec::Blob,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BuiltinCodec::Integer => "integer",
            BuiltinCodec::Real => "real",
            BuiltinCodec::Text => "text",
            BuiltinCodec::Boolean => "boolean",
            BuiltinCodec::DateTime => "datetime",
            BuiltinCodec::Json => "json",
            BuiltinCodec::Blob => "blob",
        }
    }
}

impl FieldCodec for BuiltinCodec {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn decode(&self, raw: &Value) -> Result<Value, DecodeError> {
        if raw.is_null() {
            return Ok(Value::Null);
        }
        match self {
            BuiltinCodec::Integer => match raw {
                Value::Integer(i) => Ok(Value::Integer(*i)),
                Value::Boolean(b) => Ok(Value::Integer(i64::from(*b))),
                Value::Real(r) if r.fract() == 0.0 => Ok(Value::Integer(*r as i64)),
                Value::Text(s) => s
                    .trim()
                    .parse()
                    .map(Value::Integer)
                    .map_err(|_| DecodeError::new("integer", raw)),
                _ => Err(DecodeError::new("integer", raw)),
            },
            BuiltinCodec::Real => match raw {
                Value::Real(r) => Ok(Value::Real(*r)),
                Value::Integer(i) => Ok(Value::Real(*i as f64)),
                Value::Text(s) => s
                    .trim()
                    .parse()
                    .map(Value::Real)
                    .map_err(|_| DecodeError::new("real", raw)),
                _ => Err(DecodeError::new("real", raw)),
            },
            BuiltinCodec::Text => match raw {
                Value::Text(s) => Ok(Value::Text(s.clone())),
                Value::Integer(_) | Value::Real(_) => Ok(Value::Text(raw.to_string())),
                _ => Err(DecodeError::new("text", raw)),
            },
            BuiltinCodec::Boolean => match raw {
                Value::Boolean(b) => Ok(Value::Boolean(*b)),
                Value::Integer(0) => Ok(Value::Boolean(false)),
                Value::Integer(1) => Ok(Value::Boolean(true)),
                Value::Text(s) => match s.as_str() {
                    "1" | "true" => Ok(Value::Boolean(true)),
                    "0" | "false" => Ok(Value::Boolean(false)),
                    _ => Err(DecodeError::new("boolean", raw)),
                },
                _ => Err(DecodeError::new("boolean", raw)),
            },
            BuiltinCodec::DateTime => match raw {
                Value::DateTime(dt) => Ok(Value::DateTime(*dt)),
                Value::Text(s) => parse_datetime(s)
                    .map(Value::DateTime)
                    .ok_or_else(|| DecodeError::new("datetime", raw)),
                Value::Integer(secs) => Utc
                    .timestamp_opt(*secs, 0)
                    .single()
                    .map(Value::DateTime)
                    .ok_or_else(|| DecodeError::new("datetime", raw)),
                _ => Err(DecodeError::new("datetime", raw)),
            },
            BuiltinCodec::Json => match raw {
                Value::Json(j) => Ok(Value::Json(j.clone())),
                Value::Text(s) => serde_json::from_str(s)
                    .map(Value::Json)
                    .map_err(|_| DecodeError::new("json", raw)),
                _ => Err(DecodeError::new("json", raw)),
            },
            BuiltinCodec::Blob => match raw {
                Value::Blob(b) => Ok(Value::Blob(b.clone())),
                Value::Text(s) => Ok(Value::Blob(s.as_bytes().to_vec())),
                _ => Err(DecodeError::new("blob", raw)),
            },
        }
    }
}

/// Parse a stored timestamp: RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]` or
/// `YYYY-MM-DD`, the latter two read as UTC.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_passes_through_every_codec() {
        for codec in BuiltinCodec::ALL {
            assert_eq!(codec.decode(&Value::Null).unwrap(), Value::Null);
        }
    }

    #[test]
    fn boolean_accepts_sqlite_integers() {
        let codec = BuiltinCodec::Boolean;
        assert_eq!(codec.decode(&Value::Integer(1)).unwrap(), Value::Boolean(true));
        assert_eq!(codec.decode(&Value::Integer(0)).unwrap(), Value::Boolean(false));
        assert!(codec.decode(&Value::Integer(7)).is_err());
    }

    #[test]
    fn datetime_accepts_platform_format() {
        let dt = parse_datetime("2024-03-01 12:30:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-01T12:30:00+00:00");
        assert_eq!(parse_datetime("2024-03-01T12:30:00Z"), Some(dt));
    }

    #[test]
    fn decode_error_names_the_raw_value() {
        let err = BuiltinCodec::Integer.decode(&Value::Text("abc".into())).unwrap_err();
        assert_eq!(err.to_string(), "expected integer, found text abc");
    }
}
