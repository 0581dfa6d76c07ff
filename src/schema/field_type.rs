// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Field Type Registry
//!
//! Each semantic attribute type owns an indexed-name suffix and a codec
//! between typed values and their wire representation.
//!
//! ```text
//! string    _s      "Pizza"
//! text      _text   "free text"
//! integer   _i      "42"            trie: _it
//! long      _l      "9000000000"    trie: _lt
//! float     _f      "1.5"           trie: _ft
//! double    _e      "2.25"          trie: _et
//! boolean   _b      "true"
//! time      _d      "2009-06-18T12:00:00Z"   trie: _dt
//! date      _d      "2009-06-18T00:00:00Z"   trie: _dt
//! location  _ll     "51.5,-0.12"
//! ```
//!
//! Codecs never escape; escaping belongs to the query translator so that raw
//! stored values stay unescaped.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::error::{MapperError, Result};

/// Semantic field kinds supported by the index schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Text,
    Integer,
    Long,
    Float,
    Double,
    Boolean,
    Time,
    Date,
    Location,
}

impl FieldType {
    /// Look up a field type by its declaration tag.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "string" => Ok(FieldType::String),
            "text" => Ok(FieldType::Text),
            "integer" => Ok(FieldType::Integer),
            "long" => Ok(FieldType::Long),
            "float" => Ok(FieldType::Float),
            "double" => Ok(FieldType::Double),
            "boolean" => Ok(FieldType::Boolean),
            "time" => Ok(FieldType::Time),
            "date" => Ok(FieldType::Date),
            "location" | "geo_point" | "latlon" => Ok(FieldType::Location),
            _ => Err(MapperError::UnknownFieldType {
                tag: tag.to_string(),
            }),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Long => "long",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Boolean => "boolean",
            FieldType::Time => "time",
            FieldType::Date => "date",
            FieldType::Location => "location",
        }
    }

    /// Naming-convention fragment appended to the logical field name.
    ///
    /// `trie` selects the range-optimized variant where one exists.
    pub fn suffix(&self, trie: bool) -> &'static str {
        match (self, trie) {
            (FieldType::String, _) => "_s",
            (FieldType::Text, _) => "_text",
            (FieldType::Integer, false) => "_i",
            (FieldType::Integer, true) => "_it",
            (FieldType::Long, false) => "_l",
            (FieldType::Long, true) => "_lt",
            (FieldType::Float, false) => "_f",
            (FieldType::Float, true) => "_ft",
            (FieldType::Double, false) => "_e",
            (FieldType::Double, true) => "_et",
            (FieldType::Boolean, _) => "_b",
            (FieldType::Time | FieldType::Date, false) => "_d",
            (FieldType::Time | FieldType::Date, true) => "_dt",
            (FieldType::Location, _) => "_ll",
        }
    }

    /// Numeric values are interpolated into query syntax without escaping.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Integer | FieldType::Long | FieldType::Float | FieldType::Double
        )
    }

    /// Check that `value` is a valid value of this type.
    pub fn validate(&self, value: &FieldValue) -> Result<()> {
        let ok = match (self, value) {
            (FieldType::String | FieldType::Text, FieldValue::Str(_)) => true,
            (FieldType::Integer, FieldValue::Int(v)) => i32::try_from(*v).is_ok(),
            (FieldType::Long, FieldValue::Int(_)) => true,
            (FieldType::Float | FieldType::Double, FieldValue::Float(v)) => v.is_finite(),
            (FieldType::Boolean, FieldValue::Bool(_)) => true,
            (FieldType::Time, FieldValue::Time(_)) => true,
            (FieldType::Date, FieldValue::Date(_)) => true,
            (FieldType::Location, FieldValue::Location { lat, lng }) => {
                (-90.0..=90.0).contains(lat) && (-180.0..=180.0).contains(lng)
            }
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(MapperError::argument(format!(
                "{} is not a valid {} value",
                value,
                self.tag()
            )))
        }
    }

    /// Encode a typed value into its wire string.
    pub fn encode(&self, value: &FieldValue) -> Result<String> {
        self.validate(value)?;
        Ok(match value {
            FieldValue::Str(s) => s.clone(),
            FieldValue::Int(v) => v.to_string(),
            FieldValue::Float(v) => v.to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Time(t) => t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            FieldValue::Date(d) => format!("{}T00:00:00Z", d.format("%Y-%m-%d")),
            FieldValue::Location { lat, lng } => format!("{},{}", lat, lng),
        })
    }

    /// Decode a wire string into a typed value.
    pub fn decode(&self, raw: &str) -> Result<FieldValue> {
        let decoded = match self {
            FieldType::String | FieldType::Text => Some(FieldValue::Str(raw.to_string())),
            FieldType::Integer => i32::from_str(raw).ok().map(|v| FieldValue::Int(v as i64)),
            FieldType::Long => i64::from_str(raw).ok().map(FieldValue::Int),
            FieldType::Float | FieldType::Double => {
                f64::from_str(raw).ok().filter(|v| v.is_finite()).map(FieldValue::Float)
            }
            FieldType::Boolean => match raw {
                "true" | "T" => Some(FieldValue::Bool(true)),
                "false" | "F" => Some(FieldValue::Bool(false)),
                _ => None,
            },
            FieldType::Time => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|t| FieldValue::Time(t.with_timezone(&Utc))),
            FieldType::Date => raw
                .get(..10)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                .map(FieldValue::Date),
            FieldType::Location => raw.split_once(',').and_then(|(lat, lng)| {
                Some(FieldValue::Location {
                    lat: f64::from_str(lat.trim()).ok()?,
                    lng: f64::from_str(lng.trim()).ok()?,
                })
            }),
        };
        decoded.ok_or_else(|| MapperError::Decode {
            field_type: self.tag().to_string(),
            value: raw.to_string(),
        })
    }

    /// Decode a stored JSON value, which may be a string, number or boolean.
    pub fn decode_json(&self, raw: &serde_json::Value) -> Result<FieldValue> {
        match raw {
            serde_json::Value::String(s) => self.decode(s),
            serde_json::Value::Number(_) | serde_json::Value::Bool(_) => {
                self.decode(&raw.to_string())
            }
            other => Err(MapperError::Decode {
                field_type: self.tag().to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A typed attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// string and text values
    Str(String),
    /// integer and long values
    Int(i64),
    /// float and double values
    Float(f64),
    Bool(bool),
    Time(DateTime<Utc>),
    Date(NaiveDate),
    Location { lat: f64, lng: f64 },
}

impl FieldValue {
    fn rank(&self) -> u8 {
        match self {
            FieldValue::Bool(_) => 0,
            FieldValue::Int(_) | FieldValue::Float(_) => 1,
            FieldValue::Date(_) => 2,
            FieldValue::Time(_) => 3,
            FieldValue::Location { .. } => 4,
            FieldValue::Str(_) => 5,
        }
    }

    /// Total ascending order used for lexical facet sorting.
    ///
    /// Values of different kinds order by kind; integers and floats compare numerically.
    pub fn lexical_cmp(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Str(a), FieldValue::Str(b)) => a.cmp(b),
            (FieldValue::Int(a), FieldValue::Int(b)) => a.cmp(b),
            (FieldValue::Int(a), FieldValue::Float(b)) => (*a as f64).total_cmp(b),
            (FieldValue::Float(a), FieldValue::Int(b)) => a.total_cmp(&(*b as f64)),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.total_cmp(b),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Time(a), FieldValue::Time(b)) => a.cmp(b),
            (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
            (
                FieldValue::Location { lat: a1, lng: a2 },
                FieldValue::Location { lat: b1, lng: b2 },
            ) => a1.total_cmp(b1).then(a2.total_cmp(b2)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => write!(f, "{:?}", s),
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Time(t) => write!(f, "{}", t.to_rfc3339()),
            FieldValue::Date(d) => write!(f, "{}", d),
            FieldValue::Location { lat, lng } => write!(f, "({}, {})", lat, lng),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Time(v)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        FieldValue::Date(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_unknown_tag() {
        let err = FieldType::from_tag("currency").unwrap_err();
        assert!(matches!(err, MapperError::UnknownFieldType { tag } if tag == "currency"));
    }

    #[test]
    fn test_geo_point_alias() {
        assert_eq!(FieldType::from_tag("geo_point").unwrap(), FieldType::Location);
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(FieldType::Integer.suffix(false), "_i");
        assert_eq!(FieldType::Integer.suffix(true), "_it");
        assert_eq!(FieldType::Time.suffix(true), "_dt");
        assert_eq!(FieldType::Boolean.suffix(true), "_b");
        assert_eq!(FieldType::Text.suffix(false), "_text");
    }

    #[test]
    fn test_time_encoding_to_the_second() {
        let t = Utc.with_ymd_and_hms(2009, 6, 18, 12, 0, 0).unwrap();
        let encoded = FieldType::Time.encode(&t.into()).unwrap();
        assert_eq!(encoded, "2009-06-18T12:00:00Z");
        assert_eq!(FieldType::Time.decode(&encoded).unwrap(), FieldValue::Time(t));
    }

    #[test]
    fn test_time_keeps_sub_second_precision() {
        let t = Utc.timestamp_millis_opt(1_245_326_400_123).unwrap();
        let encoded = FieldType::Time.encode(&t.into()).unwrap();
        assert_eq!(encoded, "2009-06-18T12:00:00.123Z");
        assert_eq!(FieldType::Time.decode(&encoded).unwrap(), FieldValue::Time(t));
    }

    #[test]
    fn test_date_encoding() {
        let d = NaiveDate::from_ymd_opt(2009, 6, 18).unwrap();
        assert_eq!(FieldType::Date.encode(&d.into()).unwrap(), "2009-06-18T00:00:00Z");
        assert_eq!(
            FieldType::Date.decode("2009-06-18T00:00:00Z").unwrap(),
            FieldValue::Date(d)
        );
    }

    #[test]
    fn test_integer_range_is_validated() {
        assert!(FieldType::Integer.encode(&FieldValue::Int(i64::MAX)).is_err());
        assert_eq!(FieldType::Long.encode(&FieldValue::Int(i64::MAX)).unwrap(), i64::MAX.to_string());
    }

    #[test]
    fn test_mismatched_value_is_rejected() {
        let err = FieldType::Integer.encode(&"ten".into()).unwrap_err();
        assert!(matches!(err, MapperError::Argument { .. }));
    }

    #[test]
    fn test_float_round_trip() {
        let v = FieldValue::Float(0.1 + 0.2);
        let encoded = FieldType::Double.encode(&v).unwrap();
        assert_eq!(FieldType::Double.decode(&encoded).unwrap(), v);
    }

    #[test]
    fn test_location_round_trip() {
        let v = FieldValue::Location { lat: 51.5, lng: -0.12 };
        let encoded = FieldType::Location.encode(&v).unwrap();
        assert_eq!(encoded, "51.5,-0.12");
        assert_eq!(FieldType::Location.decode(&encoded).unwrap(), v);
    }

    #[test]
    fn test_decode_json_number() {
        let v = FieldType::Integer.decode_json(&serde_json::json!(7)).unwrap();
        assert_eq!(v, FieldValue::Int(7));
        let b = FieldType::Boolean.decode_json(&serde_json::json!(true)).unwrap();
        assert_eq!(b, FieldValue::Bool(true));
    }

    #[test]
    fn test_lexical_cmp_mixed_numeric() {
        assert_eq!(
            FieldValue::Int(2).lexical_cmp(&FieldValue::Float(2.5)),
            Ordering::Less
        );
    }
}
