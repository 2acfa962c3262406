//! [`Value`]: the document model encoded by opack.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;

use crate::error::{OPackError, Result};

/// Map type used for [`Value::Map`]. Keeps insertion order; equality ignores
/// order.
pub type Map = IndexMap<String, Value>;

/// A tree-shaped document.
///
/// Integer and float widths are part of the value: `Int32(1)` and `Int64(1)`
/// are different values, encode with different tags, and occupy different
/// index table slots.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    /// UTC instant, stored on the wire with 100 ns resolution.
    DateTime(DateTime<Utc>),
    Array(Vec<Value>),
    Map(Map),
}

impl Value {
    /// Short name of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::UInt8(_) => "uint8",
            Value::UInt16(_) => "uint16",
            Value::UInt32(_) => "uint32",
            Value::UInt64(_) => "uint64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up `key` when this value is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    String => String,
    DateTime<Utc> => DateTime,
    Vec<Value> => Array,
    Map => Map,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().collect())
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Array(iter.into_iter().collect())
    }
}

/// Seconds between 1601-01-01T00:00:00Z and the Unix epoch.
const FILE_TIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;
const TICKS_PER_SECOND: i64 = 10_000_000;
const NANOS_PER_TICK: u32 = 100;

/// Converts an instant to 100 ns ticks since 1601-01-01 UTC.
///
/// Instants before 1601 have no tick representation.
pub fn to_file_time(dt: &DateTime<Utc>) -> Result<i64> {
    let secs = dt
        .timestamp()
        .checked_add(FILE_TIME_UNIX_OFFSET_SECS)
        .filter(|secs| *secs >= 0)
        .ok_or(OPackError::DateTimeOutOfRange)?;
    // Leap-second nanos (>= 1e9) are folded into the last tick of the second.
    let sub = (dt.timestamp_subsec_nanos() / NANOS_PER_TICK).min(TICKS_PER_SECOND as u32 - 1);
    secs.checked_mul(TICKS_PER_SECOND)
        .and_then(|ticks| ticks.checked_add(sub as i64))
        .ok_or(OPackError::DateTimeOutOfRange)
}

/// Inverse of [`to_file_time`].
pub fn from_file_time(ticks: i64) -> Result<DateTime<Utc>> {
    if ticks < 0 {
        return Err(OPackError::DateTimeOutOfRange);
    }
    let secs = ticks / TICKS_PER_SECOND - FILE_TIME_UNIX_OFFSET_SECS;
    let nanos = (ticks % TICKS_PER_SECOND) as u32 * NANOS_PER_TICK;
    DateTime::<Utc>::from_timestamp(secs, nanos).ok_or(OPackError::DateTimeOutOfRange)
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    narrowest_int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt64(u)
                } else {
                    Value::Float64(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => arr.into_iter().map(Value::from).collect(),
            serde_json::Value::Object(obj) => Value::Map(
                obj.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

fn narrowest_int(i: i64) -> Value {
    if let Ok(v) = i8::try_from(i) {
        Value::Int8(v)
    } else if let Ok(v) = i16::try_from(i) {
        Value::Int16(v)
    } else if let Ok(v) = i32::try_from(i) {
        Value::Int32(v)
    } else {
        Value::Int64(i)
    }
}

fn json_float(f: f64) -> serde_json::Value {
    serde_json::Number::from_f64(f).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int8(i) => serde_json::json!(i),
            Value::Int16(i) => serde_json::json!(i),
            Value::Int32(i) => serde_json::json!(i),
            Value::Int64(i) => serde_json::json!(i),
            Value::UInt8(u) => serde_json::json!(u),
            Value::UInt16(u) => serde_json::json!(u),
            Value::UInt32(u) => serde_json::json!(u),
            Value::UInt64(u) => serde_json::json!(u),
            Value::Float32(f) => json_float(f as f64),
            Value::Float64(f) => json_float(f),
            Value::String(s) => serde_json::Value::String(s),
            Value::DateTime(dt) => {
                serde_json::Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn file_time_of_unix_epoch() {
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        assert_eq!(to_file_time(&epoch).unwrap(), 116_444_736_000_000_000);
        assert_eq!(from_file_time(116_444_736_000_000_000).unwrap(), epoch);
    }

    #[test]
    fn file_time_keeps_100ns_resolution() {
        let dt = Utc.timestamp_opt(1_700_000_000, 123_456_700).unwrap();
        let ticks = to_file_time(&dt).unwrap();
        assert_eq!(from_file_time(ticks).unwrap(), dt);

        let finer = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        assert_eq!(to_file_time(&finer).unwrap(), ticks);
    }

    #[test]
    fn file_time_before_unix_epoch() {
        let origin = Utc.with_ymd_and_hms(1601, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(to_file_time(&origin).unwrap(), 0);
        assert_eq!(from_file_time(0).unwrap(), origin);

        let dt = Utc.timestamp_opt(-2_208_988_800, 500).unwrap();
        let ticks = to_file_time(&dt).unwrap();
        assert_eq!(ticks, 94_354_848_000_000_005);
        assert_eq!(from_file_time(ticks).unwrap(), dt);
    }

    #[test]
    fn file_time_rejects_pre_1601() {
        let early = Utc.with_ymd_and_hms(1500, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(to_file_time(&early), Err(OPackError::DateTimeOutOfRange));
        assert_eq!(from_file_time(-1), Err(OPackError::DateTimeOutOfRange));
    }

    #[test]
    fn json_integers_pick_narrowest_width() {
        assert_eq!(Value::from(json!(1)), Value::Int8(1));
        assert_eq!(Value::from(json!(-200)), Value::Int16(-200));
        assert_eq!(Value::from(json!(70_000)), Value::Int32(70_000));
        assert_eq!(Value::from(json!(5_000_000_000i64)), Value::Int64(5_000_000_000));
        assert_eq!(Value::from(json!(u64::MAX)), Value::UInt64(u64::MAX));
        assert_eq!(Value::from(json!(1.5)), Value::Float64(1.5));
    }

    #[test]
    fn json_object_keeps_order() {
        let v = Value::from(json!({"b": 1, "a": [true, null, "x"]}));
        let map = v.as_map().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(
            v.get("a"),
            Some(&Value::Array(vec![
                Value::Bool(true),
                Value::Null,
                Value::String("x".into())
            ]))
        );
    }

    #[test]
    fn to_json_renders_datetime_and_non_finite() {
        let dt = Utc.with_ymd_and_hms(2020, 5, 17, 8, 30, 0).unwrap();
        let v: Value = [
            ("at".to_owned(), Value::DateTime(dt)),
            ("nan".to_owned(), Value::Float64(f64::NAN)),
            ("f".to_owned(), Value::Float32(0.5)),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            serde_json::Value::from(v),
            json!({"at": "2020-05-17T08:30:00Z", "nan": null, "f": 0.5})
        );
    }

    #[test]
    fn map_equality_ignores_order() {
        let a: Value = [("x".to_owned(), Value::Int8(1)), ("y".to_owned(), Value::Int8(2))]
            .into_iter()
            .collect();
        let b: Value = [("y".to_owned(), Value::Int8(2)), ("x".to_owned(), Value::Int8(1))]
            .into_iter()
            .collect();
        assert_eq!(a, b);
    }
}
