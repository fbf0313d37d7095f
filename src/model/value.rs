//! Scalar values flowing through predicates, cursors and update assignments.

use crate::error::ConversionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// Declared kind of an entity property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Text,
    Uuid,
    Timestamp,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::Uuid => "uuid",
            ValueKind::Timestamp => "timestamp",
        }
    }

    /// Whether a value of this kind converts to `target` without loss
    pub fn widens_to(self, target: ValueKind) -> bool {
        self == target || matches!((self, target), (ValueKind::Int, ValueKind::Float))
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Int(_) => Some(ValueKind::Int),
            Value::Float(_) => Some(ValueKind::Float),
            Value::Text(_) => Some(ValueKind::Text),
            Value::Uuid(_) => Some(ValueKind::Uuid),
            Value::Timestamp(_) => Some(ValueKind::Timestamp),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Explicit conversion to `target`. Null converts to Null for every kind.
    pub fn convert_to(&self, target: ValueKind) -> Result<Value, ConversionError> {
        if self.kind() == Some(target) {
            return Ok(self.clone());
        }

        let incompatible = |reason: String| ConversionError::Incompatible {
            value: self.to_string(),
            target,
            reason,
        };

        match (self, target) {
            (Value::Null, _) => Ok(Value::Null),
            (Value::Int(i), ValueKind::Float) => Ok(Value::Float(*i as f64)),
            (Value::Float(f), ValueKind::Int) => {
                if f.is_finite() && f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64
                {
                    Ok(Value::Int(*f as i64))
                } else {
                    Err(incompatible("value is not an integral number".to_string()))
                }
            }
            (Value::Text(s), ValueKind::Int) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| incompatible(e.to_string())),
            (Value::Text(s), ValueKind::Float) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| incompatible(e.to_string())),
            (Value::Text(s), ValueKind::Bool) => s
                .trim()
                .parse::<bool>()
                .map(Value::Bool)
                .map_err(|e| incompatible(e.to_string())),
            (Value::Text(s), ValueKind::Uuid) => Uuid::parse_str(s.trim())
                .map(Value::Uuid)
                .map_err(|e| incompatible(e.to_string())),
            (Value::Text(s), ValueKind::Timestamp) => DateTime::parse_from_rfc3339(s.trim())
                .map(|dt| Value::Timestamp(dt.with_timezone(&Utc)))
                .map_err(|e| incompatible(e.to_string())),
            (_, ValueKind::Text) => Ok(Value::Text(self.plain_text())),
            _ => Err(incompatible(format!(
                "no conversion from {} to {target}",
                self.kind().map_or("null", ValueKind::name)
            ))),
        }
    }

    /// SQL-style comparison: `None` when either side is null or the kinds are incomparable.
    ///
    /// NaN equals NaN and sorts above every other number, so comparisons
    /// agree with [`Value::sort_cmp`].
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Some(float_cmp(*a, *b)),
            (Value::Int(a), Value::Float(b)) => Some(float_cmp(*a as f64, *b)),
            (Value::Float(a), Value::Int(b)) => Some(float_cmp(*a, *b as f64)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total order used for sorting. Nulls sort first.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            _ => self
                .compare(other)
                .unwrap_or_else(|| self.rank().cmp(&other.rank())),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(_) | Value::Uuid(_) | Value::Timestamp(_) => {
                serde_json::Value::String(self.plain_text())
            }
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::Text(_) => 3,
            Value::Uuid(_) => 4,
            Value::Timestamp(_) => 5,
        }
    }

    fn plain_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Uuid(u) => u.to_string(),
            Value::Timestamp(ts) => ts.to_rfc3339(),
        }
    }
}

/// Renders the value as a SQL-style literal
fn float_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b)
        .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(_) | Value::Int(_) | Value::Float(_) => f.write_str(&self.plain_text()),
            Value::Text(_) | Value::Uuid(_) | Value::Timestamp(_) => {
                write!(f, "'{}'", self.plain_text().replace('\'', "''"))
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map_or(Value::Null, Value::Float),
            },
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Text(other.to_string()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_cursor_converts_to_declared_kind() {
        assert_eq!(
            Value::from("42").convert_to(ValueKind::Int).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            Value::from("2.5").convert_to(ValueKind::Float).unwrap(),
            Value::Float(2.5)
        );
        let ts = Value::from("2024-03-01T12:00:00Z")
            .convert_to(ValueKind::Timestamp)
            .unwrap();
        assert_eq!(ts.kind(), Some(ValueKind::Timestamp));
    }

    #[test]
    fn test_conversion_failure_names_value_and_target() {
        let err = Value::from("abc").convert_to(ValueKind::Int).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'abc'"), "{message}");
        assert!(message.contains("int"), "{message}");
    }

    #[test]
    fn test_non_integral_float_does_not_narrow() {
        assert!(Value::Float(2.5).convert_to(ValueKind::Int).is_err());
        assert_eq!(
            Value::Float(3.0).convert_to(ValueKind::Int).unwrap(),
            Value::Int(3)
        );
    }

    #[test]
    fn test_null_comparisons_are_unknown() {
        assert_eq!(Value::Null.compare(&Value::Int(1)), None);
        assert_eq!(Value::Int(1).compare(&Value::Float(1.5)), Some(Ordering::Less));
        assert_eq!(Value::Null.sort_cmp(&Value::Int(1)), Ordering::Less);
    }

    #[test]
    fn test_nan_compares_above_every_number() {
        let nan = Value::Float(f64::NAN);
        assert_eq!(nan.compare(&Value::Float(1e300)), Some(Ordering::Greater));
        assert_eq!(Value::Int(7).compare(&nan), Some(Ordering::Less));
        assert_eq!(nan.compare(&Value::Float(-f64::NAN)), Some(Ordering::Equal));
        assert_eq!(nan.sort_cmp(&Value::Float(f64::INFINITY)), Ordering::Greater);
        assert_eq!(Value::Float(-0.0).sort_cmp(&Value::Float(0.0)), Ordering::Equal);
    }

    #[test]
    fn test_display_quotes_text() {
        assert_eq!(Value::from("o'neil").to_string(), "'o''neil'");
        assert_eq!(Value::Int(7).to_string(), "7");
        assert_eq!(Value::Null.to_string(), "NULL");
    }

    #[test]
    fn test_json_numbers_map_to_int_or_float() {
        assert_eq!(Value::from(serde_json::json!(5)), Value::Int(5));
        assert_eq!(Value::from(serde_json::json!(5.5)), Value::Float(5.5));
        assert_eq!(Value::Int(5).to_json(), serde_json::json!(5));
    }
}
