//! Dynamic value type for flow unit fields.
//!
//! Wraps `serde_json::Value` to provide the type-safe accessors evaluators
//! need when reading metric records and upstream outputs.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Dynamic value carried in flow unit records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Value(pub JsonValue);

impl Value {
    /// Create a null value.
    pub fn null() -> Self {
        Self(JsonValue::Null)
    }

    /// Create a boolean value.
    pub fn bool(v: bool) -> Self {
        Self(JsonValue::Bool(v))
    }

    /// Create an integer value.
    pub fn int(v: i64) -> Self {
        Self(JsonValue::Number(v.into()))
    }

    /// Create a floating-point value.
    pub fn float(v: f64) -> Self {
        Self(serde_json::Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number))
    }

    /// Create a string value.
    pub fn string(v: impl Into<String>) -> Self {
        Self(JsonValue::String(v.into()))
    }

    /// Check if the value is null.
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Convert to f64 if possible.
    pub fn as_f64(&self) -> Option<f64> {
        match &self.0 {
            JsonValue::Number(n) => n.as_f64(),
            JsonValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Convert to i64 if possible.
    pub fn as_i64(&self) -> Option<i64> {
        match &self.0 {
            JsonValue::Number(n) => n.as_i64(),
            JsonValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Borrow as a string slice if the value is a string.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// Convert to bool if possible.
    pub fn as_bool(&self) -> Option<bool> {
        match &self.0 {
            JsonValue::Bool(b) => Some(*b),
            JsonValue::Null => Some(false),
            _ => None,
        }
    }

    /// Check if the value exceeds a numeric threshold.
    pub fn exceeds(&self, threshold: f64) -> bool {
        self.as_f64().is_some_and(|v| v > threshold)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::string(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::string(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_conversions() {
        assert_eq!(Value::int(3).as_f64(), Some(3.0));
        assert_eq!(Value::float(0.5).as_f64(), Some(0.5));
        assert_eq!(Value::string("2.5").as_f64(), Some(2.5));
        assert_eq!(Value::string("nope").as_f64(), None);
    }

    #[test]
    fn threshold_check() {
        assert!(Value::float(0.9).exceeds(0.8));
        assert!(!Value::float(0.7).exceeds(0.8));
        assert!(!Value::null().exceeds(0.0));
    }

    #[test]
    fn serde_roundtrip_is_transparent() {
        let v = Value::float(1.25);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "1.25");
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
