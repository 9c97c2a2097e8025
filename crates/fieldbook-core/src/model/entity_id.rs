// ── Entity identity ──
//
// Backends key records by integer ids; a few (imports, external
// providers) hand back opaque strings. `EntityId` covers both so caches
// and templates never care which one they hold.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical identifier for any backend entity.
///
/// `Numeric(0)` is the "not yet assigned" id every model starts with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Numeric(i64),
    Text(String),
}

impl EntityId {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Numeric(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// `true` until the backend has assigned an id.
    pub fn is_unassigned(&self) -> bool {
        match self {
            Self::Numeric(n) => *n == 0,
            Self::Text(s) => s.is_empty(),
        }
    }

    /// Read an id from a raw payload value.
    ///
    /// Integers (and integral floats) become `Numeric`; numeric strings
    /// are parsed; any other non-empty string is kept as `Text`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(float_to_i64))
                .map(Self::Numeric),
            Value::String(s) if !s.trim().is_empty() => Some(Self::from(s.trim())),
            _ => None,
        }
    }

    /// JSON form used when filling URL templates and request bodies.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Numeric(n) => Value::from(*n),
            Self::Text(s) => Value::from(s.as_str()),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn float_to_i64(f: f64) -> i64 {
    f as i64
}

impl Default for EntityId {
    fn default() -> Self {
        Self::Numeric(0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        Self::Numeric(n)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        match s.parse::<i64>() {
            Ok(n) => Self::Numeric(n),
            Err(_) => Self::Text(s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn numeric_strings_become_numeric() {
        assert_eq!(EntityId::from("42"), EntityId::Numeric(42));
        let id: EntityId = "abc-123".parse().unwrap();
        assert_eq!(id, EntityId::Text("abc-123".into()));
    }

    #[test]
    fn from_value_accepts_numbers_and_strings() {
        assert_eq!(EntityId::from_value(&json!(7)), Some(EntityId::Numeric(7)));
        assert_eq!(EntityId::from_value(&json!(7.0)), Some(EntityId::Numeric(7)));
        assert_eq!(EntityId::from_value(&json!("7")), Some(EntityId::Numeric(7)));
        assert_eq!(
            EntityId::from_value(&json!("ext-9")),
            Some(EntityId::Text("ext-9".into()))
        );
        assert_eq!(EntityId::from_value(&json!(7.5)), None);
        assert_eq!(EntityId::from_value(&json!("")), None);
        assert_eq!(EntityId::from_value(&json!(null)), None);
    }

    #[test]
    fn default_is_unassigned() {
        assert!(EntityId::default().is_unassigned());
        assert!(!EntityId::from(3).is_unassigned());
    }

    #[test]
    fn serializes_untagged() {
        assert_eq!(serde_json::to_value(EntityId::from(5)).unwrap(), json!(5));
        assert_eq!(EntityId::from(5).to_value(), json!(5));
        assert_eq!(EntityId::from("x").to_string(), "x");
    }
}
