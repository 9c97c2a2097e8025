// ── Raw payload access ──
//
// A response object with its keys normalized to snake_case, plus the
// coercions hydration needs. Nothing in here fails: a value that cannot
// be read as the target type leaves the field untouched.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use super::Hydratable;
use super::entity_id::EntityId;

/// A JSON object prepared for hydration.
#[derive(Debug, Clone, Default)]
pub struct Payload {
    fields: Map<String, Value>,
}

impl Payload {
    /// Normalize `raw`. Non-objects produce an empty payload.
    ///
    /// camelCase keys are folded to snake_case; when both spellings are
    /// present the snake_case one wins.
    pub fn new(raw: &Value) -> Self {
        let Some(object) = raw.as_object() else {
            return Self::default();
        };

        let mut fields = Map::with_capacity(object.len());
        for (key, value) in object {
            if to_snake_case(key) == *key {
                fields.insert(key.clone(), value.clone());
            }
        }
        for (key, value) in object {
            let snake = to_snake_case(key);
            if snake != *key {
                fields.entry(snake).or_insert_with(|| value.clone());
            }
        }

        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Raw value under `key` (snake_case), `null` included.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    // ── Field assignment ─────────────────────────────────────────────

    /// Overwrite `field` when `key` is present and coercible.
    pub fn set<T: Coerce>(&self, key: &str, field: &mut T) {
        if let Some(value) = self.fields.get(key).and_then(T::coerce) {
            *field = value;
        }
    }

    /// Like [`set`](Self::set), reading the first present key of `keys`.
    pub fn set_any<T: Coerce>(&self, keys: &[&str], field: &mut T) {
        if let Some(key) = keys.iter().find(|k| self.fields.contains_key(**k)) {
            self.set(key, field);
        }
    }

    /// Rebuild a nested entity from its sub-payload.
    pub fn nested<T: Hydratable>(&self, key: &str, field: &mut T) {
        if let Some(raw @ Value::Object(_)) = self.fields.get(key) {
            *field = super::hydrate(raw);
        }
    }

    /// Optional nested entity: an object hydrates, `null` clears.
    pub fn nested_opt<T: Hydratable>(&self, key: &str, field: &mut Option<T>) {
        match self.fields.get(key) {
            Some(raw @ Value::Object(_)) => *field = Some(super::hydrate(raw)),
            Some(Value::Null) => *field = None,
            _ => {}
        }
    }

    /// Nested sequence: every object element is hydrated, anything else
    /// is dropped.
    pub fn list<T: Hydratable>(&self, key: &str, field: &mut Vec<T>) {
        match self.fields.get(key) {
            Some(Value::Array(items)) => {
                *field = items
                    .iter()
                    .filter(|item| item.is_object())
                    .map(super::hydrate)
                    .collect();
            }
            Some(Value::Null) => field.clear(),
            _ => {}
        }
    }
}

// ── Coercion ─────────────────────────────────────────────────────────

/// Lenient conversion from a raw JSON value.
///
/// `None` means "not representable"; the caller keeps its current value.
pub trait Coerce: Sized {
    fn coerce(value: &Value) -> Option<Self>;
}

impl Coerce for String {
    fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl Coerce for i64 {
    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => {
                let s = s.trim();
                s.parse()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
            }
            _ => None,
        }
    }
}

impl Coerce for f64 {
    fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl Coerce for bool {
    fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" | "" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl Coerce for EntityId {
    fn coerce(value: &Value) -> Option<Self> {
        EntityId::from_value(value)
    }
}

impl Coerce for DateTime<Utc> {
    fn coerce(value: &Value) -> Option<Self> {
        parse_date(value)
    }
}

impl Coerce for Vec<String> {
    fn coerce(value: &Value) -> Option<Self> {
        value
            .as_array()
            .map(|items| items.iter().filter_map(String::coerce).collect())
    }
}

impl<T: Coerce> Coerce for Option<T> {
    fn coerce(value: &Value) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::coerce(value).map(Some)
        }
    }
}

// ── Dates ────────────────────────────────────────────────────────────

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a timestamp as the backends send it.
///
/// Accepts RFC 3339, naive date-times (read as UTC), bare dates and
/// integer epoch milliseconds. The Go zero time and anything
/// unparseable yield `None`.
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        Value::String(s) => parse_date_str(s.trim()),
        _ => None,
    }?;

    // 0001-01-01T00:00:00Z is "unset" on the Go backend.
    (parsed.timestamp() > ZERO_TIME_CUTOFF).then_some(parsed)
}

// Anything on or before 0001-01-02 counts as the zero time.
const ZERO_TIME_CUTOFF: i64 = -62_135_510_400;

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ── Scalars ──────────────────────────────────────────────────────────

/// Prefix a non-empty color code with `#` unless it already has one.
///
/// Idempotent: `"FF00FF"` and `"#FF00FF"` both yield `"#FF00FF"`.
pub fn normalize_hex_color(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        trimmed.to_owned()
    } else {
        format!("#{trimmed}")
    }
}

/// `hexColor` → `hex_color`, `placeID` → `place_id`.
pub fn to_snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = i.checked_sub(1).and_then(|p| chars.get(p)).copied();
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}
