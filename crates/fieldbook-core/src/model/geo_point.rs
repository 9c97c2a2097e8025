// ── Geo point domain type ──

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::entity_id::EntityId;
use super::payload::Coerce;
use super::{Hydratable, Payload};

/// Provider details attached to a geocoded point.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeoMetadata {
    pub provider: String,
    pub confidence: f64,
    pub place_id: String,
    pub place_type: String,
    pub category: String,
}

impl Hydratable for GeoMetadata {
    fn assign(&mut self, p: &Payload) {
        p.set("provider", &mut self.provider);
        p.set("confidence", &mut self.confidence);
        p.set("place_id", &mut self.place_id);
        p.set("place_type", &mut self.place_type);
        p.set("category", &mut self.category);
    }
}

// Stored as a JSON string by one backend, sent as an object by the other.
impl Coerce for GeoMetadata {
    fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::Object(_) => Some(super::hydrate(value)),
            Value::String(raw) => serde_json::from_str::<Value>(raw)
                .ok()
                .filter(Value::is_object)
                .map(|object| super::hydrate(&object)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeoPoint {
    pub id: EntityId,
    pub merchant_id: EntityId,
    /// Where the point came from (`"amap"`, `"manual"`, ...).
    pub from: String,
    pub longitude: f64,
    pub latitude: f64,
    pub address: String,
    pub accuracy: f64,
    pub metadata: Option<GeoMetadata>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl GeoPoint {
    /// `(longitude, latitude)`, the order map providers expect.
    pub fn coordinates(&self) -> (f64, f64) {
        (self.longitude, self.latitude)
    }

    pub fn is_valid(&self) -> bool {
        (-180.0..=180.0).contains(&self.longitude) && (-90.0..=90.0).contains(&self.latitude)
    }
}

impl Hydratable for GeoPoint {
    fn assign(&mut self, p: &Payload) {
        p.set("id", &mut self.id);
        p.set("merchant_id", &mut self.merchant_id);
        p.set("from", &mut self.from);
        p.set("longitude", &mut self.longitude);
        p.set("latitude", &mut self.latitude);
        p.set("address", &mut self.address);
        p.set("accuracy", &mut self.accuracy);
        p.set("metadata", &mut self.metadata);
        p.set_any(&["created", "created_at"], &mut self.created);
        p.set_any(&["updated", "updated_at"], &mut self.updated);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::hydrate;

    #[test]
    fn metadata_from_object_or_string() {
        let object: GeoPoint = hydrate(&json!({
            "metadata": { "provider": "amap", "confidence": 0.9, "placeId": "B0FF" }
        }));
        let meta = object.metadata.unwrap();
        assert_eq!(meta.provider, "amap");
        assert_eq!(meta.place_id, "B0FF");

        let encoded: GeoPoint = hydrate(&json!({
            "metadata": "{\"provider\":\"tianditu\",\"category\":\"shop\"}"
        }));
        assert_eq!(encoded.metadata.unwrap().category, "shop");

        let broken: GeoPoint = hydrate(&json!({ "metadata": "{not json" }));
        assert!(broken.metadata.is_none());
    }

    #[test]
    fn validity_and_coordinates() {
        let point: GeoPoint = hydrate(&json!({
            "merchantId": 5, "longitude": 121.47, "latitude": 31.23
        }));
        assert_eq!(point.merchant_id, EntityId::from(5));
        assert_eq!(point.coordinates(), (121.47, 31.23));
        assert!(point.is_valid());

        let off: GeoPoint = hydrate(&json!({ "longitude": 200.0, "latitude": 0 }));
        assert!(!off.is_valid());
    }
}
