// ── Domain model ──
//
// Every entity is a plain struct with a `Default` (one default per
// declared field) and a `Hydratable` impl. `hydrate` runs the same two
// steps for all of them: assign matching payload keys onto the
// defaults, then let the entity normalize itself (nested entities,
// colors). Hydration never fails; bad input degrades to defaults.

pub mod entity_id;
pub mod geo_point;
pub mod label;
pub mod merchant;
pub mod merchant_tag;
pub mod payload;
pub mod project;
pub mod results;
pub mod subscription;
pub mod task;
pub mod team;
pub mod user;

use serde_json::Value;

pub use entity_id::EntityId;
pub use geo_point::{GeoMetadata, GeoPoint};
pub use label::Label;
pub use merchant::{GEOCODE_PENDING, Merchant};
pub use merchant_tag::MerchantTag;
pub use payload::{Coerce, Payload, normalize_hex_color, parse_date};
pub use project::Project;
pub use results::{GeocodeResult, ImportResult, ImportRowError};
pub use subscription::Subscription;
pub use task::{RepeatMode, Task};
pub use team::Team;
pub use user::{ApiInfo, User};

/// Capability to be built from a raw backend payload.
pub trait Hydratable: Default {
    /// Copy every recognised key of `payload` onto `self`.
    /// Unrecognised keys are ignored.
    fn assign(&mut self, payload: &Payload);

    /// Post-assignment fix-ups. Runs once, after `assign`.
    fn normalize(&mut self) {}
}

/// Build a fully-populated `T` from `raw`.
pub fn hydrate<T: Hydratable>(raw: &Value) -> T {
    let mut model = T::default();
    model.assign(&Payload::new(raw));
    model.normalize();
    model
}

/// Hydrate every object in a list response.
///
/// Accepts a bare array or an envelope carrying the array under
/// `items`, `data` or `results`. Anything else yields an empty list.
pub fn hydrate_list<T: Hydratable>(raw: &Value) -> Vec<T> {
    let items = match raw {
        Value::Array(items) => Some(items),
        Value::Object(envelope) => ["items", "data", "results"]
            .iter()
            .find_map(|key| envelope.get(*key).and_then(Value::as_array)),
        _ => None,
    };

    items
        .map(|items| {
            items
                .iter()
                .filter(|item| item.is_object())
                .map(hydrate)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn list_from_bare_array_and_envelope() {
        let bare: Vec<Label> = hydrate_list(&json!([{ "id": 1 }, { "id": 2 }, 3]));
        assert_eq!(bare.len(), 2);

        let wrapped: Vec<Label> = hydrate_list(&json!({ "items": [{ "id": 1 }], "total": 1 }));
        assert_eq!(wrapped.len(), 1);

        let nothing: Vec<Label> = hydrate_list(&json!({ "detail": "x" }));
        assert!(nothing.is_empty());
    }
}
