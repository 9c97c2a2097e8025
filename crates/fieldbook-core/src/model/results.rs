// ── Operation results ──
//
// Bodies returned by the merchant import and geocode extensions. Not
// cached entities, but hydrated the same way.

use serde::Serialize;
use serde_json::{Map, Value};

use super::merchant::Merchant;
use super::{Hydratable, Payload};

/// One rejected row of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportRowError {
    pub row: i64,
    pub column: String,
    pub message: String,
    pub value: String,
}

impl Hydratable for ImportRowError {
    fn assign(&mut self, p: &Payload) {
        p.set("row", &mut self.row);
        p.set("column", &mut self.column);
        p.set("message", &mut self.message);
        p.set("value", &mut self.value);
    }
}

/// Outcome of a CSV or Excel merchant import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportResult {
    pub total_rows: i64,
    pub success_count: i64,
    pub error_count: i64,
    pub errors: Vec<ImportRowError>,
    pub imported_items: Vec<Merchant>,
    pub summary: Map<String, Value>,
}

impl ImportResult {
    pub fn has_errors(&self) -> bool {
        self.error_count > 0 || !self.errors.is_empty()
    }
}

impl Hydratable for ImportResult {
    fn assign(&mut self, p: &Payload) {
        p.set("total_rows", &mut self.total_rows);
        p.set("success_count", &mut self.success_count);
        p.set("error_count", &mut self.error_count);
        p.list("errors", &mut self.errors);
        p.list("imported_items", &mut self.imported_items);
        if let Some(summary) = p.get("summary").and_then(Value::as_object) {
            self.summary.clone_from(summary);
        }
    }

    fn normalize(&mut self) {
        if self.error_count == 0 && !self.errors.is_empty() {
            self.error_count = i64::try_from(self.errors.len()).unwrap_or(i64::MAX);
        }
    }
}

/// Coordinates resolved for a free-text address.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeocodeResult {
    pub longitude: f64,
    pub latitude: f64,
    pub level: String,
    pub score: f64,
    pub description: String,
    pub address: String,
    pub provider: String,
}

impl Hydratable for GeocodeResult {
    fn assign(&mut self, p: &Payload) {
        p.set("longitude", &mut self.longitude);
        p.set("latitude", &mut self.latitude);
        p.set("level", &mut self.level);
        p.set("score", &mut self.score);
        p.set("description", &mut self.description);
        p.set("address", &mut self.address);
        p.set("provider", &mut self.provider);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::hydrate;

    #[test]
    fn import_result_hydrates_rows_and_merchants() {
        let result: ImportResult = hydrate(&json!({
            "total_rows": 3,
            "success_count": 2,
            "errors": [{ "row": 3, "column": "phone", "message": "invalid", "value": "x" }],
            "imported_items": [{ "id": 1, "title": "A" }, { "id": 2, "title": "B" }],
            "summary": { "geocoded": 1 }
        }));

        assert_eq!(result.error_count, 1);
        assert!(result.has_errors());
        assert_eq!(result.errors[0].column, "phone");
        assert_eq!(result.imported_items[1].title, "B");
        assert_eq!(result.summary.get("geocoded"), Some(&json!(1)));
    }
}
