// ── Entity-specific store operations ──

use std::sync::Arc;

use fieldbook_api::{Params, UploadFile};
use serde_json::Value;
use tracing::{info, trace};

use super::sequence::SequenceKey;
use super::{Store, keyed, share};
use crate::error::CoreError;
use crate::model::{EntityId, GeocodeResult, ImportResult, Merchant, MerchantTag, Task};

impl Store<Task> {
    /// Flip `done` on a cached task. `Ok(None)` if the task is not cached.
    pub async fn toggle_done(&self, id: &EntityId) -> Result<Option<Arc<Task>>, CoreError> {
        let Some(task) = self.get_by_id(id) else {
            return Ok(None);
        };
        let mut data = Params::new();
        data.insert("done".into(), Value::Bool(!task.done));
        self.update(id, &data).await.map(Some)
    }

    /// Fetch tasks across every project and merge them into the cache.
    pub async fn fetch_across_projects(&self, filter: &Params) -> Result<Vec<Arc<Task>>, CoreError> {
        let key = SequenceKey::All;
        let seq = self.sequences.issue(&key);

        let items = self
            .track(
                || "Failed to fetch tasks".to_owned(),
                self.service.all(filter),
            )
            .await?;
        let items = share(items);

        if self.sequences.is_current(&key, seq) {
            self.cache.upsert_many(keyed(&items));
        } else {
            trace!(seq, "discarding superseded task listing");
        }
        Ok(items)
    }
}

impl Store<Merchant> {
    /// Re-geocode one merchant and replace its cached entry.
    pub async fn geocode(&self, id: &EntityId) -> Result<Arc<Merchant>, CoreError> {
        let key = SequenceKey::Entity(id.clone());
        let seq = self.sequences.issue(&key);

        let merchant = self
            .track(
                || "Failed to geocode merchant".to_owned(),
                self.service.geocode_merchant(id),
            )
            .await?;
        let merchant = Arc::new(merchant);

        if self.sequences.is_current(&key, seq) {
            self.cache.replace(id, Arc::clone(&merchant));
        }
        Ok(merchant)
    }

    /// Import merchants from a CSV file; imported rows join the cache.
    pub async fn import_csv(
        &self,
        file: UploadFile,
        auto_geocode: bool,
    ) -> Result<ImportResult, CoreError> {
        let result = self
            .track(
                || "Failed to import merchants".to_owned(),
                self.service.import_csv(file, auto_geocode),
            )
            .await?;
        self.absorb_import(&result);
        Ok(result)
    }

    /// Import merchants from an Excel workbook; imported rows join the cache.
    pub async fn import_excel(&self, file: UploadFile) -> Result<ImportResult, CoreError> {
        let result = self
            .track(
                || "Failed to import merchants".to_owned(),
                self.service.import_excel(file),
            )
            .await?;
        self.absorb_import(&result);
        Ok(result)
    }

    /// Resolve a free-text address. The cache is not touched.
    pub async fn geocode_address(&self, address: &str) -> Result<GeocodeResult, CoreError> {
        self.track(
            || "Failed to geocode address".to_owned(),
            self.service.geocode_address(address),
        )
        .await
    }

    fn absorb_import(&self, result: &ImportResult) {
        let imported: Vec<_> = result
            .imported_items
            .iter()
            .filter(|merchant| !merchant.id.is_unassigned())
            .map(|merchant| (merchant.id.clone(), Arc::new(merchant.clone())))
            .collect();
        let added = self.cache.upsert_many(imported);
        info!(
            total = result.total_rows,
            succeeded = result.success_count,
            failed = result.error_count,
            added,
            "merchant import finished"
        );
    }
}

impl Store<MerchantTag> {
    pub async fn distinct_classes(&self) -> Result<Vec<String>, CoreError> {
        self.track(
            || "Failed to fetch tag classes".to_owned(),
            self.service.distinct_classes(),
        )
        .await
    }
}
