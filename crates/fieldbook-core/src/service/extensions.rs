// ── Entity-specific service operations ──

use fieldbook_api::{Params, UploadFile};
use serde_json::json;

use super::catalogue::{
    DISTINCT_CLASSES, GEOCODE_ADDRESS, GEOCODE_MERCHANT, IMPORT_CSV, IMPORT_EXCEL, TASKS_ALL,
};
use super::{Service, id_params};
use crate::error::CoreError;
use crate::model::{
    Coerce, EntityId, GeocodeResult, ImportResult, Merchant, MerchantTag, Task, hydrate,
    hydrate_list,
};

impl Service<Task> {
    /// Tasks across every project. Filters (`done`, `page`, `per_page`)
    /// go in the query string.
    pub async fn all(&self, filter: &Params) -> Result<Vec<Task>, CoreError> {
        let raw = self.call(TASKS_ALL, filter, None).await?;
        Ok(hydrate_list(&raw))
    }
}

impl Service<Merchant> {
    /// Ask the backend to (re)geocode one merchant. Returns the updated
    /// merchant.
    pub async fn geocode_merchant(&self, id: &EntityId) -> Result<Merchant, CoreError> {
        let raw = self.call(GEOCODE_MERCHANT, &id_params(id), None).await?;
        Ok(hydrate(&raw))
    }

    pub async fn import_excel(&self, file: UploadFile) -> Result<ImportResult, CoreError> {
        let raw = self
            .upload(IMPORT_EXCEL, &Params::new(), &[], file)
            .await?;
        Ok(hydrate(&raw))
    }

    /// CSV import; `auto_geocode` asks the backend to geocode every
    /// imported row.
    pub async fn import_csv(
        &self,
        file: UploadFile,
        auto_geocode: bool,
    ) -> Result<ImportResult, CoreError> {
        let fields = [("autoGeocode".to_owned(), auto_geocode.to_string())];
        let raw = self
            .upload(IMPORT_CSV, &Params::new(), &fields, file)
            .await?;
        Ok(hydrate(&raw))
    }

    /// Geocode a free-text address without touching any merchant.
    pub async fn geocode_address(&self, address: &str) -> Result<GeocodeResult, CoreError> {
        let body = json!({ "address": address });
        let raw = self
            .call(GEOCODE_ADDRESS, &Params::new(), Some(&body))
            .await?;
        Ok(hydrate(&raw))
    }
}

impl Service<MerchantTag> {
    /// Every distinct `class` value in use.
    pub async fn distinct_classes(&self) -> Result<Vec<String>, CoreError> {
        let raw = self.call(DISTINCT_CLASSES, &Params::new(), None).await?;
        Ok(Vec::<String>::coerce(&raw)
            .unwrap_or_default()
            .into_iter()
            .filter(|class| !class.is_empty())
            .collect())
    }
}
