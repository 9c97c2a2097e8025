// ── Generic CRUD service ──
//
// `Service<M>` maps typed operations onto the entity's endpoint table,
// issues the HTTP call through the shared `ApiClient`, and hydrates the
// response into `M`. Templates are resolved before loading starts, so a
// parameter error never touches the network or the loading flag.

mod catalogue;
mod extensions;
pub mod loading;
mod progress;

use std::marker::PhantomData;
use std::sync::Arc;

use fieldbook_api::{ApiClient, Endpoints, Method, Operation, Params, UploadFile};
use serde_json::Value;
use tokio::sync::watch;

use crate::error::CoreError;
use crate::model::{EntityId, Hydratable, hydrate, hydrate_list};

pub use catalogue::{
    DISTINCT_CLASSES, GEOCODE_ADDRESS, GEOCODE_MERCHANT, IMPORT_CSV, IMPORT_EXCEL, TASKS_ALL,
};
pub use loading::{CancelHandle, LoadingGuard, LoadingTracker};

/// An entity type the backend exposes as a REST collection.
pub trait Resource: Hydratable + Clone + Send + Sync + 'static {
    /// Singular noun used in messages, e.g. `"task"`.
    const NAME: &'static str;
    /// Plural noun used in messages, e.g. `"tasks"`.
    const PLURAL: &'static str;
    /// Parameter naming the parent for scoped fetches, e.g. `"project_id"`.
    const RELATION_KEY: Option<&'static str> = None;

    /// Operation → template table.
    fn endpoints() -> Endpoints;

    fn id(&self) -> &EntityId;

    /// Value of the relation key on this instance.
    fn relation_id(&self) -> Option<&EntityId> {
        None
    }
}

/// Stateless gateway for one entity type, apart from its loading and
/// upload-progress channels.
pub struct Service<M: Resource> {
    client: Arc<ApiClient>,
    endpoints: Endpoints,
    loading: LoadingTracker,
    progress: Arc<watch::Sender<u8>>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Resource> Service<M> {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self::with_endpoints(client, M::endpoints())
    }

    /// Use a custom endpoint table instead of `M::endpoints()`.
    pub fn with_endpoints(client: Arc<ApiClient>, endpoints: Endpoints) -> Self {
        let (progress, _) = watch::channel(0);
        Self {
            client,
            endpoints,
            loading: LoadingTracker::new(),
            progress: Arc::new(progress),
            _model: PhantomData,
        }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Fill the template registered under `op` from `params`.
    pub fn resolve_template(&self, op: Operation, params: &Params) -> Result<String, CoreError> {
        Ok(self.endpoints.resolve(op, params)?.path)
    }

    // ── Observable state ─────────────────────────────────────────────

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// Current upload progress, 0–100.
    pub fn progress(&self) -> u8 {
        *self.progress.borrow()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<u8> {
        self.progress.subscribe()
    }

    pub fn loading_tracker(&self) -> &LoadingTracker {
        &self.loading
    }

    /// Cancel every call this service has in flight.
    pub fn cancel_in_flight(&self) -> usize {
        self.loading.cancel_all()
    }

    // ── CRUD ─────────────────────────────────────────────────────────

    /// List. Parameters not consumed by the template go in the query.
    pub async fn get_all(&self, params: &Params) -> Result<Vec<M>, CoreError> {
        let raw = self.call(Operation::GetAll, params, None).await?;
        Ok(hydrate_list(&raw))
    }

    pub async fn get(&self, params: &Params) -> Result<M, CoreError> {
        let raw = self.call(Operation::Get, params, None).await?;
        Ok(hydrate(&raw))
    }

    /// `data` both fills the template and is sent as the body.
    pub async fn create(&self, data: &Params) -> Result<M, CoreError> {
        let body = Value::Object(data.clone());
        let raw = self.call(Operation::Create, data, Some(&body)).await?;
        Ok(hydrate(&raw))
    }

    /// Send a partial payload for entity `id`.
    pub async fn update(&self, id: &EntityId, data: &Params) -> Result<M, CoreError> {
        let mut params = data.clone();
        params.insert("id".into(), id.to_value());
        let body = Value::Object(data.clone());
        let raw = self.call(Operation::Update, &params, Some(&body)).await?;
        Ok(hydrate(&raw))
    }

    pub async fn delete(&self, id: &EntityId) -> Result<(), CoreError> {
        self.call(Operation::Delete, &id_params(id), None).await?;
        Ok(())
    }

    // ── Raw calls ────────────────────────────────────────────────────

    /// Resolve `op`, then send it under a loading slot.
    ///
    /// Unconsumed scalar parameters become the query string of `GET`
    /// requests and are dropped otherwise.
    pub async fn call(
        &self,
        op: Operation,
        params: &Params,
        body: Option<&Value>,
    ) -> Result<Value, CoreError> {
        let resolved = self.endpoints.resolve(op, params)?;
        let query = if resolved.method == Method::GET {
            resolved.query(params)
        } else {
            Vec::new()
        };

        let guard = self.loading.begin();
        guard
            .run(
                self.client
                    .send_json(resolved.method, &resolved.path, &query, body),
            )
            .await
    }

    /// Multipart upload under a loading slot, publishing progress.
    ///
    /// Progress only moves forward during the call and is back at 0 once
    /// it returns, whatever the outcome.
    pub async fn upload(
        &self,
        op: Operation,
        params: &Params,
        fields: &[(String, String)],
        file: UploadFile,
    ) -> Result<Value, CoreError> {
        let resolved = self.endpoints.resolve(op, params)?;

        let guard = self.loading.begin();
        let reporter = progress::UploadProgress::start(Arc::clone(&self.progress));
        let result = guard
            .run(
                self.client
                    .upload(&resolved.path, fields, file, Some(reporter.callback())),
            )
            .await;
        drop(reporter);
        result
    }
}

/// `{"id": id}`.
pub(crate) fn id_params(id: &EntityId) -> Params {
    let mut params = Params::new();
    params.insert("id".into(), id.to_value());
    params
}
