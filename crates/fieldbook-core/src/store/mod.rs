// ── Reactive entity store ──
//
// One long-lived cache per entity type. Every operation runs under the
// store's own loading slot, clears `error` when it starts and records a
// display-ready message when it fails. The cache only changes from the
// backend's authoritative responses: created and updated entities are
// the ones the server returned, and deletes apply after confirmation.

mod collection;
mod extensions;
mod sequence;

use std::future::Future;
use std::sync::Arc;

use fieldbook_api::{ApiClient, Params};
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::error::CoreError;
use crate::model::EntityId;
use crate::service::{LoadingTracker, Resource, Service};
use crate::stream::EntityStream;

use self::collection::{EntityCollection, Snapshot};
use self::sequence::{SequenceKey, Sequencer};

pub struct Store<M: Resource> {
    service: Service<M>,
    cache: EntityCollection<M>,
    loading: LoadingTracker,
    error: watch::Sender<Option<String>>,
    sequences: Sequencer,
}

impl<M: Resource> Store<M> {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self::with_service(Service::new(client))
    }

    pub fn with_service(service: Service<M>) -> Self {
        let (error, _) = watch::channel(None);
        Self {
            service,
            cache: EntityCollection::new(),
            loading: LoadingTracker::new(),
            error,
            sequences: Sequencer::default(),
        }
    }

    pub fn service(&self) -> &Service<M> {
        &self.service
    }

    // ── Cache access ─────────────────────────────────────────────────

    pub fn snapshot(&self) -> Snapshot<M> {
        self.cache.snapshot()
    }

    pub fn subscribe(&self) -> EntityStream<M> {
        EntityStream::new(self.cache.subscribe())
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_by_id(&self, id: &EntityId) -> Option<Arc<M>> {
        self.cache.get(id)
    }

    /// Every cached entity whose relation key equals `relation_id`.
    pub fn get_by_relation(&self, relation_id: &EntityId) -> Vec<Arc<M>> {
        self.cache
            .filter(|entity| entity.relation_id() == Some(relation_id))
    }

    /// Drop every cached entity.
    pub fn clear(&self) {
        self.cache.clear();
    }

    // ── Loading / error state ────────────────────────────────────────

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// Message of the most recent failed operation, if the latest
    /// attempt failed.
    pub fn error(&self) -> Option<String> {
        self.error.borrow().clone()
    }

    pub fn subscribe_error(&self) -> watch::Receiver<Option<String>> {
        self.error.subscribe()
    }

    pub fn clear_error(&self) {
        self.error.send_if_modified(|error| error.take().is_some());
    }

    /// Cancel every operation in flight on this store and its service.
    pub fn cancel(&self) -> usize {
        self.loading.cancel_all() + self.service.cancel_in_flight()
    }

    // ── Fetching ─────────────────────────────────────────────────────

    /// Global fetch: merge the result into the cache. Existing entries
    /// keep their position; new ones are appended.
    pub async fn fetch_all(&self, params: &Params) -> Result<Vec<Arc<M>>, CoreError> {
        let key = SequenceKey::All;
        let seq = self.sequences.issue(&key);

        let items = self
            .track(fetch_failed::<M>, self.service.get_all(params))
            .await?;
        let items = share(items);

        if self.sequences.is_current(&key, seq) {
            self.cache.upsert_many(keyed(&items));
        } else {
            trace!(entity = M::NAME, seq, "discarding superseded fetch");
        }
        Ok(items)
    }

    /// Scoped fetch: replace exactly the cached entities under
    /// `relation_id` with the result.
    pub async fn fetch_scoped(
        &self,
        relation_id: &EntityId,
        params: &Params,
    ) -> Result<Vec<Arc<M>>, CoreError> {
        let relation_key = M::RELATION_KEY.ok_or_else(|| CoreError::Unsupported {
            operation: format!("scoped fetch of {}", M::PLURAL),
        })?;
        let mut params = params.clone();
        params.insert(relation_key.to_owned(), relation_id.to_value());

        let key = SequenceKey::Scope(relation_id.clone());
        let seq = self.sequences.issue(&key);

        let items = self
            .track(fetch_failed::<M>, self.service.get_all(&params))
            .await?;
        let items = share(items);

        if self.sequences.is_current(&key, seq) {
            self.cache.replace_where(
                |entity| entity.relation_id() == Some(relation_id),
                keyed(&items),
            );
        } else {
            trace!(entity = M::NAME, %relation_id, seq, "discarding superseded scoped fetch");
        }
        Ok(items)
    }

    /// Fetch one entity and upsert it.
    pub async fn get(&self, id: &EntityId) -> Result<Arc<M>, CoreError> {
        let key = SequenceKey::Entity(id.clone());
        let seq = self.sequences.issue(&key);

        let mut params = Params::new();
        params.insert("id".into(), id.to_value());
        let entity = self
            .track(
                || format!("Failed to fetch {}", M::NAME),
                self.service.get(&params),
            )
            .await?;
        let entity = Arc::new(entity);

        if self.sequences.is_current(&key, seq) {
            self.cache.upsert(id.clone(), Arc::clone(&entity));
        } else {
            trace!(entity = M::NAME, %id, seq, "discarding superseded get");
        }
        Ok(entity)
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Create and append the server's copy to the cache.
    pub async fn create(&self, data: &Params) -> Result<Arc<M>, CoreError> {
        let entity = self
            .track(
                || format!("Failed to create {}", M::NAME),
                self.service.create(data),
            )
            .await?;
        let entity = Arc::new(entity);
        if entity.id().is_unassigned() {
            warn!(entity = M::NAME, "created entity came back without an id; not cached");
        } else {
            self.cache.upsert(entity.id().clone(), Arc::clone(&entity));
        }
        Ok(entity)
    }

    /// Send a partial update; the cached entry is replaced wholesale by
    /// the server's copy.
    pub async fn update(&self, id: &EntityId, data: &Params) -> Result<Arc<M>, CoreError> {
        let key = SequenceKey::Entity(id.clone());
        let seq = self.sequences.issue(&key);

        let entity = self
            .track(
                || format!("Failed to update {}", M::NAME),
                self.service.update(id, data),
            )
            .await?;
        let entity = Arc::new(entity);

        if self.sequences.is_current(&key, seq) {
            self.cache.replace(id, Arc::clone(&entity));
        } else {
            trace!(entity = M::NAME, %id, seq, "discarding superseded update");
        }
        Ok(entity)
    }

    /// Delete on the backend, then drop the cached entry. A failed
    /// delete leaves the cache untouched.
    pub async fn delete(&self, id: &EntityId) -> Result<(), CoreError> {
        // Supersede any update still in flight for this id.
        self.sequences.issue(&SequenceKey::Entity(id.clone()));

        self.track(
            || format!("Failed to delete {}", M::NAME),
            self.service.delete(id),
        )
        .await?;
        self.cache.remove(id);
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Run one store operation: loading slot, error reset, failure
    /// capture. Failures are always re-raised.
    async fn track<T, F>(
        &self,
        fallback: impl FnOnce() -> String,
        fut: F,
    ) -> Result<T, CoreError>
    where
        F: Future<Output = Result<T, CoreError>>,
    {
        self.clear_error();
        let result = self.loading.begin().run(fut).await;

        if let Err(ref err) = result {
            match err {
                // The shell reacts to these; they are not the store's to show.
                CoreError::Unauthorized | CoreError::Cancelled => {
                    debug!(entity = M::NAME, error = %err, "operation ended without result");
                }
                _ => {
                    let message = err.display_message(fallback);
                    warn!(entity = M::NAME, error = %err, "{message}");
                    self.error.send_replace(Some(message));
                }
            }
        }

        result
    }
}

fn fetch_failed<M: Resource>() -> String {
    format!("Failed to fetch {}", M::PLURAL)
}

fn share<M>(items: Vec<M>) -> Vec<Arc<M>> {
    items.into_iter().map(Arc::new).collect()
}

fn keyed<M: Resource>(items: &[Arc<M>]) -> Vec<(EntityId, Arc<M>)> {
    items
        .iter()
        .map(|entity| (entity.id().clone(), Arc::clone(entity)))
        .collect()
}
