// ── Ordered reactive entity collection ──
//
// Insertion-ordered storage keyed by `EntityId`, with push-based change
// notification via a `watch` snapshot channel. Every mutation rebuilds
// the snapshot while still holding the write lock, so subscribers never
// observe a half-applied batch.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use tokio::sync::watch;

use crate::model::EntityId;

pub(crate) type Snapshot<T> = Arc<Vec<Arc<T>>>;

pub(crate) struct EntityCollection<T: Send + Sync + 'static> {
    entries: RwLock<IndexMap<EntityId, Arc<T>>>,
    snapshot: watch::Sender<Snapshot<T>>,
}

impl<T: Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            entries: RwLock::new(IndexMap::new()),
            snapshot,
        }
    }

    /// Insert or replace. Existing entries keep their position; new ones
    /// are appended. Returns `true` if the id was new.
    pub(crate) fn upsert(&self, id: EntityId, entity: Arc<T>) -> bool {
        let mut entries = self.write();
        let is_new = entries.insert(id, entity).is_none();
        self.publish(&entries);
        is_new
    }

    /// Upsert a batch with a single notification. Returns how many ids
    /// were new.
    pub(crate) fn upsert_many(&self, items: impl IntoIterator<Item = (EntityId, Arc<T>)>) -> usize {
        let mut entries = self.write();
        let added = items
            .into_iter()
            .filter(|(id, entity)| entries.insert(id.clone(), Arc::clone(entity)).is_none())
            .count();
        self.publish(&entries);
        added
    }

    /// Replace an existing entry in place. Absent ids are left alone.
    pub(crate) fn replace(&self, id: &EntityId, entity: Arc<T>) -> bool {
        let mut entries = self.write();
        let Some(slot) = entries.get_mut(id) else {
            return false;
        };
        *slot = entity;
        self.publish(&entries);
        true
    }

    /// Drop every entry matching `stale`, then append `items`.
    pub(crate) fn replace_where(
        &self,
        stale: impl Fn(&T) -> bool,
        items: impl IntoIterator<Item = (EntityId, Arc<T>)>,
    ) {
        let mut entries = self.write();
        entries.retain(|_, entity| !stale(entity));
        entries.extend(items);
        self.publish(&entries);
    }

    /// Remove by id, preserving the order of the rest.
    pub(crate) fn remove(&self, id: &EntityId) -> Option<Arc<T>> {
        let mut entries = self.write();
        let removed = entries.shift_remove(id);
        if removed.is_some() {
            self.publish(&entries);
        }
        removed
    }

    pub(crate) fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.read().get(id).cloned()
    }

    pub(crate) fn filter(&self, keep: impl Fn(&T) -> bool) -> Vec<Arc<T>> {
        self.read()
            .values()
            .filter(|entity| keep(entity))
            .cloned()
            .collect()
    }

    /// Current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Snapshot<T> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn clear(&self) {
        let mut entries = self.write();
        entries.clear();
        self.publish(&entries);
    }

    pub(crate) fn len(&self) -> usize {
        self.read().len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<EntityId, Arc<T>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<EntityId, Arc<T>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, entries: &IndexMap<EntityId, Arc<T>>) {
        let values: Vec<Arc<T>> = entries.values().cloned().collect();
        // `send_replace` updates unconditionally, even with zero receivers.
        self.snapshot.send_replace(Arc::new(values));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn id(n: i64) -> EntityId {
        EntityId::from(n)
    }

    fn titles(col: &EntityCollection<String>) -> Vec<String> {
        col.snapshot().iter().map(|s| (**s).clone()).collect()
    }

    #[test]
    fn upsert_reports_new_ids_and_keeps_position() {
        let col = EntityCollection::new();
        assert!(col.upsert(id(1), Arc::new("a".to_owned())));
        assert!(col.upsert(id(2), Arc::new("b".to_owned())));
        assert!(!col.upsert(id(1), Arc::new("a2".to_owned())));

        assert_eq!(titles(&col), vec!["a2", "b"]);
    }

    #[test]
    fn replace_ignores_unknown_ids() {
        let col = EntityCollection::new();
        col.upsert(id(1), Arc::new("a".to_owned()));

        assert!(!col.replace(&id(9), Arc::new("z".to_owned())));
        assert!(col.replace(&id(1), Arc::new("a2".to_owned())));
        assert_eq!(titles(&col), vec!["a2"]);
    }

    #[test]
    fn replace_where_swaps_matching_subset() {
        let col = EntityCollection::new();
        col.upsert_many([
            (id(1), Arc::new("p1:a".to_owned())),
            (id(2), Arc::new("p2:b".to_owned())),
            (id(3), Arc::new("p1:c".to_owned())),
        ]);

        col.replace_where(
            |s| s.starts_with("p1:"),
            [(id(4), Arc::new("p1:d".to_owned()))],
        );

        assert_eq!(titles(&col), vec!["p2:b", "p1:d"]);
        assert!(col.get(&id(1)).is_none());
    }

    #[test]
    fn remove_preserves_order() {
        let col = EntityCollection::new();
        col.upsert_many([
            (id(1), Arc::new("a".to_owned())),
            (id(2), Arc::new("b".to_owned())),
            (id(3), Arc::new("c".to_owned())),
        ]);

        assert_eq!(*col.remove(&id(2)).unwrap(), "b");
        assert!(col.remove(&id(2)).is_none());
        assert_eq!(titles(&col), vec!["a", "c"]);
        assert_eq!(col.len(), 2);
    }

    #[test]
    fn subscribers_see_mutations() {
        let col = EntityCollection::new();
        let mut rx = col.subscribe();

        col.upsert(id(1), Arc::new("a".to_owned()));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        col.clear();
        assert!(rx.borrow_and_update().is_empty());
        assert_eq!(col.filter(|_| true).len(), 0);
    }
}
