// Last-issued-wins bookkeeping for cache writes.
//
// Every fetch or update takes a ticket for the key it will write. When
// the response lands, it is applied only if no newer ticket was issued
// for that key in the meantime.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::model::EntityId;

/// What a response is about to overwrite.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum SequenceKey {
    /// The whole collection (global fetches).
    All,
    /// Everything under one parent (scoped fetches).
    Scope(EntityId),
    /// One entity (get, update, delete).
    Entity(EntityId),
}

#[derive(Debug, Default)]
pub(crate) struct Sequencer {
    counter: AtomicU64,
    latest: DashMap<SequenceKey, u64>,
}

impl Sequencer {
    /// Take a new ticket for `key`, superseding all earlier ones.
    pub(crate) fn issue(&self, key: &SequenceKey) -> u64 {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        self.latest.insert(key.clone(), seq);
        seq
    }

    /// `true` if `seq` is still the newest ticket for `key`.
    pub(crate) fn is_current(&self, key: &SequenceKey, seq: u64) -> bool {
        self.latest.get(key).is_none_or(|latest| *latest == seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_supersedes() {
        let seq = Sequencer::default();
        let key = SequenceKey::Entity(EntityId::from(1));

        let first = seq.issue(&key);
        assert!(seq.is_current(&key, first));

        let second = seq.issue(&key);
        assert!(!seq.is_current(&key, first));
        assert!(seq.is_current(&key, second));
    }

    #[test]
    fn keys_are_independent() {
        let seq = Sequencer::default();
        let a = seq.issue(&SequenceKey::Scope(EntityId::from(1)));
        seq.issue(&SequenceKey::Scope(EntityId::from(2)));
        seq.issue(&SequenceKey::All);
        assert!(seq.is_current(&SequenceKey::Scope(EntityId::from(1)), a));
    }
}
