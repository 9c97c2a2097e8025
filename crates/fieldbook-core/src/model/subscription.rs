// ── Subscription domain type ──

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::entity_id::EntityId;
use super::user::User;
use super::{Hydratable, Payload};

/// A user's watch on one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Subscription {
    pub id: EntityId,
    /// Kind of entity watched, e.g. `"merchant"`.
    pub entity: String,
    pub entity_id: EntityId,
    pub user: User,
    pub created: Option<DateTime<Utc>>,
}

impl Hydratable for Subscription {
    fn assign(&mut self, p: &Payload) {
        p.set("id", &mut self.id);
        p.set("entity", &mut self.entity);
        p.set("entity_id", &mut self.entity_id);
        p.nested("user", &mut self.user);
        p.set_any(&["created", "created_at"], &mut self.created);
    }
}
