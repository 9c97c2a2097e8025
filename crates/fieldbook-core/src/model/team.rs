// ── Team domain type ──

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::entity_id::EntityId;
use super::{Hydratable, Payload};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Team {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub created_by_id: EntityId,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl Hydratable for Team {
    fn assign(&mut self, p: &Payload) {
        p.set("id", &mut self.id);
        p.set("name", &mut self.name);
        p.set("description", &mut self.description);
        p.set("created_by_id", &mut self.created_by_id);
        p.set_any(&["created", "created_at"], &mut self.created);
        p.set_any(&["updated", "updated_at"], &mut self.updated);
    }
}
