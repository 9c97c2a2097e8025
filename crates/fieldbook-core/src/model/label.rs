// ── Label domain type ──

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::entity_id::EntityId;
use super::payload::normalize_hex_color;
use super::user::User;
use super::{Hydratable, Payload};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Label {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub hex_color: String,
    pub created_by: User,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl Hydratable for Label {
    fn assign(&mut self, p: &Payload) {
        p.set("id", &mut self.id);
        p.set("title", &mut self.title);
        p.set("description", &mut self.description);
        p.set_any(&["hex_color", "color"], &mut self.hex_color);
        p.nested("created_by", &mut self.created_by);
        p.set_any(&["created", "created_at"], &mut self.created);
        p.set_any(&["updated", "updated_at"], &mut self.updated);
    }

    fn normalize(&mut self) {
        self.hex_color = normalize_hex_color(&self.hex_color);
    }
}
