// ── Merchant tag domain type ──

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::entity_id::EntityId;
use super::payload::normalize_hex_color;
use super::user::User;
use super::{Hydratable, Payload};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MerchantTag {
    pub id: EntityId,
    pub tag_name: String,
    pub alias: String,
    /// Free-form grouping; see `Service<MerchantTag>::distinct_classes`.
    pub class: String,
    pub remarks: String,
    pub hex_color: String,
    pub owner: User,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl Hydratable for MerchantTag {
    fn assign(&mut self, p: &Payload) {
        p.set("id", &mut self.id);
        p.set("tag_name", &mut self.tag_name);
        p.set("alias", &mut self.alias);
        p.set("class", &mut self.class);
        p.set("remarks", &mut self.remarks);
        p.set("hex_color", &mut self.hex_color);
        p.nested("owner", &mut self.owner);
        p.set_any(&["created", "created_at"], &mut self.created);
        p.set_any(&["updated", "updated_at"], &mut self.updated);
    }

    fn normalize(&mut self) {
        self.hex_color = normalize_hex_color(&self.hex_color);
    }
}
