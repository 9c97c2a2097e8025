// ── Project domain type ──

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::entity_id::EntityId;
use super::payload::normalize_hex_color;
use super::user::User;
use super::{Hydratable, Payload};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Project {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub identifier: String,
    pub parent_project_id: Option<EntityId>,
    pub position: f64,
    pub hex_color: String,
    pub is_archived: bool,
    pub is_favorite: bool,
    pub owner_id: EntityId,
    pub owner: User,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl Project {
    pub fn has_color(&self) -> bool {
        !self.hex_color.is_empty()
    }

    /// Nested under another project. `0` means top level.
    pub fn is_child(&self) -> bool {
        self.parent_project_id
            .as_ref()
            .is_some_and(|id| !id.is_unassigned())
    }
}

impl Hydratable for Project {
    fn assign(&mut self, p: &Payload) {
        p.set("id", &mut self.id);
        p.set("title", &mut self.title);
        p.set("description", &mut self.description);
        p.set("identifier", &mut self.identifier);
        p.set("parent_project_id", &mut self.parent_project_id);
        p.set("position", &mut self.position);
        p.set_any(&["hex_color", "color"], &mut self.hex_color);
        p.set("is_archived", &mut self.is_archived);
        p.set("is_favorite", &mut self.is_favorite);
        p.set("owner_id", &mut self.owner_id);
        p.nested("owner", &mut self.owner);
        p.set_any(&["created", "created_at"], &mut self.created);
        p.set_any(&["updated", "updated_at"], &mut self.updated);
    }

    fn normalize(&mut self) {
        self.hex_color = normalize_hex_color(&self.hex_color);
        if self.owner_id.is_unassigned() && !self.owner.id.is_unassigned() {
            self.owner_id = self.owner.id.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::hydrate;

    #[test]
    fn nested_owner_is_hydrated() {
        let project: Project = hydrate(&json!({
            "id": 4,
            "title": "Launch",
            "hexColor": "1973ff",
            "owner": { "id": 9, "username": "lin" },
            "parent_project_id": 0
        }));

        assert_eq!(project.hex_color, "#1973ff");
        assert!(project.has_color());
        assert_eq!(project.owner.username, "lin");
        assert_eq!(project.owner_id, EntityId::from(9));
        assert!(!project.is_child());
    }

    #[test]
    fn color_alias_and_parent() {
        let project: Project = hydrate(&json!({ "color": "#00ff00", "parent_project_id": 2 }));
        assert_eq!(project.hex_color, "#00ff00");
        assert!(project.is_child());
    }
}
