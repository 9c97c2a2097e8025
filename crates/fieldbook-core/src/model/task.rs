// ── Task domain type ──

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumString};

use super::entity_id::EntityId;
use super::label::Label;
use super::payload::{Coerce, normalize_hex_color, to_snake_case};
use super::user::User;
use super::{Hydratable, Payload};

/// How a repeating task computes its next due date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RepeatMode {
    /// Shift by `repeat_after` seconds from the previous due date.
    #[default]
    Default,
    /// Same day next month.
    Month,
    /// Shift by `repeat_after` seconds from the moment it was marked done.
    FromCurrentDate,
}

impl Coerce for RepeatMode {
    fn coerce(value: &Value) -> Option<Self> {
        let mode = match value {
            Value::Number(n) => match n.as_i64() {
                Some(1) => Self::Month,
                Some(2) => Self::FromCurrentDate,
                _ => Self::Default,
            },
            Value::String(s) => to_snake_case(s.trim()).parse().unwrap_or_default(),
            _ => return None,
        };
        Some(mode)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Task {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub done: bool,
    pub done_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub priority: i64,
    pub position: f64,
    /// Seconds between repetitions; 0 means no repetition.
    pub repeat_after: i64,
    pub repeat_mode: RepeatMode,
    pub hex_color: String,
    pub bucket_id: Option<EntityId>,
    pub project_id: EntityId,
    pub parent_task_id: Option<EntityId>,
    pub created_by: User,
    pub labels: Vec<Label>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl Task {
    pub fn has_due_date(&self) -> bool {
        self.due_date.is_some()
    }

    /// Open and past its due date at `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.done && self.due_date.is_some_and(|due| due < now)
    }

    pub fn is_repeating(&self) -> bool {
        self.repeat_after > 0 || self.repeat_mode == RepeatMode::Month
    }
}

impl Hydratable for Task {
    fn assign(&mut self, p: &Payload) {
        p.set("id", &mut self.id);
        p.set("title", &mut self.title);
        p.set("description", &mut self.description);
        p.set("done", &mut self.done);
        p.set("done_at", &mut self.done_at);
        p.set("due_date", &mut self.due_date);
        p.set("start_date", &mut self.start_date);
        p.set("end_date", &mut self.end_date);
        p.set("priority", &mut self.priority);
        p.set("position", &mut self.position);
        p.set("repeat_after", &mut self.repeat_after);
        p.set("repeat_mode", &mut self.repeat_mode);
        p.set_any(&["hex_color", "color"], &mut self.hex_color);
        p.set("bucket_id", &mut self.bucket_id);
        p.set("project_id", &mut self.project_id);
        p.set("parent_task_id", &mut self.parent_task_id);
        p.nested("created_by", &mut self.created_by);
        p.list("labels", &mut self.labels);
        p.set_any(&["created", "created_at"], &mut self.created);
        p.set_any(&["updated", "updated_at"], &mut self.updated);
    }

    fn normalize(&mut self) {
        self.hex_color = normalize_hex_color(&self.hex_color);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::hydrate;

    #[test]
    fn labels_and_creator_are_models() {
        let task: Task = hydrate(&json!({
            "id": 11,
            "title": "Call supplier",
            "project_id": 4,
            "created_by": { "id": 2, "username": "mo" },
            "labels": [
                { "id": 1, "title": "urgent", "hex_color": "ff0000" },
                { "id": 2, "title": "phone" }
            ]
        }));

        assert_eq!(task.project_id, EntityId::from(4));
        assert_eq!(task.created_by.username, "mo");
        assert_eq!(task.labels.len(), 2);
        assert_eq!(task.labels[0].hex_color, "#ff0000");
        assert_eq!(task.labels[1].hex_color, "");
    }

    #[test]
    fn repeat_mode_from_number_or_name() {
        let numeric: Task = hydrate(&json!({ "repeat_mode": 1 }));
        assert_eq!(numeric.repeat_mode, RepeatMode::Month);

        let named: Task = hydrate(&json!({ "repeatMode": "fromCurrentDate" }));
        assert_eq!(named.repeat_mode, RepeatMode::FromCurrentDate);

        let unknown: Task = hydrate(&json!({ "repeat_mode": 42 }));
        assert_eq!(unknown.repeat_mode, RepeatMode::Default);
        assert_eq!(RepeatMode::FromCurrentDate.to_string(), "from_current_date");
    }

    #[test]
    fn overdue_only_when_open() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut task: Task = hydrate(&json!({ "due_date": "2024-05-30T09:00:00Z" }));
        assert!(task.has_due_date());
        assert!(task.is_overdue(now));

        task.done = true;
        assert!(!task.is_overdue(now));

        let undated: Task = hydrate(&json!({ "due_date": "0001-01-01T00:00:00Z" }));
        assert!(!undated.has_due_date());
        assert!(!undated.is_overdue(now));
    }

    #[test]
    fn repeating() {
        let task: Task = hydrate(&json!({ "repeat_after": 86400 }));
        assert!(task.is_repeating());
        assert!(!Task::default().is_repeating());
    }
}
