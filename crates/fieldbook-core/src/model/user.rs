// ── User domain type ──

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::entity_id::EntityId;
use super::{Hydratable, Payload};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct User {
    pub id: EntityId,
    pub username: String,
    pub email: String,
    pub name: String,
    pub timezone: Option<String>,
    /// 0 = Sunday.
    pub week_start: i64,
    pub language: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub is_email_confirmed: bool,
    pub totp_enabled: bool,
    pub avatar_provider: String,
    pub avatar_file_id: Option<EntityId>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl User {
    /// Minimal user known only by name, as reported by a token check.
    pub fn from_username(username: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            name: username.clone(),
            username,
            is_active: true,
            avatar_provider: "initials".into(),
            ..Self::default()
        }
    }

    /// Full name when set, otherwise the login name.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.username
        } else {
            &self.name
        }
    }
}

impl Hydratable for User {
    fn assign(&mut self, p: &Payload) {
        p.set("id", &mut self.id);
        p.set("username", &mut self.username);
        p.set("email", &mut self.email);
        p.set("name", &mut self.name);
        p.set("timezone", &mut self.timezone);
        p.set("week_start", &mut self.week_start);
        p.set("language", &mut self.language);
        p.set("is_active", &mut self.is_active);
        p.set("is_admin", &mut self.is_admin);
        p.set("is_email_confirmed", &mut self.is_email_confirmed);
        p.set("totp_enabled", &mut self.totp_enabled);
        p.set("avatar_provider", &mut self.avatar_provider);
        p.set("avatar_file_id", &mut self.avatar_file_id);
        p.set_any(&["created", "created_at"], &mut self.created);
        p.set_any(&["updated", "updated_at"], &mut self.updated);
    }
}

// ── Server info ─────────────────────────────────────────────────────

/// Backend capabilities, from `GET /info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApiInfo {
    pub version: String,
    pub local_auth_enabled: bool,
    pub registration_enabled: bool,
    pub enabled_background_providers: Vec<String>,
    pub public_teams_enabled: bool,
}

impl Hydratable for ApiInfo {
    fn assign(&mut self, p: &Payload) {
        p.set("version", &mut self.version);
        p.set(
            "enabled_background_providers",
            &mut self.enabled_background_providers,
        );
        p.set("public_teams_enabled", &mut self.public_teams_enabled);

        // auth.local.{enabled, registration_enabled}
        if let Some(local) = p.get("auth").and_then(|auth| auth.get("local")) {
            let local = Payload::new(local);
            local.set("enabled", &mut self.local_auth_enabled);
            local.set("registration_enabled", &mut self.registration_enabled);
        }
    }
}
