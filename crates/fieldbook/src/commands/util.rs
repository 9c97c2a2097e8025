//! Shared helpers for command handlers.

use std::path::Path;

use serde_json::Value;

use fieldbook_core::{EntityId, Params, Workspace};

use crate::cli::{FieldArgs, ListArgs};
use crate::error::CliError;

/// Fail early when no token is stored for the profile.
pub fn require_login(workspace: &Workspace, profile: &str) -> Result<(), CliError> {
    if workspace.session().is_logged_in() {
        Ok(())
    } else {
        Err(CliError::NotLoggedIn {
            profile: profile.into(),
        })
    }
}

pub fn parse_id(raw: &str) -> EntityId {
    EntityId::from(raw)
}

/// Query parameters shared by list commands.
pub fn list_params(list: &ListArgs) -> Params {
    let mut params = Params::new();
    if let Some(ref search) = list.search {
        params.insert("s".into(), Value::String(search.clone()));
    }
    if let Some(page) = list.page {
        params.insert("page".into(), page.into());
    }
    if let Some(limit) = list.limit {
        params.insert("per_page".into(), limit.into());
    }
    params
}

/// Body fields from `--from-file` and repeated `--set key=value`.
///
/// Values that parse as JSON keep their type (`3`, `true`, `[1,2]`);
/// anything else is sent as a string. `--set` wins over the file.
pub fn field_params(fields: &FieldArgs) -> Result<Params, CliError> {
    let mut params = match fields.from_file {
        Some(ref path) => read_json_object(path)?,
        None => Params::new(),
    };
    for assignment in &fields.set {
        let (key, value) = parse_assignment(assignment)?;
        params.insert(key, value);
    }
    Ok(params)
}

fn parse_assignment(raw: &str) -> Result<(String, Value), CliError> {
    let (key, value) = raw.split_once('=').ok_or_else(|| CliError::Validation {
        field: "set".into(),
        reason: format!("expected KEY=VALUE, got '{raw}'"),
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::Validation {
            field: "set".into(),
            reason: format!("empty key in '{raw}'"),
        });
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((key.to_owned(), value))
}

fn read_json_object(path: &Path) -> Result<Params, CliError> {
    let contents = std::fs::read_to_string(path)?;
    match serde_json::from_str(&contents)? {
        Value::Object(map) => Ok(map),
        _ => Err(CliError::Validation {
            field: "from-file".into(),
            reason: "expected a JSON object".into(),
        }),
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// `2026-03-01 10:00` in local time, or empty.
pub fn format_date(value: Option<&chrono::DateTime<chrono::Utc>>) -> String {
    value
        .map(|dt| dt.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn assignments_keep_json_types() {
        let fields = FieldArgs {
            set: vec![
                "priority=3".into(),
                "done=true".into(),
                "title=Visit the shop".into(),
            ],
            from_file: None,
        };
        let params = field_params(&fields).unwrap();
        assert_eq!(params["priority"], json!(3));
        assert_eq!(params["done"], json!(true));
        assert_eq!(params["title"], json!("Visit the shop"));
    }

    #[test]
    fn set_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task.json");
        std::fs::write(&path, r#"{"title": "from file", "priority": 1}"#).unwrap();

        let fields = FieldArgs {
            set: vec!["priority=5".into()],
            from_file: Some(path),
        };
        let params = field_params(&fields).unwrap();
        assert_eq!(params["title"], json!("from file"));
        assert_eq!(params["priority"], json!(5));
    }

    #[test]
    fn malformed_assignment_is_rejected() {
        assert!(parse_assignment("no-equals").is_err());
        assert!(parse_assignment("=value").is_err());
    }

    #[test]
    fn list_params_use_backend_names() {
        let list = ListArgs {
            search: Some("tea".into()),
            page: Some(2),
            limit: None,
        };
        let params = list_params(&list);
        assert_eq!(params["s"], json!("tea"));
        assert_eq!(params["page"], json!(2));
        assert!(!params.contains_key("per_page"));
    }
}
