//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use fieldbook_config::ConfigError;
use fieldbook_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(fieldbook::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(fieldbook::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not logged in")]
    #[diagnostic(
        code(fieldbook::not_logged_in),
        help("Run: fieldbook login --profile {profile}")
    )]
    NotLoggedIn { profile: String },

    #[error("Session expired or token rejected")]
    #[diagnostic(
        code(fieldbook::auth_failed),
        help("The stored token was cleared. Run: fieldbook login --profile {profile}")
    )]
    AuthFailed { profile: String },

    #[error("Token storage error: {0}")]
    #[diagnostic(
        code(fieldbook::credential),
        help("Set token_storage = \"file\" on the profile if no system keyring is available.")
    )]
    Credential(String),

    // ── API ──────────────────────────────────────────────────────────
    #[error("Server rejected the request (HTTP {status}): {message}")]
    #[diagnostic(code(fieldbook::api_error))]
    Api { status: u16, message: String },

    #[error("Unexpected server response: {message}")]
    #[diagnostic(code(fieldbook::invalid_response))]
    InvalidResponse { message: String },

    #[error("{0}")]
    #[diagnostic(code(fieldbook::unsupported))]
    Unsupported(String),

    #[error("Interrupted")]
    #[diagnostic(code(fieldbook::interrupted))]
    Interrupted,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(fieldbook::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(fieldbook::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: fieldbook config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No server configured")]
    #[diagnostic(
        code(fieldbook::no_config),
        help(
            "Create a profile with: fieldbook config init\n\
             or pass --server. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(fieldbook::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(fieldbook::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(fieldbook::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(fieldbook::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::NotLoggedIn { .. } | Self::AuthFailed { .. } | Self::Credential(_) => {
                exit_code::AUTH
            }
            Self::Api { status: 404, .. } => exit_code::NOT_FOUND,
            Self::Api { status: 403, .. } | Self::Unsupported(_) => exit_code::PERMISSION,
            Self::Api { status: 409, .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::Interrupted => exit_code::INTERRUPTED,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError ──────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

// ── CoreError → CliError ────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MissingTemplateParameter { parameter, .. } => Self::Validation {
                field: parameter,
                reason: "required but not provided".into(),
            },
            CoreError::MalformedTemplate { .. } | CoreError::UnknownOperation { .. } => {
                Self::Internal(err.to_string())
            }
            CoreError::Unsupported { .. } => Self::Unsupported(err.to_string()),
            CoreError::Api {
                status,
                ref message,
                ..
            } => Self::Api {
                status,
                message: message.clone().unwrap_or_else(|| err.to_string()),
            },
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Timeout => Self::Timeout,
            CoreError::InvalidResponse { message } => Self::InvalidResponse { message },
            CoreError::Unauthorized => Self::AuthFailed {
                profile: "current".into(),
            },
            CoreError::Credential(message) => Self::Credential(message),
            CoreError::Cancelled => Self::Interrupted,
            CoreError::Io(e) => Self::Io(e),
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_drives_exit_code() {
        let not_found = CliError::from(CoreError::Api {
            status: 404,
            message: Some("Task not found".into()),
            body: String::new(),
        });
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);
        assert!(not_found.to_string().contains("Task not found"));

        let forbidden = CliError::from(CoreError::Api {
            status: 403,
            message: None,
            body: String::new(),
        });
        assert_eq!(forbidden.exit_code(), exit_code::PERMISSION);
    }

    #[test]
    fn parameter_errors_are_usage_errors() {
        let err = CliError::from(CoreError::MissingTemplateParameter {
            template: "/projects/{project_id}/tasks".into(),
            parameter: "project_id".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
        assert_eq!(
            CliError::from(CoreError::Unauthorized).exit_code(),
            exit_code::AUTH
        );
    }
}
