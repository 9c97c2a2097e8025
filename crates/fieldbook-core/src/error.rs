// ── Core error types ──
//
// What stores and services hand back to their callers. Three families:
// parameter errors raised before any I/O, transport errors carrying the
// server's status and detail, and the authorization failure the client
// interceptor has already acted on. The `From<fieldbook_api::Error>`
// impl performs the mapping.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Parameter errors ─────────────────────────────────────────────
    #[error("Missing parameter '{parameter}' for URL template '{template}'")]
    MissingTemplateParameter { template: String, parameter: String },

    #[error("Malformed URL template '{template}'")]
    MalformedTemplate { template: String },

    #[error("No endpoint configured for operation '{operation}'")]
    UnknownOperation { operation: String },

    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },

    // ── Transport errors ─────────────────────────────────────────────
    #[error("API error (HTTP {status}): {}", message.as_deref().unwrap_or("request failed"))]
    Api {
        status: u16,
        /// Server-provided detail, when the body carried one.
        message: Option<String>,
        body: String,
    },

    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Unexpected response: {message}")]
    InvalidResponse { message: String },

    // ── Authorization ────────────────────────────────────────────────
    #[error("Not authorized -- please log in again")]
    Unauthorized,

    #[error("Credential store error: {0}")]
    Credential(String),

    // ── Control flow ─────────────────────────────────────────────────
    #[error("Request cancelled")]
    Cancelled,

    // ── Local errors ─────────────────────────────────────────────────
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` for errors raised before any request was issued.
    pub fn is_parameter_error(&self) -> bool {
        matches!(
            self,
            Self::MissingTemplateParameter { .. }
                | Self::MalformedTemplate { .. }
                | Self::UnknownOperation { .. }
                | Self::Unsupported { .. }
        )
    }

    /// HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Unauthorized => Some(401),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// The server's own explanation of the failure, if it sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Display-ready message for a store's `error` field: the server
    /// detail when present, otherwise `fallback`.
    pub fn display_message(&self, fallback: impl FnOnce() -> String) -> String {
        self.detail().map_or_else(fallback, str::to_owned)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fieldbook_api::Error> for CoreError {
    fn from(err: fieldbook_api::Error) -> Self {
        use fieldbook_api::Error as Api;

        match err {
            Api::MissingTemplateParameter {
                template,
                parameter,
            } => Self::MissingTemplateParameter {
                template,
                parameter,
            },
            Api::MalformedTemplate { template } => Self::MalformedTemplate { template },
            Api::UnknownOperation { operation } => Self::UnknownOperation { operation },
            Api::Unauthorized => Self::Unauthorized,
            Api::Credential(msg) => Self::Credential(msg),
            Api::Transport(ref e) => {
                if e.is_timeout() {
                    Self::Timeout
                } else if e.is_connect() {
                    Self::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else if let Some(status) = e.status() {
                    Self::Api {
                        status: status.as_u16(),
                        message: None,
                        body: String::new(),
                    }
                } else {
                    Self::ConnectionFailed {
                        url: e.url().map(ToString::to_string).unwrap_or_default(),
                        reason: e.to_string(),
                    }
                }
            }
            Api::InvalidUrl(e) => Self::Internal(format!("Invalid URL: {e}")),
            Api::Tls(msg) => Self::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            Api::Http {
                status,
                message,
                body,
            } => Self::Api {
                status,
                message,
                body,
            },
            Api::Deserialization { message, body: _ } => Self::InvalidResponse { message },
        }
    }
}
