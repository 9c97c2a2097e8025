use thiserror::Error;

/// Top-level error type for the `fieldbook-api` crate.
///
/// Three families: parameter errors raised before any request is built,
/// authorization failures detected by the response interceptor, and
/// transport/HTTP failures carrying whatever the server said.
/// `fieldbook-core` maps these into its own `CoreError`.
#[derive(Debug, Error)]
pub enum Error {
    // ── Parameters (pre-flight) ─────────────────────────────────────
    /// A `{placeholder}` in a URL template had no matching call parameter.
    #[error("Missing parameter '{parameter}' for URL template '{template}'")]
    MissingTemplateParameter { template: String, parameter: String },

    /// A `{` in a URL template was never closed.
    #[error("Malformed URL template '{template}'")]
    MalformedTemplate { template: String },

    /// No template is registered for the requested operation.
    #[error("No endpoint configured for operation '{operation}'")]
    UnknownOperation { operation: String },

    // ── Authentication ──────────────────────────────────────────────
    /// The backend rejected the attached bearer credential (HTTP 401).
    /// The credential has already been cleared when this is returned.
    #[error("Unauthorized -- stored credential was rejected")]
    Unauthorized,

    /// Reading or writing the credential store failed.
    #[error("Credential store error: {0}")]
    Credential(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── HTTP ────────────────────────────────────────────────────────
    /// Non-success status. `message` is the server-provided detail when
    /// the body carried one (`detail` or `message` field).
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("request failed"))]
    Http {
        status: u16,
        message: Option<String>,
        body: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// A success response whose body was not valid JSON.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` for errors raised before any network I/O.
    pub fn is_parameter_error(&self) -> bool {
        matches!(
            self,
            Self::MissingTemplateParameter { .. }
                | Self::MalformedTemplate { .. }
                | Self::UnknownOperation { .. }
        )
    }

    /// HTTP status code, if this error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Unauthorized => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// The server-provided detail message, if the response carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_display_prefers_server_message() {
        let err = Error::Http {
            status: 422,
            message: Some("title is required".into()),
            body: String::new(),
        };
        assert_eq!(err.to_string(), "HTTP 422: title is required");
        assert_eq!(err.detail(), Some("title is required"));
    }

    #[test]
    fn http_error_display_without_message() {
        let err = Error::Http {
            status: 500,
            message: None,
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "HTTP 500: request failed");
        assert!(err.detail().is_none());
    }

    #[test]
    fn parameter_errors_are_classified() {
        let err = Error::MissingTemplateParameter {
            template: "/tasks/{id}".into(),
            parameter: "id".into(),
        };
        assert!(err.is_parameter_error());
        assert!(!Error::Unauthorized.is_parameter_error());
        assert_eq!(Error::Unauthorized.status(), Some(401));
    }
}
