// REST client
//
// Wraps `reqwest::Client` with base-URL + API-prefix handling and the two
// interceptors every call goes through: the outbound one attaches the
// bearer credential, the inbound one turns a 401 on an authenticated
// request into a cleared credential plus an `AuthFailure` broadcast.
// Bodies come back as raw `serde_json::Value`; typing them is the
// caller's job.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{AuthFailure, CredentialStore};
use crate::error::Error;
use crate::transport::TransportConfig;
use crate::upload::{ProgressFn, UploadFile};

const AUTH_FAILURE_CHANNEL_SIZE: usize = 16;

/// Default API path prefix on the backend.
pub const DEFAULT_API_PREFIX: &str = "/api/v1";

/// Async JSON client for the backend REST API.
///
/// Cheap to share behind an `Arc`; holds no per-call state.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn CredentialStore>,
    auth_failures: broadcast::Sender<AuthFailure>,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a server root, API prefix, and transport config.
    ///
    /// `https://host` + `/api/v1` → requests go to `https://host/api/v1/…`.
    pub fn new(
        base_url: &str,
        api_prefix: &str,
        transport: &TransportConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = Self::normalize_base_url(base_url, api_prefix)?;
        Ok(Self::with_client(http, base_url, credentials))
    }

    /// Wrap an existing `reqwest::Client`. `base_url` must already carry
    /// the API prefix (see [`normalize_base_url`](Self::normalize_base_url)).
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let (auth_failures, _) = broadcast::channel(AUTH_FAILURE_CHANNEL_SIZE);
        Self {
            http,
            base_url,
            credentials,
            auth_failures,
        }
    }

    /// Append the API prefix (once) and a trailing slash so relative
    /// joins land under it.
    pub fn normalize_base_url(raw: &str, api_prefix: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        let prefix = api_prefix.trim_matches('/');

        if prefix.is_empty() || path.ends_with(&format!("/{prefix}")) {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/{prefix}/"));
        }

        Ok(url)
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Subscribe to credential rejections.
    pub fn subscribe_auth_failures(&self) -> broadcast::Receiver<AuthFailure> {
        self.auth_failures.subscribe()
    }

    /// Resolve a path (leading slash optional) against the API base.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, Error> {
        self.send_json(Method::GET, path, query, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, Error> {
        self.send_json(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, Error> {
        self.send_json(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, Error> {
        self.send_json(Method::DELETE, path, &[], None).await
    }

    /// Send a request with an optional JSON body.
    ///
    /// Returns the parsed response body, or `Value::Null` for an empty one.
    pub async fn send_json(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, Error> {
        let url = self.url(path)?;
        debug!("{method} {url}");

        let mut builder = self.http.request(method.clone(), url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        self.execute(&method, path, builder).await
    }

    /// POST a multipart form: `file` plus text `fields`.
    ///
    /// `progress` is called with `(sent, total)` as the body streams out.
    pub async fn upload(
        &self,
        path: &str,
        fields: &[(String, String)],
        file: UploadFile,
        progress: Option<ProgressFn>,
    ) -> Result<Value, Error> {
        let url = self.url(path)?;
        debug!(file = %file.file_name, bytes = file.len(), "POST {url} (multipart)");

        let form = file.into_form(fields, progress)?;
        let builder = self.http.post(url).multipart(form);

        self.execute(&Method::POST, path, builder).await
    }

    // ── Interceptors ─────────────────────────────────────────────────

    async fn execute(
        &self,
        method: &Method,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<Value, Error> {
        let (builder, authenticated) = self.authorize(builder)?;
        let resp = builder.send().await?;
        self.handle_response(method, path, authenticated, resp).await
    }

    /// Attach the stored bearer token, if any.
    fn authorize(&self, builder: RequestBuilder) -> Result<(RequestBuilder, bool), Error> {
        match self.credentials.load()? {
            Some(token) => Ok((builder.bearer_auth(token.expose_secret()), true)),
            None => Ok((builder, false)),
        }
    }

    async fn handle_response(
        &self,
        method: &Method,
        path: &str,
        authenticated: bool,
        resp: reqwest::Response,
    ) -> Result<Value, Error> {
        let status = resp.status();

        // A 401 without a credential (e.g. a bad login) is an ordinary
        // HTTP error; only a rejected token forces a logout.
        if status == StatusCode::UNAUTHORIZED && authenticated {
            self.reject_credential(method, path);
            return Err(Error::Unauthorized);
        }

        if !status.is_success() {
            return Err(parse_error(status, resp).await);
        }

        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            let preview = body
                .char_indices()
                .nth(200)
                .map_or(body.as_str(), |(end, _)| &body[..end]);
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    fn reject_credential(&self, method: &Method, path: &str) {
        if let Err(e) = self.credentials.clear() {
            warn!(error = %e, "failed to clear rejected credential");
        }
        warn!(%method, path, "credential rejected by backend");

        // No subscribers is fine -- nobody is listening for logouts.
        let _ = self.auth_failures.send(AuthFailure {
            method: method.to_string(),
            path: path.to_owned(),
        });
    }
}

// ── Error body parsing ──────────────────────────────────────────────

async fn parse_error(status: StatusCode, resp: reqwest::Response) -> Error {
    let body = resp.text().await.unwrap_or_default();
    Error::Http {
        status: status.as_u16(),
        message: extract_detail(&body),
        body,
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"detail": "..."}`, FastAPI validation lists
/// (`{"detail": [{"msg": "..."}]}`) and `{"message": "..."}`.
fn extract_detail(raw: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw).ok()?;

    match value.get("detail") {
        Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
        Some(Value::Array(items)) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if !msgs.is_empty() {
                return Some(msgs.join("; "));
            }
        }
        _ => {}
    }

    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
