// ── Authentication session ──
//
// Owns the logged-in state: who the user is and whether a credential is
// held. The credential itself lives in the client's `CredentialStore`;
// this type only decides when to save or clear it.

use std::sync::Arc;

use fieldbook_api::{ApiClient, AuthFailure};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{ApiInfo, User, hydrate};
use crate::service::LoadingTracker;

/// Sign-up form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password: SecretString,
    pub timezone: Option<String>,
    pub week_start: Option<i64>,
    pub language: Option<String>,
}

pub struct Session {
    client: Arc<ApiClient>,
    user: watch::Sender<Option<Arc<User>>>,
    logged_in: watch::Sender<bool>,
    loading: LoadingTracker,
}

impl Session {
    /// Starts logged in when the credential store already holds a token.
    pub fn new(client: Arc<ApiClient>) -> Self {
        let has_token = match client.credentials().load() {
            Ok(token) => token.is_some(),
            Err(e) => {
                warn!(error = %e, "cannot read stored credential");
                false
            }
        };
        let (user, _) = watch::channel(None);
        let (logged_in, _) = watch::channel(has_token);

        Self {
            client,
            user,
            logged_in,
            loading: LoadingTracker::new(),
        }
    }

    // ── State ────────────────────────────────────────────────────────

    pub fn user(&self) -> Option<Arc<User>> {
        self.user.borrow().clone()
    }

    pub fn subscribe_user(&self) -> watch::Receiver<Option<Arc<User>>> {
        self.user.subscribe()
    }

    pub fn is_logged_in(&self) -> bool {
        *self.logged_in.borrow()
    }

    pub fn subscribe_logged_in(&self) -> watch::Receiver<bool> {
        self.logged_in.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    /// Cancel any login, registration or token check in flight.
    pub fn cancel(&self) -> usize {
        self.loading.cancel_all()
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Exchange credentials for a token, store it, then confirm it.
    ///
    /// A token that fails confirmation is discarded again.
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
        long_token: bool,
    ) -> Result<Arc<User>, CoreError> {
        let body = json!({
            "username": username,
            "password": password.expose_secret(),
            "long_token": long_token,
        });
        let raw = self
            .loading
            .begin()
            .run(self.client.post("/login", &body))
            .await?;

        let token = raw
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CoreError::InvalidResponse {
                message: "login response carried no token".into(),
            })?;
        self.client
            .credentials()
            .save(&SecretString::from(token.to_owned()))?;
        self.logged_in.send_replace(true);

        match self.confirm_token().await {
            Ok(user) => {
                info!(username = %user.username, "logged in");
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "new token was not accepted");
                self.logout()?;
                Err(e)
            }
        }
    }

    /// Create an account, then log straight in with it.
    pub async fn register(&self, registration: &Registration) -> Result<User, CoreError> {
        let body = json!({
            "username": registration.username,
            "email": registration.email,
            "name": registration.name,
            "password": registration.password.expose_secret(),
            "timezone": registration.timezone,
            "week_start": registration.week_start.unwrap_or(0),
            "language": registration.language,
        });
        let raw = self
            .loading
            .begin()
            .run(self.client.post("/register", &body))
            .await?;
        let user: User = hydrate(&raw);
        debug!(username = %user.username, "registered");

        self.login(&registration.username, &registration.password, false)
            .await?;
        Ok(user)
    }

    /// Forget the credential and the user.
    pub fn logout(&self) -> Result<(), CoreError> {
        self.client.credentials().clear()?;
        self.reset();
        info!("logged out");
        Ok(())
    }

    /// Validate the stored token. No token means logged out; a rejected
    /// token logs out.
    pub async fn check_auth(&self) -> bool {
        match self.client.credentials().load() {
            Ok(Some(_)) => {}
            Ok(None) => {
                self.reset();
                return false;
            }
            Err(e) => {
                warn!(error = %e, "cannot read stored credential");
                self.reset();
                return false;
            }
        }

        match self.confirm_token().await {
            Ok(_) => {
                self.logged_in.send_replace(true);
                true
            }
            Err(e) => {
                debug!(error = %e, "stored token rejected");
                if let Err(e) = self.logout() {
                    warn!(error = %e, "failed to clear rejected credential");
                }
                false
            }
        }
    }

    /// Server version and enabled features.
    pub async fn info(&self) -> Result<ApiInfo, CoreError> {
        let raw = self
            .loading
            .begin()
            .run(self.client.get("/info", &[]))
            .await?;
        Ok(hydrate(&raw))
    }

    /// React to the client rejecting the credential mid-session. The
    /// client has already cleared the stored token.
    pub fn apply_auth_failure(&self, failure: &AuthFailure) {
        warn!(method = %failure.method, path = %failure.path, "session expired");
        self.reset();
    }

    // ── Internals ────────────────────────────────────────────────────

    /// `GET /token/test`; the body names the user the token belongs to.
    async fn confirm_token(&self) -> Result<Arc<User>, CoreError> {
        let raw = self
            .loading
            .begin()
            .run(self.client.get("/token/test", &[]))
            .await?;
        let username = raw.get("user").and_then(Value::as_str).unwrap_or_default();

        let current = self.user();
        let user = match current {
            Some(user) if user.username == username => user,
            _ => Arc::new(User::from_username(username)),
        };
        self.user.send_replace(Some(Arc::clone(&user)));
        Ok(user)
    }

    fn reset(&self) {
        self.user.send_replace(None);
        self.logged_in.send_replace(false);
    }
}
