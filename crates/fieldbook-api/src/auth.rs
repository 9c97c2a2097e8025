use std::sync::RwLock;

use secrecy::SecretString;

use crate::error::Error;

/// Persistent home of the bearer credential.
///
/// The API client reads it before every request and clears it when the
/// backend answers 401. Implementations decide where the token lives
/// (memory, OS keyring, a file); see `fieldbook-config` for the
/// persistent ones.
pub trait CredentialStore: Send + Sync {
    /// Current token, or `None` when logged out.
    fn load(&self) -> Result<Option<SecretString>, Error>;

    /// Replace the stored token.
    fn save(&self, token: &SecretString) -> Result<(), Error>;

    /// Forget the stored token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), Error>;
}

/// In-process credential store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<SecretString>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(SecretString::from(token.into()))),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<SecretString>, Error> {
        let guard = self
            .token
            .read()
            .map_err(|_| Error::Credential("credential lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn save(&self, token: &SecretString) -> Result<(), Error> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| Error::Credential("credential lock poisoned".into()))?;
        *guard = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| Error::Credential("credential lock poisoned".into()))?;
        *guard = None;
        Ok(())
    }
}

/// Signal raised when the backend rejects the attached credential.
///
/// Broadcast by the client's response interceptor after the credential
/// has been cleared. The application shell subscribes and routes the
/// user back to an unauthenticated entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    /// HTTP method of the rejected request.
    pub method: String,
    /// Path (relative to the API prefix) of the rejected request.
    pub path: String,
}
