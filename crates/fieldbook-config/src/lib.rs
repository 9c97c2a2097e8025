//! Shared configuration for fieldbook tools.
//!
//! TOML profiles layered under `FIELDBOOK_*` environment variables,
//! persistent token storage (OS keyring or a plaintext file), and
//! translation to the runtime `ClientConfig` the API client is built
//! from. The core crate never reads any of this directly.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use fieldbook_api::{
    ApiClient, CredentialStore, DEFAULT_API_PREFIX, TlsMode, TransportConfig,
    Error as ApiError,
};

/// Keyring service name all profiles share.
pub const KEYRING_SERVICE: &str = "fieldbook";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `name` is `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        let name = name
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into());
        self.profiles
            .get(&name)
            .map(|profile| (name.clone(), profile))
            .ok_or(ConfigError::UnknownProfile { name })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// Where a profile keeps its session token.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    /// OS keyring entry `fieldbook` / `<profile>/token`.
    #[default]
    Keyring,
    /// Plaintext file under the platform data directory.
    File,
}

/// A named backend profile.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Profile {
    /// Server root (e.g. "https://fieldbook.example.com").
    pub server: String,

    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Username remembered for `login` prompts.
    pub username: Option<String>,

    #[serde(default)]
    pub token_storage: TokenStorage,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Override the default timeout (seconds).
    pub timeout: Option<u64>,
}

fn default_api_prefix() -> String {
    DEFAULT_API_PREFIX.into()
}

impl Profile {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            api_prefix: default_api_prefix(),
            username: None,
            token_storage: TokenStorage::default(),
            ca_cert: None,
            insecure: false,
            timeout: None,
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("app", "fieldbook", "fieldbook")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("fieldbook");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory for file-backed tokens.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(dirs_fallback, |dirs| dirs.data_dir().to_path_buf())
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path` (if present), then
/// `FIELDBOOK_*` variables (`__` separates nested keys).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FIELDBOOK_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, falling back to defaults on any error.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Write `cfg` as TOML to the canonical path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token storage ───────────────────────────────────────────────────

/// Token held in the OS keyring.
#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    account: String,
}

impl KeyringCredentialStore {
    pub fn new(profile_name: &str) -> Self {
        Self {
            account: format!("{profile_name}/token"),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, ApiError> {
        keyring::Entry::new(KEYRING_SERVICE, &self.account)
            .map_err(|e| ApiError::Credential(e.to_string()))
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn load(&self) -> Result<Option<SecretString>, ApiError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(SecretString::from(token))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(ApiError::Credential(e.to_string())),
        }
    }

    fn save(&self, token: &SecretString) -> Result<(), ApiError> {
        self.entry()?
            .set_password(token.expose_secret())
            .map_err(|e| ApiError::Credential(e.to_string()))
    }

    fn clear(&self) -> Result<(), ApiError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ApiError::Credential(e.to_string())),
        }
    }
}

/// Token held in a plaintext file. For hosts without a keyring.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// `<data_dir>/tokens/<profile>`.
    pub fn new(profile_name: &str) -> Self {
        Self::at(data_dir().join("tokens").join(profile_name))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<SecretString>, ApiError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                Ok((!token.is_empty()).then(|| SecretString::from(token.to_owned())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ApiError::Credential(format!(
                "cannot read {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn save(&self, token: &SecretString) -> Result<(), ApiError> {
        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&self.path, token.expose_secret())
        };
        write().map_err(|e| {
            ApiError::Credential(format!("cannot write {}: {e}", self.path.display()))
        })
    }

    fn clear(&self) -> Result<(), ApiError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::Credential(format!(
                "cannot remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}

/// The token store a profile is configured to use.
pub fn credential_store(profile: &Profile, profile_name: &str) -> Arc<dyn CredentialStore> {
    match profile.token_storage {
        TokenStorage::Keyring => Arc::new(KeyringCredentialStore::new(profile_name)),
        TokenStorage::File => Arc::new(FileCredentialStore::new(profile_name)),
    }
}

// ── Runtime client config ───────────────────────────────────────────

/// Everything needed to build an `ApiClient`, minus the token store.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server: url::Url,
    pub api_prefix: String,
    pub transport: TransportConfig,
}

impl ClientConfig {
    pub fn build(&self, credentials: Arc<dyn CredentialStore>) -> Result<ApiClient, ApiError> {
        ApiClient::new(
            self.server.as_str(),
            &self.api_prefix,
            &self.transport,
            credentials,
        )
    }
}

/// Validate a profile and turn it into a `ClientConfig`.
pub fn profile_to_client_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let server: url::Url = profile
        .server
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "server".into(),
            reason: format!("invalid URL: {}", profile.server),
        })?;
    if !matches!(server.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "server".into(),
            reason: format!("unsupported scheme '{}'", server.scheme()),
        });
    }

    let tls = if profile.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };
    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(ClientConfig {
        server,
        api_prefix: profile.api_prefix.clone(),
        transport: TransportConfig::default()
            .with_tls(tls)
            .with_timeout(timeout),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn loads_profiles_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "work"

[defaults]
output = "json"

[profiles.work]
server = "https://fieldbook.example.com"
username = "ana"
token_storage = "file"
timeout = 5
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.defaults.output, "json");
        assert_eq!(config.defaults.timeout, 30);

        let (name, profile) = config.profile(None).unwrap();
        assert_eq!(name, "work");
        assert_eq!(profile.api_prefix, "/api/v1");
        assert_eq!(profile.token_storage, TokenStorage::File);
        assert_eq!(profile.username.as_deref(), Some("ana"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(matches!(
            config.profile(Some("nope")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config
            .profiles
            .insert("default".into(), Profile::new("http://localhost:3456"));
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles["default"].server, "http://localhost:3456");
    }

    #[test]
    fn client_config_from_profile() {
        let mut profile = Profile::new("https://fieldbook.example.com");
        profile.timeout = Some(7);
        profile.insecure = true;

        let cfg = profile_to_client_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(cfg.transport.timeout, Duration::from_secs(7));
        assert_eq!(cfg.transport.tls, TlsMode::DangerAcceptInvalid);
        assert_eq!(cfg.api_prefix, "/api/v1");
    }

    #[test]
    fn rejects_bad_server() {
        let defaults = Defaults::default();
        assert!(profile_to_client_config(&Profile::new("not a url"), &defaults).is_err());
        assert!(profile_to_client_config(&Profile::new("ftp://host"), &defaults).is_err());
    }

    #[test]
    fn file_store_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::at(dir.path().join("tokens").join("default"));

        assert!(store.load().unwrap().is_none());
        store.save(&SecretString::from("jwt".to_owned())).unwrap();
        assert_eq!(store.load().unwrap().unwrap().expose_secret(), "jwt");

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }
}
