//! CLI configuration: thin wrapper around `fieldbook_config`.
//!
//! Adds resolution that respects `GlobalOpts` overrides (--server,
//! --insecure, --timeout) on top of the shared profile types.

use std::sync::Arc;

use fieldbook_config::{ClientConfig, TokenStorage, credential_store};
use fieldbook_core::{ApiClient, Workspace};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use fieldbook_config::{
    Config, Profile, config_path, load_config, load_config_or_default, save_config,
};

/// Profile name from `--profile`, the config default, or `"default"`.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// The active profile with flag overrides applied.
///
/// With no stored profile, `--server` alone is enough.
pub fn resolve_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, config);
    let mut profile = match (config.profiles.get(&name), &global.server) {
        (Some(profile), _) => profile.clone(),
        (None, Some(server)) => Profile {
            token_storage: TokenStorage::File,
            ..Profile::new(server.clone())
        },
        (None, None) if global.profile.is_some() => {
            let mut available: Vec<_> = config.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    if let Some(ref server) = global.server {
        profile.server.clone_from(server);
    }
    if global.insecure {
        profile.insecure = true;
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    Ok((name, profile))
}

/// Build the shared workspace for the active profile.
pub fn build_workspace(global: &GlobalOpts) -> Result<(String, Workspace), CliError> {
    let cfg = load_config()?;
    let (name, profile) = resolve_profile(global, &cfg)?;

    let client_config: ClientConfig =
        fieldbook_config::profile_to_client_config(&profile, &cfg.defaults)?;
    let credentials = credential_store(&profile, &name);
    let client: ApiClient = client_config
        .build(credentials)
        .map_err(|e| CliError::from(fieldbook_core::CoreError::from(e)))?;

    tracing::debug!(
        profile = %name,
        server = %client.base_url(),
        timeout = ?client_config.transport.timeout,
        "client ready"
    );
    Ok((name, Workspace::from_shared(Arc::new(client))))
}
