//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Select};

use fieldbook_config::TokenStorage;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Render config as TOML-like text. Profiles hold no secrets.
fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "server = \"{}\"", p.server);
        let _ = writeln!(out, "api_prefix = \"{}\"", p.api_prefix);
        if let Some(ref u) = p.username {
            let _ = writeln!(out, "username = \"{u}\"");
        }
        let storage = match p.token_storage {
            TokenStorage::Keyring => "keyring",
            TokenStorage::File => "file",
        };
        let _ = writeln!(out, "token_storage = \"{storage}\"");
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if p.insecure {
            let _ = writeln!(out, "insecure = true");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_flag<T: std::str::FromStr>(field: &str, value: &str, hint: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: hint.into(),
    })
}

/// Apply `key = value` to a profile.
fn set_profile_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "server" => profile.server = value,
        "api_prefix" | "api-prefix" => profile.api_prefix = value,
        "username" => profile.username = Some(value),
        "token_storage" | "token-storage" => {
            profile.token_storage = match value.as_str() {
                "keyring" => TokenStorage::Keyring,
                "file" => TokenStorage::File,
                _ => {
                    return Err(CliError::Validation {
                        field: "token_storage".into(),
                        reason: "must be 'keyring' or 'file'".into(),
                    });
                }
            };
        }
        "insecure" => {
            profile.insecure = parse_flag("insecure", &value, "must be 'true' or 'false'")?;
        }
        "timeout" => {
            profile.timeout = Some(parse_flag("timeout", &value, "must be a number (seconds)")?);
        }
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: server, api_prefix, \
                     username, token_storage, insecure, timeout, ca_cert"
                ),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("fieldbook configuration");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let server: String = Input::new()
                .with_prompt("Server URL")
                .default("http://localhost:3456".into())
                .interact_text()
                .map_err(prompt_err)?;

            let username: String = Input::new()
                .with_prompt("Username (optional)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            let storage = Select::new()
                .with_prompt("Where should the session token be kept?")
                .items(&["System keyring (recommended)", "Plaintext file"])
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let profile = Profile {
                username: (!username.is_empty()).then_some(username),
                token_storage: if storage == 0 {
                    TokenStorage::Keyring
                } else {
                    TokenStorage::File
                },
                ..Profile::new(server)
            };
            // Reject a bad URL before it is written.
            fieldbook_config::profile_to_client_config(&profile, &Default::default())?;

            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Next: fieldbook login");
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg
                .profiles
                .entry(profile_name.clone())
                .or_insert_with(|| Profile::new(String::new()));
            set_profile_key(profile, &key, value)?;

            config::save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: fieldbook config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();

            if !cfg.profiles.contains_key(&name) {
                let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
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

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_keys_on_profile() {
        let mut profile = Profile::new("http://localhost:3456");
        set_profile_key(&mut profile, "timeout", "12".into()).unwrap();
        set_profile_key(&mut profile, "token-storage", "file".into()).unwrap();
        set_profile_key(&mut profile, "insecure", "true".into()).unwrap();

        assert_eq!(profile.timeout, Some(12));
        assert_eq!(profile.token_storage, TokenStorage::File);
        assert!(profile.insecure);

        assert!(set_profile_key(&mut profile, "timeout", "soon".into()).is_err());
        assert!(set_profile_key(&mut profile, "password", "x".into()).is_err());
    }

    #[test]
    fn formatted_config_lists_profiles_sorted() {
        let mut cfg = Config::default();
        cfg.profiles.insert("work".into(), Profile::new("https://b.example"));
        cfg.profiles.insert("home".into(), Profile::new("https://a.example"));

        let text = format_config(&cfg);
        let home = text.find("[profiles.home]").unwrap();
        let work = text.find("[profiles.work]").unwrap();
        assert!(home < work);
        assert!(text.contains("token_storage = \"keyring\""));
    }
}
