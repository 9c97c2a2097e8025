//! Session command handlers: login, logout, whoami, info.

use dialoguer::Input;
use secrecy::SecretString;

use fieldbook_core::{ApiInfo, User, Workspace};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn user_detail(user: &User) -> String {
    output::detail_lines(&[
        ("Username", user.username.clone()),
        ("Name", user.name.clone()),
        ("Email", user.email.clone()),
        ("ID", if user.id.is_unassigned() { String::new() } else { user.id.to_string() }),
    ])
}

fn info_detail(info: &ApiInfo) -> String {
    output::detail_lines(&[
        ("Version", info.version.clone()),
        ("Local auth", info.local_auth_enabled.to_string()),
        ("Registration", info.registration_enabled.to_string()),
        ("Public teams", info.public_teams_enabled.to_string()),
        ("Backgrounds", info.enabled_background_providers.join(", ")),
    ])
}

pub async fn login(
    workspace: &Workspace,
    profile: &str,
    args: LoginArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let remembered = config::load_config_or_default()
        .profiles
        .get(profile)
        .and_then(|p| p.username.clone());

    let username = match args.username.or(remembered) {
        Some(name) => name,
        None => Input::new()
            .with_prompt("Username")
            .interact_text()
            .map_err(prompt_err)?,
    };
    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    if username.is_empty() || password.is_empty() {
        return Err(CliError::Validation {
            field: "credentials".into(),
            reason: "username and password cannot be empty".into(),
        });
    }

    let user = workspace
        .session()
        .login(&username, &SecretString::from(password), args.long_token)
        .await?;

    if !global.quiet {
        eprintln!("✓ Logged in as {} (profile '{profile}')", user.display_name());
    }
    Ok(())
}

pub fn logout(workspace: &Workspace, global: &GlobalOpts) -> Result<(), CliError> {
    workspace.session().logout()?;
    if !global.quiet {
        eprintln!("✓ Logged out");
    }
    Ok(())
}

pub async fn whoami(
    workspace: &Workspace,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if !workspace.session().check_auth().await {
        return Err(CliError::NotLoggedIn {
            profile: profile.into(),
        });
    }
    let Some(user) = workspace.session().user() else {
        return Err(CliError::NotLoggedIn {
            profile: profile.into(),
        });
    };
    let out = output::render_single(&global.output, &*user, user_detail, |u| {
        u.username.clone()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn info(workspace: &Workspace, global: &GlobalOpts) -> Result<(), CliError> {
    let info = workspace.session().info().await?;
    let out = output::render_single(&global.output, &info, info_detail, |i| i.version.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
