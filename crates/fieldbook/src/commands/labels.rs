//! Label and team command handlers.

use serde_json::Value;
use tabled::Tabled;

use fieldbook_core::{Label, Team, Workspace};

use crate::cli::{GlobalOpts, LabelsArgs, LabelsCommand, TeamsArgs, TeamsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct LabelRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "Created by")]
    created_by: String,
}

impl From<&Label> for LabelRow {
    fn from(l: &Label) -> Self {
        Self {
            id: l.id.to_string(),
            title: l.title.clone(),
            color: l.hex_color.clone(),
            created_by: l.created_by.display_name().to_owned(),
        }
    }
}

#[derive(Tabled)]
struct TeamRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&Team> for TeamRow {
    fn from(t: &Team) -> Self {
        Self {
            id: t.id.to_string(),
            name: t.name.clone(),
            description: t.description.clone(),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle_labels(
    workspace: &Workspace,
    args: LabelsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let store = workspace.labels();

    match args.command {
        LabelsCommand::List(list) => {
            let labels = store.fetch_all(&util::list_params(&list)).await?;
            let out = output::render_list(
                &global.output,
                &labels,
                |l| LabelRow::from(&**l),
                |l| l.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LabelsCommand::Create { title, color } => {
            let mut data = fieldbook_core::Params::new();
            data.insert("title".into(), Value::String(title));
            if let Some(color) = color {
                // The backend stores colors without the leading '#'.
                data.insert(
                    "hex_color".into(),
                    Value::String(color.trim_start_matches('#').to_owned()),
                );
            }
            let label = store.create(&data).await?;
            if !global.quiet {
                eprintln!("✓ Label {} created", label.id);
            }
            Ok(())
        }

        LabelsCommand::Delete { id } => {
            if !util::confirm(&format!("Delete label {id}?"), global.yes)? {
                return Ok(());
            }
            store.delete(&util::parse_id(&id)).await?;
            if !global.quiet {
                eprintln!("✓ Label deleted");
            }
            Ok(())
        }
    }
}

pub async fn handle_teams(
    workspace: &Workspace,
    args: TeamsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let store = workspace.teams();

    match args.command {
        TeamsCommand::List(list) => {
            let teams = store.fetch_all(&util::list_params(&list)).await?;
            let out = output::render_list(
                &global.output,
                &teams,
                |t| TeamRow::from(&**t),
                |t| t.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TeamsCommand::Create { name, description } => {
            let mut data = fieldbook_core::Params::new();
            data.insert("name".into(), Value::String(name));
            if let Some(description) = description {
                data.insert("description".into(), Value::String(description));
            }
            let team = store.create(&data).await?;
            if !global.quiet {
                eprintln!("✓ Team {} created", team.id);
            }
            Ok(())
        }

        TeamsCommand::Delete { id } => {
            if !util::confirm(&format!("Delete team {id}?"), global.yes)? {
                return Ok(());
            }
            store.delete(&util::parse_id(&id)).await?;
            if !global.quiet {
                eprintln!("✓ Team deleted");
            }
            Ok(())
        }
    }
}
