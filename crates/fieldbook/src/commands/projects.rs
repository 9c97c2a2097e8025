//! Project command handlers.

use std::sync::Arc;

use serde_json::Value;
use tabled::Tabled;

use fieldbook_core::{Project, Workspace};

use crate::cli::{GlobalOpts, ProjectsArgs, ProjectsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Parent")]
    parent: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "Fav")]
    favorite: String,
    #[tabled(rename = "Archived")]
    archived: String,
}

impl ProjectRow {
    fn new(p: &Project, color: bool) -> Self {
        Self {
            id: p.id.to_string(),
            title: p.title.clone(),
            parent: p
                .parent_project_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            color: p.hex_color.clone(),
            favorite: output::check(p.is_favorite, color),
            archived: output::check(p.is_archived, color),
        }
    }
}

fn detail(p: &Arc<Project>) -> String {
    output::detail_lines(&[
        ("ID", p.id.to_string()),
        ("Title", p.title.clone()),
        ("Description", p.description.clone()),
        ("Identifier", p.identifier.clone()),
        ("Color", p.hex_color.clone()),
        ("Owner", p.owner.display_name().to_owned()),
        ("Created", util::format_date(p.created.as_ref())),
        ("Updated", util::format_date(p.updated.as_ref())),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    workspace: &Workspace,
    args: ProjectsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let store = workspace.projects();
    let color = output::should_color(&global.color);

    match args.command {
        ProjectsCommand::List(list) => {
            let projects = store.fetch_all(&util::list_params(&list)).await?;
            let out = output::render_list(
                &global.output,
                &projects,
                |p| ProjectRow::new(p, color),
                |p| p.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProjectsCommand::Get { id } => {
            let project = store.get(&util::parse_id(&id)).await?;
            let out = output::render_single(&global.output, &project, detail, |p| p.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProjectsCommand::Create { title, fields } => {
            let mut data = util::field_params(&fields)?;
            data.insert("title".into(), Value::String(title));
            let project = store.create(&data).await?;
            if !global.quiet {
                eprintln!("✓ Project {} created", project.id);
            }
            Ok(())
        }

        ProjectsCommand::Update { id, fields } => {
            let data = util::field_params(&fields)?;
            let project = store.update(&util::parse_id(&id), &data).await?;
            let out = output::render_single(&global.output, &project, detail, |p| p.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProjectsCommand::Delete { id } => {
            if !util::confirm(
                &format!("Delete project {id} and all of its tasks?"),
                global.yes,
            )? {
                return Ok(());
            }
            store.delete(&util::parse_id(&id)).await?;
            if !global.quiet {
                eprintln!("✓ Project deleted");
            }
            Ok(())
        }
    }
}
