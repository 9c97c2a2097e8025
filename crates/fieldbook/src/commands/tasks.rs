//! Task command handlers.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tabled::Tabled;

use fieldbook_core::{Task, Workspace};

use crate::cli::{GlobalOpts, TasksArgs, TasksCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Done")]
    done: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Project")]
    project: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Prio")]
    priority: String,
    #[tabled(rename = "Labels")]
    labels: String,
}

impl TaskRow {
    fn new(t: &Task, color: bool) -> Self {
        let due = util::format_date(t.due_date.as_ref());
        Self {
            id: t.id.to_string(),
            done: output::check(t.done, color),
            title: t.title.clone(),
            project: t.project_id.to_string(),
            due: if t.is_overdue(Utc::now()) {
                output::warn_text(&due, color)
            } else {
                due
            },
            priority: if t.priority > 0 {
                t.priority.to_string()
            } else {
                String::new()
            },
            labels: t
                .labels
                .iter()
                .map(|l| l.title.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

fn detail(t: &Arc<Task>) -> String {
    output::detail_lines(&[
        ("ID", t.id.to_string()),
        ("Title", t.title.clone()),
        ("Description", t.description.clone()),
        ("Project", t.project_id.to_string()),
        ("Done", t.done.to_string()),
        ("Due", util::format_date(t.due_date.as_ref())),
        ("Start", util::format_date(t.start_date.as_ref())),
        ("End", util::format_date(t.end_date.as_ref())),
        ("Priority", t.priority.to_string()),
        (
            "Repeats",
            if t.is_repeating() {
                format!("every {}s ({})", t.repeat_after, t.repeat_mode)
            } else {
                String::new()
            },
        ),
        ("Created by", t.created_by.display_name().to_owned()),
        ("Created", util::format_date(t.created.as_ref())),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    workspace: &Workspace,
    args: TasksArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let store = workspace.tasks();
    let color = output::should_color(&global.color);

    match args.command {
        TasksCommand::List {
            project,
            open,
            list,
        } => {
            let mut params = util::list_params(&list);
            if open {
                params.insert("filter".into(), Value::String("done = false".into()));
            }
            let tasks = match project {
                Some(project) => store.fetch_scoped(&util::parse_id(&project), &params).await?,
                None => store.fetch_across_projects(&params).await?,
            };
            let out = output::render_list(
                &global.output,
                &tasks,
                |t| TaskRow::new(t, color),
                |t| t.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TasksCommand::Get { id } => {
            let task = store.get(&util::parse_id(&id)).await?;
            let out = output::render_single(&global.output, &task, detail, |t| t.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TasksCommand::Create {
            project,
            title,
            fields,
        } => {
            let mut data = util::field_params(&fields)?;
            data.insert("title".into(), Value::String(title));
            data.insert("project_id".into(), util::parse_id(&project).to_value());
            let task = store.create(&data).await?;
            if !global.quiet {
                eprintln!("✓ Task {} created", task.id);
            }
            Ok(())
        }

        TasksCommand::Update { id, fields } => {
            let data = util::field_params(&fields)?;
            let task = store.update(&util::parse_id(&id), &data).await?;
            let out = output::render_single(&global.output, &task, detail, |t| t.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TasksCommand::Toggle { id } => {
            let id = util::parse_id(&id);
            // Toggling works on the cached copy.
            store.get(&id).await?;
            if let Some(task) = store.toggle_done(&id).await? {
                if !global.quiet {
                    let state = if task.done { "done" } else { "open" };
                    eprintln!("✓ Task {id} is now {state}");
                }
            }
            Ok(())
        }

        TasksCommand::Delete { id } => {
            if !util::confirm(&format!("Delete task {id}?"), global.yes)? {
                return Ok(());
            }
            store.delete(&util::parse_id(&id)).await?;
            if !global.quiet {
                eprintln!("✓ Task deleted");
            }
            Ok(())
        }
    }
}
