//! Merchant tag command handlers.

use serde_json::Value;
use tabled::Tabled;

use fieldbook_core::{MerchantTag, Params, Workspace};

use crate::cli::{GlobalOpts, TagsArgs, TagsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct TagRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Alias")]
    alias: String,
    #[tabled(rename = "Color")]
    color: String,
}

impl From<&MerchantTag> for TagRow {
    fn from(t: &MerchantTag) -> Self {
        Self {
            id: t.id.to_string(),
            name: t.tag_name.clone(),
            class: t.class.clone(),
            alias: t.alias.clone(),
            color: t.hex_color.clone(),
        }
    }
}

pub async fn handle(
    workspace: &Workspace,
    args: TagsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let store = workspace.merchant_tags();

    match args.command {
        TagsCommand::List(list) => {
            let tags = store.fetch_all(&util::list_params(&list)).await?;
            let out = output::render_list(
                &global.output,
                &tags,
                |t| TagRow::from(&**t),
                |t| t.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TagsCommand::Classes => {
            let classes = store.distinct_classes().await?;
            let out = output::render_single(
                &global.output,
                &classes,
                |c| c.join("\n"),
                |c| c.join("\n"),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TagsCommand::Create {
            tag_name,
            class,
            color,
        } => {
            let mut data = Params::new();
            data.insert("tag_name".into(), Value::String(tag_name));
            if let Some(class) = class {
                data.insert("class".into(), Value::String(class));
            }
            if let Some(color) = color {
                data.insert(
                    "hex_color".into(),
                    Value::String(color.trim_start_matches('#').to_owned()),
                );
            }
            let tag = store.create(&data).await?;
            if !global.quiet {
                eprintln!("✓ Tag {} created", tag.id);
            }
            Ok(())
        }

        TagsCommand::Delete { id } => {
            if !util::confirm(&format!("Delete tag {id}?"), global.yes)? {
                return Ok(());
            }
            store.delete(&util::parse_id(&id)).await?;
            if !global.quiet {
                eprintln!("✓ Tag deleted");
            }
            Ok(())
        }
    }
}
