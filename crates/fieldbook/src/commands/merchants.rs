//! Merchant command handlers, including file import and geocoding.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tabled::Tabled;

use fieldbook_core::{
    GeoPoint, GeocodeResult, ImportResult, Merchant, Params, UploadFile, Workspace,
};

use crate::cli::{GlobalOpts, MerchantsArgs, MerchantsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct MerchantRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "City")]
    city: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Located")]
    located: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

impl MerchantRow {
    fn new(m: &Merchant, color: bool) -> Self {
        Self {
            id: m.id.to_string(),
            title: m.title.clone(),
            city: m.city.clone(),
            phone: m.phone.clone(),
            located: output::check(m.is_geocoded(), color),
            tags: m
                .tags
                .iter()
                .map(|t| t.tag_name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[derive(Tabled)]
struct GeoPointRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "Lng")]
    longitude: String,
    #[tabled(rename = "Lat")]
    latitude: String,
    #[tabled(rename = "Address")]
    address: String,
}

impl From<&GeoPoint> for GeoPointRow {
    fn from(g: &GeoPoint) -> Self {
        Self {
            id: g.id.to_string(),
            from: g.from.clone(),
            longitude: format!("{:.6}", g.longitude),
            latitude: format!("{:.6}", g.latitude),
            address: g.address.clone(),
        }
    }
}

#[derive(Tabled)]
struct RowErrorRow {
    #[tabled(rename = "Row")]
    row: i64,
    #[tabled(rename = "Column")]
    column: String,
    #[tabled(rename = "Error")]
    message: String,
}

fn detail(m: &Arc<Merchant>) -> String {
    let location = match (m.lng, m.lat) {
        (Some(lng), Some(lat)) => format!("{lng:.6}, {lat:.6} ({})", m.geocode_level),
        _ => String::new(),
    };
    output::detail_lines(&[
        ("ID", m.id.to_string()),
        ("Title", m.title.clone()),
        ("Legal name", m.legal_name.clone()),
        ("Phone", m.phone.clone()),
        ("Address", m.full_address()),
        ("Location", location),
        ("Geocoder", m.geocode_description.clone()),
        ("Owner", m.owner.display_name().to_owned()),
        ("Created", util::format_date(m.created.as_ref())),
    ])
}

fn import_summary(result: &ImportResult) -> String {
    let mut out = output::detail_lines(&[
        ("Rows", result.total_rows.to_string()),
        ("Imported", result.success_count.to_string()),
        ("Failed", result.error_count.to_string()),
    ]);
    if !result.errors.is_empty() {
        let rows: Vec<_> = result
            .errors
            .iter()
            .map(|e| RowErrorRow {
                row: e.row,
                column: e.column.clone(),
                message: e.message.clone(),
            })
            .collect();
        out.push_str("\n\n");
        out.push_str(&tabled::Table::new(rows).to_string());
    }
    out
}

fn geocode_detail(g: &GeocodeResult) -> String {
    output::detail_lines(&[
        ("Address", g.address.clone()),
        ("Lng", format!("{:.6}", g.longitude)),
        ("Lat", format!("{:.6}", g.latitude)),
        ("Level", g.level.clone()),
        ("Score", format!("{:.2}", g.score)),
        ("Provider", g.provider.clone()),
    ])
}

/// Bar fed from the service's upload progress channel.
fn progress_bar(
    workspace: &Workspace,
    quiet: bool,
) -> Option<(ProgressBar, tokio::task::JoinHandle<()>)> {
    if quiet {
        return None;
    }
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner} uploading [{bar:30}] {pos:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.enable_steady_tick(Duration::from_millis(120));

    let mut progress = workspace.merchants().service().subscribe_progress();
    let feed = bar.clone();
    let task = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let percent = *progress.borrow_and_update();
            if percent > 0 {
                feed.set_position(u64::from(percent));
            }
        }
    });
    Some((bar, task))
}

fn is_excel(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xls"))
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    workspace: &Workspace,
    args: MerchantsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let store = workspace.merchants();
    let color = output::should_color(&global.color);

    match args.command {
        MerchantsCommand::List(list) => {
            let merchants = store.fetch_all(&util::list_params(&list)).await?;
            let out = output::render_list(
                &global.output,
                &merchants,
                |m| MerchantRow::new(m, color),
                |m| m.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MerchantsCommand::Get { id } => {
            let merchant = store.get(&util::parse_id(&id)).await?;
            let out =
                output::render_single(&global.output, &merchant, detail, |m| m.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MerchantsCommand::Create { title, fields } => {
            let mut data = util::field_params(&fields)?;
            data.insert("title".into(), Value::String(title));
            let merchant = store.create(&data).await?;
            if !global.quiet {
                eprintln!("✓ Merchant {} created", merchant.id);
            }
            Ok(())
        }

        MerchantsCommand::Update { id, fields } => {
            let data = util::field_params(&fields)?;
            let merchant = store.update(&util::parse_id(&id), &data).await?;
            let out =
                output::render_single(&global.output, &merchant, detail, |m| m.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MerchantsCommand::Delete { id } => {
            if !util::confirm(&format!("Delete merchant {id}?"), global.yes)? {
                return Ok(());
            }
            store.delete(&util::parse_id(&id)).await?;
            if !global.quiet {
                eprintln!("✓ Merchant deleted");
            }
            Ok(())
        }

        MerchantsCommand::Import { file, geocode } => {
            let excel = is_excel(&file);
            if excel && geocode {
                return Err(CliError::Validation {
                    field: "geocode".into(),
                    reason: "geocoding on import is only available for CSV files".into(),
                });
            }
            let upload = UploadFile::from_path(&file)?;

            let bar = progress_bar(workspace, global.quiet);
            let result = if excel {
                store.import_excel(upload).await
            } else {
                store.import_csv(upload, geocode).await
            };
            if let Some((bar, task)) = bar {
                task.abort();
                bar.finish_and_clear();
            }

            let result = result?;
            let out = output::render_single(&global.output, &result, import_summary, |r| {
                r.success_count.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MerchantsCommand::Geocode { id } => {
            let merchant = store.geocode(&util::parse_id(&id)).await?;
            let out =
                output::render_single(&global.output, &merchant, detail, |m| m.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MerchantsCommand::Locate { address } => {
            let result = store.geocode_address(&address).await?;
            let out = output::render_single(&global.output, &result, geocode_detail, |g| {
                format!("{},{}", g.longitude, g.latitude)
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MerchantsCommand::Points { id } => {
            let points = workspace
                .geo_points()
                .fetch_scoped(&util::parse_id(&id), &Params::new())
                .await?;
            let out = output::render_list(
                &global.output,
                &points,
                |g| GeoPointRow::from(&**g),
                |g| g.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excel_detection_by_extension() {
        assert!(is_excel(Path::new("shops.XLSX")));
        assert!(is_excel(Path::new("legacy.xls")));
        assert!(!is_excel(Path::new("shops.csv")));
        assert!(!is_excel(Path::new("noext")));
    }
}
