//! Issue commands.

use clap::Subcommand;
use comfy_table::{Table, presets::UTF8_FULL, modifiers::UTF8_ROUND_CORNERS, ContentArrangement};
use console::style;

use pm_core::config::ConfigHandle;
use pm_core::constants::entities;
use pm_core::error::{PmError, PmResult};
use pm_models::{IssueFilter, Page};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum IssuesAction {
    /// List maintenance issues.
    List {
        /// Only show issues that are still open.
        #[arg(short, long)]
        unresolved: bool,
        /// Only show issues for this property.
        #[arg(short, long)]
        property: Option<i64>,
        /// Maximum number of issues to show.
        #[arg(short = 'n', long, default_value = "100")]
        limit: i64,
    },
    /// Mark an issue resolved.
    Resolve {
        /// Issue ID.
        id: i64,
    },
}

pub async fn run(config: ConfigHandle, action: IssuesAction, format: OutputFormat) -> PmResult<()> {
    let directory = super::init_directory(&config).await?;

    match action {
        IssuesAction::List { unresolved, property, limit } => {
            let filter = IssueFilter {
                property_id: property,
                resolved: unresolved.then_some(false),
            };
            let issues = directory.list_issues(&filter, Page::new(0, limit))?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&issues)?);
                }
                OutputFormat::Text => {
                    if issues.is_empty() {
                        println!("  No issues found.");
                        return Ok(());
                    }

                    let mut table = Table::new();
                    table
                        .load_preset(UTF8_FULL)
                        .apply_modifier(UTF8_ROUND_CORNERS)
                        .set_content_arrangement(ContentArrangement::Dynamic);

                    table.set_header(vec!["ID", "Description", "Location", "Action", "Property", "Status"]);
                    for issue in &issues {
                        table.add_row(vec![
                            issue.id.to_string(),
                            super::truncate(&issue.description, 40),
                            super::truncate(&issue.location, 20),
                            super::truncate(&issue.action, 30),
                            issue.property_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                            if issue.resolved { "resolved".to_string() } else { "open".to_string() },
                        ]);
                    }

                    println!("{table}");
                    println!("  {} issue(s)", issues.len());
                }
            }
        }
        IssuesAction::Resolve { id } => {
            let issue = directory
                .resolve_issue(id)?
                .ok_or(PmError::NotFound { entity: entities::ISSUE, id })?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&issue)?);
                }
                OutputFormat::Text => {
                    println!(
                        "  {} Issue {} resolved: {}",
                        style("OK").green().bold(),
                        issue.id,
                        issue.description
                    );
                }
            }
        }
    }

    Ok(())
}
