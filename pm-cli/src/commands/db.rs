//! Database management commands.

use clap::Subcommand;
use comfy_table::{Table, presets::UTF8_FULL, modifiers::UTF8_ROUND_CORNERS, ContentArrangement};
use console::style;
use dialoguer::Confirm;

use pm_core::config::ConfigHandle;
use pm_core::error::PmResult;
use pm_models::db_error;
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum DbAction {
    /// Show database statistics.
    Stats,
    /// Run an integrity check.
    Check,
    /// Reset the database (WARNING: destroys all data).
    Reset {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the database file path.
    Path,
    /// Insert a small demo dataset.
    Seed,
}

pub async fn run(config: ConfigHandle, action: DbAction, format: OutputFormat) -> PmResult<()> {
    let db_path = config.read().await.effective_db_path()?;

    match action {
        DbAction::Stats => {
            let db = super::init_database(&config).await?;
            let stats = db.stats()?;

            let file_size = std::fs::metadata(&db_path).ok().map(|m| m.len());
            let wal_path = db_path.with_extension("db-wal");
            let wal_size = std::fs::metadata(&wal_path).ok().map(|m| m.len());

            let conn = db.conn()?;
            let journal_mode: String = conn
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .unwrap_or_else(|_| "unknown".to_string());
            let schema_version = pm_models::migrations::get_schema_version(&conn)?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({
                        "path": db_path.display().to_string(),
                        "tables": stats,
                        "schema_version": schema_version,
                        "file_size_bytes": file_size,
                        "wal_size_bytes": wal_size,
                        "journal_mode": journal_mode,
                    }));
                }
                OutputFormat::Text => {
                    println!("{}", style("Database Statistics").bold().underlined());
                    println!("  Path:           {}", db_path.display());
                    println!("  Journal mode:   {}", journal_mode);
                    println!("  Schema version: {}", schema_version);
                    println!();

                    let mut table = Table::new();
                    table
                        .load_preset(UTF8_FULL)
                        .apply_modifier(UTF8_ROUND_CORNERS)
                        .set_content_arrangement(ContentArrangement::Dynamic);

                    table.set_header(vec!["Table", "Row Count"]);
                    table.add_row(vec!["landlords".to_string(), stats.landlords.to_string()]);
                    table.add_row(vec!["tenants".to_string(), stats.tenants.to_string()]);
                    table.add_row(vec!["properties".to_string(), stats.properties.to_string()]);
                    table.add_row(vec!["contractors".to_string(), stats.contractors.to_string()]);
                    table.add_row(vec![
                        "issues".to_string(),
                        format!("{} ({} open)", stats.issues, stats.open_issues),
                    ]);

                    println!("{table}");

                    println!();
                    println!("{}", style("Storage").bold().underlined());
                    if let Some(size) = file_size {
                        println!("  Database:       {}", super::format_bytes(size));
                    }
                    if let Some(size) = wal_size {
                        println!("  WAL file:       {}", super::format_bytes(size));
                    }
                }
            }
        }
        DbAction::Check => {
            println!("  {} Running integrity check...", style("...").dim());
            let db = super::init_database(&config).await?;

            match db.run_integrity_check() {
                Ok(()) => println!("  {} Integrity check passed.", style("OK").green().bold()),
                Err(e) => println!("  {} Integrity check failed: {}", style("FAIL").red().bold(), e),
            }

            let conn = db.conn()?;
            let fk_violations: Vec<String> = {
                let mut stmt = conn.prepare("PRAGMA foreign_key_check").map_err(db_error)?;
                let rows = stmt
                    .query_map([], |row| {
                        let table: String = row.get(0)?;
                        let rowid: i64 = row.get(1)?;
                        let parent: String = row.get(2)?;
                        Ok(format!("{table} row {rowid} -> {parent}"))
                    })
                    .map_err(db_error)?;
                rows.filter_map(|r| r.ok()).collect()
            };

            if fk_violations.is_empty() {
                println!("  {} Foreign key constraints OK.", style("OK").green().bold());
            } else {
                println!(
                    "  {} {} foreign key violation(s):",
                    style("WARN").yellow().bold(),
                    fk_violations.len()
                );
                for v in fk_violations.iter().take(10) {
                    println!("    - {v}");
                }
                if fk_violations.len() > 10 {
                    println!("    ... and {} more", fk_violations.len() - 10);
                }
            }
        }
        DbAction::Reset { yes } => {
            println!("  {} This will delete ALL local data.", style("WARNING").red().bold());
            println!("  Database: {}", db_path.display());

            let confirmed = yes
                || Confirm::new()
                    .with_prompt("  Are you sure you want to reset the database?")
                    .default(false)
                    .interact()
                    .unwrap_or(false);

            if !confirmed {
                println!("  Reset cancelled.");
                return Ok(());
            }

            let db = super::init_database(&config).await?;
            db.reset()?;
            println!("  {} Database reset complete.", style("OK").green().bold());
        }
        DbAction::Path => match format {
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"path": db_path.display().to_string()}));
            }
            OutputFormat::Text => {
                println!("{}", db_path.display());
            }
        },
        DbAction::Seed => {
            let directory = super::init_directory(&config).await?;
            let summary = directory.seed_demo()?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({
                        "landlords": summary.landlords,
                        "properties": summary.properties,
                        "tenants": summary.tenants,
                        "contractors": summary.contractors,
                        "issues": summary.issues,
                    }));
                }
                OutputFormat::Text => {
                    println!(
                        "  {} Seeded {} landlords, {} properties, {} tenants, {} contractors, {} issues.",
                        style("OK").green().bold(),
                        summary.landlords,
                        summary.properties,
                        summary.tenants,
                        summary.contractors,
                        summary.issues
                    );
                }
            }
        }
    }

    Ok(())
}
