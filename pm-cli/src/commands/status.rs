//! Status command - show model reachability and local database state.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use pm_core::config::ConfigHandle;
use pm_core::error::PmResult;
use crate::OutputFormat;

/// Run the status command.
pub async fn run(config: ConfigHandle, format: OutputFormat) -> PmResult<()> {
    let cfg = config.snapshot().await;
    let client = super::create_llm_client(&config).await?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message(format!("Contacting {}...", client.base_url()));

    let latency = client.health_check().await;
    let reachable = latency.is_ok();
    let model_available = if reachable {
        client.has_model().await.unwrap_or(false)
    } else {
        false
    };
    pb.finish_and_clear();

    // Local database stats, only when the file already exists
    let db_path = cfg.effective_db_path()?;
    let db_stats = if db_path.exists() {
        let db = super::init_database(&config).await.ok();
        let stats = db.and_then(|d| d.stats().ok());
        let file_size = std::fs::metadata(&db_path).ok().map(|m| m.len());
        Some((stats, file_size))
    } else {
        None
    };

    match format {
        OutputFormat::Json => {
            let mut json = serde_json::json!({
                "llm_base_url": client.base_url(),
                "llm_model": client.model(),
                "llm_reachable": reachable,
                "latency_ms": latency.as_ref().ok().map(|d| d.as_millis() as u64),
                "model_available": model_available,
                "database_path": db_path.display().to_string(),
            });
            if let Some((Some(stats), file_size)) = &db_stats {
                json["local_database"] = serde_json::json!({
                    "counts": stats,
                    "file_size_bytes": file_size,
                });
            }
            println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        }
        OutputFormat::Text => {
            println!("{}", style("Model Server").bold().underlined());
            println!("  Address:   {}", client.base_url());
            match &latency {
                Ok(elapsed) => println!(
                    "  Status:    {} ({}ms)",
                    style("reachable").green(),
                    elapsed.as_millis()
                ),
                Err(e) => println!("  Status:    {} ({e})", style("unreachable").red()),
            }
            println!(
                "  Model:     {} {}",
                client.model(),
                if model_available {
                    style("available").green().to_string()
                } else {
                    style("not pulled").yellow().to_string()
                }
            );

            println!();
            println!("{}", style("Local Database").bold().underlined());
            println!("  Path:        {}", db_path.display());
            match &db_stats {
                Some((Some(stats), file_size)) => {
                    println!("  Landlords:   {}", stats.landlords);
                    println!("  Tenants:     {}", stats.tenants);
                    println!("  Properties:  {}", stats.properties);
                    println!("  Contractors: {}", stats.contractors);
                    println!("  Issues:      {} ({} open)", stats.issues, stats.open_issues);
                    if let Some(size) = file_size {
                        println!("  Disk usage:  {}", super::format_bytes(*size));
                    }
                }
                Some((None, _)) => println!("  {}", style("could not be opened").red()),
                None => println!("  {}", style("not created yet").dim()),
            }
        }
    }

    Ok(())
}
