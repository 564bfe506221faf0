//! Serve command - run the HTTP API until Ctrl-C.

use console::style;

use pm_core::config::ConfigHandle;
use pm_core::error::PmResult;
use pm_server::AppState;

pub async fn run(config: ConfigHandle, host: Option<String>, port: Option<u16>) -> PmResult<()> {
    {
        let mut cfg = config.write().await;
        if let Some(host) = host {
            cfg.server.host = host;
        }
        if let Some(port) = port {
            cfg.server.port = port;
        }
    }

    let cfg = config.snapshot().await;
    let state = AppState::from_config(&cfg)?;

    println!(
        "  {} Serving on http://{} (model {} at {})",
        style("OK").green().bold(),
        cfg.bind_address(),
        cfg.llm.model,
        cfg.llm.base_url
    );
    println!("  Press Ctrl-C to stop.");

    pm_server::serve(&cfg, state).await
}
