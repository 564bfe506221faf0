//! Chat command - interactive session with the tenant assistant.

use std::io::Write;
use std::sync::Arc;

use console::style;
use dialoguer::Input;
use futures::StreamExt;
use tracing::info;

use pm_core::config::ConfigHandle;
use pm_core::error::{PmError, PmResult};
use pm_llm::ChatModel;
use pm_services::{AssistantService, Service};

pub async fn run(config: ConfigHandle, stream: bool) -> PmResult<()> {
    let directory = super::init_directory(&config).await?;
    let client = super::create_llm_client(&config).await?;
    let settings = config.read().await.assistant.clone();

    if client.health_check().await.is_err() {
        println!(
            "  {} Model server at {} is not reachable; replies will be errors.",
            style("WARN").yellow().bold(),
            client.base_url()
        );
    }

    let model: Arc<dyn ChatModel> = Arc::new(client);
    let mut assistant = AssistantService::new(model, directory, settings);
    assistant.init()?;
    let mut conversation = assistant.new_conversation()?;
    info!(session = %conversation.id(), "interactive chat started");

    println!("{}", style("Tenant Assistant").bold().underlined());
    println!("  Type {} or {} to leave.", style("exit").cyan(), style("quit").cyan());
    println!();

    loop {
        let line: String = Input::new()
            .with_prompt(style("you").green().bold().to_string())
            .allow_empty(true)
            .interact_text()
            .map_err(|e| PmError::Io(std::io::Error::other(e.to_string())))?;

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        print!("{} ", style("assistant:").blue().bold());
        if stream {
            let mut fragments = Box::pin(conversation.stream_message(line));
            while let Some(fragment) = fragments.next().await {
                print!("{fragment}");
                std::io::stdout().flush()?;
            }
            println!();
        } else {
            let reply = conversation.send_message(line).await;
            println!("{reply}");
        }
        println!();
    }

    println!("  Goodbye. {} messages exchanged.", conversation.history().len() - 1);
    Ok(())
}
