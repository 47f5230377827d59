use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use jitb::cli::Cli;
use jitb::{logging, SessionConfig, SessionDriver};
use jitb_chat_client::{ChatClient, ChatConfig, OpenAiChatClient};
use jitb_dom_facade::{CdpDom, CdpDomConfig};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let (_log_guard, log_path) = match logging::init(cli.debug) {
        Ok(initialized) => initialized,
        Err(err) => {
            eprintln!("jitb: {err:#}");
            std::process::exit(1);
        }
    };
    if let Some(path) = &log_path {
        info!(path = %path.display(), "debug log enabled");
    }

    if let Err(err) = run(cli).await {
        eprintln!("jitb: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut chat_config = ChatConfig::default();
    if let Some(model) = &cli.model {
        chat_config = chat_config.with_model(model);
    }
    let chat: Arc<dyn ChatClient> =
        Arc::new(OpenAiChatClient::new(chat_config).context("chat client setup failed")?);

    let dom = CdpDom::launch(CdpDomConfig {
        headless: !cli.headful,
        ..CdpDomConfig::default()
    })
    .await
    .context("browser launch failed")?;

    let driver = SessionDriver::new(
        &dom,
        chat,
        SessionConfig {
            room: cli.room,
            user: cli.user,
            game: cli.game,
        },
    );

    let outcome = tokio::select! {
        result = driver.run() => result.map_err(anyhow::Error::from),
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received; shutting down");
            Ok(())
        }
    };

    dom.close().await;
    outcome
}
