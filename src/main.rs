use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use teloxide::prelude::*;
use tokio::time::interval;

use flacbot::catalog::CatalogClient;
use flacbot::config;
use flacbot::session::SessionStore;
use flacbot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};
use flacbot::workflow::Coordinator;

/// Main entry point for the Telegram bot
#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present
    let _ = dotenv();
    pretty_env_logger::init();

    if std::env::var("BOT_TOKEN").map(|v| v.is_empty()).unwrap_or(true) {
        eprintln!("❌ BOT_TOKEN environment variable is required!");
        eprintln!("Please set your Telegram Bot Token:");
        eprintln!("export BOT_TOKEN=\"your_bot_token_here\"");
        std::process::exit(1);
    }

    run_bot().await
}

/// Run the Telegram bot
async fn run_bot() -> Result<()> {
    let bot = create_bot()?;
    setup_bot_commands(&bot).await?;

    let sessions = Arc::new(SessionStore::new());
    let catalog = CatalogClient::from_env()?;
    log::info!("Catalog API base URL: {}", catalog.base_url());

    let coordinator = Arc::new(Coordinator::new(
        catalog,
        Arc::clone(&sessions),
        config::DOWNLOAD_FOLDER.as_str(),
    ));

    // Periodic session expiry sweep
    let sweep_sessions = Arc::clone(&sessions);
    tokio::spawn(async move {
        let mut interval = interval(config::session::sweep_interval());
        loop {
            interval.tick().await;
            let removed = sweep_sessions.sweep_expired(config::session::max_age()).await;
            if removed > 0 {
                log::info!("Expired {} search session(s)", removed);
            }
        }
    });

    let handler = schema(HandlerDeps { coordinator });

    log::info!("🎵 FlacBot started successfully!");
    log::info!("Waiting for messages...");

    Dispatcher::builder(bot, handler)
        .dependencies(DependencyMap::new())
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
