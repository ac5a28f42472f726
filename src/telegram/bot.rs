//! Bot initialization and command definitions.

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "I can:")]
pub enum Command {
    #[command(description = "show the welcome message")]
    Start,
    #[command(description = "show usage help")]
    Help,
    #[command(description = "search the catalog for music")]
    Search(String),
}

/// Creates a Bot instance reading BOT_TOKEN from the environment.
///
/// The HTTP client carries the long network timeout so document uploads of
/// full-size FLAC files are not cut off mid-send.
pub fn create_bot() -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(config::network::download_timeout()).build()?;
    Ok(Bot::from_env_with_client(client))
}

/// Sets up bot commands in the Telegram UI.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}
