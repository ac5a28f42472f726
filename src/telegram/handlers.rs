//! Dispatcher schema and message/callback handlers.
//!
//! The same schema is used in production and can be plugged into a test
//! dispatcher. Callback tokens: `download_{track_id}` per result row plus a
//! trailing `new_search` row.

use std::sync::Arc;

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, Message};

use super::bot::Command;
use crate::catalog::Track;
use crate::config;
use crate::errors::WorkflowError;
use crate::workflow::{Coordinator, SearchReply};

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub coordinator: Arc<Coordinator>,
}

const WELCOME_MESSAGE: &str = "🎵 Welcome to FlacBot! 🎵\n\n\
    I can help you search and download high-quality FLAC music files.\n\n\
    📖 Commands:\n\
    • Send me any text to search for music\n\
    • /search <query> - Search for music\n\
    • /help - Show this help message\n\n\
    🎧 Just type the name of a song, artist, or album to get started!";

const HELP_MESSAGE: &str = "🎵 FlacBot Help 🎵\n\n\
    📖 Available commands:\n\
    • /start - Show welcome message\n\
    • /search <query> - Search for music\n\
    • /help - Show this help message\n\n\
    🔍 How to use:\n\
    1. Send me a search query (song name, artist, or album)\n\
    2. I'll show you search results with inline buttons\n\
    3. Click on a track to download it\n\
    4. I'll send you the FLAC file\n\n\
    💡 Tips:\n\
    • Be specific with your search terms for better results\n\
    • You can search by artist name, song title, or album\n\n\
    🎧 Example: \"Bohemian Rhapsody Queen\"";

/// Creates the main dispatcher schema for the bot.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        // Command handler
        .branch(command_handler(deps_commands))
        // Plain text messages are treated as search queries
        .branch(message_handler(deps_messages))
        // Inline keyboard button presses
        .branch(callback_handler(deps_callback))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_command::<Command>()
        .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                match cmd {
                    Command::Start => {
                        bot.send_message(msg.chat.id, WELCOME_MESSAGE).await?;
                    }
                    Command::Help => {
                        bot.send_message(msg.chat.id, HELP_MESSAGE).await?;
                    }
                    Command::Search(query) => {
                        if query.trim().is_empty() {
                            bot.send_message(msg.chat.id, "🔍 Send me a search query after /search")
                                .await?;
                        } else {
                            perform_search(&bot, &deps, msg.chat.id, query.trim()).await?;
                        }
                    }
                }
                Ok(())
            }
        })
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| {
            msg.text()
                .map(|text| !text.trim().is_empty() && !text.starts_with('/'))
                .unwrap_or(false)
        })
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                if let Some(query) = msg.text() {
                    perform_search(&bot, &deps, msg.chat.id, query.trim()).await?;
                }
                Ok(())
            }
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            let chat_id = q.message.as_ref().map(|m| m.chat().id);
            let message_id = q.message.as_ref().map(|m| m.id());

            if let (Some(data), Some(chat_id), Some(message_id)) = (q.data.as_deref(), chat_id, message_id) {
                if data == "new_search" {
                    bot.edit_message_text(chat_id, message_id, "🔍 Send me a new search query:")
                        .await?;
                } else if let Some(track_id) = data.strip_prefix("download_") {
                    if let Err(e) = handle_download(&bot, &deps, chat_id, message_id, track_id).await {
                        log::error!("Download handler failed for chat {}: {}", chat_id, e);
                        let _ = bot
                            .edit_message_text(chat_id, message_id, "❌ Failed to download track. Please try again.")
                            .await;
                    }
                } else {
                    log::warn!("Unknown callback data from chat {}: {}", chat_id, data);
                }
            }

            // Always answer to clear the button's loading state
            bot.answer_callback_query(q.id).await?;
            Ok(())
        }
    })
}

/// Runs a search and edits the progress message into the result list with
/// one button per track, preserving result order verbatim.
async fn perform_search(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId, query: &str) -> Result<(), HandlerError> {
    let searching = bot.send_message(chat_id, "🔍 Searching for music...").await?;

    match deps.coordinator.search(chat_id, query).await {
        SearchReply::NoResults => {
            bot.edit_message_text(chat_id, searching.id, "❌ No results found. Try a different search term.")
                .await?;
        }
        SearchReply::Results { tracks, status } => {
            let text = format!(
                "🎵 Found {} results for \"{}\":\n\n{}\n\nClick on a track to download:",
                tracks.len(),
                query,
                status
            );
            bot.edit_message_text(chat_id, searching.id, text)
                .reply_markup(results_keyboard(&tracks))
                .await?;
        }
    }

    Ok(())
}

/// One row per track labeled with title and artist, plus a New Search row.
fn results_keyboard(tracks: &[Track]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = tracks
        .iter()
        .map(|track| {
            vec![InlineKeyboardButton::callback(
                format!("🎵 {} - {}", track.title, track.artist),
                format!("download_{}", track.id),
            )]
        })
        .collect();

    rows.push(vec![InlineKeyboardButton::callback(
        "🔍 New Search".to_string(),
        "new_search".to_string(),
    )]);

    InlineKeyboardMarkup::new(rows)
}

async fn handle_download(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    message_id: teloxide::types::MessageId,
    track_id: &str,
) -> Result<(), HandlerError> {
    let track = match deps.coordinator.resolve(chat_id, track_id).await {
        Ok(track) => track,
        Err(WorkflowError::SessionExpired) => {
            bot.edit_message_text(chat_id, message_id, "❌ Session expired. Please perform a new search.")
                .await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let download_kind = if track.is_fallback { "demo file" } else { "FLAC track" };
    bot.edit_message_text(
        chat_id,
        message_id,
        format!("⬬ Downloading {}: {} by {}...", download_kind, track.title, track.artist),
    )
    .await?;

    let result = deps.coordinator.download(&track, config::quality::LOSSLESS).await?;

    bot.send_document(chat_id, InputFile::file(result.path.clone()))
        .caption(format_track_caption(&track))
        .await?;

    let success_text = if result.used_fallback {
        format!(
            "✅ Demo file sent: {} by {}\n🚧 This is demonstration content. \
             Real music will be available when the API is accessible.",
            track.title, track.artist
        )
    } else {
        format!("✅ Successfully sent: {} by {}", track.title, track.artist)
    };
    bot.edit_message_text(chat_id, message_id, success_text).await?;

    // The file has been handed to Telegram; drop the local copy
    deps.coordinator.cleanup(&result.path).await?;

    Ok(())
}

/// Formats the document caption shown under a delivered file.
fn format_track_caption(track: &Track) -> String {
    format!(
        "🎵 {}\n👤 {}\n💿 {}\n⏱️ {}\n🎧 {}",
        track.title, track.artist, track.album, track.duration_display, track.quality_display
    )
}
