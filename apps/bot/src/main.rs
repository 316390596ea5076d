//! Telegram front end for the nightlight API.
//!
//! Runs as its own process next to the server and long-polls Telegram, so
//! no public URL is needed for the bot itself. Each chat command becomes
//! one API call; replies are plain text.

use std::{collections::HashSet, time::Duration};

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

mod api_client;
mod commands;
mod config;
mod telegram;

use api_client::ApiClient;
use commands::{parse_command, BotCommand};
use config::{load_bot_settings, validate_bot_settings};
use telegram::TelegramClient;

const POLL_TIMEOUT_S: u64 = 30;
const POLL_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
struct Args {
    /// Override the nightlight API base URL from the environment.
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut settings = load_bot_settings();
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.clone())
        .init();

    let args = Args::parse();
    if let Some(api_url) = args.api_url {
        settings.api_base_url = api_url;
    }
    validate_bot_settings(&settings)?;
    let allowed_chat_ids = settings.allowed_chat_ids()?;

    let api = ApiClient::new(
        &settings.api_base_url,
        &settings.api_token,
        &settings.device_id,
        settings.tls_verify,
    )?;
    let telegram = TelegramClient::new(&settings.telegram_bot_token);

    info!(device_id = %settings.device_id, api = %settings.api_base_url, "bot polling for updates");
    let mut offset = 0i64;
    loop {
        let updates = match telegram.get_updates(offset, POLL_TIMEOUT_S).await {
            Ok(updates) => updates,
            Err(error) => {
                warn!(%error, "getUpdates failed, backing off");
                tokio::time::sleep(POLL_BACKOFF).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(message) = update.message else {
                continue;
            };
            let Some(text) = message.text.as_deref() else {
                continue;
            };
            let chat_id = message.chat.id;
            let Some(reply) = handle_command(&api, &allowed_chat_ids, chat_id, text).await else {
                continue;
            };
            if let Err(error) = telegram.send_message(chat_id, &reply).await {
                warn!(%error, chat_id, "failed to send reply");
            }
        }
    }
}

/// Produces the reply for one message, or `None` when the bot should stay
/// silent (plain text, commands it does not know).
async fn handle_command(
    api: &ApiClient,
    allowed_chat_ids: &HashSet<i64>,
    chat_id: i64,
    text: &str,
) -> Option<String> {
    let command = parse_command(text);
    if command == BotCommand::Unknown {
        return None;
    }
    // An empty allowlist means anyone may drive the light.
    if !allowed_chat_ids.is_empty() && !allowed_chat_ids.contains(&chat_id) {
        return Some("Access denied.".to_string());
    }

    let reply = match command {
        BotCommand::Start => "Commands: /status, /on, /off, /brightness 0-100".to_string(),
        BotCommand::Status => match api.get_state().await {
            Ok(state) => format!(
                "State: {}, brightness {}%",
                if state.is_on { "ON" } else { "OFF" },
                percent(state.brightness)
            ),
            Err(error) => request_failed(chat_id, error),
        },
        BotCommand::On => match api.set_power(true).await {
            Ok(state) => format!("Turned on, brightness {}%", percent(state.brightness)),
            Err(error) => request_failed(chat_id, error),
        },
        BotCommand::Off => match api.set_power(false).await {
            Ok(_) => "Turned off".to_string(),
            Err(error) => request_failed(chat_id, error),
        },
        BotCommand::Brightness(value) => match api.set_brightness(value).await {
            Ok(state) => format!("Brightness set to {}%", percent(state.brightness)),
            Err(error) => request_failed(chat_id, error),
        },
        BotCommand::BrightnessUsage => "Usage: /brightness 0-100".to_string(),
        BotCommand::Unknown => return None,
    };
    Some(reply)
}

fn request_failed(chat_id: i64, error: anyhow::Error) -> String {
    warn!(%error, chat_id, "API request failed");
    "The light did not respond, try again later.".to_string()
}

fn percent(brightness: f64) -> i64 {
    (brightness * 100.0).round() as i64
}
