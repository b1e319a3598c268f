//! One-shot admin tools for the relay bot.
//!
//! - `relay-tools group-id`: find the admin group's chat id in recent updates
//! - `relay-tools cleanup`: delete the bot's recent messages in `GROUP_ID`
//!
//! Both read `BOT_TOKEN` (and `GROUP_ID` for cleanup) from the environment / `.env`.
//! The Bot API refuses `getUpdates` while a webhook is set, so `cleanup` removes it first.

use std::time::Duration;

use anyhow::Context;
use teloxide::{
    prelude::*,
    types::{Message, UpdateKind, UserId},
};

use relay_core::config::{self, Config};

const USAGE: &str = "usage: relay-tools <group-id|cleanup>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = std::env::args().nth(1).unwrap_or_default();

    match cmd.as_str() {
        "group-id" => group_id().await,
        "cleanup" => cleanup().await,
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
}

fn bot_from_env() -> anyhow::Result<Bot> {
    config::load_dotenv();
    let token = std::env::var("BOT_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty())
        .context("Missing BOT_TOKEN in .env")?;
    Ok(Bot::new(token))
}

async fn recent_messages(bot: &Bot, limit: u8) -> anyhow::Result<Vec<Message>> {
    let updates = bot
        .get_updates()
        .limit(limit)
        .await
        .context("getUpdates failed")?;
    Ok(updates
        .into_iter()
        .filter_map(|u| match u.kind {
            UpdateKind::Message(m) => Some(m),
            _ => None,
        })
        .collect())
}

async fn group_id() -> anyhow::Result<()> {
    let bot = bot_from_env()?;
    let messages = recent_messages(&bot, 100).await?;

    match first_group_chat(&messages) {
        Some(id) => {
            println!("Group ID: {id}");
            println!("Add to .env:  GROUP_ID={id}");
        }
        None => {
            println!("No group chat found in getUpdates.");
            println!("1. Add your bot to the group");
            println!("2. Send any message in the group");
            println!("3. Run this again:  relay-tools group-id");
        }
    }
    Ok(())
}

async fn cleanup() -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let bot = Bot::new(cfg.bot_token.clone());
    let group = teloxide::types::ChatId(cfg.group_id.0);

    println!("Cleaning up bot messages in group {}...", cfg.group_id);

    bot.delete_webhook().await.context("deleteWebhook failed")?;
    let me = bot.get_me().await.context("getMe failed")?;
    println!("Bot: @{} (ID: {})", me.username(), me.id.0);

    tokio::time::sleep(Duration::from_secs(1)).await;

    let messages = recent_messages(&bot, 100).await?;
    println!("Found {} recent messages", messages.len());

    let targets = bot_messages_in(&messages, group, me.id);
    if targets.is_empty() {
        println!("No bot messages found in recent updates");
        println!("Note: only the last ~100 updates are visible to the Bot API");
        return Ok(());
    }

    println!("Found {} bot messages to delete", targets.len());
    let (mut deleted, mut failed) = (0usize, 0usize);
    for id in targets {
        match bot.delete_message(group, id).await {
            Ok(_) => {
                println!("deleted message {}", id.0);
                deleted += 1;
            }
            Err(e) => {
                println!("failed to delete message {}: {e}", id.0);
                failed += 1;
            }
        }
        // Stay well under the flood limit.
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    println!("\nCleanup summary:");
    println!("  deleted: {deleted}");
    println!("  failed:  {failed}");
    if failed > 0 {
        println!("Some messages couldn't be deleted (too old or already gone)");
    }
    Ok(())
}

fn first_group_chat(messages: &[Message]) -> Option<i64> {
    messages
        .iter()
        .find(|m| m.chat.is_group() || m.chat.is_supergroup())
        .map(|m| m.chat.id.0)
}

fn bot_messages_in(
    messages: &[Message],
    group: teloxide::types::ChatId,
    me: UserId,
) -> Vec<teloxide::types::MessageId> {
    messages
        .iter()
        .filter(|m| m.chat.id == group && m.from().is_some_and(|u| u.id == me))
        .map(|m| m.id)
        .collect()
}
