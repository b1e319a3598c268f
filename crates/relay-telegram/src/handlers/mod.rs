//! Telegram update handlers.
//!
//! Commands are answered here; every other message is converted into an
//! `IncomingEvent` and handed to the relay core.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use relay_core::domain::ChatId;

use crate::convert::event_from_message;
use crate::router::AppState;

mod commands;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if msg.chat.is_private() && msg.text().is_some_and(commands::is_start) {
        state.relay.welcome(ChatId(msg.chat.id.0)).await;
        return Ok(());
    }

    let Some(event) = event_from_message(&msg, state.bot_id) else {
        return Ok(());
    };

    let outcome = state.relay.handle(&event).await;
    tracing::debug!(chat = msg.chat.id.0, message_id = msg.id.0, ?outcome, "message handled");

    Ok(())
}
