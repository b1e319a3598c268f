use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    Result,
};

/// Outbound messenger port.
///
/// Telegram is the only implementation; the relay core only ever needs to deliver plain
/// text to a chat and (for ephemeral notices) delete one of its own messages.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Deliver `text` verbatim (no parse mode) and return the new message reference.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    async fn delete_message(&self, msg: MessageRef) -> Result<()>;
}
