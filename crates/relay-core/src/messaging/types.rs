use crate::domain::{ChatId, MessageId};

/// Kind of chat an event arrived in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    /// Groups and supergroups.
    Group,
}

/// Messenger-agnostic inbound message event.
///
/// Telegram-specific fields stay in the Telegram adapter; this is only what the relay
/// needs to classify and route a message.
#[derive(Clone, Debug)]
pub struct IncomingEvent {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    /// `None` for non-text content (stickers, photos, ...).
    pub text: Option<String>,
    pub replied_to: Option<RepliedMessage>,
    pub sender_display_name: Option<String>,
    pub sender_handle: Option<String>,
}

/// The message an event replies to.
#[derive(Clone, Debug)]
pub struct RepliedMessage {
    pub id: MessageId,
    pub author_is_bot: bool,
    pub text: Option<String>,
}
