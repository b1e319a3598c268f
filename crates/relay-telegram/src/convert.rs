use teloxide::types::{Message, UserId};

use relay_core::{
    domain::{ChatId, MessageId},
    messaging::types::{ChatKind, IncomingEvent, RepliedMessage},
};

/// Translate a Telegram message into a relay event.
///
/// `me` is the bot's own user id: a replied-to message counts as bot-authored only when
/// this bot wrote it, so replies to other bots in the group never resolve. Channel
/// posts yield `None`.
pub fn event_from_message(msg: &Message, me: UserId) -> Option<IncomingEvent> {
    let chat_kind = if msg.chat.is_private() {
        ChatKind::Private
    } else if msg.chat.is_group() || msg.chat.is_supergroup() {
        ChatKind::Group
    } else {
        return None;
    };

    let replied_to = msg.reply_to_message().map(|r| RepliedMessage {
        id: MessageId(r.id.0),
        author_is_bot: r.from().map(|u| u.is_bot && u.id == me).unwrap_or(false),
        text: r.text().map(str::to_string),
    });

    let sender = msg.from();
    Some(IncomingEvent {
        chat_id: ChatId(msg.chat.id.0),
        chat_kind,
        text: msg.text().map(str::to_string),
        replied_to,
        sender_display_name: sender.map(|u| u.full_name()),
        sender_handle: sender.and_then(|u| u.username.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: UserId = UserId(9000);

    fn message(v: serde_json::Value) -> Message {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn private_text_message() {
        let msg = message(serde_json::json!({
            "message_id": 5,
            "date": 1_700_000_000,
            "chat": { "id": 111, "type": "private", "first_name": "Alice" },
            "from": {
                "id": 111, "is_bot": false,
                "first_name": "Alice", "last_name": "Smith", "username": "alice"
            },
            "text": "Hello"
        }));

        let ev = event_from_message(&msg, BOT).unwrap();
        assert_eq!(ev.chat_id, ChatId(111));
        assert_eq!(ev.chat_kind, ChatKind::Private);
        assert_eq!(ev.text.as_deref(), Some("Hello"));
        assert!(ev.replied_to.is_none());
        assert_eq!(ev.sender_display_name.as_deref(), Some("Alice Smith"));
        assert_eq!(ev.sender_handle.as_deref(), Some("alice"));
    }

    fn group_reply(author_id: u64, author_is_bot: bool) -> Message {
        message(serde_json::json!({
            "message_id": 50,
            "date": 1_700_000_100,
            "chat": { "id": -100200, "type": "supergroup", "title": "Admins" },
            "from": { "id": 42, "is_bot": false, "first_name": "Bob" },
            "text": "We can help",
            "reply_to_message": {
                "message_id": 49,
                "date": 1_700_000_000,
                "chat": { "id": -100200, "type": "supergroup", "title": "Admins" },
                "from": { "id": author_id, "is_bot": author_is_bot, "first_name": "Relay" },
                "text": "User: Alice\n\nHello"
            }
        }))
    }

    #[test]
    fn reply_to_this_bot_in_supergroup() {
        let ev = event_from_message(&group_reply(9000, true), BOT).unwrap();
        assert_eq!(ev.chat_kind, ChatKind::Group);
        assert_eq!(ev.chat_id, ChatId(-100200));

        let replied = ev.replied_to.unwrap();
        assert_eq!(replied.id, MessageId(49));
        assert!(replied.author_is_bot);
        assert_eq!(replied.text.as_deref(), Some("User: Alice\n\nHello"));
    }

    #[test]
    fn reply_to_another_bot_or_human_is_not_bot_authored() {
        let other_bot = event_from_message(&group_reply(7777, true), BOT).unwrap();
        assert!(!other_bot.replied_to.unwrap().author_is_bot);

        let human = event_from_message(&group_reply(42, false), BOT).unwrap();
        assert!(!human.replied_to.unwrap().author_is_bot);
    }

    #[test]
    fn sticker_has_no_text() {
        let msg = message(serde_json::json!({
            "message_id": 6,
            "date": 1_700_000_000,
            "chat": { "id": 111, "type": "private", "first_name": "Alice" },
            "from": { "id": 111, "is_bot": false, "first_name": "Alice" },
            "dice": { "emoji": "🎲", "value": 3 }
        }));

        let ev = event_from_message(&msg, BOT).unwrap();
        assert!(ev.text.is_none());
        assert!(ev.sender_handle.is_none());
    }
}
