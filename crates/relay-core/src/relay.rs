use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;

use crate::{
    config::{Config, Notices},
    domain::{ChatId, MessageId, MessageRef},
    gate::PendingGate,
    messaging::{
        port::MessagingPort,
        types::{ChatKind, IncomingEvent, RepliedMessage},
    },
    resolver::{ReplyResolver, Strategy},
    threads::{ThreadEntry, ThreadStore},
    Result,
};

/// What the relay did with an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Not a DM and not a qualifying admin reply.
    Ignored,
    /// The user still has an unanswered message; they got the waiting notice.
    Waiting,
    /// The DM reached the admin group and a thread entry was recorded.
    Forwarded { group_message_id: MessageId },
    /// The admin group could not be reached; the user was told to retry.
    DeliveryFailed,
    /// An admin reply was delivered to the user.
    Replied { user: ChatId, strategy: Strategy },
    /// The reply resolved but delivery to the user failed. Not retried.
    ReplyFailed { user: ChatId },
    /// No strategy could map the reply to a user; dropped silently.
    Unresolved,
}

/// Routes inbound events: user DMs go to the admin group, admin replies go back to users.
///
/// Event handling is serialized on the gate lock, so "check pending, deliver, record,
/// arm" runs as one unit even when the transport delivers updates concurrently.
pub struct Relay {
    group: ChatId,
    notices: Notices,
    notice_ttl: Option<Duration>,
    messenger: Arc<dyn MessagingPort>,
    threads: Arc<ThreadStore>,
    resolver: ReplyResolver,
    gate: Mutex<PendingGate>,
}

impl Relay {
    pub fn new(
        cfg: &Config,
        messenger: Arc<dyn MessagingPort>,
        threads: Arc<ThreadStore>,
    ) -> Self {
        Self {
            group: cfg.group_id,
            notices: cfg.notices.clone(),
            notice_ttl: cfg.notice_ttl,
            messenger,
            resolver: ReplyResolver::new(threads.clone()),
            threads,
            gate: Mutex::new(PendingGate::new()),
        }
    }

    pub async fn is_pending(&self, user: ChatId) -> bool {
        self.gate.lock().await.is_pending(user)
    }

    /// Answer `/start` with the welcome notice.
    pub async fn welcome(&self, chat_id: ChatId) {
        if let Err(e) = self.send_notice(chat_id, &self.notices.welcome, true).await {
            tracing::warn!(chat = %chat_id, "failed to send welcome notice: {e}");
        }
    }

    pub async fn handle(&self, event: &IncomingEvent) -> Outcome {
        let mut gate = self.gate.lock().await;

        if let Some(replied_to) = &event.replied_to {
            // Only the configured group, and only replies to the bot's own messages;
            // everything else is admin-to-admin chatter.
            if event.chat_id != self.group || !replied_to.author_is_bot {
                return Outcome::Ignored;
            }
            let Some(text) = event.text.as_deref() else {
                return Outcome::Ignored;
            };
            return self.relay_reply(&mut gate, replied_to, text).await;
        }

        if event.chat_kind != ChatKind::Private {
            return Outcome::Ignored;
        }
        let Some(text) = event.text.as_deref() else {
            return Outcome::Ignored;
        };
        self.forward_dm(&mut gate, event, text).await
    }

    async fn relay_reply(
        &self,
        gate: &mut PendingGate,
        replied_to: &RepliedMessage,
        text: &str,
    ) -> Outcome {
        let Some(resolution) = self.resolver.resolve(self.group, replied_to).await else {
            tracing::debug!(message_id = replied_to.id.0, "unresolved reply dropped");
            return Outcome::Unresolved;
        };
        let user = resolution.user;

        // Anonymous: the raw text only, never who replied.
        if let Err(e) = self.messenger.send_text(user, text).await {
            tracing::warn!(user = %user, "failed to relay reply: {e}");
            return Outcome::ReplyFailed { user };
        }

        gate.disarm(user);
        tracing::info!(user = %user, strategy = %resolution.strategy, "reply relayed");
        Outcome::Replied {
            user,
            strategy: resolution.strategy,
        }
    }

    async fn forward_dm(&self, gate: &mut PendingGate, event: &IncomingEvent, text: &str) -> Outcome {
        let user = event.chat_id;

        if gate.is_pending(user) {
            if let Err(e) = self.send_notice(user, &self.notices.waiting, true).await {
                tracing::warn!(user = %user, "failed to send waiting notice: {e}");
            }
            return Outcome::Waiting;
        }

        let line = compose_group_line(
            event.sender_display_name.as_deref(),
            event.sender_handle.as_deref(),
            text,
        );

        // Ack first so the user hears back even if the group send is slow or fails.
        if let Err(e) = self.messenger.send_text(user, &self.notices.ack).await {
            tracing::warn!(user = %user, "failed to send ack notice: {e}");
        }

        let delivered = match self.messenger.send_text(self.group, &line).await {
            Ok(msg) => msg,
            Err(e) => {
                tracing::error!(user = %user, "failed to forward message to group: {e}");
                if let Err(e) = self.messenger.send_text(user, &self.notices.unreachable).await {
                    tracing::warn!(user = %user, "failed to send unreachable notice: {e}");
                }
                return Outcome::DeliveryFailed;
            }
        };

        self.threads
            .record(ThreadEntry::new(self.group, delivered.message_id, user))
            .await;
        gate.try_arm(user);

        tracing::info!(
            user = %user,
            group_message_id = delivered.message_id.0,
            "forwarded to group"
        );
        Outcome::Forwarded {
            group_message_id: delivered.message_id,
        }
    }

    async fn send_notice(&self, chat_id: ChatId, text: &str, ephemeral: bool) -> Result<()> {
        let sent = self.messenger.send_text(chat_id, text).await?;
        if ephemeral {
            if let Some(ttl) = self.notice_ttl {
                schedule_delete(self.messenger.clone(), sent, ttl);
            }
        }
        Ok(())
    }
}

/// Best-effort deletion of a notice after `ttl`, keeping the user's chat clean.
fn schedule_delete(messenger: Arc<dyn MessagingPort>, msg: MessageRef, ttl: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(ttl).await;
        if let Err(e) = messenger.delete_message(msg).await {
            tracing::debug!(chat = %msg.chat_id, "failed to delete notice: {e}");
        }
    });
}

/// The line posted in the admin group for a user's DM.
pub fn compose_group_line(display_name: Option<&str>, handle: Option<&str>, text: &str) -> String {
    let name = display_name
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown");
    let handle = handle
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|h| format!(" (@{h})"))
        .unwrap_or_default();
    format!("User: {name}{handle}\n\n{text}")
}
