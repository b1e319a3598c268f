use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    domain::{ChatId, MessageRef},
    messaging::port::MessagingPort,
    Result,
};

/// Minimum gaps between outbound Bot API calls.
#[derive(Clone, Copy, Debug)]
pub struct Pacing {
    /// Between any two calls.
    pub any_call: Duration,
    /// Between two sends into the admin group. Every forwarded DM lands there, so a burst
    /// of users writing at once is the only traffic that can hit the group flood limit.
    pub group_send: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            any_call: Duration::from_millis(35),
            group_send: Duration::from_secs(1),
        }
    }
}

#[derive(Debug)]
struct Slots {
    any: Instant,
    group: Instant,
}

/// MessagingPort decorator that delays calls to stay under Telegram's flood limits.
///
/// Sends to user chats only wait for the short global gap; user chats see at most a
/// couple of messages per event. A call that fails is returned as-is and never retried.
pub struct PacedMessenger {
    inner: Arc<dyn MessagingPort>,
    group: ChatId,
    pacing: Pacing,
    slots: Mutex<Slots>,
}

impl PacedMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, group: ChatId, pacing: Pacing) -> Self {
        let now = Instant::now();
        Self {
            inner,
            group,
            pacing,
            slots: Mutex::new(Slots {
                any: now,
                group: now,
            }),
        }
    }

    async fn wait_turn(&self, group_send: bool) {
        let wait = {
            let mut slots = self.slots.lock().await;
            let now = Instant::now();
            let mut at = slots.any.max(now);
            if group_send {
                at = at.max(slots.group);
                slots.group = at + self.pacing.group_send;
            }
            slots.any = at + self.pacing.any_call;
            at.saturating_duration_since(now)
        };
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl MessagingPort for PacedMessenger {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        self.wait_turn(chat_id == self.group).await;
        self.inner.send_text(chat_id, text).await
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.wait_turn(false).await;
        self.inner.delete_message(msg).await
    }
}
