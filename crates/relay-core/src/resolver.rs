use std::{fmt, sync::Arc, sync::OnceLock};

use regex::Regex;

use crate::{
    domain::ChatId,
    messaging::types::RepliedMessage,
    threads::ThreadStore,
};

/// Which strategy produced a resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    Secondary,
    ThreadStore,
    LegacyMarker,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Secondary => "secondary",
            Strategy::ThreadStore => "thread_store",
            Strategy::LegacyMarker => "legacy_marker",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub user: ChatId,
    pub strategy: Strategy,
}

/// Maps an admin's reply in the group back to the user the replied-to message came from.
///
/// Strategies run in a fixed order and the first hit wins:
/// 1. secondary store (when configured)
/// 2. file-backed thread store
/// 3. a `User <N>` marker in the replied-to text
///
/// The caller guarantees the reply happened in the admin group and targets a bot message.
pub struct ReplyResolver {
    threads: Arc<ThreadStore>,
}

impl ReplyResolver {
    pub fn new(threads: Arc<ThreadStore>) -> Self {
        Self { threads }
    }

    pub async fn resolve(&self, group: ChatId, replied_to: &RepliedMessage) -> Option<Resolution> {
        let group_key = group.to_string();

        if let Some(secondary) = self.threads.secondary() {
            match secondary.query_by_key(&group_key, replied_to.id).await {
                Ok(Some(entry)) => {
                    return Some(Resolution {
                        user: entry.user(),
                        strategy: Strategy::Secondary,
                    })
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        message_id = replied_to.id.0,
                        "secondary store lookup failed: {e}"
                    );
                }
            }
        }

        if let Some(user) = self.threads.lookup(&group_key, replied_to.id) {
            return Some(Resolution {
                user,
                strategy: Strategy::ThreadStore,
            });
        }

        // Last resort. Admin-typed text containing "User <N>" can false-positive here.
        replied_to
            .text
            .as_deref()
            .and_then(parse_user_marker)
            .map(|user| Resolution {
                user,
                strategy: Strategy::LegacyMarker,
            })
    }
}

/// Extract `N` from the first `User <N>` marker (signed integer) in `text`.
pub fn parse_user_marker(text: &str) -> Option<ChatId> {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    let re = MARKER.get_or_init(|| Regex::new(r"User\s*<(-?\d+)>").expect("valid regex"));

    let caps = re.captures(text)?;
    caps.get(1)?.as_str().parse::<i64>().ok().map(ChatId)
}
