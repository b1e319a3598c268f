//! Durable thread mapping: which forwarded group message belongs to which user.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{ChatId, MessageId},
    Result,
};

mod file;
mod store;

pub use file::FileThreadStore;
pub use store::ThreadStore;

/// "This message in the admin group was forwarded from this user."
///
/// Field names match the `message_threads` table of the secondary store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadEntry {
    pub group_chat_id: String,
    pub group_message_id: i32,
    pub user_chat_id: i64,
}

impl ThreadEntry {
    pub fn new(group: ChatId, group_message_id: MessageId, user: ChatId) -> Self {
        Self {
            group_chat_id: group.to_string(),
            group_message_id: group_message_id.0,
            user_chat_id: user.0,
        }
    }

    pub fn user(&self) -> ChatId {
        ChatId(self.user_chat_id)
    }
}

/// Optional network-backed store that mirrors the file store.
///
/// Implementations may fail or be slow; callers treat every error as a miss.
#[async_trait]
pub trait SecondaryStore: Send + Sync {
    async fn insert(&self, entry: &ThreadEntry) -> Result<()>;

    async fn query_by_key(
        &self,
        group_chat_id: &str,
        group_message_id: MessageId,
    ) -> Result<Option<ThreadEntry>>;
}
