use std::sync::Arc;

use crate::{
    domain::{ChatId, MessageId},
    threads::{FileThreadStore, SecondaryStore, ThreadEntry},
};

/// Thread store facade: the file store is authoritative, the secondary store mirrors it.
pub struct ThreadStore {
    file: FileThreadStore,
    secondary: Option<Arc<dyn SecondaryStore>>,
}

impl ThreadStore {
    pub fn new(file: FileThreadStore, secondary: Option<Arc<dyn SecondaryStore>>) -> Self {
        Self { file, secondary }
    }

    pub fn file(&self) -> &FileThreadStore {
        &self.file
    }

    /// The secondary store, if one is configured. Only the resolver reads from it.
    pub fn secondary(&self) -> Option<&Arc<dyn SecondaryStore>> {
        self.secondary.as_ref()
    }

    /// Persist an entry to the file and, if configured, the secondary store.
    ///
    /// Never fails: the message is already delivered at this point, so a lost mapping only
    /// degrades later reply resolution.
    pub async fn record(&self, entry: ThreadEntry) {
        if let Err(e) = self.file.append(&entry) {
            tracing::error!(
                path = %self.file.path().display(),
                group_message_id = entry.group_message_id,
                user = entry.user_chat_id,
                "thread store write failed: {e}"
            );
        }

        if let Some(secondary) = &self.secondary {
            if let Err(e) = secondary.insert(&entry).await {
                tracing::warn!(
                    group_message_id = entry.group_message_id,
                    user = entry.user_chat_id,
                    "secondary store insert failed: {e}"
                );
            }
        }
    }

    /// Look up the file-backed index only.
    pub fn lookup(&self, group_chat_id: &str, group_message_id: MessageId) -> Option<ChatId> {
        self.file.lookup(group_chat_id, group_message_id)
    }
}
