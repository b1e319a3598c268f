use std::{
    collections::HashMap,
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use crate::{
    domain::{ChatId, MessageId},
    threads::ThreadEntry,
    Result,
};

type Key = (String, i32);

/// Append-only JSON Lines store with an in-memory index.
///
/// The whole file is read once at [`FileThreadStore::open`]; afterwards every entry is
/// appended as one line. For a duplicate key the first recorded entry wins.
pub struct FileThreadStore {
    path: PathBuf,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    index: HashMap<Key, ChatId>,
    /// The file may end in a partial line (crash mid-write, failed append).
    /// The next append starts on a fresh line.
    torn_tail: bool,
}

impl FileThreadStore {
    /// Load all entries from `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(txt) => State {
                index: parse_index(&path, &txt),
                torn_tail: !txt.is_empty() && !txt.ends_with('\n'),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => State::default(),
            Err(e) => return Err(e.into()),
        };

        if state.torn_tail {
            tracing::warn!(path = %path.display(), "thread file ends in a partial line");
        }
        tracing::info!(path = %path.display(), entries = state.index.len(), "thread store loaded");
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lookup(&self, group_chat_id: &str, group_message_id: MessageId) -> Option<ChatId> {
        self.lock()
            .index
            .get(&(group_chat_id.to_string(), group_message_id.0))
            .copied()
    }

    /// Append one entry. The index is only updated once the line is on disk.
    pub fn append(&self, entry: &ThreadEntry) -> Result<()> {
        let mut state = self.lock();
        let key = (entry.group_chat_id.clone(), entry.group_message_id);
        if state.index.contains_key(&key) {
            tracing::warn!(
                group = %entry.group_chat_id,
                message_id = entry.group_message_id,
                "thread entry already recorded; keeping the first one"
            );
            return Ok(());
        }

        let mut line = String::new();
        if state.torn_tail {
            line.push('\n');
        }
        line.push_str(&serde_json::to_string(entry)?);
        line.push('\n');

        if let Err(e) = self.write_line(&line) {
            // Part of the line may have reached the disk.
            state.torn_tail = true;
            return Err(e);
        }

        state.torn_tail = false;
        state.index.insert(key, entry.user());
        Ok(())
    }

    fn write_line(&self, line: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_index(path: &Path, txt: &str) -> HashMap<Key, ChatId> {
    let mut index = HashMap::new();
    for (n, line) in txt.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ThreadEntry>(line) {
            Ok(entry) => {
                index
                    .entry((entry.group_chat_id.clone(), entry.group_message_id))
                    .or_insert(entry.user());
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), line = n + 1, "skipping bad thread entry: {e}");
            }
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn tmp(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_nanos();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}"))
    }

    #[test]
    fn missing_file_is_empty() {
        let store = FileThreadStore::open(tmp("threads-missing").join("threads.jsonl")).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.lookup("-100", MessageId(1)), None);
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = tmp("threads-reopen");
        let path = dir.join("data/threads.jsonl");

        let store = FileThreadStore::open(&path).unwrap();
        store
            .append(&ThreadEntry::new(ChatId(-100), MessageId(5), ChatId(111)))
            .unwrap();
        store
            .append(&ThreadEntry::new(ChatId(-100), MessageId(6), ChatId(222)))
            .unwrap();
        assert_eq!(store.lookup("-100", MessageId(5)), Some(ChatId(111)));

        let reopened = FileThreadStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.lookup("-100", MessageId(6)), Some(ChatId(222)));
        assert_eq!(reopened.lookup("-999", MessageId(6)), None);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn first_entry_wins_for_duplicate_keys() {
        let dir = tmp("threads-dup");
        let path = dir.join("threads.jsonl");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            &path,
            concat!(
                "{\"group_chat_id\":\"-100\",\"group_message_id\":1,\"user_chat_id\":10}\n",
                "not json\n",
                "\n",
                "{\"group_chat_id\":\"-100\",\"group_message_id\":1,\"user_chat_id\":20}\n",
            ),
        )
        .unwrap();

        let store = FileThreadStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup("-100", MessageId(1)), Some(ChatId(10)));

        store
            .append(&ThreadEntry::new(ChatId(-100), MessageId(1), ChatId(30)))
            .unwrap();
        assert_eq!(store.lookup("-100", MessageId(1)), Some(ChatId(10)));
        let lines = fs::read_to_string(&path).unwrap().lines().count();
        assert_eq!(lines, 4);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_write_leaves_index_untouched() {
        let dir = tmp("threads-fail");
        fs::create_dir_all(&dir).unwrap();
        // A directory where the file should be makes the append fail.
        let path = dir.join("threads.jsonl");
        fs::create_dir_all(&path).unwrap();

        let store = FileThreadStore {
            path: path.clone(),
            state: Mutex::new(State::default()),
        };
        assert!(store
            .append(&ThreadEntry::new(ChatId(-100), MessageId(1), ChatId(10)))
            .is_err());
        assert_eq!(store.lookup("-100", MessageId(1)), None);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn append_after_partial_last_line_survives_reopen() {
        let dir = tmp("threads-torn");
        let path = dir.join("threads.jsonl");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            &path,
            concat!(
                "{\"group_chat_id\":\"-100\",\"group_message_id\":1,\"user_chat_id\":10}\n",
                "{\"group_chat_id\":\"-100\",\"group_mes",
            ),
        )
        .unwrap();

        let store = FileThreadStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
        store
            .append(&ThreadEntry::new(ChatId(-100), MessageId(2), ChatId(20)))
            .unwrap();
        store
            .append(&ThreadEntry::new(ChatId(-100), MessageId(3), ChatId(30)))
            .unwrap();

        let reopened = FileThreadStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 3);
        assert_eq!(reopened.lookup("-100", MessageId(1)), Some(ChatId(10)));
        assert_eq!(reopened.lookup("-100", MessageId(2)), Some(ChatId(20)));
        assert_eq!(reopened.lookup("-100", MessageId(3)), Some(ChatId(30)));
        assert!(fs::read_to_string(&path).unwrap().ends_with('\n'));

        let _ = fs::remove_dir_all(&dir);
    }
}
