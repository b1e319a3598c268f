use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{domain::ChatId, errors::Error, Result};

const DEFAULT_WELCOME: &str =
    "Send your message in one message. Our admins will receive it and reply to you here.";
const DEFAULT_ACK: &str = "We'll get back to you as soon as we can.";
const DEFAULT_WAITING: &str = "Waiting for admins to reply. You can only send another message after they've replied to your previous message.";
const DEFAULT_UNREACHABLE: &str =
    "Couldn't reach the admins right now. Please try again in a moment.";
const DEFAULT_WEBHOOK_SECRET: &str = "reply-bot-webhook";
const DEFAULT_THREADS_FILE: &str = "data/threads.jsonl";

/// Typed configuration for the relay bot.
#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: String,
    /// The single admin group every DM is forwarded into.
    pub group_id: ChatId,
    pub threads_file: PathBuf,
    pub supabase: Option<SupabaseConfig>,
    pub notices: Notices,
    /// When set, welcome/waiting notices are deleted after this delay.
    pub notice_ttl: Option<Duration>,
    pub transport: Transport,
}

/// Credentials for the optional secondary thread store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_key: String,
}

/// User-facing notice strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notices {
    pub welcome: String,
    pub ack: String,
    pub waiting: String,
    pub unreachable: String,
}

impl Default for Notices {
    fn default() -> Self {
        Self {
            welcome: DEFAULT_WELCOME.to_string(),
            ack: DEFAULT_ACK.to_string(),
            waiting: DEFAULT_WAITING.to_string(),
            unreachable: DEFAULT_UNREACHABLE.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transport {
    Polling,
    Webhook {
        port: u16,
        base_url: String,
        secret: String,
    },
}

impl Transport {
    /// Public URL Telegram should POST updates to.
    pub fn webhook_url(&self) -> Option<String> {
        match self {
            Transport::Polling => None,
            Transport::Webhook {
                base_url, secret, ..
            } => Some(format!("{}/{}", base_url.trim_end_matches('/'), secret)),
        }
    }
}

impl Config {
    /// Load from the process environment (after an optional `.env` file).
    pub fn load() -> Result<Self> {
        load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).and_then(non_empty);

        let bot_token = var("BOT_TOKEN")
            .ok_or_else(|| Error::Config("BOT_TOKEN is required".to_string()))?;

        let raw_group = var("GROUP_ID").ok_or_else(|| {
            Error::Config(
                "GROUP_ID is required (add bot to group, then get id from getUpdates)".to_string(),
            )
        })?;
        let group_id = raw_group
            .trim()
            .parse::<i64>()
            .map(ChatId)
            .map_err(|e| Error::Config(format!("GROUP_ID must be a numeric chat id: {e}")))?;

        let threads_file = var("THREADS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_THREADS_FILE));

        // Both credentials are needed; one without the other means file-only.
        let supabase = match (var("SUPABASE_URL"), var("SUPABASE_SERVICE_KEY")) {
            (Some(url), Some(service_key)) => Some(SupabaseConfig { url, service_key }),
            _ => None,
        };

        let defaults = Notices::default();
        let notices = Notices {
            welcome: var("WELCOME_MESSAGE").unwrap_or(defaults.welcome),
            ack: var("MESSAGE_AFTER").unwrap_or(defaults.ack),
            waiting: var("WAITING_MESSAGE").unwrap_or(defaults.waiting),
            unreachable: var("UNREACHABLE_MESSAGE").unwrap_or(defaults.unreachable),
        };

        let notice_ttl = match var("NOTICE_TTL_SECS") {
            Some(raw) => Some(Duration::from_secs(raw.trim().parse::<u64>().map_err(
                |e| Error::Config(format!("NOTICE_TTL_SECS must be a number of seconds: {e}")),
            )?)),
            None => None,
        };

        let transport = match (var("PORT"), var("WEBHOOK_BASE_URL")) {
            (Some(port), Some(base_url)) => Transport::Webhook {
                port: port
                    .trim()
                    .parse::<u16>()
                    .map_err(|e| Error::Config(format!("PORT must be a valid port: {e}")))?,
                base_url,
                secret: var("WEBHOOK_SECRET").unwrap_or_else(|| DEFAULT_WEBHOOK_SECRET.to_string()),
            },
            _ => Transport::Polling,
        };

        Ok(Self {
            bot_token,
            group_id,
            threads_file,
            supabase,
            notices,
            notice_ttl,
            transport,
        })
    }
}

/// Merge `./.env` into the process environment without overriding existing variables.
pub fn load_dotenv() {
    load_dotenv_if_present(Path::new(".env"));
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
