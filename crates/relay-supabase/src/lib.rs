//! Supabase adapter (secondary thread store).
//!
//! Talks to the PostgREST API of a `message_threads` table with columns
//! `group_chat_id`, `group_message_id`, `user_chat_id`.

use async_trait::async_trait;

use relay_core::{
    config::SupabaseConfig,
    domain::MessageId,
    errors::Error,
    threads::{SecondaryStore, ThreadEntry},
    Result,
};

const TABLE: &str = "message_threads";

#[derive(Clone, Debug)]
pub struct SupabaseThreadStore {
    base_url: String,
    service_key: String,
    http: reqwest::Client,
}

impl SupabaseThreadStore {
    pub fn new(cfg: &SupabaseConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| Error::External(format!("supabase client build error: {e}")))?;
        Ok(Self {
            base_url: cfg.url.trim_end_matches('/').to_string(),
            service_key: cfg.service_key.clone(),
            http,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{TABLE}", self.base_url)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

#[async_trait]
impl SecondaryStore for SupabaseThreadStore {
    async fn insert(&self, entry: &ThreadEntry) -> Result<()> {
        let resp = self
            .authed(self.http.post(self.table_url()))
            .header("Prefer", "return=minimal")
            .json(entry)
            .send()
            .await
            .map_err(|e| Error::External(format!("supabase request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "supabase insert failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        tracing::debug!(
            group_message_id = entry.group_message_id,
            "thread entry mirrored to supabase"
        );
        Ok(())
    }

    async fn query_by_key(
        &self,
        group_chat_id: &str,
        group_message_id: MessageId,
    ) -> Result<Option<ThreadEntry>> {
        let resp = self
            .authed(self.http.get(self.table_url()))
            .query(&key_query(group_chat_id, group_message_id))
            .send()
            .await
            .map_err(|e| Error::External(format!("supabase request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "supabase query failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let v: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("supabase json error: {e}")))?;

        parse_rows(v)
    }
}

fn key_query(group_chat_id: &str, group_message_id: MessageId) -> Vec<(&'static str, String)> {
    vec![
        ("select", "group_chat_id,group_message_id,user_chat_id".to_string()),
        ("group_chat_id", format!("eq.{group_chat_id}")),
        ("group_message_id", format!("eq.{}", group_message_id.0)),
        ("limit", "1".to_string()),
    ]
}

/// PostgREST answers with a JSON array of rows; the first one is the match.
fn parse_rows(v: serde_json::Value) -> Result<Option<ThreadEntry>> {
    let serde_json::Value::Array(rows) = v else {
        return Err(Error::External(
            "supabase returned a non-array response".to_string(),
        ));
    };
    match rows.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}
