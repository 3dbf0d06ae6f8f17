//! Best-effort persistence of analysis results per browser session.
//!
//! Nothing here may fail a task call: write errors are logged and dropped, and
//! missing or corrupt data reads back as "nothing saved".

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::analysis::models::{HistoryItem, ResumeAnalysisResult};

/// History entries kept per session, newest first.
pub const MAX_HISTORY_ITEMS: usize = 20;

/// Upper bound on how long a save may hold up the analyze response.
pub const SAVE_TIMEOUT: Duration = Duration::from_secs(2);

const KEY_PREFIX: &str = "resumatch";

/// String-keyed storage of serialized blobs.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
    /// Prepends `value` to the list at `key`, keeping at most `max_len` items.
    async fn push_capped(&self, key: &str, value: &str, max_len: usize) -> Result<()>;
    async fn list(&self, key: &str) -> Result<Vec<String>>;
}

/// Redis-backed store. One managed multiplexed connection is opened on first use and
/// shared by every call; it reconnects on its own after a dropped link.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
    connection: Arc<OnceCell<ConnectionManager>>,
}

impl RedisStore {
    pub fn new(client: redis::Client) -> Self {
        Self {
            client,
            connection: Arc::new(OnceCell::new()),
        }
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                debug!("Opening Redis connection");
                ConnectionManager::new(self.client.clone()).await
            })
            .await?;
        Ok(manager.clone())
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn push_capped(&self, key: &str, value: &str, max_len: usize) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.lpush::<_, _, ()>(key, value).await?;
        let stop = isize::try_from(max_len).unwrap_or(isize::MAX) - 1;
        conn.ltrim::<_, ()>(key, 0, stop).await?;
        Ok(())
    }

    async fn list(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;
        Ok(conn.lrange(key, 0, -1).await?)
    }
}

/// The last analysis of a session, as restored on page load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSession {
    pub analysis: ResumeAnalysisResult,
    pub resume_text: Option<String>,
}

#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn save_analysis(
        &self,
        session_id: Uuid,
        analysis: &ResumeAnalysisResult,
        resume_text: &str,
        file_name: Option<&str>,
    ) {
        let item = HistoryItem {
            id: Uuid::new_v4(),
            date: Utc::now(),
            file_name: file_name.unwrap_or("Pasted text").to_string(),
            score: analysis.data.ats_score.overall_score,
            job_role: None,
        };

        let save = self.try_save(session_id, analysis, resume_text, &item);
        match tokio::time::timeout(SAVE_TIMEOUT, save).await {
            Ok(Ok(())) => debug!("Persisted analysis {} for session {}", item.id, session_id),
            Ok(Err(e)) => warn!("Failed to persist analysis for session {session_id}: {e:#}"),
            Err(_) => warn!(
                "Persisting analysis for session {session_id} timed out after {:?}",
                SAVE_TIMEOUT
            ),
        }
    }

    async fn try_save(
        &self,
        session_id: Uuid,
        analysis: &ResumeAnalysisResult,
        resume_text: &str,
        item: &HistoryItem,
    ) -> Result<()> {
        let analysis_json = serde_json::to_string(analysis)?;
        let item_json = serde_json::to_string(item)?;
        self.store
            .set(&analysis_key(session_id), &analysis_json)
            .await?;
        self.store
            .set(&resume_text_key(session_id), resume_text)
            .await?;
        self.store
            .push_capped(&history_key(session_id), &item_json, MAX_HISTORY_ITEMS)
            .await?;
        Ok(())
    }

    pub async fn load_session(&self, session_id: Uuid) -> Option<SavedSession> {
        let raw = match self.store.get(&analysis_key(session_id)).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read saved analysis for session {session_id}: {e:#}");
                return None;
            }
        };

        let analysis = match serde_json::from_str::<ResumeAnalysisResult>(&raw) {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("Ignoring corrupt saved analysis for session {session_id}: {e}");
                return None;
            }
        };

        let resume_text = self
            .store
            .get(&resume_text_key(session_id))
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to read saved resume text for session {session_id}: {e:#}");
                None
            });

        Some(SavedSession {
            analysis,
            resume_text,
        })
    }

    /// Clears the saved analysis and resume text. History is kept.
    pub async fn clear_session(&self, session_id: Uuid) {
        for key in [analysis_key(session_id), resume_text_key(session_id)] {
            if let Err(e) = self.store.remove(&key).await {
                warn!("Failed to remove {key}: {e:#}");
            }
        }
    }

    pub async fn history(&self, session_id: Uuid) -> Vec<HistoryItem> {
        let raw = match self.store.list(&history_key(session_id)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to read history for session {session_id}: {e:#}");
                return Vec::new();
            }
        };

        raw.iter()
            .filter_map(|entry| match serde_json::from_str::<HistoryItem>(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("Skipping corrupt history entry: {e}");
                    None
                }
            })
            .collect()
    }
}

fn analysis_key(session_id: Uuid) -> String {
    format!("{KEY_PREFIX}:{session_id}:analysis")
}

fn resume_text_key(session_id: Uuid) -> String {
    format!("{KEY_PREFIX}:{session_id}:resume_text")
}

fn history_key(session_id: Uuid) -> String {
    format!("{KEY_PREFIX}:{session_id}:history")
}

#[cfg(test)]
pub mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use anyhow::{bail, Result};
    use async_trait::async_trait;

    use super::KeyValueStore;

    /// In-process store for tests. `failing()` builds one whose every call errors,
    /// `stalled(d)` one whose every call first waits `d`.
    #[derive(Default)]
    pub struct MemoryStore {
        values: Mutex<HashMap<String, String>>,
        lists: Mutex<HashMap<String, Vec<String>>>,
        fail: bool,
        stall: Option<Duration>,
    }

    impl MemoryStore {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub fn stalled(delay: Duration) -> Self {
            Self {
                stall: Some(delay),
                ..Default::default()
            }
        }

        pub fn insert_raw(&self, key: &str, value: &str) {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }

        async fn check(&self) -> Result<()> {
            if let Some(delay) = self.stall {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                bail!("store unavailable");
            }
            Ok(())
        }
    }

    #[async_trait]
    impl KeyValueStore for MemoryStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.check().await?;
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            self.check().await?;
            self.insert_raw(key, value);
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.check().await?;
            self.values.lock().unwrap().remove(key);
            self.lists.lock().unwrap().remove(key);
            Ok(())
        }

        async fn push_capped(&self, key: &str, value: &str, max_len: usize) -> Result<()> {
            self.check().await?;
            let mut lists = self.lists.lock().unwrap();
            let list = lists.entry(key.to_string()).or_default();
            list.insert(0, value.to_string());
            list.truncate(max_len);
            Ok(())
        }

        async fn list(&self, key: &str) -> Result<Vec<String>> {
            self.check().await?;
            Ok(self
                .lists
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .unwrap_or_default())
        }
    }
}
