use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPayload {
    pub key: String,
    pub payload: String,
    pub fetched_at: i64,
    pub expires_at: i64,
}

/// Persisted snapshot cache. `get_snapshot` only returns entries with `expires_at > now`.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_snapshot(&self, key: &str, now: i64) -> Result<Option<CachedPayload>>;
    async fn put_snapshot(&self, entry: &CachedPayload) -> Result<()>;
}
