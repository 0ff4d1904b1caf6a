use anyhow::Result;
use async_trait::async_trait;
use sqlx::AnyPool;
use tracing::{info, warn};

use crate::dao;
use crate::db::{connect_pool, redact_url};
use crate::mapping::record_from_row;
use crate::types::Dataset;

/// Anything that can produce the full catalogue table.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Stable identity used to key persisted snapshots.
    fn cache_key(&self) -> String;
    async fn fetch_dataset(&self) -> Result<Dataset>;
}

/// Read-only SQL warehouse holding details, stream history and genre tables.
#[derive(Clone)]
pub struct Warehouse {
    pool: AnyPool,
    label: String,
}

impl Warehouse {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = connect_pool(url, 2).await?;
        Ok(Self { pool, label: redact_url(url) })
    }
}

#[async_trait]
impl DataSource for Warehouse {
    fn cache_key(&self) -> String { format!("dataset|{}", self.label) }

    async fn fetch_dataset(&self) -> Result<Dataset> {
        let rows = dao::fetch_active_rows(&self.pool).await?;
        let total = rows.len();
        let records: Vec<_> = rows.into_iter().filter_map(record_from_row).collect();
        let dropped = total - records.len();
        if dropped > 0 {
            warn!(dropped, "dropped catalogue rows without a usable added date");
        }
        info!(rows = records.len(), source = %self.label, "loaded catalogue from warehouse");
        Ok(Dataset::new(records))
    }
}
