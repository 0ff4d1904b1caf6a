pub mod cache;
pub mod charts;
pub mod config;
pub mod dao;
pub mod db;
pub mod mapping;
pub mod stats;
pub mod storage;
pub mod timeseries;
pub mod types;
pub mod warehouse;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::charts::{recompute, recompute_with, ChartData, ChartSettings, Filters, Panel};
    pub use crate::config::Config;
    pub use crate::timeseries::{count_additions, AdditionSeries, DateRange, Granularity};
    pub use crate::types::{ContentRecord, ContentType, Dataset};
    pub use crate::warehouse::{DataSource, Warehouse};
    pub use crate::{FilterOptions, StreamStats};
}

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::cache::DatasetCache;
use crate::charts::{recompute_with, ChartData, ChartSettings, Filters};
use crate::config::Config;
use crate::db::Database;
use crate::types::{ContentType, Dataset};
use crate::warehouse::{DataSource, Warehouse};

/// The choices a filter sidebar offers for the current dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub rows: usize,
    pub services: Vec<String>,
    pub content_types: Vec<ContentType>,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
}

impl FilterOptions {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let bounds = dataset.date_bounds();
        Self {
            rows: dataset.len(),
            services: dataset.services(),
            content_types: dataset.content_types(),
            earliest: bounds.map(|b| b.0),
            latest: bounds.map(|b| b.1),
        }
    }
}

/// Library entry point: a data source behind a TTL cache, plus chart settings.
pub struct StreamStats<S: DataSource = Warehouse> {
    source: S,
    cache: DatasetCache,
    store: Option<Database>,
    settings: ChartSettings,
}

impl StreamStats<Warehouse> {
    /// Connect to the configured warehouse and, unless disabled, the local snapshot store.
    /// An unreachable warehouse is an error; an unusable snapshot store only disables persistence.
    pub async fn connect(config: &Config) -> Result<Self> {
        let warehouse = Warehouse::connect(config.require_warehouse_url()?).await?;
        let mut cache = DatasetCache::new(config.ttl_secs);

        let store = if config.use_snapshot_store {
            match open_store(config.cache_url.as_deref()).await {
                Ok(db) => {
                    cache = cache.with_store(Arc::new(db.clone()));
                    Some(db)
                }
                Err(e) => {
                    warn!(error = %e, "snapshot store unavailable; caching in memory only");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self { source: warehouse, cache, store, settings: config.charts.clone() })
    }
}

impl<S: DataSource> StreamStats<S> {
    pub fn with_source(source: S, cache: DatasetCache, settings: ChartSettings) -> Self {
        Self { source, cache, store: None, settings }
    }

    pub fn snapshot_store(&self) -> Option<&Database> { self.store.as_ref() }

    /// Cached catalogue; `refresh` bypasses both cache layers.
    pub async fn dataset(&mut self, refresh: bool) -> Result<Arc<Dataset>> {
        self.cache.get_or_fetch(&self.source, current_epoch(), refresh).await
    }

    pub async fn options(&mut self) -> Result<FilterOptions> {
        let dataset = self.dataset(false).await?;
        Ok(FilterOptions::from_dataset(&dataset))
    }

    pub async fn default_filters(&mut self) -> Result<Filters> {
        let dataset = self.dataset(false).await?;
        Ok(Filters::defaults_for(&dataset))
    }

    /// Full recompute of every chart from the cached dataset.
    pub async fn charts(&mut self, filters: &Filters) -> Result<ChartData> {
        let dataset = self.dataset(false).await?;
        Ok(recompute_with(filters, &dataset, &self.settings))
    }
}

async fn open_store(url: Option<&str>) -> Result<Database> {
    let db = Database::connect(url).await?;
    db.run_migrations().await?;
    Ok(db)
}

pub fn current_epoch() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
