use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cache::DEFAULT_TTL_SECS;
use crate::charts::ChartSettings;
use crate::db::ensure_sqlite_url;

/// Settings read from `config.toml`; every key is optional.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub warehouse_url: Option<String>,
    #[serde(default)]
    pub cache_url: Option<String>,
    #[serde(default)]
    pub ttl_secs: Option<i64>,
    #[serde(default)]
    pub top_genres: Option<usize>,
    #[serde(default)]
    pub score_bin_width: Option<f64>,
    #[serde(default)]
    pub year_bin_width: Option<f64>,
}

/// Resolved configuration: file, then `STREAMSTATS_*` env vars, then CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub warehouse_url: Option<String>,
    pub cache_url: Option<String>,
    pub use_snapshot_store: bool,
    pub ttl_secs: i64,
    pub charts: ChartSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            warehouse_url: None,
            cache_url: None,
            use_snapshot_store: true,
            ttl_secs: DEFAULT_TTL_SECS,
            charts: ChartSettings::default(),
        }
    }
}

impl Config {
    /// Load from an explicit path (which must exist) or from the default location (if present).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => read_file_config(p)?,
            None => match default_config_path() {
                Some(p) if p.exists() => read_file_config(&p)?,
                _ => FileConfig::default(),
            },
        };
        let mut cfg = Self::default();
        cfg.apply_file(file);
        cfg.apply_env(|k| std::env::var(k).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_file(&mut self, file: FileConfig) {
        if file.warehouse_url.is_some() { self.warehouse_url = file.warehouse_url; }
        if file.cache_url.is_some() { self.cache_url = file.cache_url; }
        if let Some(ttl) = file.ttl_secs { self.ttl_secs = ttl; }
        if let Some(n) = file.top_genres { self.charts.top_genres = n; }
        if let Some(w) = file.score_bin_width { self.charts.score_bin_width = w; }
        if let Some(w) = file.year_bin_width { self.charts.year_bin_width = w; }
    }

    pub fn apply_env<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = get("STREAMSTATS_WAREHOUSE_URL").filter(|s| !s.trim().is_empty()) {
            self.warehouse_url = Some(url);
        }
        if let Some(url) = get("STREAMSTATS_CACHE_URL").filter(|s| !s.trim().is_empty()) {
            self.cache_url = Some(url);
        }
        if let Some(ttl) = get("STREAMSTATS_TTL_SECS") {
            self.ttl_secs = ttl
                .trim()
                .parse()
                .with_context(|| format!("STREAMSTATS_TTL_SECS is not an integer: {ttl}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.ttl_secs <= 0 {
            return Err(anyhow!("ttl_secs must be positive (got {})", self.ttl_secs));
        }
        for (name, w) in [("score_bin_width", self.charts.score_bin_width), ("year_bin_width", self.charts.year_bin_width)] {
            if !(w.is_finite() && w > 0.0) {
                return Err(anyhow!("{name} must be a positive number (got {w})"));
            }
        }
        if self.charts.top_genres == 0 {
            return Err(anyhow!("top_genres must be at least 1"));
        }
        if let Some(url) = self.cache_url.as_deref().filter(|u| !u.trim().is_empty()) {
            ensure_sqlite_url(url)?;
        }
        Ok(())
    }

    pub fn require_warehouse_url(&self) -> Result<&str> {
        self.warehouse_url.as_deref().ok_or_else(|| {
            anyhow!("no warehouse configured: pass --warehouse-url, set STREAMSTATS_WAREHOUSE_URL, or add warehouse_url to config.toml")
        })
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config: {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing config: {}", path.display()))
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "streamstats", "streamstats").map(|p| p.config_dir().join("config.toml"))
}
