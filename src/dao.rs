use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::{AnyPool, Row};

/// Active catalogue rows: one per (title, service, genre). Runtime text is returned raw.
/// Casts keep DATE and NUMERIC warehouse columns decodable through the `Any` driver.
pub const ACTIVE_CATALOGUE_SQL: &str = "\
SELECT d.title_id, d.title_text,
       CAST(d.imdb_score AS DOUBLE PRECISION) AS imdb_score,
       d.type AS content_type,
       CAST(d.release_year AS BIGINT) AS release_year,
       d.tv_rating, sh.streaming_service, g.genre_name,
       CAST(sh.added_date AS TEXT) AS added_date,
       d.runtime
FROM details d
JOIN stream_history sh ON d.title_id = sh.title_id
JOIN title_genre tg ON d.title_id = tg.title_id
JOIN genres g ON tg.genre_id = g.genre_id
WHERE sh.current_status = 'true'";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseRow {
    pub title_id: String,
    pub title_text: Option<String>,
    pub imdb_score: Option<f64>,
    pub content_type: String,
    pub release_year: Option<i64>,
    pub tv_rating: Option<String>,
    pub streaming_service: String,
    pub genre_name: Option<String>,
    pub added_date: Option<String>,
    pub runtime: Option<String>,
}

// sqlx's `Any` driver refuses NULL for a checked `Option<T>` read, so nullable
// columns are decoded unchecked.
impl<'r> sqlx::FromRow<'r, AnyRow> for WarehouseRow {
    fn from_row(row: &'r AnyRow) -> sqlx::Result<Self> {
        Ok(Self {
            title_id: row.try_get("title_id")?,
            title_text: row.try_get_unchecked("title_text")?,
            imdb_score: row.try_get_unchecked("imdb_score")?,
            content_type: row.try_get("content_type")?,
            release_year: row.try_get_unchecked("release_year")?,
            tv_rating: row.try_get_unchecked("tv_rating")?,
            streaming_service: row.try_get("streaming_service")?,
            genre_name: row.try_get_unchecked("genre_name")?,
            added_date: row.try_get_unchecked("added_date")?,
            runtime: row.try_get_unchecked("runtime")?,
        })
    }
}

pub async fn fetch_active_rows(pool: &AnyPool) -> Result<Vec<WarehouseRow>> {
    let rows = sqlx::query_as::<_, WarehouseRow>(ACTIVE_CATALOGUE_SQL)
        .fetch_all(pool)
        .await
        .context("running active catalogue query")?;
    Ok(rows)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotStats {
    pub entries: u64,
    pub expired: u64,
}

pub async fn snapshot_stats(pool: &AnyPool, now: i64) -> Result<SnapshotStats> {
    let entries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM snapshot_cache")
        .fetch_one(pool)
        .await?;
    let expired: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM snapshot_cache WHERE expires_at <= ?")
        .bind(now)
        .fetch_one(pool)
        .await?;
    Ok(SnapshotStats { entries: entries.max(0) as u64, expired: expired.max(0) as u64 })
}

pub async fn clear_snapshots(pool: &AnyPool, prefix: Option<&str>) -> Result<u64> {
    let result = if let Some(p) = prefix {
        let like = format!("{}%", p);
        sqlx::query("DELETE FROM snapshot_cache WHERE key LIKE ?")
            .bind(like)
            .execute(pool)
            .await?
    } else {
        sqlx::query("DELETE FROM snapshot_cache")
            .execute(pool)
            .await?
    };
    Ok(result.rows_affected())
}
