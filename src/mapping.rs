use chrono::NaiveDate;

use crate::dao::WarehouseRow;
use crate::types::{ContentRecord, ContentType};

/// Runtime columns derived from free-text runtime such as `"90 min"` or `"3 Seasons"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParsedRuntime {
    pub movie_runtime_minutes: Option<i64>,
    pub tv_show_seasons: Option<i64>,
}

pub fn parse_runtime(content_type: &ContentType, runtime: Option<&str>) -> ParsedRuntime {
    let Some(text) = runtime.map(str::trim).filter(|t| !t.is_empty()) else {
        return ParsedRuntime::default();
    };
    match content_type {
        ContentType::Movie => ParsedRuntime {
            movie_runtime_minutes: number_before(text, &[" mins", " min"]),
            tv_show_seasons: None,
        },
        ContentType::TvShow => ParsedRuntime {
            movie_runtime_minutes: None,
            tv_show_seasons: number_before(text, &[" Seasons", " Season"]),
        },
        ContentType::Other(_) => ParsedRuntime::default(),
    }
}

// Longer suffixes first so "mins" is not read as "min" + trailing "s".
fn number_before(text: &str, suffixes: &[&str]) -> Option<i64> {
    suffixes
        .iter()
        .find_map(|suffix| text.strip_suffix(suffix))
        .and_then(|n| n.trim().parse::<i64>().ok())
}

/// Accepts `YYYY-MM-DD` or any timestamp that starts with one.
pub fn parse_added_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Map a raw warehouse row into a record. Rows without a usable added date yield `None`.
pub fn record_from_row(row: WarehouseRow) -> Option<ContentRecord> {
    let added_date = row.added_date.as_deref().and_then(parse_added_date)?;
    let content_type = ContentType::from(row.content_type);
    let runtime = parse_runtime(&content_type, row.runtime.as_deref());
    Some(ContentRecord {
        title_id: row.title_id,
        title: row.title_text.unwrap_or_default(),
        content_type,
        streaming_service: row.streaming_service,
        added_date,
        imdb_score: row.imdb_score,
        release_year: row.release_year,
        tv_rating: row.tv_rating.filter(|s| !s.trim().is_empty()),
        genre_name: row.genre_name.filter(|s| !s.trim().is_empty()),
        movie_runtime_minutes: runtime.movie_runtime_minutes,
        tv_show_seasons: runtime.tv_show_seasons,
    })
}
