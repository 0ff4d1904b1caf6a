use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of catalogue entry. Warehouse values outside the two known kinds are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentType {
    Movie,
    TvShow,
    Other(String),
}

impl ContentType {
    pub fn as_str(&self) -> &str {
        match self {
            ContentType::Movie => "Movie",
            ContentType::TvShow => "TV Show",
            ContentType::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for ContentType {
    fn from(s: String) -> Self {
        match s.trim() {
            "Movie" => ContentType::Movie,
            "TV Show" => ContentType::TvShow,
            _ => ContentType::Other(s),
        }
    }
}

impl From<&str> for ContentType {
    fn from(s: &str) -> Self { ContentType::from(s.to_string()) }
}

impl From<ContentType> for String {
    fn from(ct: ContentType) -> Self { ct.as_str().to_string() }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// One active (title, service, genre) row as loaded from the warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub title_id: String,
    pub title: String,
    pub content_type: ContentType,
    pub streaming_service: String,
    pub added_date: NaiveDate,
    pub imdb_score: Option<f64>,
    pub release_year: Option<i64>,
    pub tv_rating: Option<String>,
    pub genre_name: Option<String>,
    pub movie_runtime_minutes: Option<i64>,
    pub tv_show_seasons: Option<i64>,
}

/// Read-only in-memory table of catalogue rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub records: Vec<ContentRecord>,
}

impl Dataset {
    pub fn new(records: Vec<ContentRecord>) -> Self { Self { records } }

    pub fn len(&self) -> usize { self.records.len() }
    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn services(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.streaming_service.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn content_types(&self) -> Vec<ContentType> {
        self.records
            .iter()
            .map(|r| r.content_type.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Earliest and latest added dates, or `None` for an empty table.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.added_date).min()?;
        let max = self.records.iter().map(|r| r.added_date).max()?;
        Some((min, max))
    }
}

/// Collapse the genre fan-out: keeps the first row per (title, service, added date).
pub fn distinct_titles<'a, I>(rows: I) -> Vec<&'a ContentRecord>
where
    I: IntoIterator<Item = &'a ContentRecord>,
{
    let mut seen: HashSet<(&str, &str, NaiveDate)> = HashSet::new();
    rows.into_iter()
        .filter(|r| seen.insert((r.title_id.as_str(), r.streaming_service.as_str(), r.added_date)))
        .collect()
}
