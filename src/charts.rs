//! Chart-ready views over the cached catalogue.
//!
//! Everything here is a pure function of `(Filters, &Dataset)`; any front end
//! (the CLI, a web handler, a desktop shell) can call [`recompute`] on every
//! filter change and draw the resulting [`ChartData`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::stats::{BoxStats, Histogram};
use crate::timeseries::{count_additions, AdditionSeries, DateRange, Granularity};
use crate::types::{distinct_titles, ContentRecord, ContentType, Dataset};

pub const NO_DATA: &str = "No data available.";
pub const NO_MOVIE_DATA: &str = "No movie data available.";
pub const NO_TV_DATA: &str = "No TV show data available.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    pub services: BTreeSet<String>,
    pub content_types: BTreeSet<ContentType>,
    #[serde(flatten)]
    pub range: DateRange,
    pub granularity: Granularity,
}

impl Filters {
    /// Everything selected, spanning the earliest to the latest added date, daily buckets.
    pub fn defaults_for(dataset: &Dataset) -> Self {
        let (start, end) = dataset.date_bounds().unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
        Self {
            services: dataset.services().into_iter().collect(),
            content_types: dataset.content_types().into_iter().collect(),
            range: DateRange::new(start, end),
            granularity: Granularity::Daily,
        }
    }

    pub fn admits_type(&self, r: &ContentRecord) -> bool { self.content_types.contains(&r.content_type) }

    pub fn admits(&self, r: &ContentRecord) -> bool {
        self.admits_type(r)
            && self.services.contains(&r.streaming_service)
            && self.range.contains(r.added_date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSettings {
    pub top_genres: usize,
    pub score_bin_width: f64,
    pub year_bin_width: f64,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self { top_genres: 10, score_bin_width: 0.5, year_bin_width: 1.0 }
    }
}

/// A chart's data, or the explicit empty state to show in its place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Panel<T> {
    Ready { title: String, data: T },
    NoData { title: String, message: String },
}

impl<T> Panel<T> {
    fn from_option(title: impl Into<String>, data: Option<T>, message: &str) -> Self {
        match data {
            Some(data) => Panel::Ready { title: title.into(), data },
            None => Panel::NoData { title: title.into(), message: message.to_string() },
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Panel::Ready { title, .. } | Panel::NoData { title, .. } => title,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Panel::Ready { data, .. } => Some(data),
            Panel::NoData { .. } => None,
        }
    }

    pub fn is_empty(&self) -> bool { matches!(self, Panel::NoData { .. }) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingCount {
    pub rating: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingShare {
    pub rating: String,
    /// Percent of this rating's titles per service; sums to 100.
    pub shares: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreSlice {
    pub genre: String,
    pub count: u64,
    pub share: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSummary {
    pub rows: usize,
    pub titles: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub filters: Filters,
    pub scope: ScopeSummary,
    pub additions: Panel<AdditionSeries>,
    pub rating_counts: Panel<Vec<RatingCount>>,
    pub rating_share: Panel<Vec<RatingShare>>,
    pub imdb_scores: Panel<Histogram>,
    pub release_years: Panel<Histogram>,
    pub movie_runtimes: Panel<BTreeMap<String, BoxStats>>,
    pub tv_seasons: Panel<BTreeMap<String, BoxStats>>,
    pub top_genres: Panel<Vec<GenreSlice>>,
}

pub fn recompute(filters: &Filters, dataset: &Dataset) -> ChartData {
    recompute_with(filters, dataset, &ChartSettings::default())
}

pub fn recompute_with(filters: &Filters, dataset: &Dataset, settings: &ChartSettings) -> ChartData {
    let scoped: Vec<&ContentRecord> = dataset.records.iter().filter(|r| filters.admits(r)).collect();
    let titles = distinct_titles(scoped.iter().copied());

    ChartData {
        filters: filters.clone(),
        scope: ScopeSummary { rows: scoped.len(), titles: titles.len() },
        additions: additions_panel(filters, dataset),
        rating_counts: Panel::from_option("Distribution of TV Ratings", rating_counts(&titles), NO_DATA),
        rating_share: Panel::from_option(
            "TV Ratings Distribution by Streaming Service",
            rating_share(&titles),
            NO_DATA,
        ),
        imdb_scores: Panel::from_option(
            "IMDB Score Distribution",
            Histogram::build(
                titles.iter().filter_map(|r| Some((r.streaming_service.as_str(), r.imdb_score?))),
                settings.score_bin_width,
            ),
            NO_DATA,
        ),
        release_years: Panel::from_option(
            "Release Year Distribution",
            Histogram::build(
                titles.iter().filter_map(|r| Some((r.streaming_service.as_str(), r.release_year? as f64))),
                settings.year_bin_width,
            ),
            NO_DATA,
        ),
        movie_runtimes: Panel::from_option(
            "Movie Runtime Distribution (minutes)",
            box_by_service(&titles, |r| match r.content_type {
                ContentType::Movie => r.movie_runtime_minutes,
                _ => None,
            }),
            NO_MOVIE_DATA,
        ),
        tv_seasons: Panel::from_option(
            "TV Show Seasons Distribution",
            box_by_service(&titles, |r| match r.content_type {
                ContentType::TvShow => r.tv_show_seasons,
                _ => None,
            }),
            NO_TV_DATA,
        ),
        top_genres: Panel::from_option(
            format!("Top {} Genres", settings.top_genres),
            top_genres(&scoped, settings.top_genres),
            NO_DATA,
        ),
    }
}

fn additions_panel(filters: &Filters, dataset: &Dataset) -> Panel<AdditionSeries> {
    let typed = distinct_titles(dataset.records.iter().filter(|r| filters.admits_type(r)));
    let series = count_additions(
        typed.iter().map(|r| (r.added_date, r.streaming_service.as_str())),
        &filters.range,
        &filters.services,
        filters.granularity,
    );
    let title = format!("Content Added {}", filters.granularity.label());
    Panel::from_option(title, Some(series).filter(|s| !s.is_empty()), NO_DATA)
}

fn rating_counts(titles: &[&ContentRecord]) -> Option<Vec<RatingCount>> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for rating in titles.iter().filter_map(|r| r.tv_rating.as_deref()) {
        *counts.entry(rating).or_insert(0) += 1;
    }
    if counts.is_empty() {
        return None;
    }
    let mut out: Vec<RatingCount> = counts
        .into_iter()
        .map(|(rating, count)| RatingCount { rating: rating.to_string(), count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.rating.cmp(&b.rating)));
    Some(out)
}

fn rating_share(titles: &[&ContentRecord]) -> Option<Vec<RatingShare>> {
    let mut grid: BTreeMap<&str, BTreeMap<&str, u64>> = BTreeMap::new();
    let mut services: BTreeSet<&str> = BTreeSet::new();
    for r in titles {
        let Some(rating) = r.tv_rating.as_deref() else { continue };
        *grid.entry(rating).or_default().entry(r.streaming_service.as_str()).or_insert(0) += 1;
        services.insert(r.streaming_service.as_str());
    }
    if grid.is_empty() {
        return None;
    }
    let rows = grid
        .into_iter()
        .map(|(rating, per_service)| {
            let total: u64 = per_service.values().sum();
            let shares = services
                .iter()
                .map(|s| {
                    let n = per_service.get(s).copied().unwrap_or(0);
                    (s.to_string(), n as f64 / total as f64 * 100.0)
                })
                .collect();
            RatingShare { rating: rating.to_string(), shares }
        })
        .collect();
    Some(rows)
}

fn box_by_service<F>(titles: &[&ContentRecord], value: F) -> Option<BTreeMap<String, BoxStats>>
where
    F: Fn(&ContentRecord) -> Option<i64>,
{
    let mut grouped: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in titles {
        if let Some(v) = value(*r) {
            grouped.entry(r.streaming_service.as_str()).or_default().push(v as f64);
        }
    }
    let out: BTreeMap<String, BoxStats> = grouped
        .into_iter()
        .filter_map(|(s, vals)| BoxStats::from_values(vals).map(|b| (s.to_string(), b)))
        .collect();
    Some(out).filter(|m| !m.is_empty())
}

// Genre counts keep the genre fan-out: a title in three genres counts once in each.
fn top_genres(scoped: &[&ContentRecord], limit: usize) -> Option<Vec<GenreSlice>> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for genre in scoped.iter().filter_map(|r| r.genre_name.as_deref()) {
        *counts.entry(genre).or_insert(0) += 1;
    }
    let mut ranked: Vec<(&str, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(limit);
    let shown: u64 = ranked.iter().map(|(_, n)| n).sum();
    if shown == 0 {
        return None;
    }
    Some(
        ranked
            .into_iter()
            .map(|(genre, count)| GenreSlice {
                genre: genre.to_string(),
                count,
                share: count as f64 / shown as f64 * 100.0,
            })
            .collect(),
    )
}
