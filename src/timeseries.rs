//! Addition counts per streaming service per time bucket.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    /// First day of the bucket containing `date`. Weeks start on Monday.
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Daily => date,
            Granularity::Weekly => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Granularity::Monthly => date.with_day(1).unwrap_or(date),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Granularity::Daily => "Daily",
            Granularity::Weekly => "Weekly",
            Granularity::Monthly => "Monthly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

impl FromStr for Granularity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "daily" | "day" | "d" => Ok(Self::Daily),
            "weekly" | "week" | "w" => Ok(Self::Weekly),
            "monthly" | "month" | "m" => Ok(Self::Monthly),
            other => Err(anyhow!(
                "unknown granularity `{}` (expected daily, weekly, monthly)",
                other
            )),
        }
    }
}

/// Inclusive date range. A range with `start > end` admits nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self { Self { start, end } }

    pub fn contains(&self, date: NaiveDate) -> bool { self.start <= date && date <= self.end }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionBucket {
    pub start: NaiveDate,
    /// One entry per retained service, zero-filled.
    pub counts: BTreeMap<String, u64>,
}

impl AdditionBucket {
    pub fn total(&self) -> u64 { self.counts.values().sum() }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionSeries {
    pub granularity: Granularity,
    /// Services with at least one addition in range, sorted.
    pub services: Vec<String>,
    pub buckets: Vec<AdditionBucket>,
}

impl AdditionSeries {
    pub fn is_empty(&self) -> bool { self.buckets.is_empty() }
}

/// Count `(date, service)` addition events per bucket and service.
///
/// Only events inside `range` and for a service in `selected` are counted.
/// The result has one row per bucket that saw at least one addition, in
/// ascending order, and one column per service whose total is non-zero.
/// Selected services without any in-range events do not appear at all.
pub fn count_additions<'a, I>(
    events: I,
    range: &DateRange,
    selected: &BTreeSet<String>,
    granularity: Granularity,
) -> AdditionSeries
where
    I: IntoIterator<Item = (NaiveDate, &'a str)>,
{
    let mut grouped: BTreeMap<NaiveDate, BTreeMap<&'a str, u64>> = BTreeMap::new();
    let mut present: BTreeSet<&'a str> = BTreeSet::new();

    for (date, service) in events {
        if !range.contains(date) || !selected.contains(service) {
            continue;
        }
        let bucket = granularity.bucket_start(date);
        *grouped.entry(bucket).or_default().entry(service).or_insert(0) += 1;
        present.insert(service);
    }

    let buckets = grouped
        .into_iter()
        .map(|(start, per_service)| AdditionBucket {
            start,
            counts: present
                .iter()
                .map(|s| (s.to_string(), per_service.get(s).copied().unwrap_or(0)))
                .collect(),
        })
        .collect();

    AdditionSeries {
        granularity,
        services: present.into_iter().map(str::to_string).collect(),
        buckets,
    }
}
