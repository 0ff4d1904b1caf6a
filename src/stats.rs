use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Five-number summary with Tukey whiskers, the shape a box plot draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    /// `None` when there are no finite values.
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let inside = sorted.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence);
        let lower_whisker = inside.clone().next().unwrap_or(sorted[0]);
        let upper_whisker = inside.last().unwrap_or(sorted[sorted.len() - 1]);
        let outliers = sorted.iter().copied().filter(|v| *v < lo_fence || *v > hi_fence).collect();

        Some(Self {
            count: sorted.len(),
            min: sorted[0],
            q1,
            median,
            q3,
            max: sorted[sorted.len() - 1],
            lower_whisker,
            upper_whisker,
            outliers,
        })
    }
}

// Linear interpolation between closest ranks; `sorted` must be non-empty and ascending.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub counts: BTreeMap<String, u64>,
}

/// Per-service histogram over shared bins, with a box summary per service as the marginal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bin_width: f64,
    pub services: Vec<String>,
    pub bins: Vec<HistogramBin>,
    pub marginals: BTreeMap<String, BoxStats>,
}

/// Upper bound on bins per histogram; wider spans double the bin width until they fit.
pub const MAX_HISTOGRAM_BINS: usize = 1000;

impl Histogram {
    /// Bins are `[k*w, (k+1)*w)` from the minimum's bin to the maximum's; empty
    /// interior bins are kept. Non-positive widths fall back to 1.
    pub fn build<'a, I>(values: I, bin_width: f64) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut width = if bin_width.is_finite() && bin_width > 0.0 { bin_width } else { 1.0 };

        let mut by_service: BTreeMap<&'a str, Vec<f64>> = BTreeMap::new();
        for (service, v) in values.into_iter().filter(|(_, v)| v.is_finite()) {
            by_service.entry(service).or_default().push(v);
        }

        let all = by_service.values().flatten().copied();
        let lo = all.clone().reduce(f64::min)?;
        let hi = all.reduce(f64::max)?;
        while (hi / width).floor() - (lo / width).floor() >= MAX_HISTOGRAM_BINS as f64 {
            width *= 2.0;
        }

        let index = |v: f64| (v / width).floor() as i64;
        let first = index(lo);
        let last = index(hi);

        let services: Vec<String> = by_service.keys().map(|s| s.to_string()).collect();
        let mut bins: Vec<HistogramBin> = (first..=last)
            .map(|k| HistogramBin {
                start: k as f64 * width,
                end: (k + 1) as f64 * width,
                counts: services.iter().map(|s| (s.clone(), 0)).collect(),
            })
            .collect();

        for (service, vals) in &by_service {
            for v in vals {
                let slot = (index(*v) - first) as usize;
                if let Some(count) = bins[slot].counts.get_mut(*service) {
                    *count += 1;
                }
            }
        }

        let marginals = by_service
            .iter()
            .filter_map(|(s, vals)| BoxStats::from_values(vals.iter().copied()).map(|b| (s.to_string(), b)))
            .collect();

        Some(Self { bin_width: width, services, bins, marginals })
    }

    pub fn total(&self) -> u64 {
        self.bins.iter().flat_map(|b| b.counts.values()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quartiles_use_linear_interpolation() {
        let b = BoxStats::from_values([1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(b.q1, 1.75);
        assert_eq!(b.median, 2.5);
        assert_eq!(b.q3, 3.25);
        assert_eq!((b.min, b.max), (1.0, 4.0));
        assert_eq!(b.count, 4);
        assert!(b.outliers.is_empty());

        let single = BoxStats::from_values([42.0]).unwrap();
        assert_eq!((single.q1, single.median, single.q3), (42.0, 42.0, 42.0));
    }

    #[test]
    fn whiskers_exclude_outliers() {
        let b = BoxStats::from_values([90.0, 95.0, 100.0, 105.0, 110.0, 400.0]).unwrap();
        assert_eq!(b.outliers, vec![400.0]);
        assert_eq!(b.upper_whisker, 110.0);
        assert_eq!(b.lower_whisker, 90.0);
        assert_eq!(b.max, 400.0);
    }

    #[test]
    fn empty_or_nan_only_input_has_no_summary() {
        assert!(BoxStats::from_values(Vec::<f64>::new()).is_none());
        assert!(BoxStats::from_values([f64::NAN]).is_none());
    }

    #[test]
    fn histogram_keeps_empty_interior_bins() {
        let values = vec![("Netflix", 6.1), ("Netflix", 7.4), ("Hulu", 7.9), ("Hulu", 8.0)];
        let h = Histogram::build(values, 0.5).unwrap();
        let starts: Vec<f64> = h.bins.iter().map(|b| b.start).collect();
        assert_eq!(starts, vec![6.0, 6.5, 7.0, 7.5, 8.0]);
        assert_eq!(h.bins[1].counts["Netflix"], 0);
        assert_eq!(h.bins[2].counts["Netflix"], 1);
        assert_eq!(h.bins[3].counts["Hulu"], 1);
        assert_eq!(h.bins[4].counts["Hulu"], 1);
        assert_eq!(h.total(), 4);
        assert_eq!(h.services, vec!["Hulu".to_string(), "Netflix".to_string()]);
        assert!((h.marginals["Hulu"].median - 7.95).abs() < 1e-9);
    }

    #[test]
    fn histogram_of_nothing_is_none() {
        assert!(Histogram::build(Vec::<(&str, f64)>::new(), 1.0).is_none());
    }

    #[test]
    fn huge_spans_widen_bins_instead_of_exploding() {
        let h = Histogram::build(vec![("Netflix", 7.0), ("Netflix", 1e12)], 0.5).unwrap();
        assert!(h.bins.len() <= MAX_HISTOGRAM_BINS);
        assert!(h.bin_width > 0.5);
        assert_eq!(h.total(), 2);
        assert_eq!(h.bins[0].counts["Netflix"], 1);
        assert_eq!(h.bins[h.bins.len() - 1].counts["Netflix"], 1);
    }

    #[test]
    fn invalid_bin_width_falls_back_to_one() {
        let h = Histogram::build(vec![("Netflix", 1999.0), ("Netflix", 2001.0)], 0.0).unwrap();
        assert_eq!(h.bin_width, 1.0);
        assert_eq!(h.bins.len(), 3);
    }
}
