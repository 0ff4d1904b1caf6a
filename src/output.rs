use streamstats::charts::Panel;
use streamstats::timeseries::AdditionSeries;
use streamstats::FilterOptions;

/// Render a simple left-aligned table.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|c| c.chars().count())
                .max()
                .unwrap_or(0)
                .max(h.chars().count())
        })
        .collect();

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<width$}", width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header = line(headers.to_vec());
    let mut out = vec![header.clone(), "-".repeat(header.chars().count())];
    out.extend(rows.iter().map(|r| line(r.iter().map(String::as_str).collect())));
    out.join("\n")
}

pub fn render_additions(panel: &Panel<AdditionSeries>) -> String {
    let series = match panel {
        Panel::Ready { data, .. } => data,
        Panel::NoData { title, message } => return format!("{title}\n{message}"),
    };
    let mut headers = vec!["Date"];
    headers.extend(series.services.iter().map(String::as_str));
    headers.push("Total");

    let rows: Vec<Vec<String>> = series
        .buckets
        .iter()
        .map(|b| {
            let mut row = vec![b.start.to_string()];
            row.extend(series.services.iter().map(|s| b.counts.get(s).copied().unwrap_or(0).to_string()));
            row.push(b.total().to_string());
            row
        })
        .collect();

    format!("{}\n{}", panel.title(), render_table(&headers, &rows))
}

pub fn render_options(opts: &FilterOptions) -> String {
    let dates = match (opts.earliest, opts.latest) {
        (Some(a), Some(b)) => format!("{a} .. {b}"),
        _ => "none".to_string(),
    };
    let types: Vec<&str> = opts.content_types.iter().map(|t| t.as_str()).collect();
    let rows = vec![
        vec!["rows".to_string(), opts.rows.to_string()],
        vec!["services".to_string(), opts.services.join(", ")],
        vec!["content types".to_string(), types.join(", ")],
        vec!["added dates".to_string(), dates],
    ];
    render_table(&["Filter", "Available"], &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use streamstats::timeseries::{AdditionBucket, Granularity};

    #[test]
    fn table_aligns_columns() {
        let out = render_table(&["A", "Long"], &[vec!["xyz".into(), "1".into()]]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "A    Long");
        assert_eq!(lines[1], "---------");
        assert_eq!(lines[2], "xyz  1");
    }

    #[test]
    fn non_ascii_cells_align_by_character() {
        let rows = vec![vec!["Crunchyrôll".into(), "3".into()], vec!["Hulu".into(), "1".into()]];
        let out = render_table(&["Service", "N"], &rows);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Service      N");
        assert_eq!(lines[1], "-".repeat(14));
        assert_eq!(lines[2], "Crunchyrôll  3");
        assert_eq!(lines[3], "Hulu         1");
    }

    #[test]
    fn additions_table_lists_services_and_totals() {
        let counts: BTreeMap<String, u64> = [("Hulu".to_string(), 0), ("Netflix".to_string(), 2)].into();
        let panel = Panel::Ready {
            title: "Content Added Daily".to_string(),
            data: AdditionSeries {
                granularity: Granularity::Daily,
                services: vec!["Hulu".into(), "Netflix".into()],
                buckets: vec![AdditionBucket { start: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(), counts }],
            },
        };
        let out = render_additions(&panel);
        assert!(out.starts_with("Content Added Daily\n"));
        assert!(out.contains("Date        Hulu  Netflix  Total"));
        assert!(out.contains("2024-04-01  0     2        2"));
    }

    #[test]
    fn empty_additions_say_so() {
        let panel: Panel<AdditionSeries> = Panel::NoData { title: "Content Added Weekly".into(), message: "No data available.".into() };
        assert_eq!(render_additions(&panel), "Content Added Weekly\nNo data available.");
    }
}
