// Hand-off to the rendering layer: CSV per table, one JSON document, and a
// plain-text preview for the terminal.
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use crate::delta::{DeltaValue, MetricDelta};
use crate::error::Result;
use crate::pipeline::Report;
use crate::util::{format_int, format_pct};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Write every table plus `report.json` into `dir`, returning the paths.
pub fn write_report(dir: &Path, report: &Report) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let t = &report.tables;
    let tables = [
        ("monthly_counts.csv", &t.monthly_counts),
        ("monthly_mean_closure.csv", &t.monthly_mean_closure),
        ("product_monthly.csv", &t.product_monthly),
        ("client_monthly.csv", &t.client_monthly),
        ("product_monthly_mean_closure.csv", &t.product_monthly_mean_closure),
    ];
    let mut written = Vec::with_capacity(tables.len() + 2);
    for (name, rows) in tables {
        let path = dir.join(name);
        write_csv(&path, rows)?;
        written.push(path);
    }
    let weekly = dir.join("weekly_counts.csv");
    write_csv(&weekly, &t.weekly_counts)?;
    written.push(weekly);

    let json = dir.join("report.json");
    write_json(&json, report)?;
    written.push(json);
    log::info!("Wrote {} files to {}", written.len(), dir.display());
    Ok(written)
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

pub fn format_delta(value: &DeltaValue) -> String {
    match value {
        DeltaValue::Available { pct } => format_pct(*pct),
        DeltaValue::Unavailable { .. } => "n/a (insufficient historical data)".to_string(),
    }
}

pub fn metric_line(m: &MetricDelta) -> String {
    let label = match &m.category {
        Some(c) => format!("{} [{}]", m.metric, c),
        None => m.metric.clone(),
    };
    let current = m
        .current
        .map(format_int)
        .unwrap_or_else(|| "no data".to_string());
    format!(
        "{}: {} (MoM {}, YoY {})",
        label,
        current,
        format_delta(&m.month_over_month),
        format_delta(&m.year_over_year)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use crate::types::Period;

    #[test]
    fn test_metric_line() {
        let m = MetricDelta {
            metric: "tickets_opened".to_string(),
            category: Some("Portal".to_string()),
            period: Period::new(2024, 5),
            current: Some(1200),
            month_over_month: DeltaValue::Available { pct: 25.0 },
            year_over_year: DeltaValue::Unavailable {
                reason: "x".to_string(),
            },
        };
        assert_eq!(
            metric_line(&m),
            "tickets_opened [Portal]: 1,200 (MoM +25.0%, YoY n/a (insufficient historical data))"
        );
    }

    #[test]
    fn test_write_report_creates_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReportConfig {
            current_period: Some(Period::new(2024, 5)),
            ..ReportConfig::default()
        };
        let report = crate::pipeline::run(&[], &config);
        let written = write_report(dir.path(), &report).unwrap();
        assert_eq!(written.len(), 7);
        assert!(written.iter().all(|p| p.exists()));
        let json = std::fs::read_to_string(dir.path().join("report.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["current_period"], "2024-05");
    }
}
