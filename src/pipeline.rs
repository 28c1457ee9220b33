// One parameterized pass from normalized tickets to the full report.
use chrono::Datelike;
use serde::Serialize;
use std::path::Path;

use crate::aggregate::{self, CategoryKey, InterestSet};
use crate::cache;
use crate::config::ReportConfig;
use crate::delta::{self, DeltaValue, MetricDelta};
use crate::error::Result;
use crate::types::{AggregateRow, DataWarning, Measure, Period, Ticket, WeeklyRow};

pub const METRIC_TICKETS_OPENED: &str = "tickets_opened";
pub const METRIC_DAYS_TO_CLOSE: &str = "days_to_close";
pub const METRIC_TICKETS_BY_PRODUCT: &str = "tickets_by_product";
pub const METRIC_TICKETS_BY_CLIENT: &str = "tickets_by_client";
pub const METRIC_DAYS_TO_CLOSE_BY_PRODUCT: &str = "days_to_close_by_product";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTables {
    pub monthly_counts: Vec<AggregateRow>,
    pub monthly_mean_closure: Vec<AggregateRow>,
    pub product_monthly: Vec<AggregateRow>,
    pub client_monthly: Vec<AggregateRow>,
    pub product_monthly_mean_closure: Vec<AggregateRow>,
    /// ISO-week volume of the current year.
    pub weekly_counts: Vec<WeeklyRow>,
}

/// Tickets opened from Jan 1 up to the reference day, this year vs last.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearToDate {
    pub day_of_year: u32,
    pub current: i64,
    pub previous: Option<i64>,
    pub delta: DeltaValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub current_period: Period,
    pub ticket_count: usize,
    pub product_interest: Vec<String>,
    pub client_interest: Vec<String>,
    pub tables: ReportTables,
    pub deltas: Vec<MetricDelta>,
    pub year_to_date: YearToDate,
    pub warnings: Vec<DataWarning>,
}

/// Load `path` (reusing an unchanged previous parse) and build the report.
/// Schema errors abort before any aggregation.
pub fn run_file(path: &Path, config: &ReportConfig) -> Result<Report> {
    config.validate()?;
    let loaded = cache::load_cached(path, &config.dropped_columns)?;
    Ok(run(&loaded.tickets, config))
}

pub fn run(tickets: &[Ticket], config: &ReportConfig) -> Report {
    let as_of = config.resolve_as_of();
    let current = Period::new(as_of.year(), as_of.month());
    let (derived, warnings) = crate::features::derive(tickets);

    let min_year = config.interest_min_year(current);
    let product_interest = aggregate::select_interest_set(
        &derived,
        CategoryKey::Product,
        min_year,
        config.product_interest_size,
        &config.client_aliases,
    );
    let client_interest = aggregate::select_interest_set(
        &derived,
        CategoryKey::Client,
        min_year,
        config.client_interest_size,
        &config.client_aliases,
    );
    log::info!(
        "Interest sets for {}: products [{}], clients [{}]",
        current,
        product_interest.members().join(", "),
        client_interest.members().join(", ")
    );

    let closed = config.closed_status.as_str();
    let tables = ReportTables {
        monthly_counts: aggregate::monthly_counts(&derived),
        monthly_mean_closure: aggregate::monthly_mean_closure(&derived, closed),
        product_monthly: aggregate::by_product_monthly(&derived, &product_interest),
        client_monthly: aggregate::by_client_monthly(
            &derived,
            &client_interest,
            &config.client_aliases,
        ),
        product_monthly_mean_closure: aggregate::by_product_monthly_mean_closure(
            &derived,
            &product_interest,
            closed,
        ),
        weekly_counts: aggregate::weekly_counts(&derived, current.year),
    };

    let mut deltas = vec![
        delta::period_deltas(
            METRIC_TICKETS_OPENED,
            &tables.monthly_counts,
            Measure::Count,
            current,
            None,
        ),
        delta::period_deltas(
            METRIC_DAYS_TO_CLOSE,
            &tables.monthly_mean_closure,
            Measure::MeanDaysToClose,
            current,
            None,
        ),
    ];
    deltas.extend(category_deltas(
        METRIC_TICKETS_BY_PRODUCT,
        &tables.product_monthly,
        Measure::Count,
        current,
        &product_interest,
    ));
    deltas.extend(category_deltas(
        METRIC_TICKETS_BY_CLIENT,
        &tables.client_monthly,
        Measure::Count,
        current,
        &client_interest,
    ));
    deltas.extend(category_deltas(
        METRIC_DAYS_TO_CLOSE_BY_PRODUCT,
        &tables.product_monthly_mean_closure,
        Measure::MeanDaysToClose,
        current,
        &product_interest,
    ));

    let day_of_year = as_of.ordinal();
    let ytd = aggregate::year_to_date_counts(&derived, day_of_year);
    let ytd_current = ytd.get(&current.year).copied().unwrap_or(0);
    let ytd_previous = ytd.get(&(current.year - 1)).copied();
    let year_to_date = YearToDate {
        day_of_year,
        current: ytd_current,
        previous: ytd_previous,
        delta: delta::year_to_date_change(
            ytd_current,
            ytd_previous,
            current.year - 1,
            day_of_year,
        )
        .into(),
    };

    Report {
        current_period: current,
        ticket_count: tickets.len(),
        product_interest: product_interest.members().to_vec(),
        client_interest: client_interest.members().to_vec(),
        tables,
        deltas,
        year_to_date,
        warnings,
    }
}

fn category_deltas<'a>(
    metric: &'a str,
    rows: &'a [AggregateRow],
    measure: Measure,
    current: Period,
    interest: &'a InterestSet,
) -> impl Iterator<Item = MetricDelta> + 'a {
    interest
        .members()
        .iter()
        .map(move |category| {
            delta::period_deltas(metric, rows, measure, current, Some(category.as_str()))
        })
}
