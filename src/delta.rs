// Delta calculator: month-over-month and year-over-year percentage change of
// one aggregate metric for the current period.
use serde::Serialize;

use crate::error::DeltaError;
use crate::types::{AggregateRow, Measure, Period};
use crate::util::round_one_decimal;

/// Serializable outcome of a single comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeltaValue {
    Available { pct: f64 },
    Unavailable { reason: String },
}

impl From<Result<f64, DeltaError>> for DeltaValue {
    fn from(r: Result<f64, DeltaError>) -> Self {
        match r {
            Ok(pct) => DeltaValue::Available { pct },
            Err(e) => DeltaValue::Unavailable {
                reason: e.to_string(),
            },
        }
    }
}

/// Headline value of one metric for the current period, with its deltas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDelta {
    pub metric: String,
    pub category: Option<String>,
    pub period: Period,
    pub current: Option<i64>,
    pub month_over_month: DeltaValue,
    pub year_over_year: DeltaValue,
}

fn lookup(rows: &[AggregateRow], period: Period, category: Option<&str>) -> Option<i64> {
    rows.iter()
        .find(|r| r.period() == period && r.category.as_deref() == category)
        .map(|r| r.value)
}

/// Value of the current bucket. A missing count bucket means zero tickets; a
/// missing mean bucket means there is nothing to average.
fn current_value(
    rows: &[AggregateRow],
    measure: Measure,
    period: Period,
    category: Option<&str>,
) -> Option<i64> {
    match (lookup(rows, period, category), measure) {
        (Some(v), _) => Some(v),
        (None, Measure::Count) => Some(0),
        (None, Measure::MeanDaysToClose) => None,
    }
}

/// `(current - prior) / prior * 100`, rounded to one decimal.
pub fn percent_change(
    current: Option<i64>,
    current_period: Period,
    prior: Option<i64>,
    prior_period: Period,
) -> Result<f64, DeltaError> {
    let current = current.ok_or(DeltaError::MissingPeriod(current_period))?;
    let prior = prior.ok_or(DeltaError::MissingPeriod(prior_period))?;
    if prior == 0 {
        return Err(DeltaError::DivisionByZero(prior_period));
    }
    let pct = (current - prior) as f64 / prior as f64 * 100.0;
    Ok(round_one_decimal(pct))
}

/// Year-to-date change against the same Jan 1 to `day_of_year` window of
/// `prior_year`.
pub fn year_to_date_change(
    current: i64,
    prior: Option<i64>,
    prior_year: i32,
    day_of_year: u32,
) -> Result<f64, DeltaError> {
    match prior {
        None => Err(DeltaError::MissingYearToDate {
            year: prior_year,
            day_of_year,
        }),
        Some(0) => Err(DeltaError::ZeroYearToDate {
            year: prior_year,
            day_of_year,
        }),
        Some(prior) => Ok(round_one_decimal(
            (current - prior) as f64 / prior as f64 * 100.0,
        )),
    }
}

fn delta_against(
    rows: &[AggregateRow],
    measure: Measure,
    current: Period,
    prior: Period,
    category: Option<&str>,
) -> Result<f64, DeltaError> {
    percent_change(
        current_value(rows, measure, current, category),
        current,
        lookup(rows, prior, category),
        prior,
    )
}

/// Change against the previous calendar month.
pub fn delta_month(
    rows: &[AggregateRow],
    measure: Measure,
    current: Period,
    category: Option<&str>,
) -> Result<f64, DeltaError> {
    delta_against(rows, measure, current, current.previous_month(), category)
}

/// Change against the same month one year earlier.
pub fn delta_year(
    rows: &[AggregateRow],
    measure: Measure,
    current: Period,
    category: Option<&str>,
) -> Result<f64, DeltaError> {
    delta_against(rows, measure, current, current.same_month_last_year(), category)
}

pub fn period_deltas(
    metric: &str,
    rows: &[AggregateRow],
    measure: Measure,
    current: Period,
    category: Option<&str>,
) -> MetricDelta {
    MetricDelta {
        metric: metric.to_string(),
        category: category.map(str::to_string),
        period: current,
        current: current_value(rows, measure, current, category),
        month_over_month: delta_month(rows, measure, current, category).into(),
        year_over_year: delta_year(rows, measure, current, category).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: i32, month: u32, category: Option<&str>, value: i64) -> AggregateRow {
        AggregateRow {
            year,
            month,
            category: category.map(str::to_string),
            value,
        }
    }

    #[test]
    fn test_month_over_month() {
        let rows = vec![row(2024, 4, None, 80), row(2024, 5, None, 100)];
        let d = delta_month(&rows, Measure::Count, Period::new(2024, 5), None);
        assert_eq!(d, Ok(25.0));
    }

    #[test]
    fn test_month_over_month_across_year_boundary() {
        let rows = vec![row(2023, 12, None, 3), row(2024, 1, None, 2)];
        let d = delta_month(&rows, Measure::Count, Period::new(2024, 1), None);
        assert_eq!(d, Ok(-33.3));
    }

    #[test]
    fn test_year_over_year() {
        let rows = vec![row(2023, 5, None, 40), row(2024, 5, None, 50)];
        let d = delta_year(&rows, Measure::Count, Period::new(2024, 5), None);
        assert_eq!(d, Ok(25.0));
    }

    #[test]
    fn test_zero_baseline_is_division_by_zero() {
        let rows = vec![row(2024, 4, None, 0), row(2024, 5, None, 10)];
        let d = delta_month(&rows, Measure::Count, Period::new(2024, 5), None);
        assert_eq!(d, Err(DeltaError::DivisionByZero(Period::new(2024, 4))));
    }

    #[test]
    fn test_missing_baseline_is_missing_period() {
        let rows = vec![row(2024, 5, None, 10)];
        let d = delta_year(&rows, Measure::Count, Period::new(2024, 5), None);
        assert_eq!(d, Err(DeltaError::MissingPeriod(Period::new(2023, 5))));
    }

    #[test]
    fn test_missing_current_count_is_zero() {
        let rows = vec![row(2024, 4, None, 8)];
        let d = delta_month(&rows, Measure::Count, Period::new(2024, 5), None);
        assert_eq!(d, Ok(-100.0));
    }

    #[test]
    fn test_missing_current_mean_is_missing_period() {
        let rows = vec![row(2024, 4, None, 8)];
        let d = delta_month(&rows, Measure::MeanDaysToClose, Period::new(2024, 5), None);
        assert_eq!(d, Err(DeltaError::MissingPeriod(Period::new(2024, 5))));
    }

    #[test]
    fn test_category_filter() {
        let rows = vec![
            row(2024, 4, Some("A"), 10),
            row(2024, 4, Some("Other"), 1),
            row(2024, 5, Some("A"), 15),
            row(2024, 5, Some("Other"), 4),
        ];
        let p = Period::new(2024, 5);
        assert_eq!(delta_month(&rows, Measure::Count, p, Some("A")), Ok(50.0));
        assert_eq!(delta_month(&rows, Measure::Count, p, Some("Other")), Ok(300.0));
    }

    #[test]
    fn test_period_deltas_fail_independently() {
        let rows = vec![row(2024, 4, None, 80), row(2024, 5, None, 100)];
        let m = period_deltas("tickets_opened", &rows, Measure::Count, Period::new(2024, 5), None);
        assert_eq!(m.current, Some(100));
        assert_eq!(m.month_over_month, DeltaValue::Available { pct: 25.0 });
        assert!(matches!(m.year_over_year, DeltaValue::Unavailable { .. }));
    }

    #[test]
    fn test_year_to_date_change_names_prior_year() {
        assert_eq!(year_to_date_change(9, Some(3), 2023, 152), Ok(200.0));
        assert_eq!(
            year_to_date_change(9, None, 2023, 152),
            Err(DeltaError::MissingYearToDate {
                year: 2023,
                day_of_year: 152
            })
        );
        let reason = year_to_date_change(9, Some(0), 2023, 152)
            .unwrap_err()
            .to_string();
        assert!(reason.contains("2023 up to day 152"));
    }

    #[test]
    fn test_delta_value_serializes_with_status() {
        let r: Result<f64, DeltaError> = Err(DeltaError::DivisionByZero(Period::new(2024, 4)));
        let v = DeltaValue::from(r);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert!(json["reason"]
            .as_str()
            .unwrap()
            .contains("insufficient historical data"));
    }
}
