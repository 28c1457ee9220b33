// Report configuration: everything that used to be hard-coded per script
// revision (interest-set sizes, recency window, alias rules, "this month").
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ReportError, Result};
use crate::types::Period;

pub const DEFAULT_DROPPED_COLUMNS: &[&str] =
    &["Latest Update", "Tickets", "Assignee name", "Requester name"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub product_interest_size: usize,
    pub client_interest_size: usize,
    /// Interest sets are ranked over tickets opened in the current year and
    /// this many years before it.
    pub interest_window_years: u32,
    /// Exact client-name rewrites applied before ranking and collapsing.
    pub client_aliases: BTreeMap<String, String>,
    pub closed_status: String,
    /// Headers removed before positional renaming; absent ones are ignored.
    pub dropped_columns: Vec<String>,
    /// "This month" for deltas. `None` means today's local date.
    pub current_period: Option<Period>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        let mut client_aliases = BTreeMap::new();
        client_aliases.insert(
            "The Red Sea Development Co., (TRSDC)".to_string(),
            "TRSDC".to_string(),
        );
        ReportConfig {
            product_interest_size: 6,
            client_interest_size: 5,
            interest_window_years: 1,
            client_aliases,
            closed_status: "Closed".to_string(),
            dropped_columns: DEFAULT_DROPPED_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect(),
            current_period: None,
        }
    }
}

impl ReportConfig {
    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: ReportConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.product_interest_size == 0 || self.client_interest_size == 0 {
            return Err(ReportError::Config(
                "interest set sizes must be at least 1".to_string(),
            ));
        }
        if self.closed_status.trim().is_empty() {
            return Err(ReportError::Config("closed_status must not be empty".to_string()));
        }
        Ok(())
    }

    /// Reference date of the report: today, or the last day of the
    /// configured current period when reprocessing an archived snapshot.
    pub fn resolve_as_of(&self) -> NaiveDate {
        match self.current_period {
            None => Local::now().date_naive(),
            Some(p) => last_day_of_month(p),
        }
    }

    pub fn resolve_current_period(&self) -> Period {
        let as_of = self.resolve_as_of();
        Period::new(as_of.year(), as_of.month())
    }

    /// First `year_opened` that counts towards interest-set ranking.
    pub fn interest_min_year(&self, current: Period) -> i32 {
        current.year - self.interest_window_years as i32
    }
}

fn last_day_of_month(p: Period) -> NaiveDate {
    let next = p.next_month();
    NaiveDate::from_ymd_opt(next.year, next.month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let c = ReportConfig::default();
        assert_eq!(c.product_interest_size, 6);
        assert_eq!(c.client_interest_size, 5);
        assert_eq!(c.closed_status, "Closed");
        assert_eq!(c.dropped_columns.len(), 4);
        assert!(c.current_period.is_none());
    }

    #[test]
    fn test_default_alias_rule() {
        let c = ReportConfig::default();
        assert_eq!(
            c.client_aliases
                .get("The Red Sea Development Co., (TRSDC)")
                .map(String::as_str),
            Some("TRSDC")
        );
    }

    #[test]
    fn test_interest_min_year() {
        let c = ReportConfig::default();
        assert_eq!(c.interest_min_year(Period::new(2024, 5)), 2023);
    }

    #[test]
    fn test_explicit_current_period_wins() {
        let c = ReportConfig {
            current_period: Some(Period::new(2022, 8)),
            ..ReportConfig::default()
        };
        assert_eq!(c.resolve_current_period(), Period::new(2022, 8));
        assert_eq!(
            c.resolve_as_of(),
            NaiveDate::from_ymd_opt(2022, 8, 31).unwrap()
        );
    }

    #[test]
    fn test_as_of_handles_december_and_leap_february() {
        let dec = ReportConfig {
            current_period: Some(Period::new(2023, 12)),
            ..ReportConfig::default()
        };
        assert_eq!(dec.resolve_as_of(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        let feb = ReportConfig {
            current_period: Some(Period::new(2024, 2)),
            ..ReportConfig::default()
        };
        assert_eq!(feb.resolve_as_of(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_from_json_file_partial() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{"product_interest_size": 3, "current_period": "2023-02"}}"#
        )
        .unwrap();
        let c = ReportConfig::from_json_file(f.path()).unwrap();
        assert_eq!(c.product_interest_size, 3);
        assert_eq!(c.client_interest_size, 5);
        assert_eq!(c.current_period, Some(Period::new(2023, 2)));
    }

    #[test]
    fn test_from_json_file_rejects_zero_size() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"client_interest_size": 0}}"#).unwrap();
        let err = ReportConfig::from_json_file(f.path()).unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }
}
