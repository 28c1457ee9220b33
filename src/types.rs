use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

/// Label every out-of-interest category collapses into.
pub const OTHER: &str = "Other";

/// One normalized row of the ticket export.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub ticket_id: String,
    pub client_name: Option<String>,
    pub ticket_status: Option<String>,
    pub ticket_type: Option<String>,
    pub ticket_subject: Option<String>,
    pub ticket_priority: Option<String>,
    pub requested_date: NaiveDateTime,
    pub environment: Option<String>,
    pub product_type: Option<String>,
    pub ticket_updated_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTicket {
    pub ticket: Ticket,
    /// `ticket_updated_date - requested_date`; may be negative.
    pub days_active: Option<Duration>,
    pub month_opened: u32,
    pub year_opened: i32,
    pub day_opened: u32,
    pub week_opened: u32,
}

impl DerivedTicket {
    pub fn is_status(&self, status: &str) -> bool {
        self.ticket.ticket_status.as_deref() == Some(status)
    }
}

/// What the `value` column of an aggregate table holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    Count,
    /// Mean `days_active`, ceiled to whole days.
    MeanDaysToClose,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct AggregateRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Category")]
    #[tabled(rename = "Category", display_with = "display_category")]
    pub category: Option<String>,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: i64,
}

impl AggregateRow {
    pub fn period(&self) -> Period {
        Period::new(self.year, self.month)
    }
}

fn display_category(category: &Option<String>) -> String {
    category.clone().unwrap_or_else(|| "-".to_string())
}

/// ISO-week volume row, used by the weekly trend table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct WeeklyRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Week")]
    #[tabled(rename = "Week")]
    pub week: u32,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: i64,
}

/// A calendar month, the bucket key for every monthly aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Self {
        Period { year, month }
    }

    pub fn previous_month(self) -> Self {
        if self.month == 1 {
            Period::new(self.year - 1, 12)
        } else {
            Period::new(self.year, self.month - 1)
        }
    }

    pub fn next_month(self) -> Self {
        if self.month == 12 {
            Period::new(self.year + 1, 1)
        } else {
            Period::new(self.year, self.month + 1)
        }
    }

    pub fn same_month_last_year(self) -> Self {
        Period::new(self.year - 1, self.month)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = String;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (y, m) = s
            .split_once('-')
            .ok_or_else(|| format!("invalid period {:?}, expected YYYY-MM", s))?;
        let year: i32 = y
            .parse()
            .map_err(|_| format!("invalid year in period {:?}", s))?;
        let month: u32 = m
            .parse()
            .map_err(|_| format!("invalid month in period {:?}", s))?;
        if !(1..=12).contains(&month) {
            return Err(format!("month out of range in period {:?}", s));
        }
        Ok(Period::new(year, month))
    }
}

impl TryFrom<String> for Period {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(p: Period) -> Self {
        p.to_string()
    }
}

/// Non-fatal data-quality findings surfaced alongside the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataWarning {
    /// Updated date precedes the requested date; the duration is kept as-is.
    NegativeDuration { ticket_id: String, days: f64 },
}
