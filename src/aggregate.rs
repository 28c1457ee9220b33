// Aggregator: the monthly tables behind every report tab.
//
// All functions are pure over the derived tickets. Rows come back sorted by
// (year, month) and, for breakdowns, by interest-set order so "Other" is last.
use chrono::Duration;
use std::collections::{BTreeMap, HashMap};

use crate::types::{AggregateRow, DerivedTicket, WeeklyRow, OTHER};
use crate::util::mean_days_ceil;

/// Which categorical column a breakdown is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKey {
    Product,
    Client,
}

/// Ranked categories kept verbatim in a breakdown, always ending in "Other".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestSet {
    members: Vec<String>,
}

impl InterestSet {
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Map a category onto its bucket: itself if retained, else "Other".
    pub fn collapse<'a>(&'a self, category: &'a str) -> &'a str {
        if self.members.iter().any(|m| m == category) {
            category
        } else {
            OTHER
        }
    }

    /// Display position; unknown labels sort after everything.
    pub fn rank(&self, category: &str) -> usize {
        self.members
            .iter()
            .position(|m| m == category)
            .unwrap_or(self.members.len())
    }
}

/// Build an interest set from raw category values: top `k` by frequency
/// (ties broken alphabetically), with "Other" moved to or appended at the end.
pub fn interest_set<'a, I>(values: I, k: usize) -> InterestSet
where
    I: IntoIterator<Item = &'a str>,
{
    let mut freq: HashMap<&str, usize> = HashMap::new();
    for v in values {
        *freq.entry(v).or_default() += 1;
    }
    let mut ranked: Vec<(&str, usize)> = freq.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut members: Vec<String> = ranked
        .into_iter()
        .take(k)
        .map(|(name, _)| name)
        .filter(|name| *name != OTHER)
        .map(str::to_string)
        .collect();
    members.push(OTHER.to_string());
    InterestSet { members }
}

/// Rank categories over tickets opened in `min_year` or later.
pub fn select_interest_set(
    tickets: &[DerivedTicket],
    key: CategoryKey,
    min_year: i32,
    k: usize,
    aliases: &BTreeMap<String, String>,
) -> InterestSet {
    interest_set(
        tickets
            .iter()
            .filter(|t| t.year_opened >= min_year)
            .filter_map(|t| category_of(t, key, aliases)),
        k,
    )
}

/// Exact-match alias lookup; unmatched names pass through.
pub fn canonical_client<'a>(aliases: &'a BTreeMap<String, String>, name: &'a str) -> &'a str {
    aliases.get(name).map(String::as_str).unwrap_or(name)
}

fn category_of<'a>(
    ticket: &'a DerivedTicket,
    key: CategoryKey,
    aliases: &'a BTreeMap<String, String>,
) -> Option<&'a str> {
    match key {
        CategoryKey::Product => ticket.ticket.product_type.as_deref(),
        CategoryKey::Client => ticket
            .ticket
            .client_name
            .as_deref()
            .map(|c| canonical_client(aliases, c)),
    }
}

type Bucket = (i32, u32, Option<String>);

fn count_rows(buckets: HashMap<Bucket, i64>, interest: Option<&InterestSet>) -> Vec<AggregateRow> {
    let rows = buckets
        .into_iter()
        .map(|((year, month, category), value)| AggregateRow {
            year,
            month,
            category,
            value,
        })
        .collect();
    sorted(rows, interest)
}

fn mean_rows(
    buckets: HashMap<Bucket, Vec<Duration>>,
    interest: Option<&InterestSet>,
) -> Vec<AggregateRow> {
    let rows = buckets
        .into_iter()
        .filter_map(|((year, month, category), durations)| {
            mean_days_ceil(&durations).map(|value| AggregateRow {
                year,
                month,
                category,
                value,
            })
        })
        .collect();
    sorted(rows, interest)
}

fn sorted(mut rows: Vec<AggregateRow>, interest: Option<&InterestSet>) -> Vec<AggregateRow> {
    rows.sort_by(|a, b| {
        (a.year, a.month).cmp(&(b.year, b.month)).then_with(|| {
            match (interest, a.category.as_deref(), b.category.as_deref()) {
                (Some(set), Some(ca), Some(cb)) => set.rank(ca).cmp(&set.rank(cb)),
                _ => a.category.cmp(&b.category),
            }
        })
    });
    rows
}

/// Ticket count per (year, month), regardless of status.
pub fn monthly_counts(tickets: &[DerivedTicket]) -> Vec<AggregateRow> {
    let mut map: HashMap<Bucket, i64> = HashMap::new();
    for t in tickets {
        *map.entry((t.year_opened, t.month_opened, None)).or_default() += 1;
    }
    count_rows(map, None)
}

/// Mean days-to-close per (year, month) over closed tickets, ceiled.
pub fn monthly_mean_closure(tickets: &[DerivedTicket], closed_status: &str) -> Vec<AggregateRow> {
    let mut map: HashMap<Bucket, Vec<Duration>> = HashMap::new();
    for t in tickets.iter().filter(|t| t.is_status(closed_status)) {
        if let Some(d) = t.days_active {
            map.entry((t.year_opened, t.month_opened, None))
                .or_default()
                .push(d);
        }
    }
    mean_rows(map, None)
}

fn collapsed_counts(
    tickets: &[DerivedTicket],
    key: CategoryKey,
    interest: &InterestSet,
    aliases: &BTreeMap<String, String>,
) -> Vec<AggregateRow> {
    let mut map: HashMap<Bucket, i64> = HashMap::new();
    for t in tickets {
        let Some(category) = category_of(t, key, aliases) else {
            continue;
        };
        let bucket = interest.collapse(category).to_string();
        *map.entry((t.year_opened, t.month_opened, Some(bucket)))
            .or_default() += 1;
    }
    count_rows(map, Some(interest))
}

/// Ticket count per (year, month, product); null products are excluded.
pub fn by_product_monthly(tickets: &[DerivedTicket], interest: &InterestSet) -> Vec<AggregateRow> {
    collapsed_counts(tickets, CategoryKey::Product, interest, &BTreeMap::new())
}

/// Ticket count per (year, month, client) after applying client aliases.
pub fn by_client_monthly(
    tickets: &[DerivedTicket],
    interest: &InterestSet,
    aliases: &BTreeMap<String, String>,
) -> Vec<AggregateRow> {
    collapsed_counts(tickets, CategoryKey::Client, interest, aliases)
}

pub fn by_product_monthly_mean_closure(
    tickets: &[DerivedTicket],
    interest: &InterestSet,
    closed_status: &str,
) -> Vec<AggregateRow> {
    let mut map: HashMap<Bucket, Vec<Duration>> = HashMap::new();
    for t in tickets.iter().filter(|t| t.is_status(closed_status)) {
        let (Some(product), Some(d)) = (t.ticket.product_type.as_deref(), t.days_active) else {
            continue;
        };
        let bucket = interest.collapse(product).to_string();
        map.entry((t.year_opened, t.month_opened, Some(bucket)))
            .or_default()
            .push(d);
    }
    mean_rows(map, Some(interest))
}

/// Ticket count per ISO week for tickets opened in `year`.
pub fn weekly_counts(tickets: &[DerivedTicket], year: i32) -> Vec<WeeklyRow> {
    let mut map: BTreeMap<u32, i64> = BTreeMap::new();
    for t in tickets.iter().filter(|t| t.year_opened == year) {
        *map.entry(t.week_opened).or_default() += 1;
    }
    map.into_iter()
        .map(|(week, count)| WeeklyRow { year, week, count })
        .collect()
}

/// Per-year count of tickets opened on or before `day_of_year`.
pub fn year_to_date_counts(tickets: &[DerivedTicket], day_of_year: u32) -> BTreeMap<i32, i64> {
    let mut map = BTreeMap::new();
    for t in tickets.iter().filter(|t| t.day_opened <= day_of_year) {
        *map.entry(t.year_opened).or_default() += 1;
    }
    map
}
