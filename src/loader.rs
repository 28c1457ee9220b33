// Schema normalizer: turns the raw export into canonical `Ticket`s.
//
// Header text is only used to find the droppable columns. Everything else is
// mapped by position, so renamed headers in a new export do not matter as
// long as the column order is unchanged.
use crate::error::{Result, SchemaError};
use crate::types::Ticket;
use crate::util::{non_empty, parse_datetime_safe};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;

/// Canonical columns, in the positional order of the export.
pub const CANONICAL_COLUMNS: [&str; 10] = [
    "ticket_id",
    "client_name",
    "ticket_status",
    "ticket_type",
    "ticket_subject",
    "ticket_priority",
    "requested_date",
    "environment",
    "product_type",
    "ticket_updated_date",
];

const REQUESTED_DATE: usize = 6;
const UPDATED_DATE: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    /// Droppable headers that were actually present.
    pub dropped_columns: Vec<String>,
    /// Headers past the tenth retained column; not loaded.
    pub ignored_columns: Vec<String>,
    pub missing_updated_dates: usize,
}

pub fn load_tickets(
    path: impl AsRef<Path>,
    dropped: &[String],
) -> Result<(Vec<Ticket>, LoadReport)> {
    let file = std::fs::File::open(path.as_ref())?;
    load_tickets_from_reader(std::io::BufReader::new(file), dropped)
}

/// Core loading logic; accepts any `Read` source so tests can feed strings.
pub fn load_tickets_from_reader<R: Read>(
    reader: R,
    dropped: &[String],
) -> Result<(Vec<Ticket>, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(SchemaError::EmptyFile.into());
    }

    let mut dropped_columns = Vec::new();
    let mut retained: Vec<usize> = Vec::with_capacity(headers.len());
    for (idx, name) in headers.iter().enumerate() {
        if dropped.iter().any(|d| d == name) {
            dropped_columns.push(name.to_string());
        } else {
            retained.push(idx);
        }
    }
    if retained.len() < CANONICAL_COLUMNS.len() {
        return Err(SchemaError::TooFewColumns {
            found: retained.len(),
            required: CANONICAL_COLUMNS.len(),
        }
        .into());
    }
    let ignored_columns: Vec<String> = retained[CANONICAL_COLUMNS.len()..]
        .iter()
        .filter_map(|&i| headers.get(i))
        .map(str::to_string)
        .collect();
    if !ignored_columns.is_empty() {
        log::debug!("Ignoring extra columns: {}", ignored_columns.join(", "));
    }
    retained.truncate(CANONICAL_COLUMNS.len());

    let mut tickets = Vec::new();
    let mut total_rows = 0usize;
    let mut missing_updated_dates = 0usize;
    for result in rdr.records() {
        let record = result?;
        total_rows += 1;
        // Header is line 1.
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(total_rows + 1);
        let ticket = normalize_record(&record, &retained, line)?;
        if ticket.ticket_updated_date.is_none() {
            missing_updated_dates += 1;
        }
        tickets.push(ticket);
    }
    if total_rows == 0 {
        return Err(SchemaError::EmptyFile.into());
    }

    log::info!(
        "Loaded {} tickets ({} optional columns dropped)",
        tickets.len(),
        dropped_columns.len()
    );
    let report = LoadReport {
        total_rows,
        dropped_columns,
        ignored_columns,
        missing_updated_dates,
    };
    Ok((tickets, report))
}

fn normalize_record(
    record: &StringRecord,
    retained: &[usize],
    line: usize,
) -> std::result::Result<Ticket, SchemaError> {
    let cell = |pos: usize| record.get(retained[pos]);
    let text = |pos: usize| non_empty(cell(pos)).map(str::to_string);

    let raw_requested = cell(REQUESTED_DATE);
    let requested_date =
        parse_datetime_safe(raw_requested).ok_or_else(|| SchemaError::InvalidDate {
            column: CANONICAL_COLUMNS[REQUESTED_DATE],
            line,
            value: raw_requested.unwrap_or("").to_string(),
        })?;

    // Blank update dates are nulls; anything else must parse.
    let raw_updated = cell(UPDATED_DATE);
    let ticket_updated_date = match non_empty(raw_updated) {
        None => None,
        Some(v) => Some(parse_datetime_safe(Some(v)).ok_or_else(|| {
            SchemaError::InvalidDate {
                column: CANONICAL_COLUMNS[UPDATED_DATE],
                line,
                value: v.to_string(),
            }
        })?),
    };

    Ok(Ticket {
        ticket_id: cell(0).unwrap_or("").trim().to_string(),
        client_name: text(1),
        ticket_status: text(2),
        ticket_type: text(3),
        ticket_subject: text(4),
        ticket_priority: text(5),
        requested_date,
        environment: text(7),
        product_type: text(8),
        ticket_updated_date,
    })
}
