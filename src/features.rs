// Feature deriver: elapsed duration and calendar buckets per ticket.
use chrono::Datelike;

use crate::types::{DataWarning, DerivedTicket, Ticket};
use crate::util::duration_days;

/// Derive `days_active` and the calendar fields for every ticket.
///
/// Calendar fields come from `requested_date` only (Gregorian calendar, ISO
/// week numbering). Negative durations are kept and reported as warnings.
pub fn derive(tickets: &[Ticket]) -> (Vec<DerivedTicket>, Vec<DataWarning>) {
    let mut warnings = Vec::new();
    let derived = tickets
        .iter()
        .map(|t| {
            let d = derive_one(t);
            if let Some(days) = d.days_active.filter(|d| d.num_seconds() < 0) {
                let days = duration_days(days);
                log::warn!(
                    "Ticket {} was updated {:.2} days before it was requested",
                    t.ticket_id,
                    -days
                );
                warnings.push(DataWarning::NegativeDuration {
                    ticket_id: t.ticket_id.clone(),
                    days,
                });
            }
            d
        })
        .collect();
    (derived, warnings)
}

pub fn derive_one(ticket: &Ticket) -> DerivedTicket {
    let requested = ticket.requested_date;
    let date = requested.date();
    DerivedTicket {
        days_active: ticket.ticket_updated_date.map(|u| u - requested),
        month_opened: date.month(),
        year_opened: date.year(),
        day_opened: date.ordinal(),
        week_opened: date.iso_week().week(),
        ticket: ticket.clone(),
    }
}
