//! Support-ticket KPI report: normalize a ticket export, bucket it by month,
//! and compute month-over-month and year-over-year deltas.
//!
//! The flow is strictly one-way:
//! `loader` -> `features` -> `aggregate` -> `delta`, wired together by
//! `pipeline::run`. `output` hands the result to whatever renders it.
pub mod aggregate;
pub mod cache;
pub mod config;
pub mod delta;
pub mod error;
pub mod features;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod types;
pub mod util;

pub use config::ReportConfig;
pub use error::{DeltaError, ReportError, Result, SchemaError};
pub use pipeline::{run, run_file, Report};
