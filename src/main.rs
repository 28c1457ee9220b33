// Entry point and high-level CLI flow.
//
// - Load and normalize the ticket export, printing diagnostics.
// - Build the report for the configured current period.
// - Print metric lines and table previews, then export CSV/JSON files.
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ticket_report::cache::{self, LoadedFile};
use ticket_report::config::ReportConfig;
use ticket_report::output;
use ticket_report::pipeline::{self, Report};
use ticket_report::types::Period;
use ticket_report::util::format_int;

#[derive(Parser)]
#[command(name = "ticket_report", about = "Support-ticket KPI report")]
struct Cli {
    /// Ticket export (CSV)
    file: PathBuf,

    /// JSON config file; missing keys use defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Current period as YYYY-MM (default: this month)
    #[arg(long)]
    current: Option<Period>,

    /// Number of products kept before collapsing into "Other"
    #[arg(long)]
    product_top: Option<usize>,

    /// Number of clients kept before collapsing into "Other"
    #[arg(long)]
    client_top: Option<usize>,

    /// Output directory for CSV and JSON files
    #[arg(long, default_value = "report")]
    out: PathBuf,

    /// Rows shown per table preview
    #[arg(long, default_value = "3")]
    preview: usize,

    /// Print the full report as JSON instead of previews
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn build_config(cli: &Cli) -> ticket_report::Result<ReportConfig> {
    let mut config = match &cli.config {
        Some(path) => ReportConfig::from_json_file(path)?,
        None => ReportConfig::default(),
    };
    if let Some(p) = cli.current {
        config.current_period = Some(p);
    }
    if let Some(k) = cli.product_top {
        config.product_interest_size = k;
    }
    if let Some(k) = cli.client_top {
        config.client_interest_size = k;
    }
    config.validate()?;
    Ok(config)
}

fn print_load_summary(loaded: &LoadedFile) {
    let r = &loaded.report;
    println!(
        "Processing dataset... ({} rows loaded)",
        format_int(r.total_rows)
    );
    if !r.dropped_columns.is_empty() {
        println!("Dropped columns: {}", r.dropped_columns.join(", "));
    }
    if !r.ignored_columns.is_empty() {
        println!("Ignored extra columns: {}", r.ignored_columns.join(", "));
    }
    if r.missing_updated_dates > 0 {
        println!(
            "Note: {} rows have no update date and are left out of closure times.",
            format_int(r.missing_updated_dates)
        );
    }
    println!();
}

fn print_report(report: &Report, preview: usize) {
    println!("KPI report for {}\n", report.current_period);
    for m in &report.deltas {
        println!("{}", output::metric_line(m));
    }
    let ytd = &report.year_to_date;
    println!(
        "tickets_year_to_date (day {}): {} (vs last year {})\n",
        ytd.day_of_year,
        format_int(ytd.current),
        output::format_delta(&ytd.delta)
    );

    let t = &report.tables;
    let sections = [
        ("Ticket volume per month", &t.monthly_counts),
        ("Mean days to close per month", &t.monthly_mean_closure),
        ("Tickets per product per month", &t.product_monthly),
        ("Tickets per client per month", &t.client_monthly),
        ("Mean days to close per product per month", &t.product_monthly_mean_closure),
    ];
    for (title, rows) in sections {
        println!("{}", title);
        // Latest buckets are the interesting ones.
        let tail = &rows[rows.len().saturating_sub(preview)..];
        output::preview_table_rows(tail, preview);
    }
    println!("Ticket volume per ISO week ({})", report.current_period.year);
    output::preview_table_rows(&t.weekly_counts, preview);

    for w in &report.warnings {
        eprintln!("Warning: {:?}", w);
    }
}

fn run(cli: &Cli) -> ticket_report::Result<()> {
    let config = build_config(cli)?;
    let loaded = cache::load_cached(Path::new(&cli.file), &config.dropped_columns)?;
    if !cli.json {
        print_load_summary(&loaded);
    }

    let report = pipeline::run(&loaded.tickets, &config);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, cli.preview);
    }

    let written = output::write_report(&cli.out, &report)?;
    if !cli.json {
        println!("Outputs saved to {} ({} files)", cli.out.display(), written.len());
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Failed to build report: {}", e);
            ExitCode::FAILURE
        }
    }
}
