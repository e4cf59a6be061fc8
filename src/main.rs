use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{miette, IntoDiagnostic, Result};
use serde::Serialize;
use time::{Date, Duration, OffsetDateTime};
use tracing_subscriber::EnvFilter;

use climatology::{
    compare_day, ingest, store::parse_date, Config, DayQuery, DayReport, RecordStore, WindowComparison,
    WindowQuery, YearRange,
};

mod render;

use render::{DayText, WindowText};

#[derive(Parser)]
#[command(name = "climatology")]
#[command(author, version, about = "Compare daily temperatures with the historical record", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Daily temperature export (defaults to the first ta*.csv of the working directory)
    #[arg(long, global = true)]
    csv: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(clap::Args)]
struct DayArgs {
    /// Day to rank (defaults to yesterday)
    #[arg(short, long, value_parser = date_arg)]
    date: Option<Date>,

    /// First year of the comparison
    #[arg(long)]
    from_year: Option<i32>,

    /// Last year of the comparison
    #[arg(long)]
    to_year: Option<i32>,

    /// Length of the hottest/coldest listings
    #[arg(long)]
    top: Option<usize>,
}

#[derive(clap::Args)]
struct WindowArgs {
    /// First day after the window (defaults to today, so the window ends yesterday)
    #[arg(short, long, value_parser = date_arg)]
    end: Option<Date>,

    /// Number of days in the window
    #[arg(short = 'n', long)]
    days: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank one day against the same calendar day of every year
    Day(DayArgs),

    /// Compare the last days with the same days of previous years
    Window(WindowArgs),

    /// Both comparisons
    Report {
        #[command(flatten)]
        day: DayArgs,

        #[command(flatten)]
        window: WindowArgs,
    },
}

#[derive(Serialize)]
struct FullReport {
    day: DayReport,
    window: WindowComparison,
}

fn date_arg(s: &str) -> Result<Date, String> {
    parse_date(s).map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

/// Today in the local time zone, UTC when the offset cannot be determined.
fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

fn main() -> Result<()> {
    // the local offset is only readable while the process has a single thread
    let today = today();
    let cli = Cli::parse();

    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load_or_default(cli.config.as_deref())?;
    let path = cli
        .csv
        .clone()
        .or_else(|| config.source.path.clone())
        .or_else(|| ingest::find_default("."))
        .ok_or_else(|| miette!(help = "pass --csv or set `source.path`", "No ta*.csv file found"))?;
    let store = ingest::load(&path, &config.layout())?;

    match cli.command {
        Commands::Day(args) => {
            let report = compare_day(&store, &day_query(&args, &config, &store, today)?)?;
            match cli.format {
                Format::Text => print!("{}", DayText(&report)),
                Format::Json => emit(&report)?,
            }
        }
        Commands::Window(args) => {
            let comparison = window_query(&args, &config, today).run(&store)?;
            match cli.format {
                Format::Text => print!("{}", WindowText(&comparison)),
                Format::Json => emit(&comparison)?,
            }
        }
        Commands::Report { day, window } => {
            let day = compare_day(&store, &day_query(&day, &config, &store, today)?)?;
            let window = window_query(&window, &config, today).run(&store)?;
            match cli.format {
                Format::Text => print!("{}\n{}", DayText(&day), WindowText(&window)),
                Format::Json => emit(&FullReport { day, window })?,
            }
        }
    }

    Ok(())
}

fn day_query(args: &DayArgs, config: &Config, store: &RecordStore, today: Date) -> Result<DayQuery> {
    let date = args.date.unwrap_or(today - Duration::days(1));
    let mut query = DayQuery::new(date).top(args.top.unwrap_or(config.query.top));

    let from = args.from_year.or(config.query.from_year);
    let to = args.to_year.or(config.query.to_year);
    if from.is_some() || to.is_some() {
        let (first, last) = store.year_range().unwrap_or((date.year(), date.year()));
        query = query.years(YearRange::new(from.unwrap_or(first), to.unwrap_or(last))?);
    }
    Ok(query)
}

fn window_query(args: &WindowArgs, config: &Config, today: Date) -> WindowQuery {
    WindowQuery::new(
        args.end.unwrap_or(today),
        args.days.unwrap_or(config.query.window_days),
    )
    .rule(config.query.baseline)
}

fn emit(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn today_is_within_a_day_of_utc() {
        let utc = OffsetDateTime::now_utc().date();
        assert!((today() - utc).whole_days().abs() <= 1);
    }
}
