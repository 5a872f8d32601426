use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use pension_cli::app::{self, OutputFormat};
use pension_cli::report::{DEFAULT_LINES_PER_PAGE, ReportOptions};
use pension_cli::logging::{self, LogOptions};
use pension_cli::request_csv;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Spanish retirement pension simulator.
///
/// Checks the requirements of each retirement type and estimates the
/// monthly pension from the policy tables in force.
#[derive(Debug, Parser)]
#[command(name = "pension-sim", version, about)]
struct Cli {
    /// Directory with policy tables. Uses the bundled tables when omitted.
    #[arg(long, global = true)]
    policy_dir: Option<PathBuf>,

    /// Evaluation date (YYYY-MM-DD). Defaults to the local date and time.
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Also append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Simulate one request given as a JSON file.
    Simulate {
        /// Request JSON file.
        request: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Write the report into this directory instead of stdout.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Issuer named in the report.
        #[arg(long)]
        issuer: Option<String>,

        /// Lines per report page.
        #[arg(long, default_value_t = DEFAULT_LINES_PER_PAGE)]
        lines_per_page: usize,
    },

    /// Check the requirements of one request without calculating the amount.
    Validate {
        /// Request JSON file.
        request: PathBuf,
    },

    /// Simulate every row of a CSV file, printing one JSON line per row.
    Batch {
        /// Requests CSV file.
        input: PathBuf,
    },

    /// List the retirement types.
    Types,

    /// Show the requirements of one retirement type.
    Requirements {
        /// e.g. `ordinaria`, `anticipada_voluntaria`, `demorada`.
        tipo: String,
    },
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&LogOptions {
        verbose: cli.verbose,
        file: cli.log_file.clone(),
    })?;

    let as_of: NaiveDateTime = match cli.today {
        Some(day) => day.and_time(NaiveTime::MIN),
        None => Local::now().naive_local(),
    };
    debug!(%as_of, "evaluation instant");

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match cli.command {
        Command::Simulate {
            request,
            format,
            output_dir,
            issuer,
            lines_per_page,
        } => {
            let policy = app::load_policy(cli.policy_dir.as_deref())?;
            let request = app::read_request(&request)?;
            let mut options = ReportOptions {
                lines_per_page,
                ..ReportOptions::default()
            };
            if let Some(issuer) = issuer {
                options.issuer = issuer;
            }
            app::simulate(
                &mut out,
                &policy,
                &request,
                as_of,
                format,
                &options,
                output_dir.as_deref(),
            )?;
        }
        Command::Validate { request } => {
            let policy = app::load_policy(cli.policy_dir.as_deref())?;
            let request = app::read_request(&request)?;
            app::validate(&mut out, &policy, &request, as_of)?;
        }
        Command::Batch { input } => {
            let policy = app::load_policy(cli.policy_dir.as_deref())?;
            let requests = request_csv::load_from_file(&input)
                .with_context(|| format!("Failed to load requests from: {}", input.display()))?;
            info!(rows = requests.len(), "requests loaded");
            app::batch(&mut out, &policy, &requests, as_of)?;
        }
        Command::Types => app::list_types(&mut out)?,
        Command::Requirements { tipo } => app::requirements(&mut out, &tipo)?,
    }

    out.flush()?;
    Ok(())
}
