use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pension_core::EarlyModality;
use pension_data::PolicyLoader;

/// Load a policy table directory and print the figures it yields for a year.
///
/// The directory must contain:
/// - ordinary_age.csv: year, full_career_months, reduced_age_months, standard_age_months
/// - contribution_scale.csv: effective_from, minimum_years, base_percentage, up_to_month, monthly_rate
/// - early_coefficients.csv: modality, from_contribution_months, quarterly_coefficient
/// - pension_limits.csv: year, minimum_pension, maximum_pension, income_limit
/// - parameters.toml
#[derive(Parser, Debug)]
#[command(name = "pension-policy-check")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory with the policy tables (the bundled tables when omitted)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Retirement year to resolve
    #[arg(short, long, default_value_t = 2026)]
    year: i32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let policy = match &args.dir {
        Some(dir) => {
            println!("Loading policy tables from: {}", dir.display());
            PolicyLoader::load_dir(dir)
                .with_context(|| format!("Failed to load policy tables from: {}", dir.display()))?
        }
        None => {
            println!("Loading bundled policy tables");
            PolicyLoader::bundled().context("Bundled policy tables are inconsistent")?
        }
    };

    println!("Version: {}", policy.version());

    let short_career = policy
        .ordinary_age(args.year, 0)
        .with_context(|| format!("No ordinary age rule for {}", args.year))?;
    println!(
        "Ordinary age in {}: {} months ({} months with at least {} contributed months)",
        args.year,
        short_career.age_months,
        policy
            .ordinary_age(args.year, short_career.full_career_months)?
            .age_months,
        short_career.full_career_months,
    );

    let scale = policy.contribution_scale(args.year)?;
    println!(
        "Scale from {}: {}% at {} years, 100% at {} months",
        scale.effective_from,
        scale.base_percentage,
        scale.minimum_years,
        scale.full_percentage_months(),
    );

    for modality in [EarlyModality::Voluntary, EarlyModality::Involuntary] {
        println!(
            "Early {} coefficient for short careers: {}% per quarter",
            modality,
            policy.early_coefficient(modality, 0)?,
        );
    }

    let limits = policy.limits(args.year)?;
    println!(
        "Limits ({}): minimum {}, maximum {}, income limit {}",
        limits.year, limits.minimum_pension, limits.maximum_pension, limits.income_limit,
    );

    Ok(())
}
