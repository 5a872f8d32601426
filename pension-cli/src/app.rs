//! Command implementations behind the `pension-sim` binary.
//!
//! Each command writes its result to the given writer so it can be driven
//! from tests as well as from `main`.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::ValueEnum;
use pension_core::{
    PensionRequest, PolicyTables, RetirementType, SimulationError, SimulationResponse, Simulator,
    catalog,
};
use pension_data::PolicyLoader;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::report::{ReportOptions, build_report, file_name};

const GENERIC_FAILURE: &str =
    "No se ha podido completar la simulación. Inténtelo de nuevo más tarde.";

/// How `simulate` presents its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Report,
}

/// Loads the tables from `dir`, or the bundled ones.
pub fn load_policy(dir: Option<&Path>) -> Result<PolicyTables> {
    let policy = match dir {
        Some(dir) => PolicyLoader::load_dir(dir)
            .with_context(|| format!("Failed to load policy tables from: {}", dir.display()))?,
        None => PolicyLoader::bundled().context("Bundled policy tables are inconsistent")?,
    };
    info!(version = policy.version(), "policy tables loaded");
    Ok(policy)
}

/// Reads one JSON request.
pub fn read_request(path: &Path) -> Result<PensionRequest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid request JSON: {}", path.display()))
}

/// Message shown to the user for a failed simulation.
///
/// Input problems are explained; anything else is reported generically and
/// only detailed in the log.
pub fn user_message(error: &SimulationError) -> String {
    match error {
        SimulationError::Request(inner) => format!("Datos de entrada no válidos: {inner}"),
        _ => GENERIC_FAILURE.to_string(),
    }
}

fn log_failure(error: &SimulationError) {
    if error.is_input_error() {
        warn!(%error, "request rejected");
    } else {
        error!(%error, "simulation failed");
    }
}

fn user_facing<T>(result: Result<T, SimulationError>) -> Result<T> {
    result.map_err(|error| {
        log_failure(&error);
        anyhow::anyhow!(user_message(&error))
    })
}

/// `simulate`: evaluates one request and prints the response or its report.
///
/// With `output_dir`, the report is written there under its standard file
/// name and the path is printed instead.
pub fn simulate<W: Write>(
    out: &mut W,
    policy: &PolicyTables,
    request: &PensionRequest,
    as_of: NaiveDateTime,
    format: OutputFormat,
    report_options: &ReportOptions,
    output_dir: Option<&Path>,
) -> Result<SimulationResponse> {
    let response = user_facing(Simulator::new(policy).evaluate(request, as_of))?;
    debug!(valid = response.validation.is_valid, "simulation complete");

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &response)?;
            writeln!(out)?;
        }
        OutputFormat::Report => {
            let report = build_report(request, &response, report_options, as_of.date());
            match output_dir {
                Some(dir) => {
                    let path =
                        write_report_file(dir, request.retirement_type, as_of, &report.render())?;
                    writeln!(out, "{}", path.display())?;
                }
                None => out.write_all(report.render().as_bytes())?,
            }
        }
    }

    Ok(response)
}

fn write_report_file(
    dir: &Path,
    kind: RetirementType,
    as_of: NaiveDateTime,
    text: &str,
) -> Result<PathBuf> {
    let path = dir.join(file_name(kind, as_of.date()));
    std::fs::write(&path, text)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    info!(path = %path.display(), "report written");
    Ok(path)
}

/// `validate`: checks requirements only and prints the validation result.
pub fn validate<W: Write>(
    out: &mut W,
    policy: &PolicyTables,
    request: &PensionRequest,
    as_of: NaiveDateTime,
) -> Result<()> {
    let validation = user_facing(Simulator::new(policy).validate_requirements(request, as_of))?;
    serde_json::to_writer_pretty(&mut *out, &validation)?;
    writeln!(out)?;
    Ok(())
}

/// One output line of `batch`.
#[derive(Debug, Serialize)]
struct BatchLine<'a> {
    fila: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    resultado: Option<&'a SimulationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Counts reported by `batch`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub valid: usize,
    pub invalid: usize,
    pub failed: usize,
}

/// `batch`: evaluates every request and prints one JSON object per line.
///
/// A failing row is reported on its own line and does not stop the batch.
pub fn batch<W: Write>(
    out: &mut W,
    policy: &PolicyTables,
    requests: &[PensionRequest],
    as_of: NaiveDateTime,
) -> Result<BatchSummary> {
    let simulator = Simulator::new(policy);
    let mut summary = BatchSummary::default();

    for (idx, request) in requests.iter().enumerate() {
        let fila = idx + 1;
        match simulator.evaluate(request, as_of) {
            Ok(response) => {
                if response.validation.is_valid {
                    summary.valid += 1;
                } else {
                    summary.invalid += 1;
                }
                let line = BatchLine {
                    fila,
                    resultado: Some(&response),
                    error: None,
                };
                serde_json::to_writer(&mut *out, &line)?;
            }
            Err(error) => {
                log_failure(&error);
                summary.failed += 1;
                let line = BatchLine {
                    fila,
                    resultado: None,
                    error: Some(user_message(&error)),
                };
                serde_json::to_writer(&mut *out, &line)?;
            }
        }
        writeln!(out)?;
    }

    info!(
        valid = summary.valid,
        invalid = summary.invalid,
        failed = summary.failed,
        "batch complete"
    );
    Ok(summary)
}

/// `types`: prints the catalogue of retirement types.
pub fn list_types<W: Write>(out: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, &catalog::list_retirement_types())?;
    writeln!(out)?;
    Ok(())
}

/// `requirements`: prints the requirements of one retirement type.
pub fn requirements<W: Write>(
    out: &mut W,
    kind: &str,
) -> Result<()> {
    let kind = RetirementType::parse(kind).with_context(|| {
        let known: Vec<&str> = RetirementType::ALL.iter().map(|k| k.as_str()).collect();
        format!(
            "Tipo de jubilación desconocido '{kind}'. Valores válidos: {}",
            known.join(", ")
        )
    })?;
    serde_json::to_writer_pretty(&mut *out, &catalog::requirements_for(kind))?;
    writeln!(out)?;
    Ok(())
}
