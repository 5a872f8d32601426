use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use pension_core::{
    ContributionScale, EarlyCoefficient, EarlyModality, OrdinaryAgeRule, PensionLimits,
    PolicyError, PolicyParameters, PolicyTables, ScaleBracket,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const ORDINARY_AGE_FILE: &str = "ordinary_age.csv";
pub const CONTRIBUTION_SCALE_FILE: &str = "contribution_scale.csv";
pub const EARLY_COEFFICIENTS_FILE: &str = "early_coefficients.csv";
pub const PENSION_LIMITS_FILE: &str = "pension_limits.csv";
pub const PARAMETERS_FILE: &str = "parameters.toml";

const BUNDLED_ORDINARY_AGE: &str = include_str!("../data/ordinary_age.csv");
const BUNDLED_CONTRIBUTION_SCALE: &str = include_str!("../data/contribution_scale.csv");
const BUNDLED_EARLY_COEFFICIENTS: &str = include_str!("../data/early_coefficients.csv");
const BUNDLED_PENSION_LIMITS: &str = include_str!("../data/pension_limits.csv");
const BUNDLED_PARAMETERS: &str = include_str!("../data/parameters.toml");

/// Errors that can occur when loading policy data.
#[derive(Debug, Error)]
pub enum PolicyLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown early retirement modality '{0}' (expected voluntaria or involuntaria)")]
    UnknownModality(String),

    #[error("{0} has no rows")]
    EmptyTable(&'static str),

    #[error("contribution scale effective from {0} mixes different minimum years or base percentages")]
    InconsistentScale(i32),

    #[error("inconsistent policy tables: {0}")]
    Policy(#[from] PolicyError),
}

impl From<csv::Error> for PolicyLoaderError {
    fn from(err: csv::Error) -> Self {
        PolicyLoaderError::CsvParse(err.to_string())
    }
}

impl From<toml::de::Error> for PolicyLoaderError {
    fn from(err: toml::de::Error) -> Self {
        PolicyLoaderError::TomlParse(err.to_string())
    }
}

/// A single row of the contribution scale CSV.
///
/// Each row is one bracket; rows sharing `effective_from` form one scale
/// and must repeat the same `minimum_years` and `base_percentage`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScaleBracketRecord {
    pub effective_from: i32,
    pub minimum_years: u32,
    pub base_percentage: Decimal,
    pub up_to_month: u32,
    pub monthly_rate: Decimal,
}

/// A single row of the early retirement coefficients CSV.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EarlyCoefficientRecord {
    pub modality: String,
    pub from_contribution_months: u32,
    pub quarterly_coefficient: Decimal,
}

/// Loader for the policy tables.
///
/// Each table has its own CSV file; the scalar parameters live in a TOML
/// file. A default set is compiled into the crate and available through
/// [`PolicyLoader::bundled`].
pub struct PolicyLoader;

impl PolicyLoader {
    /// Parse the ordinary age schedule. One row per calendar year, ages and
    /// careers in months.
    pub fn parse_ordinary_ages<R: Read>(
        reader: R
    ) -> Result<Vec<OrdinaryAgeRule>, PolicyLoaderError> {
        let rows = read_rows(reader)?;
        non_empty(rows, ORDINARY_AGE_FILE)
    }

    /// Parse the contribution percentage scales, grouping bracket rows by
    /// the year they take effect.
    pub fn parse_contribution_scales<R: Read>(
        reader: R
    ) -> Result<Vec<ContributionScale>, PolicyLoaderError> {
        let records: Vec<ScaleBracketRecord> = read_rows(reader)?;
        let records = non_empty(records, CONTRIBUTION_SCALE_FILE)?;

        let mut scales: BTreeMap<i32, ContributionScale> = BTreeMap::new();
        for record in records {
            let scale = scales
                .entry(record.effective_from)
                .or_insert_with(|| ContributionScale {
                    effective_from: record.effective_from,
                    minimum_years: record.minimum_years,
                    base_percentage: record.base_percentage,
                    brackets: Vec::new(),
                });

            if scale.minimum_years != record.minimum_years
                || scale.base_percentage != record.base_percentage
            {
                return Err(PolicyLoaderError::InconsistentScale(record.effective_from));
            }

            scale.brackets.push(ScaleBracket {
                up_to_month: record.up_to_month,
                monthly_rate: record.monthly_rate,
            });
        }

        Ok(scales.into_values().collect())
    }

    /// Parse the early retirement reduction coefficients.
    pub fn parse_early_coefficients<R: Read>(
        reader: R
    ) -> Result<Vec<EarlyCoefficient>, PolicyLoaderError> {
        let records: Vec<EarlyCoefficientRecord> = read_rows(reader)?;
        let records = non_empty(records, EARLY_COEFFICIENTS_FILE)?;

        records
            .into_iter()
            .map(|record| {
                let modality = EarlyModality::parse(record.modality.trim())
                    .ok_or_else(|| PolicyLoaderError::UnknownModality(record.modality.clone()))?;
                Ok(EarlyCoefficient {
                    modality,
                    from_contribution_months: record.from_contribution_months,
                    quarterly_coefficient: record.quarterly_coefficient,
                })
            })
            .collect()
    }

    /// Parse the yearly minimum and maximum pensions.
    pub fn parse_pension_limits<R: Read>(
        reader: R
    ) -> Result<Vec<PensionLimits>, PolicyLoaderError> {
        let rows = read_rows(reader)?;
        non_empty(rows, PENSION_LIMITS_FILE)
    }

    /// Parse the scalar policy parameters.
    pub fn parse_parameters(text: &str) -> Result<PolicyParameters, PolicyLoaderError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a full set of tables from `dir`.
    ///
    /// The directory must hold the five files named by the `*_FILE`
    /// constants of this module.
    pub fn load_dir(dir: &Path) -> Result<PolicyTables, PolicyLoaderError> {
        debug!(dir = %dir.display(), "loading policy tables");

        let parameters_path = dir.join(PARAMETERS_FILE);
        let parameters_text =
            std::fs::read_to_string(&parameters_path).map_err(|source| PolicyLoaderError::Io {
                path: parameters_path,
                source,
            })?;

        Self::assemble(
            Self::parse_parameters(&parameters_text)?,
            Self::parse_ordinary_ages(open(dir, ORDINARY_AGE_FILE)?)?,
            Self::parse_contribution_scales(open(dir, CONTRIBUTION_SCALE_FILE)?)?,
            Self::parse_early_coefficients(open(dir, EARLY_COEFFICIENTS_FILE)?)?,
            Self::parse_pension_limits(open(dir, PENSION_LIMITS_FILE)?)?,
        )
    }

    /// The tables compiled into this crate.
    pub fn bundled() -> Result<PolicyTables, PolicyLoaderError> {
        Self::assemble(
            Self::parse_parameters(BUNDLED_PARAMETERS)?,
            Self::parse_ordinary_ages(BUNDLED_ORDINARY_AGE.as_bytes())?,
            Self::parse_contribution_scales(BUNDLED_CONTRIBUTION_SCALE.as_bytes())?,
            Self::parse_early_coefficients(BUNDLED_EARLY_COEFFICIENTS.as_bytes())?,
            Self::parse_pension_limits(BUNDLED_PENSION_LIMITS.as_bytes())?,
        )
    }

    fn assemble(
        parameters: PolicyParameters,
        ordinary_ages: Vec<OrdinaryAgeRule>,
        scales: Vec<ContributionScale>,
        coefficients: Vec<EarlyCoefficient>,
        limits: Vec<PensionLimits>,
    ) -> Result<PolicyTables, PolicyLoaderError> {
        debug!(
            version = %parameters.version,
            ordinary_ages = ordinary_ages.len(),
            scales = scales.len(),
            coefficients = coefficients.len(),
            limits = limits.len(),
            "assembling policy tables"
        );
        Ok(PolicyTables::new(
            parameters,
            ordinary_ages,
            scales,
            coefficients,
            limits,
        )?)
    }
}

fn read_rows<T, R>(reader: R) -> Result<Vec<T>, PolicyLoaderError>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for result in csv_reader.deserialize() {
        let row: T = result?;
        rows.push(row);
    }

    Ok(rows)
}

fn non_empty<T>(
    rows: Vec<T>,
    file: &'static str,
) -> Result<Vec<T>, PolicyLoaderError> {
    if rows.is_empty() {
        return Err(PolicyLoaderError::EmptyTable(file));
    }
    Ok(rows)
}

fn open(
    dir: &Path,
    file: &str,
) -> Result<File, PolicyLoaderError> {
    let path = dir.join(file);
    File::open(&path).map_err(|source| PolicyLoaderError::Io { path, source })
}
