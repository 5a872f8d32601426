//! Statutory policy tables.
//!
//! Every figure that changes with legislation lives here as data: the
//! ordinary retirement age per calendar year, the percentage scale for
//! years contributed, the reduction coefficients for early retirement, the
//! yearly minimum and maximum pensions, and the scalar parameters of each
//! retirement modality. Tables are validated once on construction and are
//! read-only afterwards, so a single [`PolicyTables`] can be shared by any
//! number of concurrent evaluations.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Failures to resolve or build policy data.
///
/// These are system faults, never a verdict on the applicant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("{0} table is empty")]
    EmptyTable(&'static str),

    #[error("{table} table has no entry for year {year}")]
    MissingYear { table: &'static str, year: i32 },

    #[error("no {modality} early retirement coefficient for {months} contributed months")]
    MissingCoefficient {
        modality: EarlyModality,
        months: u32,
    },

    #[error("{table} table has duplicate entries for {key}")]
    DuplicateEntry { table: &'static str, key: String },

    #[error("contribution scale effective from {effective_from} is invalid: {reason}")]
    InvalidScale { effective_from: i32, reason: String },

    #[error("pension limits for {year} are invalid: {reason}")]
    InvalidLimits { year: i32, reason: String },
}

/// Ordinary retirement age rule for one calendar year.
///
/// Careers of at least `full_career_months` retire at `reduced_age_months`;
/// shorter careers at `standard_age_months`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdinaryAgeRule {
    pub year: i32,
    pub full_career_months: u32,
    pub reduced_age_months: u32,
    pub standard_age_months: u32,
}

/// Ordinary age resolved for one applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrdinaryAge {
    /// Year of the rule that was applied.
    pub rule_year: i32,
    pub age_months: u32,
    pub full_career_months: u32,
    /// Whether the applicant's career reached the full-career requirement.
    pub full_career: bool,
}

/// One step of the percentage scale: each contributed month beyond the
/// minimum, up to `up_to_month`, adds `monthly_rate` percentage points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleBracket {
    pub up_to_month: u32,
    pub monthly_rate: Decimal,
}

/// Percentage of the regulatory base earned by years contributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionScale {
    pub effective_from: i32,
    pub minimum_years: u32,
    pub base_percentage: Decimal,
    /// Sorted by `up_to_month`, counted from the end of the minimum period.
    pub brackets: Vec<ScaleBracket>,
}

impl ContributionScale {
    /// Percentage earned for `contributed_months` of career.
    ///
    /// Zero below the minimum period, `base_percentage` at exactly the
    /// minimum, then bracket by bracket, capped at 100.
    pub fn percentage(
        &self,
        contributed_months: u32,
    ) -> Decimal {
        let minimum_months = self.minimum_years * 12;
        if contributed_months < minimum_months {
            return Decimal::ZERO;
        }

        let extra_months = contributed_months - minimum_months;
        let mut percentage = self.base_percentage;
        let mut previous_limit = 0;
        for bracket in &self.brackets {
            let upper = extra_months.min(bracket.up_to_month);
            if upper > previous_limit {
                percentage += Decimal::from(upper - previous_limit) * bracket.monthly_rate;
            }
            previous_limit = bracket.up_to_month;
        }

        percentage.min(Decimal::ONE_HUNDRED)
    }

    /// Career length, in months, at which the scale reaches 100 %.
    pub fn full_percentage_months(&self) -> u32 {
        self.minimum_years * 12 + self.brackets.last().map_or(0, |b| b.up_to_month)
    }

    fn validate(&self) -> Result<(), PolicyError> {
        let invalid = |reason: &str| PolicyError::InvalidScale {
            effective_from: self.effective_from,
            reason: reason.to_string(),
        };

        if self.brackets.is_empty() {
            return Err(invalid("no brackets"));
        }
        if self
            .brackets
            .windows(2)
            .any(|w| w[0].up_to_month >= w[1].up_to_month)
        {
            return Err(invalid("brackets must be strictly increasing"));
        }
        if self.brackets.iter().any(|b| b.monthly_rate < Decimal::ZERO) {
            return Err(invalid("negative monthly rate"));
        }
        if self.base_percentage < Decimal::ZERO || self.base_percentage > Decimal::ONE_HUNDRED {
            return Err(invalid("base percentage must be between 0 and 100"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EarlyModality {
    #[serde(rename = "voluntaria")]
    Voluntary,
    #[serde(rename = "involuntaria")]
    Involuntary,
}

impl EarlyModality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Voluntary => "voluntaria",
            Self::Involuntary => "involuntaria",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "voluntaria" => Some(Self::Voluntary),
            "involuntaria" => Some(Self::Involuntary),
            _ => None,
        }
    }
}

impl fmt::Display for EarlyModality {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reduction, in percentage points per quarter of anticipation, for careers
/// of at least `from_contribution_months`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarlyCoefficient {
    pub modality: EarlyModality,
    pub from_contribution_months: u32,
    pub quarterly_coefficient: Decimal,
}

/// Yearly monthly-pension floor and ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PensionLimits {
    pub year: i32,
    pub minimum_pension: Decimal,
    pub maximum_pension: Decimal,
    /// Above this yearly income the top-up to the minimum is not paid.
    pub income_limit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarlyRetirementRule {
    pub minimum_contribution_years: u32,
    pub max_advance_months: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialRetirementRule {
    pub relay_minimum_age_years: u32,
    pub min_reduction_percentage: Decimal,
    pub max_reduction_percentage: Decimal,
    pub min_seniority_years: Decimal,
    pub min_relay_base_percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredRetirementRule {
    /// Percentage points added per full year of delay.
    pub annual_increment_percentage: Decimal,
    /// Lump sum per full year, as a percentage of the yearly pension.
    pub lump_sum_annual_percentage: Decimal,
    /// Share of each benefit kept under the mixed option.
    pub mixed_split: Decimal,
    /// Pension payments per year, used to annualise the monthly pension.
    pub annual_payments: u32,
}

/// Scalar parameters of the eligibility and amount rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyParameters {
    /// Identifies the data set, e.g. `"2025.1"`.
    pub version: String,
    pub minimum_contribution_years: u32,
    pub minimum_specific_contribution_days: i32,
    /// Margin, in years of contribution, under which a pass is flagged as borderline.
    pub borderline_contribution_years: Decimal,
    /// Margin, in months of age, under which a pass is flagged as borderline.
    pub borderline_age_months: u32,
    pub voluntary_early: EarlyRetirementRule,
    pub involuntary_early: EarlyRetirementRule,
    pub partial: PartialRetirementRule,
    pub deferred: DeferredRetirementRule,
}

impl PolicyParameters {
    pub fn early_rule(
        &self,
        modality: EarlyModality,
    ) -> &EarlyRetirementRule {
        match modality {
            EarlyModality::Voluntary => &self.voluntary_early,
            EarlyModality::Involuntary => &self.involuntary_early,
        }
    }
}

/// The complete, validated set of policy data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTables {
    parameters: PolicyParameters,
    ordinary_ages: Vec<OrdinaryAgeRule>,
    contribution_scales: Vec<ContributionScale>,
    early_coefficients: Vec<EarlyCoefficient>,
    pension_limits: Vec<PensionLimits>,
}

impl PolicyTables {
    /// Validates and indexes the tables.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if a table is empty, a key is duplicated, a
    /// scale is malformed, a limits row has its minimum above its maximum,
    /// or an early modality has no coefficient for short careers.
    pub fn new(
        parameters: PolicyParameters,
        mut ordinary_ages: Vec<OrdinaryAgeRule>,
        mut contribution_scales: Vec<ContributionScale>,
        mut early_coefficients: Vec<EarlyCoefficient>,
        mut pension_limits: Vec<PensionLimits>,
    ) -> Result<Self, PolicyError> {
        ordinary_ages.sort_by_key(|r| r.year);
        contribution_scales.sort_by_key(|s| s.effective_from);
        early_coefficients.sort_by_key(|c| (c.modality.as_str(), c.from_contribution_months));
        pension_limits.sort_by_key(|l| l.year);

        ensure_unique("ordinary age", ordinary_ages.iter().map(|r| r.year))?;
        ensure_unique(
            "contribution scale",
            contribution_scales.iter().map(|s| s.effective_from),
        )?;
        ensure_unique("pension limits", pension_limits.iter().map(|l| l.year))?;

        for scale in &contribution_scales {
            scale.validate()?;
        }

        for limits in &pension_limits {
            if limits.minimum_pension > limits.maximum_pension {
                return Err(PolicyError::InvalidLimits {
                    year: limits.year,
                    reason: "minimum pension above maximum pension".to_string(),
                });
            }
        }

        if ordinary_ages.is_empty() {
            return Err(PolicyError::EmptyTable("ordinary age"));
        }
        if contribution_scales.is_empty() {
            return Err(PolicyError::EmptyTable("contribution scale"));
        }
        if pension_limits.is_empty() {
            return Err(PolicyError::EmptyTable("pension limits"));
        }

        let tables = Self {
            parameters,
            ordinary_ages,
            contribution_scales,
            early_coefficients,
            pension_limits,
        };

        // Every career length must resolve to a coefficient.
        for modality in [EarlyModality::Voluntary, EarlyModality::Involuntary] {
            tables.early_coefficient(modality, 0)?;
        }

        Ok(tables)
    }

    pub fn parameters(&self) -> &PolicyParameters {
        &self.parameters
    }

    pub fn version(&self) -> &str {
        &self.parameters.version
    }

    /// Ordinary retirement age for a retirement in `year` after
    /// `contributed_months` of career.
    ///
    /// Years after the last row reuse the last row, since the transitional
    /// schedule ends in a permanent rule.
    ///
    /// # Errors
    ///
    /// [`PolicyError::MissingYear`] for years before the first row.
    pub fn ordinary_age(
        &self,
        year: i32,
        contributed_months: u32,
    ) -> Result<OrdinaryAge, PolicyError> {
        let rule = latest_at_or_before(&self.ordinary_ages, year, |r| r.year).ok_or(
            PolicyError::MissingYear {
                table: "ordinary age",
                year,
            },
        )?;

        let full_career = contributed_months >= rule.full_career_months;
        let age_months = if full_career {
            rule.reduced_age_months
        } else {
            rule.standard_age_months
        };
        debug!(
            year,
            rule_year = rule.year,
            contributed_months,
            age_months,
            "resolved ordinary retirement age"
        );

        Ok(OrdinaryAge {
            rule_year: rule.year,
            age_months,
            full_career_months: rule.full_career_months,
            full_career,
        })
    }

    /// Percentage scale in force for a retirement in `year`.
    ///
    /// # Errors
    ///
    /// [`PolicyError::MissingYear`] if no scale was yet in force.
    pub fn contribution_scale(
        &self,
        year: i32,
    ) -> Result<&ContributionScale, PolicyError> {
        latest_at_or_before(&self.contribution_scales, year, |s| s.effective_from).ok_or(
            PolicyError::MissingYear {
                table: "contribution scale",
                year,
            },
        )
    }

    /// Quarterly reduction coefficient for a career of `contributed_months`.
    ///
    /// # Errors
    ///
    /// [`PolicyError::MissingCoefficient`] when no row covers the career.
    pub fn early_coefficient(
        &self,
        modality: EarlyModality,
        contributed_months: u32,
    ) -> Result<Decimal, PolicyError> {
        self.early_coefficients
            .iter()
            .filter(|c| c.modality == modality && c.from_contribution_months <= contributed_months)
            .max_by_key(|c| c.from_contribution_months)
            .map(|c| c.quarterly_coefficient)
            .ok_or(PolicyError::MissingCoefficient {
                modality,
                months: contributed_months,
            })
    }

    /// Minimum and maximum pension for `year`.
    ///
    /// Falls back to the most recent earlier year, with a warning, since
    /// new yearly figures are usually published late.
    ///
    /// # Errors
    ///
    /// [`PolicyError::MissingYear`] for years before the first row.
    pub fn limits(
        &self,
        year: i32,
    ) -> Result<&PensionLimits, PolicyError> {
        let limits = latest_at_or_before(&self.pension_limits, year, |l| l.year).ok_or(
            PolicyError::MissingYear {
                table: "pension limits",
                year,
            },
        )?;
        if limits.year != year {
            warn!(
                year,
                fallback_year = limits.year,
                "no pension limits for year, using most recent"
            );
        }
        Ok(limits)
    }
}

fn latest_at_or_before<T>(
    rows: &[T],
    year: i32,
    key: impl Fn(&T) -> i32,
) -> Option<&T> {
    rows.iter().rev().find(|row| key(row) <= year)
}

fn ensure_unique(
    table: &'static str,
    sorted_keys: impl Iterator<Item = i32>,
) -> Result<(), PolicyError> {
    let mut previous = None;
    for key in sorted_keys {
        if previous == Some(key) {
            return Err(PolicyError::DuplicateEntry {
                table,
                key: key.to_string(),
            });
        }
        previous = Some(key);
    }
    Ok(())
}
