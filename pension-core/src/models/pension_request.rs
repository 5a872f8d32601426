use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::dates::{birth_date_bounds, retirement_date_bounds};
use crate::models::{IncrementOption, RetirementType, Sex};

/// Largest accepted total contribution: 50 years of 365 days.
pub const MAX_GENERIC_CONTRIBUTION_DAYS: i32 = 18_250;

/// Width of the recent-contribution window: 15 years of 365 days.
pub const SPECIFIC_CONTRIBUTION_WINDOW_DAYS: i32 = 5_475;

/// Errors in the shape of a request, detected before any rule is evaluated.
///
/// These are distinct from a request that is well formed but does not
/// qualify, which is reported inside the simulation response instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("birth date {date} must fall between {earliest} and {latest}")]
    BirthDateOutOfRange {
        date: NaiveDate,
        earliest: NaiveDate,
        latest: NaiveDate,
    },

    #[error("desired retirement date {date} must fall between {earliest} and {latest}")]
    RetirementDateOutOfRange {
        date: NaiveDate,
        earliest: NaiveDate,
        latest: NaiveDate,
    },

    #[error("total contribution of {0} days exceeds the maximum of 18250")]
    GenericContributionTooLarge(i32),

    #[error("regulatory base must be greater than 0 and at most 10000, got {0}")]
    RegulatoryBaseOutOfRange(Decimal),

    #[error("other annual income cannot be negative, got {0}")]
    NegativeOtherIncome(Decimal),

    #[error("partial retirement requires partial retirement details")]
    MissingPartialDetails,

    #[error("deferred retirement requires deferred retirement details")]
    MissingDeferredDetails,

    #[error("partial retirement details given for retirement type '{0}'")]
    UnexpectedPartialDetails(RetirementType),

    #[error("deferred retirement details given for retirement type '{0}'")]
    UnexpectedDeferredDetails(RetirementType),
}

/// Extra inputs for partial retirement (`datos_parcial`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDetails {
    /// Reduction of the working day, as a percentage.
    #[serde(rename = "porcentaje_reduccion_jornada")]
    pub reduction_percentage: Decimal,

    /// Whether a relay worker is hired to cover the reduced hours.
    #[serde(rename = "contrato_relevo")]
    pub relay_contract: bool,

    /// Salary kept for the part of the day still worked.
    #[serde(
        rename = "salario_compatible",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub compatible_salary: Option<Decimal>,

    #[serde(
        rename = "antiguedad_empresa_anios",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub seniority_years: Option<Decimal>,

    /// Contribution base of the relay worker as a percentage of the retiree's.
    #[serde(
        rename = "base_cotizacion_relevista_pct",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub relay_base_percentage: Option<Decimal>,

    #[serde(
        rename = "mantenimiento_relevo_meses",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub relay_maintenance_months: Option<u32>,
}

/// Extra inputs for deferred retirement (`datos_demorada`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredDetails {
    #[serde(rename = "meses_retraso")]
    pub months_of_delay: u32,

    #[serde(rename = "opcion_incremento")]
    pub increment_option: IncrementOption,
}

/// A retirement simulation request (`SolicitudPension`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PensionRequest {
    #[serde(rename = "fecha_nacimiento")]
    pub birth_date: NaiveDate,

    #[serde(rename = "fecha_jubilacion_deseada")]
    pub desired_retirement_date: NaiveDate,

    /// Recorded for reporting; no rule depends on it.
    #[serde(rename = "sexo")]
    pub sex: Sex,

    /// Total career contribution, in days.
    #[serde(rename = "carencia_generica")]
    pub generic_contribution_days: i32,

    /// Contribution within the last 15 years before retirement, in days.
    #[serde(rename = "carencia_especifica")]
    pub specific_contribution_days: i32,

    /// Averaged monthly contribution base.
    #[serde(rename = "base_reguladora")]
    pub regulatory_base: Decimal,

    #[serde(rename = "tipo_jubilacion")]
    pub retirement_type: RetirementType,

    #[serde(rename = "otras_rentas_anuales", default)]
    pub other_annual_income: Decimal,

    #[serde(
        rename = "datos_parcial",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub partial_details: Option<PartialDetails>,

    #[serde(
        rename = "datos_demorada",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub deferred_details: Option<DeferredDetails>,
}

impl PensionRequest {
    /// Checks field ranges and the presence of type-specific details.
    ///
    /// `today` anchors the date windows: the applicant must be between 16
    /// and 100 years old and the retirement date must lie within the next
    /// 30 years.
    ///
    /// # Errors
    ///
    /// Returns the first [`RequestError`] found.
    pub fn validate_shape(
        &self,
        today: NaiveDate,
    ) -> Result<(), RequestError> {
        let (earliest_birth, latest_birth) = birth_date_bounds(today);
        if self.birth_date < earliest_birth || self.birth_date > latest_birth {
            return Err(RequestError::BirthDateOutOfRange {
                date: self.birth_date,
                earliest: earliest_birth,
                latest: latest_birth,
            });
        }

        let (earliest_retirement, latest_retirement) = retirement_date_bounds(today);
        if self.desired_retirement_date < earliest_retirement
            || self.desired_retirement_date > latest_retirement
        {
            return Err(RequestError::RetirementDateOutOfRange {
                date: self.desired_retirement_date,
                earliest: earliest_retirement,
                latest: latest_retirement,
            });
        }

        if self.generic_contribution_days > MAX_GENERIC_CONTRIBUTION_DAYS {
            return Err(RequestError::GenericContributionTooLarge(
                self.generic_contribution_days,
            ));
        }

        if self.regulatory_base <= Decimal::ZERO || self.regulatory_base > Decimal::from(10_000) {
            return Err(RequestError::RegulatoryBaseOutOfRange(
                self.regulatory_base,
            ));
        }

        if self.other_annual_income < Decimal::ZERO {
            return Err(RequestError::NegativeOtherIncome(
                self.other_annual_income,
            ));
        }

        match (self.retirement_type, &self.partial_details) {
            (RetirementType::Partial, None) => return Err(RequestError::MissingPartialDetails),
            (kind, Some(_)) if kind != RetirementType::Partial => {
                return Err(RequestError::UnexpectedPartialDetails(kind));
            }
            _ => {}
        }

        match (self.retirement_type, &self.deferred_details) {
            (RetirementType::Deferred, None) => Err(RequestError::MissingDeferredDetails),
            (kind, Some(_)) if kind != RetirementType::Deferred => {
                Err(RequestError::UnexpectedDeferredDetails(kind))
            }
            _ => Ok(()),
        }
    }
}
