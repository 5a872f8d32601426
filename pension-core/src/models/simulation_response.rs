use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::IncrementOption;

/// One violated eligibility rule (`ErrorValidacion`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleViolation {
    /// Machine readable code, e.g. `CARENCIA_GENERICA_INSUFICIENTE`.
    #[serde(rename = "codigo")]
    pub code: String,

    #[serde(rename = "mensaje")]
    pub message: String,

    /// Text of the rule that was applied, for the audit trail.
    #[serde(rename = "regla_aplicada")]
    pub rule_applied: String,
}

impl RuleViolation {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        rule_applied: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            rule_applied: rule_applied.into(),
        }
    }
}

/// Verdict of the eligibility checks (`ResultadoValidacion`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(rename = "es_valido")]
    pub is_valid: bool,

    #[serde(rename = "errores")]
    pub errors: Vec<RuleViolation>,

    /// Non-blocking advisories; they never affect `is_valid`.
    #[serde(rename = "advertencias")]
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new(
        errors: Vec<RuleViolation>,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn has_error(
        &self,
        code: &str,
    ) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarlyRetirementData {
    pub meses_anticipacion: u32,
    pub trimestres_anticipacion: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub coeficiente_trimestral: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialRetirementData {
    #[serde(with = "rust_decimal::serde::float")]
    pub porcentaje_reduccion_jornada: Decimal,
    pub contrato_relevo: bool,
    #[serde(
        with = "rust_decimal::serde::float_option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub salario_compatible: Option<Decimal>,
    pub meses_anticipacion: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredRetirementData {
    pub meses_demora: u32,
    pub anos_completos_demora: u32,
    pub opcion_incremento: IncrementOption,
    #[serde(with = "rust_decimal::serde::float")]
    pub tanto_alzado: Decimal,
}

/// Data that only makes sense for one retirement modality
/// (`datos_especificos`).
///
/// Serialized as a flat object with a `tipo` discriminator so consumers that
/// iterate the keys keep working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tipo")]
pub enum TypeSpecificData {
    #[serde(rename = "ordinaria")]
    Ordinary,
    #[serde(rename = "anticipada_voluntaria")]
    VoluntaryEarly(EarlyRetirementData),
    #[serde(rename = "anticipada_involuntaria")]
    InvoluntaryEarly(EarlyRetirementData),
    #[serde(rename = "parcial")]
    Partial(PartialRetirementData),
    #[serde(rename = "demorada")]
    Deferred(DeferredRetirementData),
}

impl TypeSpecificData {
    /// One-time payment, when the modality has one.
    pub fn lump_sum(&self) -> Option<Decimal> {
        match self {
            Self::Deferred(data) => Some(data.tanto_alzado),
            _ => None,
        }
    }

    pub fn months_of_delay(&self) -> Option<u32> {
        match self {
            Self::Deferred(data) => Some(data.meses_demora),
            _ => None,
        }
    }

    pub fn months_of_advance(&self) -> Option<u32> {
        match self {
            Self::VoluntaryEarly(data) | Self::InvoluntaryEarly(data) => {
                Some(data.meses_anticipacion)
            }
            Self::Partial(data) if data.meses_anticipacion > 0 => Some(data.meses_anticipacion),
            _ => None,
        }
    }
}

/// Monetary and percentage breakdown of a valid simulation (`DetalleCalculo`).
///
/// Amounts are rounded to cents and percentages to two decimals; the
/// calculation behind them is carried at full precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationDetail {
    #[serde(
        rename = "porcentaje_anos_cotizados",
        with = "rust_decimal::serde::float"
    )]
    pub years_contributed_percentage: Decimal,

    #[serde(
        rename = "porcentaje_anticipacion_demora",
        with = "rust_decimal::serde::float"
    )]
    pub early_or_deferred_percentage: Decimal,

    #[serde(rename = "pension_antes_topes", with = "rust_decimal::serde::float")]
    pub pension_before_caps: Decimal,

    #[serde(
        rename = "pension_minima_aplicable",
        with = "rust_decimal::serde::float"
    )]
    pub applicable_minimum_pension: Decimal,

    #[serde(
        rename = "pension_maxima_aplicable",
        with = "rust_decimal::serde::float"
    )]
    pub applicable_maximum_pension: Decimal,

    #[serde(rename = "complemento_minimos", with = "rust_decimal::serde::float")]
    pub minimum_top_up: Decimal,

    #[serde(rename = "pension_final", with = "rust_decimal::serde::float")]
    pub final_pension: Decimal,

    #[serde(rename = "datos_especificos")]
    pub type_specific_data: TypeSpecificData,
}

impl CalculationDetail {
    /// Combined percentage of the regulatory base actually paid:
    /// `years% × adjustment% / 100`.
    pub fn total_applicable_percentage(&self) -> Decimal {
        self.years_contributed_percentage * self.early_or_deferred_percentage / Decimal::ONE_HUNDRED
    }
}

/// Everything returned for one simulation (`RespuestaSimulacion`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResponse {
    #[serde(rename = "validacion")]
    pub validation: ValidationResult,

    /// Present only when the request is valid.
    #[serde(rename = "calculo", default, skip_serializing_if = "Option::is_none")]
    pub calculation: Option<CalculationDetail>,

    /// Age at the desired retirement date, in years with two decimals.
    #[serde(rename = "edad_jubilacion_anos", with = "rust_decimal::serde::float")]
    pub retirement_age_years: Decimal,

    #[serde(rename = "anos_cotizados", with = "rust_decimal::serde::float")]
    pub years_contributed: Decimal,

    #[serde(rename = "reglas_aplicadas")]
    pub rules_applied: Vec<String>,

    #[serde(rename = "observaciones")]
    pub observations: Vec<String>,

    #[serde(rename = "fecha_calculo")]
    pub calculation_date: NaiveDateTime,

    #[serde(rename = "version_sistema")]
    pub system_version: String,
}
