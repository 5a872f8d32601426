//! Eligibility rules per retirement modality.
//!
//! The engine resolves the thresholds that apply to a request (minimum age,
//! minimum contributed years, modality-specific conditions) and checks every
//! one of them, collecting violations instead of stopping at the first.
//! Each check also leaves a line in the audit trail.
//!
//! | Modality               | Minimum age                        | Minimum years |
//! |------------------------|------------------------------------|---------------|
//! | `ordinaria`            | ordinary age                       | 15            |
//! | `anticipada_voluntaria`| ordinary age − 24 months           | 35            |
//! | `anticipada_involuntaria` | ordinary age − 48 months        | 33            |
//! | `parcial`              | 62 with relay contract, else ordinary | 15         |
//! | `demorada`             | ordinary age                       | 15            |
//!
//! All modalities also need 730 days of contribution within the last 15
//! years.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::SimulationError;
use crate::calculations::contributions::validate_contributions;
use crate::calculations::dates::{
    age, contributed_months, days_to_years, elapsed_months, format_years_months,
};
use crate::models::{
    DeferredDetails, EarlyModality, IncrementOption, OrdinaryAge, PartialDetails, PensionRequest,
    PolicyTables, RetirementType, RuleViolation, ValidationResult,
};

/// Facts about the applicant that every rule is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityContext {
    /// Age in full years on the evaluation date.
    pub current_age: u32,
    pub retirement_year: i32,
    /// Age at the desired retirement date, in full months.
    pub age_at_retirement_months: u32,
    pub contributed_months: u32,
    /// Contributed years at full precision (days / 365).
    pub years_contributed: Decimal,
    pub ordinary_age: OrdinaryAge,
}

impl EligibilityContext {
    /// Derives the context for `request` as seen on `today`.
    ///
    /// # Errors
    ///
    /// [`SimulationError::Date`] when the dates are reversed, and
    /// [`SimulationError::Policy`] when no ordinary age is known for the
    /// retirement year.
    pub fn resolve(
        request: &PensionRequest,
        policy: &PolicyTables,
        today: NaiveDate,
    ) -> Result<Self, SimulationError> {
        let current_age = age(request.birth_date, today)?;
        let age_at_retirement_months =
            elapsed_months(request.birth_date, request.desired_retirement_date)?;
        let retirement_year = request.desired_retirement_date.year();
        let months = contributed_months(request.generic_contribution_days);
        let ordinary_age = policy.ordinary_age(retirement_year, months)?;

        Ok(Self {
            current_age,
            retirement_year,
            age_at_retirement_months,
            contributed_months: months,
            years_contributed: days_to_years(request.generic_contribution_days),
            ordinary_age,
        })
    }

    /// Months between the desired retirement date and the ordinary age;
    /// zero once the ordinary age is reached.
    pub fn months_before_ordinary_age(&self) -> u32 {
        self.ordinary_age
            .age_months
            .saturating_sub(self.age_at_retirement_months)
    }

    /// Months past the ordinary age at the desired retirement date.
    pub fn months_after_ordinary_age(&self) -> u32 {
        self.age_at_retirement_months
            .saturating_sub(self.ordinary_age.age_months)
    }
}

/// Errors, warnings and audit lines produced by the eligibility checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EligibilityOutcome {
    pub errors: Vec<RuleViolation>,
    pub warnings: Vec<String>,
    pub rules_applied: Vec<String>,
}

impl EligibilityOutcome {
    pub fn is_eligible(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn fail(
        &mut self,
        code: &str,
        message: impl Into<String>,
        rule: impl Into<String>,
    ) {
        self.errors.push(RuleViolation::new(code, message, rule));
    }

    pub fn warn(
        &mut self,
        warning: impl Into<String>,
    ) {
        self.warnings.push(warning.into());
    }

    pub fn rule(
        &mut self,
        line: impl Into<String>,
    ) {
        self.rules_applied.push(line.into());
    }

    pub fn to_validation(&self) -> ValidationResult {
        ValidationResult::new(self.errors.clone(), self.warnings.clone())
    }
}

/// Evaluates the eligibility rules against a [`PolicyTables`] set.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityEngine<'a> {
    policy: &'a PolicyTables,
}

impl<'a> EligibilityEngine<'a> {
    pub fn new(policy: &'a PolicyTables) -> Self {
        Self { policy }
    }

    /// Runs every check that applies to the request's modality.
    ///
    /// Never short-circuits: a request failing on age and on contribution
    /// gets both errors.
    pub fn evaluate(
        &self,
        request: &PensionRequest,
        context: &EligibilityContext,
    ) -> EligibilityOutcome {
        let mut outcome = EligibilityOutcome::default();
        let kind = request.retirement_type;

        self.describe_ordinary_age(context, &mut outcome);
        self.check_contribution_coherency(request, context, &mut outcome);

        let minimum_age = self.minimum_age_months(request, context);
        self.check_minimum_age(kind, minimum_age, context, &mut outcome);
        self.check_generic_contribution(self.minimum_years(kind), context, &mut outcome);
        self.check_specific_contribution(request.specific_contribution_days, &mut outcome);

        match kind {
            RetirementType::Ordinary => {}
            RetirementType::VoluntaryEarly | RetirementType::InvoluntaryEarly => {
                self.check_early(kind, context, &mut outcome);
            }
            RetirementType::Partial => {
                if let Some(details) = &request.partial_details {
                    self.check_partial(details, &mut outcome);
                }
            }
            RetirementType::Deferred => {
                if let Some(details) = &request.deferred_details {
                    self.check_deferred(details, context, &mut outcome);
                }
            }
        }

        debug!(
            retirement_type = %kind,
            errors = outcome.errors.len(),
            warnings = outcome.warnings.len(),
            "eligibility evaluated"
        );
        outcome
    }

    /// Minimum age, in months, for the request's modality.
    pub fn minimum_age_months(
        &self,
        request: &PensionRequest,
        context: &EligibilityContext,
    ) -> u32 {
        let parameters = self.policy.parameters();
        let ordinary = context.ordinary_age.age_months;
        match request.retirement_type {
            RetirementType::Ordinary | RetirementType::Deferred => ordinary,
            RetirementType::VoluntaryEarly => {
                ordinary.saturating_sub(parameters.voluntary_early.max_advance_months)
            }
            RetirementType::InvoluntaryEarly => {
                ordinary.saturating_sub(parameters.involuntary_early.max_advance_months)
            }
            RetirementType::Partial => {
                let with_relay = request
                    .partial_details
                    .as_ref()
                    .is_some_and(|d| d.relay_contract);
                if with_relay {
                    (parameters.partial.relay_minimum_age_years * 12).min(ordinary)
                } else {
                    ordinary
                }
            }
        }
    }

    /// Minimum contributed years for a modality.
    pub fn minimum_years(
        &self,
        kind: RetirementType,
    ) -> u32 {
        let parameters = self.policy.parameters();
        match kind {
            RetirementType::VoluntaryEarly => parameters.voluntary_early.minimum_contribution_years,
            RetirementType::InvoluntaryEarly => {
                parameters.involuntary_early.minimum_contribution_years
            }
            _ => parameters.minimum_contribution_years,
        }
    }

    fn describe_ordinary_age(
        &self,
        context: &EligibilityContext,
        outcome: &mut EligibilityOutcome,
    ) {
        let ordinary = &context.ordinary_age;
        let career = if ordinary.full_career {
            "carrera de al menos"
        } else {
            "carrera inferior a"
        };
        outcome.rule(format!(
            "Edad ordinaria de jubilación en {}: {} ({} {} cotizados)",
            context.retirement_year,
            format_years_months(ordinary.age_months),
            career,
            format_years_months(ordinary.full_career_months),
        ));
    }

    fn check_contribution_coherency(
        &self,
        request: &PensionRequest,
        context: &EligibilityContext,
        outcome: &mut EligibilityOutcome,
    ) {
        outcome.rule(format!(
            "Coherencia de días cotizados con la edad actual ({} años)",
            context.current_age
        ));
        if let Some(issue) = validate_contributions(
            request.generic_contribution_days,
            request.specific_contribution_days,
            context.current_age,
        ) {
            outcome.errors.push(issue.to_violation());
        }
    }

    fn check_minimum_age(
        &self,
        kind: RetirementType,
        minimum_age: u32,
        context: &EligibilityContext,
        outcome: &mut EligibilityOutcome,
    ) {
        let rule = format!(
            "Edad mínima para {}: {}",
            kind.display_name(),
            format_years_months(minimum_age)
        );
        outcome.rule(rule.clone());

        let actual = context.age_at_retirement_months;
        if actual < minimum_age {
            outcome.fail(
                "EDAD_INSUFICIENTE",
                format!(
                    "La edad en la fecha de jubilación deseada ({}) es inferior a la mínima exigida ({})",
                    format_years_months(actual),
                    format_years_months(minimum_age)
                ),
                rule,
            );
        } else if actual - minimum_age < self.policy.parameters().borderline_age_months {
            outcome.warn(format!(
                "Alcanza la edad mínima exigida ({}) por menos de {} meses",
                format_years_months(minimum_age),
                self.policy.parameters().borderline_age_months
            ));
        }
    }

    fn check_generic_contribution(
        &self,
        minimum_years: u32,
        context: &EligibilityContext,
        outcome: &mut EligibilityOutcome,
    ) {
        let rule = format!("Carencia genérica mínima: {minimum_years} años cotizados");
        outcome.rule(rule.clone());

        let minimum = Decimal::from(minimum_years);
        let years = context.years_contributed;
        if years < minimum {
            outcome.fail(
                "CARENCIA_GENERICA_INSUFICIENTE",
                format!(
                    "Se requieren al menos {} años cotizados y constan {}",
                    minimum_years,
                    years.round_dp(2)
                ),
                rule,
            );
        } else if years - minimum < self.policy.parameters().borderline_contribution_years {
            outcome.warn(format!(
                "Cumple la carencia mínima de {minimum_years} años por un margen inferior a un año"
            ));
        }
    }

    fn check_specific_contribution(
        &self,
        specific_days: i32,
        outcome: &mut EligibilityOutcome,
    ) {
        let minimum = self.policy.parameters().minimum_specific_contribution_days;
        let rule = format!("Carencia específica mínima: {minimum} días en los últimos 15 años");
        outcome.rule(rule.clone());

        if specific_days < minimum {
            outcome.fail(
                "CARENCIA_ESPECIFICA_INSUFICIENTE",
                format!(
                    "Se requieren al menos {minimum} días cotizados en los últimos 15 años y constan {specific_days}"
                ),
                rule,
            );
        }
    }

    fn check_early(
        &self,
        kind: RetirementType,
        context: &EligibilityContext,
        outcome: &mut EligibilityOutcome,
    ) {
        let modality = match kind {
            RetirementType::InvoluntaryEarly => EarlyModality::Involuntary,
            _ => EarlyModality::Voluntary,
        };
        let rule = self.policy.parameters().early_rule(modality);
        outcome.rule(format!(
            "Anticipación máxima sobre la edad ordinaria: {} meses",
            rule.max_advance_months
        ));

        if context.months_before_ordinary_age() == 0 {
            outcome.warn(
                "En la fecha deseada ya se alcanza la edad ordinaria; no se aplica reducción por anticipación",
            );
        }

        match modality {
            EarlyModality::Voluntary => outcome.rule(
                "La pensión resultante debe superar la pensión mínima que correspondería a la edad ordinaria",
            ),
            EarlyModality::Involuntary => outcome.warn(
                "La jubilación anticipada involuntaria exige acreditar el cese no voluntario en el trabajo",
            ),
        }
    }

    fn check_partial(
        &self,
        details: &PartialDetails,
        outcome: &mut EligibilityOutcome,
    ) {
        let rule = &self.policy.parameters().partial;

        let range = format!(
            "Reducción de jornada entre {}% y {}%",
            rule.min_reduction_percentage, rule.max_reduction_percentage
        );
        outcome.rule(range.clone());
        let reduction = details.reduction_percentage;
        if reduction < rule.min_reduction_percentage || reduction > rule.max_reduction_percentage {
            outcome.fail(
                "REDUCCION_JORNADA_FUERA_DE_RANGO",
                format!("La reducción de jornada del {reduction}% está fuera del rango permitido"),
                range,
            );
        }

        if !details.relay_contract {
            return;
        }

        let (Some(seniority), Some(relay_base)) =
            (details.seniority_years, details.relay_base_percentage)
        else {
            outcome.fail(
                "DATOS_RELEVO_INCOMPLETOS",
                "Con contrato de relevo deben indicarse la antigüedad en la empresa y la base de cotización del relevista",
                "Datos obligatorios del contrato de relevo",
            );
            return;
        };

        let seniority_rule = format!(
            "Antigüedad mínima en la empresa con contrato de relevo: {} años",
            rule.min_seniority_years
        );
        outcome.rule(seniority_rule.clone());
        if seniority < rule.min_seniority_years {
            outcome.fail(
                "ANTIGUEDAD_INSUFICIENTE",
                format!(
                    "Se requieren al menos {} años de antigüedad en la empresa y constan {}",
                    rule.min_seniority_years, seniority
                ),
                seniority_rule,
            );
        }

        let base_rule = format!(
            "Base de cotización del relevista de al menos el {}% de la del jubilado",
            rule.min_relay_base_percentage
        );
        outcome.rule(base_rule.clone());
        if relay_base < rule.min_relay_base_percentage {
            outcome.fail(
                "BASE_RELEVISTA_INSUFICIENTE",
                format!(
                    "La base de cotización del relevista ({relay_base}%) es inferior al {}% exigido",
                    rule.min_relay_base_percentage
                ),
                base_rule,
            );
        }
    }

    fn check_deferred(
        &self,
        details: &DeferredDetails,
        context: &EligibilityContext,
        outcome: &mut EligibilityOutcome,
    ) {
        let months = details.months_of_delay;

        let minimum_rule = "Demora mínima: 1 mes después de la edad ordinaria";
        outcome.rule(minimum_rule);
        if months < 1 {
            outcome.fail(
                "MESES_DEMORA_INSUFICIENTES",
                "La jubilación demorada exige al menos 1 mes de demora",
                minimum_rule,
            );
        }

        if details.increment_option != IncrementOption::Percentage {
            let lump_sum_rule = "El tanto alzado exige al menos un año completo de demora";
            outcome.rule(lump_sum_rule);
            if months < 12 {
                outcome.fail(
                    "DEMORA_SIN_ANO_COMPLETO",
                    format!(
                        "La opción '{}' requiere al menos 12 meses de demora y se indican {months}",
                        details.increment_option.as_str()
                    ),
                    lump_sum_rule,
                );
            }
        }

        if context.months_before_ordinary_age() > 0 {
            return;
        }

        let elapsed = context.months_after_ordinary_age();
        let accredited_rule = "La demora indicada debe haber transcurrido desde la edad ordinaria";
        outcome.rule(accredited_rule);
        if months > elapsed {
            outcome.fail(
                "MESES_DEMORA_NO_ACREDITADOS",
                format!(
                    "Se indican {months} meses de demora pero desde la edad ordinaria solo transcurren {elapsed}"
                ),
                accredited_rule,
            );
        } else if months < elapsed {
            outcome.warn(format!(
                "Los meses de demora indicados ({months}) no coinciden con los transcurridos desde la edad ordinaria ({elapsed})"
            ));
        }
    }
}
