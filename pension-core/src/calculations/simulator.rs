//! Entry point of the evaluation: runs every stage and assembles the
//! [`SimulationResponse`].

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::calculations::amount::{AmountBreakdown, AmountCalculator};
use crate::calculations::common::round_half_up;
use crate::calculations::dates::DateError;
use crate::calculations::eligibility::{EligibilityContext, EligibilityEngine, EligibilityOutcome};
use crate::models::{
    PensionRequest, PolicyError, PolicyTables, RequestError, RetirementType, SimulationResponse,
    ValidationResult,
};

pub const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

const VOLUNTARY_MINIMUM_RULE: &str =
    "La pensión resultante debe superar la pensión mínima que correspondería a la edad ordinaria";

/// Failures that prevent a simulation from being produced at all.
///
/// A request that simply does not qualify is not an error; it yields a
/// response whose validation lists the reasons.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    #[error("invalid request: {0}")]
    Request(#[from] RequestError),

    #[error("policy data unavailable: {0}")]
    Policy(#[from] PolicyError),

    #[error("date error: {0}")]
    Date(#[from] DateError),
}

impl SimulationError {
    /// Whether the caller can fix the failure by correcting the request.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Request(_))
    }
}

/// Evaluates pension requests against one set of policy tables.
///
/// Holds no state besides the borrowed tables, so one simulator can serve
/// any number of threads.
#[derive(Debug, Clone, Copy)]
pub struct Simulator<'a> {
    policy: &'a PolicyTables,
}

impl<'a> Simulator<'a> {
    pub fn new(policy: &'a PolicyTables) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &'a PolicyTables {
        self.policy
    }

    /// Evaluates a request as of `as_of`.
    ///
    /// # Errors
    ///
    /// [`SimulationError::Request`] when the request is malformed, and
    /// [`SimulationError::Policy`] when the tables cannot serve the
    /// retirement year.
    pub fn evaluate(
        &self,
        request: &PensionRequest,
        as_of: NaiveDateTime,
    ) -> Result<SimulationResponse, SimulationError> {
        let (context, mut outcome) = self.check_eligibility(request, as_of)?;

        let calculation = if outcome.is_eligible() {
            let breakdown = AmountCalculator::new(self.policy).calculate(request, &context)?;
            outcome.rules_applied.extend(breakdown.rules_applied.iter().cloned());
            self.check_voluntary_minimum(request, &breakdown, &mut outcome);

            if outcome.is_eligible() {
                outcome.warnings.extend(breakdown.warnings.iter().cloned());
                Some(breakdown.to_detail())
            } else {
                None
            }
        } else {
            None
        };

        debug!(
            retirement_type = %request.retirement_type,
            valid = outcome.is_eligible(),
            "simulation evaluated"
        );

        Ok(SimulationResponse {
            validation: outcome.to_validation(),
            calculation,
            retirement_age_years: round_half_up(
                Decimal::from(context.age_at_retirement_months) / Decimal::from(12),
            ),
            years_contributed: round_half_up(context.years_contributed),
            rules_applied: outcome.rules_applied,
            observations: observations(
                context.current_age,
                context.years_contributed,
                request.retirement_type,
            ),
            calculation_date: as_of,
            system_version: self.system_version(),
        })
    }

    /// Checks the requirements for the requested modality without
    /// calculating any amount.
    ///
    /// The minimum-pension condition of voluntary early retirement depends
    /// on the amount and is therefore only checked by [`Self::evaluate`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::evaluate`].
    pub fn validate_requirements(
        &self,
        request: &PensionRequest,
        as_of: NaiveDateTime,
    ) -> Result<ValidationResult, SimulationError> {
        let (_, outcome) = self.check_eligibility(request, as_of)?;
        Ok(outcome.to_validation())
    }

    pub fn system_version(&self) -> String {
        format!("{CRATE_VERSION} (tablas {})", self.policy.version())
    }

    fn check_eligibility(
        &self,
        request: &PensionRequest,
        as_of: NaiveDateTime,
    ) -> Result<(EligibilityContext, EligibilityOutcome), SimulationError> {
        let today = as_of.date();
        request.validate_shape(today)?;
        let context = EligibilityContext::resolve(request, self.policy, today)?;
        let outcome = EligibilityEngine::new(self.policy).evaluate(request, &context);
        Ok((context, outcome))
    }

    fn check_voluntary_minimum(
        &self,
        request: &PensionRequest,
        breakdown: &AmountBreakdown,
        outcome: &mut EligibilityOutcome,
    ) {
        if request.retirement_type != RetirementType::VoluntaryEarly {
            return;
        }
        if breakdown.pension_before_caps <= breakdown.minimum_pension {
            outcome.fail(
                "PENSION_INFERIOR_MINIMA",
                format!(
                    "La pensión resultante ({:.2} €) no supera la pensión mínima ({:.2} €)",
                    breakdown.pension_before_caps, breakdown.minimum_pension
                ),
                VOLUNTARY_MINIMUM_RULE,
            );
        }
    }
}

/// Advice for the applicant based on current age and contributed years.
pub fn observations(
    current_age: u32,
    years_contributed: Decimal,
    kind: RetirementType,
) -> Vec<String> {
    let mut observations = Vec::new();

    if years_contributed < Decimal::from(15) {
        observations
            .push("Necesita al menos 15 años cotizados para cualquier tipo de jubilación".to_string());
    }
    if kind == RetirementType::VoluntaryEarly && years_contributed < Decimal::from(35) {
        observations.push(
            "Para jubilación anticipada voluntaria necesita al menos 35 años cotizados".to_string(),
        );
    }
    if kind == RetirementType::InvoluntaryEarly && years_contributed < Decimal::from(33) {
        observations.push(
            "Para jubilación anticipada involuntaria necesita al menos 33 años cotizados"
                .to_string(),
        );
    }
    if current_age < 60 {
        observations.push(
            "Considere seguir cotizando para mejorar su futuro porcentaje de pensión".to_string(),
        );
    }
    if current_age >= 67 && kind != RetirementType::Deferred {
        observations.push(
            "Podría considerar la jubilación demorada para obtener incrementos en su pensión"
                .to_string(),
        );
    }

    observations
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::fixtures::{
        date, deferred_details, flat_age_policy, test_policy, test_request, today,
    };
    use crate::calculations::amount::CapOutcome;
    use crate::models::{EarlyRetirementData, IncrementOption, TypeSpecificData};

    fn at(day: NaiveDate) -> NaiveDateTime {
        day.and_hms_opt(10, 30, 0).unwrap()
    }

    fn voluntary_request() -> PensionRequest {
        let mut request = test_request();
        request.retirement_type = RetirementType::VoluntaryEarly;
        request.birth_date = date(1961, 3, 15);
        request.desired_retirement_date = date(2026, 10, 20);
        request.generic_contribution_days = 37 * 365;
        request
    }

    // =========================================================================
    // evaluate tests
    // =========================================================================

    #[test]
    fn valid_request_gets_a_calculation() {
        let policy = test_policy();

        let response = Simulator::new(&policy)
            .evaluate(&test_request(), at(today()))
            .unwrap();

        assert!(response.validation.is_valid);
        let calculation = response.calculation.unwrap();
        assert_eq!(calculation.years_contributed_percentage, dec!(97.84));
        assert_eq!(calculation.final_pension, dec!(1761.12));
        assert_eq!(response.retirement_age_years, dec!(67));
        assert_eq!(response.years_contributed, dec!(36));
        assert_eq!(response.calculation_date, at(today()));
        assert_eq!(response.system_version, format!("{CRATE_VERSION} (tablas test)"));
    }

    #[test]
    fn audit_trail_lists_eligibility_then_amount_rules() {
        let policy = test_policy();

        let response = Simulator::new(&policy)
            .evaluate(&test_request(), at(today()))
            .unwrap();

        assert_eq!(
            response.rules_applied,
            vec![
                "Edad ordinaria de jubilación en 2027: 67 años (carrera inferior a 38 años y 6 meses cotizados)",
                "Coherencia de días cotizados con la edad actual (66 años)",
                "Edad mínima para Jubilación Ordinaria: 67 años",
                "Carencia genérica mínima: 15 años cotizados",
                "Carencia específica mínima: 730 días en los últimos 15 años",
                "Porcentaje por años cotizados (escala vigente desde 2027): 97.84% por 432 meses cotizados",
                "Pensión mínima 2026: 900.00 €; pensión máxima: 3360.00 €",
                "Sin ajuste por anticipación ni demora (100%)",
            ]
        );
    }

    #[test]
    fn sixty_five_year_old_with_thirty_six_years_qualifies_at_flat_age() {
        let policy = flat_age_policy();
        let mut request = test_request();
        request.birth_date = date(1961, 10, 19);
        request.desired_retirement_date = today();
        request.regulatory_base = dec!(1500);

        let response = Simulator::new(&policy)
            .evaluate(&request, at(today()))
            .unwrap();

        assert!(response.validation.is_valid, "{:?}", response.validation);
        let calculation = response.calculation.unwrap();
        assert_eq!(calculation.years_contributed_percentage, dec!(98.86));
        assert_eq!(calculation.early_or_deferred_percentage, dec!(100));
        assert!(calculation.final_pension >= calculation.applicable_minimum_pension);
        assert!(calculation.final_pension <= dec!(1500));
        assert_eq!(calculation.final_pension, dec!(1482.90));
    }

    #[test]
    fn sixty_five_year_old_with_thirty_six_years_is_too_young_under_transition() {
        let policy = test_policy();
        let mut request = test_request();
        request.birth_date = date(1961, 10, 19);
        request.desired_retirement_date = today();

        let response = Simulator::new(&policy)
            .evaluate(&request, at(today()))
            .unwrap();

        assert!(!response.validation.is_valid);
        assert!(response.validation.has_error("EDAD_INSUFICIENTE"));
        assert_eq!(response.calculation, None);
    }

    #[test]
    fn voluntary_early_with_ten_years_is_rejected() {
        let policy = test_policy();
        let mut request = voluntary_request();
        request.generic_contribution_days = 10 * 365;

        let response = Simulator::new(&policy)
            .evaluate(&request, at(today()))
            .unwrap();

        assert!(!response.validation.is_valid);
        assert!(response.validation.has_error("CARENCIA_GENERICA_INSUFICIENTE"));
        assert_eq!(response.calculation, None);
    }

    #[test]
    fn recent_contribution_above_total_never_gets_a_pension() {
        let policy = test_policy();
        let mut request = test_request();
        request.specific_contribution_days = 5_400;
        request.generic_contribution_days = 5_300;

        let response = Simulator::new(&policy)
            .evaluate(&request, at(today()))
            .unwrap();

        assert!(response.validation.has_error("CARENCIA_ESPECIFICA_SUPERIOR_GENERICA"));
        assert_eq!(response.calculation, None);
    }

    #[test]
    fn voluntary_early_below_minimum_pension_is_rejected() {
        let policy = test_policy();
        let mut request = voluntary_request();
        request.regulatory_base = dec!(900);

        let response = Simulator::new(&policy)
            .evaluate(&request, at(today()))
            .unwrap();

        assert!(response.validation.has_error("PENSION_INFERIOR_MINIMA"));
        assert_eq!(response.calculation, None);
    }

    #[test]
    fn voluntary_early_equal_to_minimum_pension_is_rejected() {
        let policy = test_policy();
        let request = voluntary_request();
        let breakdown = AmountBreakdown {
            years_percentage: dec!(100),
            adjustment_percentage: dec!(90),
            pension_before_caps: dec!(900.00),
            minimum_pension: dec!(900.00),
            maximum_pension: dec!(3360.00),
            cap: CapOutcome::WithinLimits,
            type_data: TypeSpecificData::VoluntaryEarly(EarlyRetirementData {
                meses_anticipacion: 12,
                trimestres_anticipacion: 4,
                coeficiente_trimestral: dec!(2.5),
            }),
            rules_applied: vec![],
            warnings: vec![],
        };
        let mut outcome = EligibilityOutcome::default();

        Simulator::new(&policy).check_voluntary_minimum(&request, &breakdown, &mut outcome);

        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].code, "PENSION_INFERIOR_MINIMA");
        assert_eq!(
            outcome.errors[0].message,
            "La pensión resultante (900.00 €) no supera la pensión mínima (900.00 €)"
        );
    }

    #[test]
    fn voluntary_early_above_minimum_is_reduced() {
        let policy = test_policy();

        let response = Simulator::new(&policy)
            .evaluate(&voluntary_request(), at(today()))
            .unwrap();

        let calculation = response.calculation.unwrap();
        assert_eq!(calculation.early_or_deferred_percentage, dec!(90));
        assert_eq!(calculation.final_pension, dec!(1620.00));
    }

    #[test]
    fn top_up_reaches_minimum_pension() {
        let policy = test_policy();
        let mut request = test_request();
        request.regulatory_base = dec!(700);

        let calculation = Simulator::new(&policy)
            .evaluate(&request, at(today()))
            .unwrap()
            .calculation
            .unwrap();

        assert_eq!(
            calculation.minimum_top_up,
            calculation.applicable_minimum_pension - calculation.pension_before_caps
        );
        assert_eq!(calculation.final_pension, calculation.applicable_minimum_pension);
    }

    #[test]
    fn suppressed_top_up_is_reported_as_warning() {
        let policy = test_policy();
        let mut request = test_request();
        request.regulatory_base = dec!(700);
        request.other_annual_income = dec!(15000);

        let response = Simulator::new(&policy)
            .evaluate(&request, at(today()))
            .unwrap();

        let calculation = response.calculation.unwrap();
        assert_eq!(calculation.final_pension, calculation.pension_before_caps);
        assert_eq!(calculation.minimum_top_up, Decimal::ZERO);
        assert!(
            response
                .validation
                .warnings
                .iter()
                .any(|w| w.contains("no se aplica el complemento a mínimos"))
        );
        assert!(response.validation.is_valid);
    }

    #[test]
    fn deferred_lump_sum_keeps_full_percentage() {
        let policy = test_policy();
        let mut request = test_request();
        request.retirement_type = RetirementType::Deferred;
        request.birth_date = date(1958, 3, 15);
        request.deferred_details = Some(deferred_details(24, IncrementOption::LumpSum));

        let calculation = Simulator::new(&policy)
            .evaluate(&request, at(today()))
            .unwrap()
            .calculation
            .unwrap();

        assert_eq!(calculation.early_or_deferred_percentage, dec!(100));
        assert!(calculation.type_specific_data.lump_sum().unwrap() > Decimal::ZERO);
        assert!(matches!(
            calculation.type_specific_data,
            TypeSpecificData::Deferred(_)
        ));
    }

    #[test]
    fn evaluation_is_deterministic() {
        let policy = test_policy();
        let simulator = Simulator::new(&policy);

        let first = simulator.evaluate(&test_request(), at(today())).unwrap();
        let second = simulator.evaluate(&test_request(), at(today())).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn malformed_request_is_an_input_error() {
        let policy = test_policy();
        let mut request = test_request();
        request.regulatory_base = dec!(0);

        let error = Simulator::new(&policy)
            .evaluate(&request, at(today()))
            .unwrap_err();

        assert_eq!(
            error,
            SimulationError::Request(RequestError::RegulatoryBaseOutOfRange(dec!(0)))
        );
        assert!(error.is_input_error());
    }

    #[test]
    fn missing_policy_year_is_a_system_error() {
        let policy = test_policy();
        let mut request = test_request();
        request.desired_retirement_date = date(2019, 6, 1);

        let error = Simulator::new(&policy)
            .evaluate(&request, at(date(2019, 1, 1)))
            .unwrap_err();

        assert!(matches!(error, SimulationError::Policy(PolicyError::MissingYear { .. })));
        assert!(!error.is_input_error());
    }

    #[test]
    fn response_serializes_with_wire_names() {
        let policy = test_policy();

        let response = Simulator::new(&policy)
            .evaluate(&test_request(), at(today()))
            .unwrap();
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["validacion"]["es_valido"], serde_json::json!(true));
        assert_eq!(value["calculo"]["pension_final"], serde_json::json!(1761.12));
        assert_eq!(value["calculo"]["datos_especificos"]["tipo"], "ordinaria");
        assert_eq!(value["fecha_calculo"], "2026-10-19T10:30:00");
    }

    // =========================================================================
    // validate_requirements tests
    // =========================================================================

    #[test]
    fn validate_requirements_matches_evaluate_verdict() {
        let policy = test_policy();
        let simulator = Simulator::new(&policy);
        let mut request = voluntary_request();
        request.generic_contribution_days = 20 * 365;

        let validation = simulator
            .validate_requirements(&request, at(today()))
            .unwrap();
        let response = simulator.evaluate(&request, at(today())).unwrap();

        assert_eq!(validation, response.validation);
    }

    #[test]
    fn validate_requirements_skips_amount_conditions() {
        let policy = test_policy();
        let mut request = voluntary_request();
        request.regulatory_base = dec!(900);

        let validation = Simulator::new(&policy)
            .validate_requirements(&request, at(today()))
            .unwrap();

        assert!(validation.is_valid);
    }

    // =========================================================================
    // observations tests
    // =========================================================================

    #[test]
    fn observations_for_young_short_career() {
        let result = observations(55, dec!(10), RetirementType::VoluntaryEarly);

        assert_eq!(
            result,
            vec![
                "Necesita al menos 15 años cotizados para cualquier tipo de jubilación",
                "Para jubilación anticipada voluntaria necesita al menos 35 años cotizados",
                "Considere seguir cotizando para mejorar su futuro porcentaje de pensión",
            ]
        );
    }

    #[test]
    fn observations_suggest_deferral_from_sixty_seven() {
        let ordinary = observations(67, dec!(40), RetirementType::Ordinary);
        let deferred = observations(67, dec!(40), RetirementType::Deferred);

        assert_eq!(
            ordinary,
            vec!["Podría considerar la jubilación demorada para obtener incrementos en su pensión"]
        );
        assert!(deferred.is_empty());
    }

    #[test]
    fn involuntary_observation_below_thirty_three_years() {
        let result = observations(63, dec!(32.9), RetirementType::InvoluntaryEarly);

        assert_eq!(
            result,
            vec!["Para jubilación anticipada involuntaria necesita al menos 33 años cotizados"]
        );
    }
}
