//! Monthly pension amount for an eligible request.
//!
//! # Calculation Structure
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Percentage earned by contributed months (versioned scale) |
//! | 2    | Adjustment percentage: early reduction, deferral increment or partial share |
//! | 3    | Pension before caps: base × step 1 × step 2 / 100 / 100 |
//! | 4    | Minimum and maximum pension for the retirement year |
//! | 5    | Top-up to the minimum, unless other income exceeds the limit |
//! | 6    | Final pension |
//!
//! Every step runs at full precision. Rounding happens once, in
//! [`AmountBreakdown::to_detail`].

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::calculations::common::{apply_percentage, round_half_up};
use crate::calculations::eligibility::EligibilityContext;
use crate::models::{
    CalculationDetail, DeferredDetails, DeferredRetirementData, EarlyModality,
    EarlyRetirementData, IncrementOption, PartialRetirementData, PensionRequest, PolicyError,
    PolicyTables, RetirementType, TypeSpecificData,
};

/// How the pension before caps relates to the yearly limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapOutcome {
    WithinLimits,
    /// Raised to the minimum pension.
    ToppedUp,
    /// Below the minimum, but other income exceeds the limit for the top-up.
    TopUpSuppressed,
    /// Lowered to the maximum pension.
    CappedAtMaximum,
}

/// Full-precision result of the amount calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountBreakdown {
    pub years_percentage: Decimal,
    pub adjustment_percentage: Decimal,
    pub pension_before_caps: Decimal,
    pub minimum_pension: Decimal,
    pub maximum_pension: Decimal,
    pub cap: CapOutcome,
    pub type_data: TypeSpecificData,
    pub rules_applied: Vec<String>,
    pub warnings: Vec<String>,
}

impl AmountBreakdown {
    pub fn final_pension(&self) -> Decimal {
        match self.cap {
            CapOutcome::WithinLimits | CapOutcome::TopUpSuppressed => self.pension_before_caps,
            CapOutcome::ToppedUp => self.minimum_pension,
            CapOutcome::CappedAtMaximum => self.maximum_pension,
        }
    }

    /// Rounds the breakdown for output.
    ///
    /// The top-up is the difference of the rounded minimum and the rounded
    /// pension before caps, so the published figures always add up.
    pub fn to_detail(&self) -> CalculationDetail {
        let before_caps = round_half_up(self.pension_before_caps);
        let minimum = round_half_up(self.minimum_pension);
        let maximum = round_half_up(self.maximum_pension);

        let (minimum_top_up, final_pension) = match self.cap {
            CapOutcome::WithinLimits | CapOutcome::TopUpSuppressed => (Decimal::ZERO, before_caps),
            CapOutcome::ToppedUp => (minimum - before_caps, minimum),
            CapOutcome::CappedAtMaximum => (Decimal::ZERO, maximum),
        };

        CalculationDetail {
            years_contributed_percentage: round_half_up(self.years_percentage),
            early_or_deferred_percentage: round_half_up(self.adjustment_percentage),
            pension_before_caps: before_caps,
            applicable_minimum_pension: minimum,
            applicable_maximum_pension: maximum,
            minimum_top_up,
            final_pension,
            type_specific_data: self.type_data.clone(),
        }
    }
}

struct Adjustment {
    percentage: Decimal,
    type_data: TypeSpecificData,
}

/// Computes pension amounts against a [`PolicyTables`] set.
#[derive(Debug, Clone, Copy)]
pub struct AmountCalculator<'a> {
    policy: &'a PolicyTables,
}

impl<'a> AmountCalculator<'a> {
    pub fn new(policy: &'a PolicyTables) -> Self {
        Self { policy }
    }

    /// Calculates the pension for a request that passed eligibility.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if the scale, coefficient or limits for the
    /// retirement year cannot be resolved.
    pub fn calculate(
        &self,
        request: &PensionRequest,
        context: &EligibilityContext,
    ) -> Result<AmountBreakdown, PolicyError> {
        let mut rules = Vec::new();
        let mut warnings = Vec::new();

        // Step 1
        let years_percentage = self.years_percentage(context, &mut rules)?;

        // Step 4 first: the lump sum is bounded by the maximum pension
        let limits = self.policy.limits(context.retirement_year)?;
        let share = match (&request.retirement_type, &request.partial_details) {
            (RetirementType::Partial, Some(details)) => details.reduction_percentage,
            _ => Decimal::ONE_HUNDRED,
        };
        let minimum_pension = apply_percentage(limits.minimum_pension, share);
        let maximum_pension = apply_percentage(limits.maximum_pension, share);
        rules.push(format!(
            "Pensión mínima {}: {:.2} €; pensión máxima: {:.2} €",
            limits.year, minimum_pension, maximum_pension
        ));

        // Step 2
        let full_pension = apply_percentage(request.regulatory_base, years_percentage);
        let adjustment = self.adjustment(
            request,
            context,
            full_pension.min(limits.maximum_pension),
            &mut rules,
        )?;

        // Step 3
        let pension_before_caps = apply_percentage(full_pension, adjustment.percentage);

        // Steps 5 and 6
        let cap = if pension_before_caps < minimum_pension {
            if request.other_annual_income > limits.income_limit {
                warn!(
                    other_income = %request.other_annual_income,
                    income_limit = %limits.income_limit,
                    "minimum pension top-up suppressed"
                );
                rules.push(format!(
                    "Complemento a mínimos no aplicable: otras rentas anuales superiores a {:.2} €",
                    limits.income_limit
                ));
                warnings.push(format!(
                    "Sus otras rentas anuales ({:.2} €) superan el límite de {:.2} €: no se aplica el complemento a mínimos",
                    request.other_annual_income, limits.income_limit
                ));
                CapOutcome::TopUpSuppressed
            } else {
                rules.push("Complemento a mínimos hasta la pensión mínima".to_string());
                CapOutcome::ToppedUp
            }
        } else if pension_before_caps > maximum_pension {
            rules.push("Pensión limitada a la pensión máxima".to_string());
            CapOutcome::CappedAtMaximum
        } else {
            CapOutcome::WithinLimits
        };

        debug!(
            %years_percentage,
            adjustment = %adjustment.percentage,
            %pension_before_caps,
            ?cap,
            "pension amount calculated"
        );

        Ok(AmountBreakdown {
            years_percentage,
            adjustment_percentage: adjustment.percentage,
            pension_before_caps,
            minimum_pension,
            maximum_pension,
            cap,
            type_data: adjustment.type_data,
            rules_applied: rules,
            warnings,
        })
    }

    fn years_percentage(
        &self,
        context: &EligibilityContext,
        rules: &mut Vec<String>,
    ) -> Result<Decimal, PolicyError> {
        let scale = self.policy.contribution_scale(context.retirement_year)?;
        let percentage = scale.percentage(context.contributed_months);
        rules.push(format!(
            "Porcentaje por años cotizados (escala vigente desde {}): {}% por {} meses cotizados",
            scale.effective_from,
            round_half_up(percentage).normalize(),
            context.contributed_months
        ));
        Ok(percentage)
    }

    fn adjustment(
        &self,
        request: &PensionRequest,
        context: &EligibilityContext,
        lump_sum_base: Decimal,
        rules: &mut Vec<String>,
    ) -> Result<Adjustment, PolicyError> {
        match request.retirement_type {
            RetirementType::Ordinary => {
                rules.push("Sin ajuste por anticipación ni demora (100%)".to_string());
                Ok(Adjustment {
                    percentage: Decimal::ONE_HUNDRED,
                    type_data: TypeSpecificData::Ordinary,
                })
            }
            RetirementType::VoluntaryEarly => {
                let data = self.early_reduction(EarlyModality::Voluntary, context, rules)?;
                Ok(Adjustment {
                    percentage: early_percentage(&data),
                    type_data: TypeSpecificData::VoluntaryEarly(data),
                })
            }
            RetirementType::InvoluntaryEarly => {
                let data = self.early_reduction(EarlyModality::Involuntary, context, rules)?;
                Ok(Adjustment {
                    percentage: early_percentage(&data),
                    type_data: TypeSpecificData::InvoluntaryEarly(data),
                })
            }
            RetirementType::Partial => {
                let details = request.partial_details.as_ref();
                let reduction = details.map_or(Decimal::ONE_HUNDRED, |d| d.reduction_percentage);
                rules.push(format!(
                    "Pensión parcial proporcional a la reducción de jornada ({reduction}%)"
                ));
                Ok(Adjustment {
                    percentage: reduction,
                    type_data: TypeSpecificData::Partial(PartialRetirementData {
                        porcentaje_reduccion_jornada: reduction,
                        contrato_relevo: details.is_some_and(|d| d.relay_contract),
                        salario_compatible: details.and_then(|d| d.compatible_salary),
                        meses_anticipacion: context.months_before_ordinary_age(),
                    }),
                })
            }
            RetirementType::Deferred => {
                let details = request.deferred_details.clone().unwrap_or(DeferredDetails {
                    months_of_delay: context.months_after_ordinary_age(),
                    increment_option: IncrementOption::Percentage,
                });
                Ok(self.deferral(
                    &details,
                    context.months_after_ordinary_age(),
                    lump_sum_base,
                    rules,
                ))
            }
        }
    }

    fn early_reduction(
        &self,
        modality: EarlyModality,
        context: &EligibilityContext,
        rules: &mut Vec<String>,
    ) -> Result<EarlyRetirementData, PolicyError> {
        let months = context.months_before_ordinary_age();
        let quarters = months.div_ceil(3);
        let coefficient = self
            .policy
            .early_coefficient(modality, context.contributed_months)?;
        rules.push(format!(
            "Coeficiente reductor ({}): {}% por trimestre × {} trimestres de anticipación",
            modality, coefficient, quarters
        ));
        Ok(EarlyRetirementData {
            meses_anticipacion: months,
            trimestres_anticipacion: quarters,
            coeficiente_trimestral: coefficient,
        })
    }

    fn deferral(
        &self,
        details: &DeferredDetails,
        elapsed_months: u32,
        lump_sum_base: Decimal,
        rules: &mut Vec<String>,
    ) -> Adjustment {
        let rule = &self.policy.parameters().deferred;
        // Only delay actually elapsed past the ordinary age counts.
        let months = details.months_of_delay.min(elapsed_months);
        let full_years = months / 12;
        let years = Decimal::from(full_years);

        let increment = rule.annual_increment_percentage * years;
        let lump_sum = apply_percentage(
            lump_sum_base * Decimal::from(rule.annual_payments),
            rule.lump_sum_annual_percentage,
        ) * years;

        let (percentage, lump_sum) = match details.increment_option {
            IncrementOption::Percentage => (Decimal::ONE_HUNDRED + increment, Decimal::ZERO),
            IncrementOption::LumpSum => (Decimal::ONE_HUNDRED, lump_sum),
            IncrementOption::Mixed => (
                Decimal::ONE_HUNDRED + increment * rule.mixed_split,
                lump_sum * rule.mixed_split,
            ),
        };

        rules.push(format!(
            "Incremento por demora: {}% por año completo × {} años ({})",
            rule.annual_increment_percentage,
            full_years,
            details.increment_option.as_str()
        ));
        if lump_sum > Decimal::ZERO {
            rules.push(format!(
                "Tanto alzado: {}% de {} pagas anuales por año completo de demora",
                rule.lump_sum_annual_percentage, rule.annual_payments
            ));
        }

        Adjustment {
            percentage,
            type_data: TypeSpecificData::Deferred(DeferredRetirementData {
                meses_demora: months,
                anos_completos_demora: full_years,
                opcion_incremento: details.increment_option,
                tanto_alzado: round_half_up(lump_sum),
            }),
        }
    }
}

fn early_percentage(data: &EarlyRetirementData) -> Decimal {
    let reduction = Decimal::from(data.trimestres_anticipacion) * data.coeficiente_trimestral;
    (Decimal::ONE_HUNDRED - reduction).max(Decimal::ZERO)
}
