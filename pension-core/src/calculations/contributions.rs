//! Coherency checks between total contribution, recent contribution and age.

use rust_decimal::Decimal;

use crate::calculations::dates::{MINIMUM_WORKING_AGE, days_to_years};
use crate::models::{RuleViolation, SPECIFIC_CONTRIBUTION_WINDOW_DAYS};

/// An impossible combination of contribution figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContributionIssue {
    NegativeGeneric,
    NegativeSpecific,
    SpecificExceedsWindow,
    SpecificExceedsGeneric,
    ExceedsWorkingLife,
}

impl ContributionIssue {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NegativeGeneric => "CARENCIA_GENERICA_NEGATIVA",
            Self::NegativeSpecific => "CARENCIA_ESPECIFICA_NEGATIVA",
            Self::SpecificExceedsWindow => "CARENCIA_ESPECIFICA_EXCEDE_15_ANOS",
            Self::SpecificExceedsGeneric => "CARENCIA_ESPECIFICA_SUPERIOR_GENERICA",
            Self::ExceedsWorkingLife => "CARENCIA_EXCEDE_VIDA_LABORAL",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::NegativeGeneric => "Los años cotizados no pueden ser negativos",
            Self::NegativeSpecific => "Los años en últimos 15 no pueden ser negativos",
            Self::SpecificExceedsWindow => "No se puede cotizar más de 15 años en los últimos 15",
            Self::SpecificExceedsGeneric => {
                "Los años en últimos 15 no pueden ser superiores al total"
            }
            Self::ExceedsWorkingLife => "No se puede cotizar más años que la edad laboral posible",
        }
    }

    pub fn rule(&self) -> &'static str {
        match self {
            Self::NegativeGeneric => "Carencia genérica ≥ 0 días",
            Self::NegativeSpecific => "Carencia específica ≥ 0 días",
            Self::SpecificExceedsWindow => "Carencia específica ≤ 5475 días (15 años)",
            Self::SpecificExceedsGeneric => "Carencia específica ≤ carencia genérica",
            Self::ExceedsWorkingLife => "Años cotizados ≤ edad actual − 16",
        }
    }

    pub fn to_violation(&self) -> RuleViolation {
        RuleViolation::new(self.code(), self.message(), self.rule())
    }
}

/// Checks the contribution figures against each other and against the
/// applicant's current age.
///
/// Checks run in a fixed order and the first failure is returned; `None`
/// means the figures are coherent.
pub fn validate_contributions(
    generic_days: i32,
    specific_days: i32,
    current_age: u32,
) -> Option<ContributionIssue> {
    if generic_days < 0 {
        return Some(ContributionIssue::NegativeGeneric);
    }
    if specific_days < 0 {
        return Some(ContributionIssue::NegativeSpecific);
    }
    if specific_days > SPECIFIC_CONTRIBUTION_WINDOW_DAYS {
        return Some(ContributionIssue::SpecificExceedsWindow);
    }
    if specific_days > generic_days {
        return Some(ContributionIssue::SpecificExceedsGeneric);
    }

    let working_years = Decimal::from(current_age) - Decimal::from(MINIMUM_WORKING_AGE);
    if days_to_years(generic_days) > working_years {
        return Some(ContributionIssue::ExceedsWorkingLife);
    }

    None
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn coherent_figures_pass() {
        assert_eq!(validate_contributions(36 * 365, 5000, 65), None);
    }

    #[test]
    fn negative_generic_is_reported_first() {
        assert_eq!(
            validate_contributions(-1, -1, 65),
            Some(ContributionIssue::NegativeGeneric)
        );
    }

    #[test]
    fn negative_specific() {
        assert_eq!(
            validate_contributions(100, -1, 65),
            Some(ContributionIssue::NegativeSpecific)
        );
    }

    #[test]
    fn specific_beyond_fifteen_years() {
        assert_eq!(
            validate_contributions(10_000, 5_476, 65),
            Some(ContributionIssue::SpecificExceedsWindow)
        );
        assert_eq!(validate_contributions(10_000, 5_475, 65), None);
    }

    #[test]
    fn window_check_precedes_generic_comparison() {
        assert_eq!(
            validate_contributions(1_000, 6_000, 65),
            Some(ContributionIssue::SpecificExceedsWindow)
        );
    }

    #[test]
    fn specific_above_generic() {
        assert_eq!(
            validate_contributions(1_000, 1_001, 65),
            Some(ContributionIssue::SpecificExceedsGeneric)
        );
    }

    #[test]
    fn career_longer_than_working_life() {
        // 50 years at 65 leaves only 49 possible working years
        assert_eq!(
            validate_contributions(50 * 365, 5_000, 65),
            Some(ContributionIssue::ExceedsWorkingLife)
        );
        assert_eq!(validate_contributions(49 * 365, 5_000, 65), None);
    }

    #[test]
    fn applicant_younger_than_working_age_cannot_have_contributed() {
        assert_eq!(
            validate_contributions(1, 0, 15),
            Some(ContributionIssue::ExceedsWorkingLife)
        );
        assert_eq!(validate_contributions(0, 0, 15), None);
    }

    #[test]
    fn issues_carry_stable_codes() {
        let violation = ContributionIssue::SpecificExceedsGeneric.to_violation();

        assert_eq!(violation.code, "CARENCIA_ESPECIFICA_SUPERIOR_GENERICA");
        assert_eq!(
            violation.message,
            "Los años en últimos 15 no pueden ser superiores al total"
        );
    }
}
