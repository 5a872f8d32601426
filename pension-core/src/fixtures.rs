//! Policy tables and requests shared by the unit tests.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{
    ContributionScale, DeferredDetails, DeferredRetirementRule, EarlyCoefficient,
    EarlyModality, EarlyRetirementRule, IncrementOption, OrdinaryAgeRule, PartialDetails,
    PartialRetirementRule, PensionLimits, PensionRequest, PolicyParameters, PolicyTables,
    RetirementType, ScaleBracket, Sex,
};

pub fn test_parameters() -> PolicyParameters {
    PolicyParameters {
        version: "test".to_string(),
        minimum_contribution_years: 15,
        minimum_specific_contribution_days: 730,
        borderline_contribution_years: dec!(1),
        borderline_age_months: 3,
        voluntary_early: EarlyRetirementRule {
            minimum_contribution_years: 35,
            max_advance_months: 24,
        },
        involuntary_early: EarlyRetirementRule {
            minimum_contribution_years: 33,
            max_advance_months: 48,
        },
        partial: PartialRetirementRule {
            relay_minimum_age_years: 62,
            min_reduction_percentage: dec!(25),
            max_reduction_percentage: dec!(75),
            min_seniority_years: dec!(6),
            min_relay_base_percentage: dec!(65),
        },
        deferred: DeferredRetirementRule {
            annual_increment_percentage: dec!(4),
            lump_sum_annual_percentage: dec!(4),
            mixed_split: dec!(0.5),
            annual_payments: 14,
        },
    }
}

fn age_rule(
    year: i32,
    career: (u32, u32),
    standard_age: (u32, u32),
) -> OrdinaryAgeRule {
    OrdinaryAgeRule {
        year,
        full_career_months: career.0 * 12 + career.1,
        reduced_age_months: 65 * 12,
        standard_age_months: standard_age.0 * 12 + standard_age.1,
    }
}

pub fn test_ordinary_ages() -> Vec<OrdinaryAgeRule> {
    vec![
        age_rule(2020, (37, 0), (65, 10)),
        age_rule(2021, (37, 3), (66, 0)),
        age_rule(2022, (37, 6), (66, 2)),
        age_rule(2023, (37, 9), (66, 4)),
        age_rule(2024, (38, 0), (66, 6)),
        age_rule(2025, (38, 3), (66, 8)),
        age_rule(2026, (38, 3), (66, 10)),
        age_rule(2027, (38, 6), (67, 0)),
    ]
}

/// Scale in force from 2023: 49 months at 0.21 then 209 at 0.19.
pub fn test_scale() -> ContributionScale {
    ContributionScale {
        effective_from: 2023,
        minimum_years: 15,
        base_percentage: dec!(50),
        brackets: vec![
            ScaleBracket {
                up_to_month: 49,
                monthly_rate: dec!(0.21),
            },
            ScaleBracket {
                up_to_month: 258,
                monthly_rate: dec!(0.19),
            },
        ],
    }
}

pub fn test_scales() -> Vec<ContributionScale> {
    vec![
        ContributionScale {
            effective_from: 2020,
            minimum_years: 15,
            base_percentage: dec!(50),
            brackets: vec![
                ScaleBracket {
                    up_to_month: 106,
                    monthly_rate: dec!(0.21),
                },
                ScaleBracket {
                    up_to_month: 252,
                    monthly_rate: dec!(0.19),
                },
            ],
        },
        test_scale(),
        ContributionScale {
            effective_from: 2027,
            minimum_years: 15,
            base_percentage: dec!(50),
            brackets: vec![
                ScaleBracket {
                    up_to_month: 248,
                    monthly_rate: dec!(0.19),
                },
                ScaleBracket {
                    up_to_month: 264,
                    monthly_rate: dec!(0.18),
                },
            ],
        },
    ]
}

pub fn test_coefficients() -> Vec<EarlyCoefficient> {
    let rows = [
        (EarlyModality::Voluntary, 0, dec!(2.000)),
        (EarlyModality::Voluntary, 462, dec!(1.875)),
        (EarlyModality::Voluntary, 498, dec!(1.750)),
        (EarlyModality::Voluntary, 534, dec!(1.625)),
        (EarlyModality::Involuntary, 0, dec!(1.875)),
        (EarlyModality::Involuntary, 462, dec!(1.750)),
        (EarlyModality::Involuntary, 498, dec!(1.625)),
        (EarlyModality::Involuntary, 534, dec!(1.500)),
    ];
    rows.into_iter()
        .map(|(modality, from, coefficient)| EarlyCoefficient {
            modality,
            from_contribution_months: from,
            quarterly_coefficient: coefficient,
        })
        .collect()
}

fn limits(
    year: i32,
    minimum: Decimal,
    maximum: Decimal,
    income_limit: Decimal,
) -> PensionLimits {
    PensionLimits {
        year,
        minimum_pension: minimum,
        maximum_pension: maximum,
        income_limit,
    }
}

pub fn test_limits() -> Vec<PensionLimits> {
    vec![
        limits(2024, dec!(802.30), dec!(3175.04), dec!(8570.00)),
        limits(2025, dec!(874.70), dec!(3267.60), dec!(9000.00)),
        limits(2026, dec!(900.00), dec!(3360.00), dec!(9250.00)),
    ]
}

pub fn test_policy() -> PolicyTables {
    PolicyTables::new(
        test_parameters(),
        test_ordinary_ages(),
        test_scales(),
        test_coefficients(),
        test_limits(),
    )
    .unwrap()
}

/// Policy whose ordinary age is 65 for every career.
pub fn flat_age_policy() -> PolicyTables {
    let ages = test_ordinary_ages()
        .into_iter()
        .map(|mut rule| {
            rule.standard_age_months = rule.reduced_age_months;
            rule
        })
        .collect();
    PolicyTables::new(
        test_parameters(),
        ages,
        test_scales(),
        test_coefficients(),
        test_limits(),
    )
    .unwrap()
}

pub fn date(
    y: i32,
    m: u32,
    d: u32,
) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn today() -> NaiveDate {
    date(2026, 10, 19)
}

/// Ordinary retirement in 2027 at 67 with a 36 year career.
pub fn test_request() -> PensionRequest {
    PensionRequest {
        birth_date: date(1960, 3, 15),
        desired_retirement_date: date(2027, 3, 15),
        sex: Sex::Male,
        generic_contribution_days: 36 * 365,
        specific_contribution_days: 5_000,
        regulatory_base: dec!(1800.00),
        retirement_type: RetirementType::Ordinary,
        other_annual_income: Decimal::ZERO,
        partial_details: None,
        deferred_details: None,
    }
}

pub fn partial_details(
    reduction: Decimal,
    relay_contract: bool,
) -> PartialDetails {
    PartialDetails {
        reduction_percentage: reduction,
        relay_contract,
        compatible_salary: None,
        seniority_years: relay_contract.then_some(dec!(10)),
        relay_base_percentage: relay_contract.then_some(dec!(80)),
        relay_maintenance_months: None,
    }
}

pub fn deferred_details(
    months: u32,
    option: IncrementOption,
) -> DeferredDetails {
    DeferredDetails {
        months_of_delay: months,
        increment_option: option,
    }
}
