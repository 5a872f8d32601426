mod pension_request;
mod policy;
mod retirement_type;
mod simulation_response;

pub use pension_request::{
    DeferredDetails, MAX_GENERIC_CONTRIBUTION_DAYS, PartialDetails, PensionRequest, RequestError,
    SPECIFIC_CONTRIBUTION_WINDOW_DAYS,
};
pub use policy::{
    ContributionScale, DeferredRetirementRule, EarlyCoefficient, EarlyModality,
    EarlyRetirementRule, OrdinaryAge, OrdinaryAgeRule, PartialRetirementRule, PensionLimits,
    PolicyError, PolicyParameters, PolicyTables, ScaleBracket,
};
pub use retirement_type::{IncrementOption, RetirementType, Sex};
pub use simulation_response::{
    CalculationDetail, DeferredRetirementData, EarlyRetirementData, PartialRetirementData,
    RuleViolation, SimulationResponse, TypeSpecificData, ValidationResult,
};
