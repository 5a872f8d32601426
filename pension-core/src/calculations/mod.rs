//! Retirement pension evaluation.
//!
//! A request flows through the contribution validator and the eligibility
//! engine and, when eligible, through the amount calculator. The
//! [`Simulator`] runs the stages and assembles the response.

pub mod amount;
pub mod common;
pub mod contributions;
pub mod dates;
pub mod eligibility;
pub mod simulator;

pub use amount::{AmountBreakdown, AmountCalculator, CapOutcome};
pub use contributions::{ContributionIssue, validate_contributions};
pub use dates::DateError;
pub use eligibility::{EligibilityContext, EligibilityEngine, EligibilityOutcome};
pub use simulator::{SimulationError, Simulator};
