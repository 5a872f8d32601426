//! Spanish retirement pension simulation.
//!
//! Given a [`PensionRequest`], the [`Simulator`] decides whether the
//! applicant qualifies for the requested retirement modality and, if so,
//! how much the monthly pension would be. All statutory figures come from
//! a [`PolicyTables`] value supplied by the caller.

pub mod calculations;
pub mod catalog;
pub mod models;

#[cfg(test)]
mod fixtures;

pub use calculations::{SimulationError, Simulator};
pub use models::*;
