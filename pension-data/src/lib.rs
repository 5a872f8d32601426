//! Policy table loading.
//!
//! Tables are plain CSV files and the scalar parameters a TOML file, so
//! new yearly figures can be published without touching code.

mod loader;

pub use loader::{
    CONTRIBUTION_SCALE_FILE, EARLY_COEFFICIENTS_FILE, EarlyCoefficientRecord, ORDINARY_AGE_FILE,
    PARAMETERS_FILE, PENSION_LIMITS_FILE, PolicyLoader, PolicyLoaderError, ScaleBracketRecord,
};
