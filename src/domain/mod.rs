//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - model-selection enums (`BoundaryType`, `QuantityType`)
//! - the fitted parameter vector (`Coefficients`) and its search box
//!   (`Boundaries`)
//! - the extinction-coefficient table (`ExtinctionTable`)
//! - fit outputs (`TissueFit`)

pub mod types;

pub use types::*;
