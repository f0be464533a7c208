//! `nirs-curves` library crate.
//!
//! Computes tissue oxygen saturation (StO2) and chromophore concentrations
//! from broadband near-infrared spectroscopy measurements:
//!
//! - photon-diffusion models (zero / extrapolated boundary conditions) fit
//!   against measured attenuation-slope spectra (`models`, `fit`)
//! - linear concentration solvers: Modified Beer-Lambert and spatially
//!   resolved spectroscopy (`mbl`)
//! - spectral utilities: attenuation spectra, slope regression, pathlength
//!   factors (`spectra`)
//!
//! The crate is a pure computation library: it is invoked with in-memory
//! arrays and enumerated option values, and it never mutates caller-owned
//! inputs. Each fit is an independent, stateless function of its inputs, so
//! fits may run in parallel (see `fit::fit_tissue_series`).

pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod mbl;
pub mod models;
pub mod spectra;
