//! Spectral utilities shared by the fitting and linear pathways.
//!
//! - attenuation spectra from raw intensities and their slope across
//!   detector distances (`attenuation`)
//! - the diffusion-theory differential pathlength factor (`dpf`)

pub mod attenuation;
pub mod dpf;

pub use attenuation::*;
pub use dpf::*;
