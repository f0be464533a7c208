//! Photon-diffusion model implementations.
//!
//! Models are implemented as small, pure functions so that the fitting code
//! can stay generic:
//!
//! - `diffusion` holds the closed-form reflectance / attenuation /
//!   attenuation-slope expressions for both boundary-condition families
//! - `select` resolves a `(boundary, quantity, separation)` choice to a
//!   concrete model and evaluates it over a spectrum

pub mod diffusion;
pub mod select;

pub use diffusion::*;
pub use select::*;
