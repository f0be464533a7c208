//! Linear concentration solvers.
//!
//! Two pathways that avoid nonlinear fitting entirely:
//!
//! - `ucln`: Modified Beer-Lambert concentration changes from attenuation
//!   changes (extinction pseudo-inverse, pathlength-factor scaling)
//! - `srs`: spatially resolved spectroscopy, absolute StO2 from the
//!   attenuation slope across detector distances

pub mod srs;
pub mod ucln;

pub use srs::*;
pub use ucln::*;
