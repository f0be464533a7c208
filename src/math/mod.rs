//! Mathematical utilities: smoothing, wavelength windowing, least squares
//! and spline interpolation.

pub mod ols;
pub mod smooth;
pub mod spline;
pub mod window;

pub use ols::*;
pub use smooth::*;
pub use spline::*;
pub use window::*;
