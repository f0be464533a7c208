//! Nonlinear derivative fitting.
//!
//! Responsibilities:
//!
//! - box-constrained Nelder-Mead minimization via variable transforms
//!   (`bounded`)
//! - the derivative objective evaluated at each candidate parameter vector
//!   (`objective`)
//! - fit orchestration: smoothing, optimization, StO2 and fit-quality
//!   derivation (`fitter`)

pub mod bounded;
pub mod fitter;
pub mod objective;

pub use bounded::*;
pub use fitter::*;
pub use objective::*;
