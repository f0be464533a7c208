//! Input/output helpers.
//!
//! - extinction-coefficient / defaults table loading (`defaults`)
//! - fit-result JSON export and reload (`export`)

pub mod defaults;
pub mod export;

pub use defaults::*;
pub use export::*;
