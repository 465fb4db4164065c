//! Command implementations.

mod run;
mod validate;

pub use run::run_simulation;
pub use validate::run_validate;
