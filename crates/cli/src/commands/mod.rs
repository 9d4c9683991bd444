//! Command implementations.

mod check;
mod export;
mod info;
mod normalize;
mod prepare;
mod train;

pub use check::run_check;
pub use export::run_export;
pub use info::run_info;
pub use normalize::run_normalize;
pub use prepare::run_prepare;
pub use train::run_train;
