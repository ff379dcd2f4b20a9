//! Background housekeeping tasks.

pub mod token_sweep;

pub use token_sweep::TokenSweeper;
