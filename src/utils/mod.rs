//! Utility modules

pub mod address;
pub mod constants;

pub use address::*;
pub use constants::*;
