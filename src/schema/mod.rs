//! Schema module - Configuration and frame types.

mod config;
mod frame;

pub use config::*;
pub use frame::*;
