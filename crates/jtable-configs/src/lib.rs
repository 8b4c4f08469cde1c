//! jtable-configs
//!
//! Configuration types and loader for the JSON table engine.

pub mod config;

pub use config::*;
pub use config::defaults;
