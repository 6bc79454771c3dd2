//! Side-effecting operations: configuration loading and process spawning.

pub mod config;
pub mod process;
