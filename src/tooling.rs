//! Tooling
//!
//! Command-line inspection of asset exports: which attributes bind to which
//! protocol configuration, and which links cannot resolve.

pub mod cli;

pub use cli::{Cli, CliContext, CommandOutput, Commands};
