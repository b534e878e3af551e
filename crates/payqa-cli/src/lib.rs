//! payqa CLI library.
//!
//! This library provides the core functionality for the payqa command-line interface,
//! including configuration loading, backend construction, command execution, and
//! output formatting.

pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::AppConfig;
pub use error::{CliError, Result};
pub use output::Formatter;
