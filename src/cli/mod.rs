//! CLI module for divforms
//!
//! Provides command-line interface for:
//! - init: Write a default configuration file
//! - serve: Boot the service and serve HTTP
//! - check-config: Validate configuration

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{bootstrap_superadmin, check_config, init, run, run_command, serve};
pub use config::{BootstrapAdmin, Config, JwtSettings, JWT_SECRET_ENV};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_response, write_response_to};
