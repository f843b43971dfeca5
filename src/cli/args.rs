//! CLI argument definitions using clap
//!
//! Commands:
//! - divforms init --config <path>
//! - divforms serve --config <path>
//! - divforms check-config --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// divforms - multi-tenant, schema-versioned form backend
#[derive(Parser, Debug)]
#[command(name = "divforms")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default configuration file
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./divforms.json")]
        config: PathBuf,
    },

    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./divforms.json")]
        config: PathBuf,
    },

    /// Validate a configuration file and print the effective settings
    CheckConfig {
        /// Path to configuration file
        #[arg(long, default_value = "./divforms.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
