use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{ENV_CONFIG, ENV_DEBUG, ENV_FIELDS, ENV_HOST, ENV_PORT};

/// Input path meaning standard input
pub const STDIN_PATH: &str = "-";

#[derive(Parser)]
#[command(name = "elastic-builder")]
#[command(version, about = "Filter tree / search query codec", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Enable debug mode (logs every decoded and encoded document)
    #[arg(long, global = true, env = ENV_DEBUG)]
    pub debug: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Path to a FieldMap JSON file (overrides the config file)
    #[arg(long, short = 'f', global = true, env = ENV_FIELDS)]
    pub fields: Option<PathBuf>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// Decode a query document into a filter tree
    Decode {
        /// Query JSON file, or `-` for stdin
        #[arg(default_value = STDIN_PATH)]
        input: String,
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
    /// Encode a filter tree document into a query
    Encode {
        /// Filter tree JSON file, or `-` for stdin
        #[arg(default_value = STDIN_PATH)]
        input: String,
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub debug: bool,
    pub config: Option<PathBuf>,
    pub fields: Option<PathBuf>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        debug: cli.debug,
        config: cli.config,
        fields: cli.fields,
    };
    (config, cli.command)
}
