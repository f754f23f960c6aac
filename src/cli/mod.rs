//! Command-line interface for the ragqa-server binary.
//!
//! Parsing uses clap; terminal output goes through [`output::Output`].

pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ragqa - RAG-powered multi-tool Q&A assistant
///
/// An LLM agent with encyclopedia, calculator and documentation search tools,
/// served behind a single-page web form and a JSON API.
#[derive(Parser, Debug)]
#[command(
    name = "ragqa-server",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "ragqa - RAG-powered multi-tool Q&A assistant",
    after_help = "EXAMPLES:\n    \
                  ragqa-server init                       # Write a default ragqa.toml\n    \
                  ragqa-server                            # Start the server\n    \
                  ragqa-server ask \"What is LangSmith?\"   # Answer one query and exit\n    \
                  ragqa-server config --validate          # Check the configuration"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "ragqa.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (the default)
    Serve {
        /// Override the configured host
        #[arg(long)]
        host: Option<String>,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Answer a single query and print the result
    Ask {
        /// The question to answer
        query: String,

        /// API key for this query; falls back to the configured environment variable
        #[arg(long)]
        api_key: Option<String>,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show configuration information
    Config {
        /// Print the full resolved configuration as TOML
        #[arg(short = 'f', long)]
        full: bool,

        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },

    /// Write a default ragqa.toml and .env.example
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// Host address for the server
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the server
        #[arg(long, default_value = "3000")]
        port: u16,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
