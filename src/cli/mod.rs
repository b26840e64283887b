//! CLI module for Primer.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Primer - ask questions about a PDF or a YouTube lecture
///
/// Ingests one document at a time into a local vector index and answers
/// questions about it with a language model.
#[derive(Parser, Debug)]
#[command(name = "primer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "PRIMER_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Index a local PDF, replacing the current document
    Upload {
        /// Path to the PDF file
        path: String,
    },

    /// Index a YouTube video's transcript, replacing the current document
    AddYoutube {
        /// Video URL (watch, youtu.be, shorts, embed or live link)
        url: String,
    },

    /// Ask a question about the current document
    Ask {
        /// The question to ask
        question: String,
    },

    /// Show what is currently indexed
    Status,

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

impl Commands {
    /// Whether this command runs the long-lived server.
    pub fn is_server(&self) -> bool {
        matches!(self, Commands::Serve { .. })
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "llm.model")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Show configuration file path
    Path,
}
