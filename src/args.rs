use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// AI-powered codebase critique: scores, strengths, weaknesses and security
/// findings from a completion endpoint.
#[derive(Parser, Debug)]
#[command(name = "codecritic")]
#[command(about = "Send code to an AI model and print its structured critique")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze code from a file (or stdin) and print the critique
    Analyze {
        /// File to analyze; reads stdin when omitted or set to "-"
        path: Option<PathBuf>,
        /// Model identifier, overriding config and environment for this run
        #[arg(long)]
        model: Option<String>,
        /// API key, overriding config and environment for this run
        #[arg(long)]
        api_key: Option<String>,
        /// Output format: json or text
        #[arg(long, default_value = "json")]
        format: String,
        /// Proceed even when the input looks like it contains secrets
        #[arg(long)]
        allow_secrets: bool,
    },
    /// Scan input for secret-shaped strings without calling the model
    Scan {
        /// File to scan; reads stdin when omitted or set to "-"
        path: Option<PathBuf>,
    },
}
