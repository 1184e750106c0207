//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod extract;
mod rewrite;
mod session;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::llm::LlmClient;

#[derive(Parser)]
#[command(name = "docwash")]
#[command(about = "Extract document text and rewrite it with an LLM")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and print the text of a document
    Extract {
        /// Document to read (txt, pdf, docx, png, jpg)
        file: PathBuf,
        /// Declared MIME type (default: guessed from name and content)
        #[arg(long)]
        mime: Option<String>,
        /// Print method, page count and text as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract, rewrite, apply instructions and export in one go
    Rewrite {
        /// Document to read (txt, pdf, docx, png, jpg)
        file: PathBuf,
        /// Declared MIME type (default: guessed from name and content)
        #[arg(long)]
        mime: Option<String>,
        /// Extra instruction applied after the baseline rewrite (repeatable, in order)
        #[arg(short, long = "instruction")]
        instructions: Vec<String>,
        /// Output DOCX path (default: export filename from config)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the final text instead of only writing the DOCX
        #[arg(long)]
        print: bool,
    },

    /// Interactive rewrite session for one document
    Session {
        /// Document to read (txt, pdf, docx, png, jpg)
        file: PathBuf,
        /// Declared MIME type (default: guessed from name and content)
        #[arg(long)]
        mime: Option<String>,
        /// Output DOCX path (default: export filename from config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check external tools, OCR backend and API credential
    Check {
        /// Also call the API to list available models
        #[arg(long)]
        probe: bool,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_discover(cli.config.as_deref()).await?;

    if let Some(ref path) = config.source_path {
        tracing::debug!("Using config {}", path.display());
    }

    match cli.command {
        Commands::Extract { file, mime, json } => {
            extract::cmd_extract(&config, &file, mime.as_deref(), json).await
        }
        Commands::Rewrite {
            file,
            mime,
            instructions,
            output,
            print,
        } => {
            rewrite::cmd_rewrite(
                &config,
                &file,
                mime.as_deref(),
                &instructions,
                output.as_deref(),
                print,
            )
            .await
        }
        Commands::Session { file, mime, output } => {
            session::cmd_session(&config, &file, mime.as_deref(), output.as_deref()).await
        }
        Commands::Check { probe } => check::cmd_check(&config, probe).await,
    }
}

/// Build the chat client, failing early when no credential is configured.
fn llm_client(config: &Config) -> anyhow::Result<LlmClient> {
    if !config.llm.has_api_key() {
        return Err(crate::llm::LlmError::MissingApiKey.into());
    }
    Ok(LlmClient::new(config.llm.clone())?)
}
