//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and the subcommand enum.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// wizardpro - resumable multi-phase project generation
#[derive(Parser, Debug)]
#[command(name = "wizardpro")]
#[command(about = "Drive a resumable LLM pipeline from a request to deployable code")]
#[command(long_about = r#"
wizardpro turns a free-text project request into requirements, an
architecture, generated code, test findings and deployment notes. Each
phase is persisted as it finishes, so an interrupted or paused run picks
up where it stopped.

EXAMPLES:
  # Start a run from an argument
  wizardpro start "A CLI todo manager with SQLite storage"

  # Start a run from stdin with a fixed id and a wrapper
  echo "A URL shortener" | wizardpro start --run-id shortener --wrapper security

  # Answer the questions a paused run asked
  wizardpro resume shortener --input "Single user, no auth needed"

  # Inspect a run and its event log
  wizardpro status shortener --events

  # List every saved run as JSON
  wizardpro list --json

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  The config file is $WIZARDPRO_HOME/config.toml, or .wizardpro/config.toml
  found by searching upward from CWD. Use --config for an explicit path.

PHASES:
  Requirements → Architecture → CodeGeneration → Testing → Deployment
  Requirements may pause the run to ask questions; resume with --input.
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Model used by every phase without its own override
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Directory holding saved run state
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    /// Attempts per generation call, including the first
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a new run and drive it until it completes, pauses or fails
    ///
    /// EXAMPLES:
    ///   wizardpro start "A markdown blog engine"
    ///   cat request.txt | wizardpro start --run-id blog
    Start {
        /// Project request; read from stdin when omitted
        request: Option<String>,

        /// Run id to use instead of a generated one
        #[arg(long)]
        run_id: Option<String>,

        /// Wrapper names carried with the run and applied to every prompt
        #[arg(long = "wrapper")]
        wrappers: Vec<String>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Continue a saved run, optionally answering its pending questions
    Resume {
        /// Run to continue
        run_id: String,

        /// Answer for a run waiting on user input
        #[arg(long)]
        input: Option<String>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a saved run without executing anything
    Status {
        /// Run to inspect
        run_id: String,

        /// Also print the event log
        #[arg(long)]
        events: bool,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List saved runs
    List {
        /// Print summaries as a JSON array
        #[arg(long)]
        json: bool,
    },
}

/// Build the clap command, for completion generation and tests
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
