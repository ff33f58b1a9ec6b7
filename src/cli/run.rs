//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Builds CliArgs and discovers Config
//! - Initializes tracing
//! - Creates the tokio runtime
//! - Dispatches to command handlers
//! - Handles all error output

use clap::Parser;

use wizardpro_config::{CliArgs, Config};
use wizardpro_utils::error::{ConfigError, render_report};
use wizardpro_utils::exit_codes::ExitCode;
use wizardpro_utils::logging::init_tracing;

use super::args::{Cli, Commands};
use super::commands;
use crate::error::WizardError;

/// Main CLI execution function.
///
/// Handles ALL output including errors. On failure the report has
/// already been printed and the returned `ExitCode` is all `main` needs.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        model: cli.model.clone(),
        state_dir: cli.state_dir.clone(),
        verbose: cli.verbose.then_some(true),
        max_attempts: cli.max_attempts,
    };

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            match err.downcast_ref::<ConfigError>() {
                Some(config_err) => eprintln!("{}", render_report(config_err)),
                None => eprintln!("✗ Failed to load configuration: {err:#}"),
            }
            return Err(ExitCode::CLI_ARGS);
        }
    };

    if let Err(e) = init_tracing(config.verbose()) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let result = rt.block_on(async {
        match cli.command {
            Commands::Start {
                request,
                run_id,
                wrappers,
                json,
            } => {
                commands::execute_start_command(request, run_id.as_deref(), wrappers, json, &config)
                    .await
            }
            Commands::Resume {
                run_id,
                input,
                json,
            } => commands::execute_resume_command(&run_id, input, json, &config).await,
            Commands::Status {
                run_id,
                events,
                json,
            } => commands::execute_status_command(&run_id, events, json, &config),
            Commands::List { json } => commands::execute_list_command(json, &config),
        }
    });

    if let Err(error) = result {
        if let Some(wizard_error) = error.downcast_ref::<WizardError>() {
            eprintln!("{}", render_report(wizard_error));
            return Err(wizard_error.exit_code());
        }
        eprintln!("✗ Unexpected error: {error:#}");
        eprintln!("\n  Run with --verbose for more detailed output");
        return Err(ExitCode::INTERNAL);
    }

    Ok(())
}
