use std::path::PathBuf;

/// CLI arguments that take part in configuration precedence.
///
/// Every field is optional; `None` leaves the file or default value in place.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub model: Option<String>,
    pub state_dir: Option<PathBuf>,
    pub verbose: Option<bool>,
    pub max_attempts: Option<u32>,
}
