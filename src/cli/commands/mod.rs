//! CLI command implementations (facade).
//!
//! This module re-exports the command surface used by `run.rs`.
//! Implementations live in `commands/*`.

mod common;
mod json_emit;
mod list;
mod resume;
mod start;
mod status;

pub use list::execute_list_command;
pub use resume::execute_resume_command;
pub use start::execute_start_command;
pub use status::execute_status_command;
