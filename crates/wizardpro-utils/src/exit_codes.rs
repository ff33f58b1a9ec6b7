//! Exit code constants for the wizardpro CLI.
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Run completed, or paused waiting for user input |
//! | 1 | `INTERNAL` | Internal failure, or the run ended in `Error` |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 3 | `RUN_NOT_FOUND` | No persisted state for the requested run id |
//! | 9 | `RUN_BUSY` | Run already in progress or already exists |

/// Exit codes matching the documented exit code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - run completed or paused for input
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error, or the run halted in `Error`
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments or configuration error
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Resume requested for a run id with no persisted state
    pub const RUN_NOT_FOUND: ExitCode = ExitCode(3);

    /// Run is already being driven, or a fresh start reused an existing id
    pub const RUN_BUSY: ExitCode = ExitCode(9);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values_are_stable() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::INTERNAL.as_i32(), 1);
        assert_eq!(ExitCode::CLI_ARGS.as_i32(), 2);
        assert_eq!(ExitCode::RUN_NOT_FOUND.as_i32(), 3);
        assert_eq!(ExitCode::RUN_BUSY.as_i32(), 9);
    }

    #[test]
    fn test_exit_code_conversions() {
        assert_eq!(ExitCode::from(3), ExitCode::RUN_NOT_FOUND);
        assert_eq!(i32::from(ExitCode::RUN_BUSY), 9);
        assert_eq!(ExitCode::from_i32(0), ExitCode::SUCCESS);
    }
}
