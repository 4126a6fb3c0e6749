//! Terminal conditions of a bootstrap run.
//!
//! Anything else that goes wrong (filesystem access, spawn failures) travels as a
//! plain `anyhow::Error` and is reported with its full context chain.

use crate::command::ExitCode;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BootstrapError {
    #[error("{message}")]
    Declined { message: String },

    #[error("Stage {stage}: command `{command}` failed with exit code {code}")]
    StageFailed {
        stage: String,
        command: String,
        code: ExitCode,
    },

    #[error("REPL failed with exit code {code}")]
    ReplFailed { code: ExitCode },

    #[error("command not found: {program}")]
    CommandNotFound { program: String },

    #[error("unknown command `{name}`, expected one of: help, clean, build, repl, test")]
    UnknownCommand { name: String },

    #[error("{message}")]
    Usage { message: String },
}

impl BootstrapError {
    pub fn declined() -> Self {
        BootstrapError::Declined {
            message: "Terminating build".to_owned(),
        }
    }
}

/// How the process ends after a failure: what goes to stderr and with which status.
///
/// Every failure, a declined confirmation included, ends through here. The
/// status is 0 unless strict exit was requested, in which case it is 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abort {
    pub message: String,
    pub status: u8,
}

impl Abort {
    pub const NEUTRAL: u8 = 0;
    pub const FAILED: u8 = 1;

    /// Expected conditions print their message; anything else prints the full
    /// context chain.
    pub fn from_error(err: &anyhow::Error, strict: bool) -> Self {
        let message = match err.downcast_ref::<BootstrapError>() {
            Some(err) => err.to_string(),
            None => format!("{err:?}"),
        };
        Self {
            message,
            status: if strict { Self::FAILED } else { Self::NEUTRAL },
        }
    }
}
