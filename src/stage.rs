use crate::command::{CommandLine, ExitCode};
use crate::error::BootstrapError;
use crate::io_adapters::Payload;
use std::path::PathBuf;

/// One external-process invocation of the bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: String,
    pub command: CommandLine,
    pub working_dir: PathBuf,
    /// Scripted input; `None` means the child shares our standard streams.
    pub payload: Option<Payload>,
}

impl Stage {
    /// A stage with inherited streams.
    ///
    /// `command` is split on whitespace, see [`CommandLine::parse`].
    pub fn inherited(
        name: impl Into<String>,
        command: &str,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            command: CommandLine::parse(command),
            working_dir: working_dir.into(),
            payload: None,
        }
    }

    /// A stage fed `payload` on its standard input.
    pub fn scripted(
        name: impl Into<String>,
        command: &str,
        working_dir: impl Into<PathBuf>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            payload: Some(Payload::new(payload)),
            ..Self::inherited(name, command, working_dir)
        }
    }
}

/// Result of one pipeline run. Never modified once the run has ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub completed: bool,
    pub failed_stage: Option<String>,
    pub failed_command: Option<String>,
    pub exit_code: Option<ExitCode>,
}

impl PipelineOutcome {
    pub(crate) fn success() -> Self {
        Self {
            completed: true,
            failed_stage: None,
            failed_command: None,
            exit_code: None,
        }
    }

    pub(crate) fn failure(stage: &Stage, code: ExitCode) -> Self {
        Self {
            completed: false,
            failed_stage: Some(stage.name.clone()),
            failed_command: Some(stage.command.to_string()),
            exit_code: Some(code),
        }
    }

    /// Turn a failed outcome into the error reported to the user.
    pub fn into_result(self) -> Result<(), BootstrapError> {
        if self.completed {
            return Ok(());
        }
        Err(BootstrapError::StageFailed {
            stage: self.failed_stage.unwrap_or_default(),
            command: self.failed_command.unwrap_or_default(),
            code: self.exit_code.unwrap_or(-1),
        })
    }
}
