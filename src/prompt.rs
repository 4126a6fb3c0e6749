use crate::command::Confirmation;
use crate::io_adapters::LineSource;
use anyhow::Result;
use tracing::debug;

/// Blocking yes/no question guarding an irreversible or network-bound step.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> Result<Confirmation>;
}

/// Asks `message [y/n]: ` until it gets a recognized answer.
///
/// Input is trimmed and case-folded. `y`/`yes` proceed; `n`/`no`, an empty line
/// and end of input abort. Anything else prints a notice and asks again,
/// without limit.
pub struct ConfirmationGate<S> {
    source: S,
}

impl<S: LineSource> ConfirmationGate<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: LineSource> Confirm for ConfirmationGate<S> {
    fn confirm(&mut self, message: &str) -> Result<Confirmation> {
        let prompt = format!("{message} [y/n]: ");
        loop {
            let answer = self
                .source
                .read_line(&prompt)?
                .map(|line| line.trim().to_lowercase())
                .unwrap_or_else(|| "n".to_owned());
            match answer.as_str() {
                "y" | "yes" => return Ok(Confirmation::Proceed),
                "n" | "no" | "" => return Ok(Confirmation::Abort),
                other => {
                    debug!(answer = other, "unrecognized confirmation answer");
                    self.source.notice("Expected [y/n]")?;
                }
            }
        }
    }
}
