use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{BufRead, IsTerminal, Write};

/// Scripted command fed to a child's standard input.
///
/// The payload is always followed by a blank line, the terminator the
/// self-hosted compiler waits for before it evaluates the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(String);

impl Payload {
    pub const TERMINATOR: &'static str = "\n\n";

    pub fn new(command: impl Into<String>) -> Self {
        Self(command.into())
    }

    pub fn command(&self) -> &str {
        &self.0
    }

    /// Exact bytes written to the child.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.0.len() + Self::TERMINATOR.len());
        bytes.extend_from_slice(self.0.as_bytes());
        bytes.extend_from_slice(Self::TERMINATOR.as_bytes());
        bytes
    }

    /// Write the payload and its terminator, then flush.
    pub fn write_to(&self, out: &mut dyn Write) -> std::io::Result<()> {
        out.write_all(&self.to_bytes())?;
        out.flush()
    }
}

/// Source of answers for the confirmation gate.
pub trait LineSource {
    /// Show `prompt` and read one line. `None` means end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Print a notice between prompts.
    fn notice(&mut self, message: &str) -> Result<()>;
}

/// Standard input of the orchestrator.
///
/// On a terminal the line editor owns the prompt. When stdin is redirected
/// the editor would not echo it, so lines are read plainly and the prompt is
/// written to stdout.
pub enum Terminal {
    Interactive(DefaultEditor),
    Piped(Lines<Box<dyn BufRead>, Box<dyn Write>>),
}

impl Terminal {
    pub fn new() -> Result<Self> {
        Self::detect(std::io::stdin().is_terminal())
    }

    fn detect(interactive: bool) -> Result<Self> {
        if interactive {
            Ok(Self::Interactive(DefaultEditor::new()?))
        } else {
            Ok(Self::piped(
                Box::new(std::io::stdin().lock()),
                Box::new(std::io::stdout()),
            ))
        }
    }

    pub fn piped(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        Self::Piped(Lines::new(input, output))
    }
}

impl LineSource for Terminal {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self {
            Self::Interactive(editor) => match editor.readline(prompt) {
                Ok(line) => Ok(Some(line)),
                // Ctrl-C and Ctrl-D both count as "no".
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
                Err(err) => Err(err.into()),
            },
            Self::Piped(lines) => lines.read_line(prompt),
        }
    }

    fn notice(&mut self, message: &str) -> Result<()> {
        match self {
            Self::Interactive(_) => {
                println!("{message}");
                Ok(())
            }
            Self::Piped(lines) => lines.notice(message),
        }
    }
}

/// Line source over arbitrary buffered input and output.
pub struct Lines<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Lines<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> LineSource for Lines<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn notice(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{message}")?;
        Ok(())
    }
}
