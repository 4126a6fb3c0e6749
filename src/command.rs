use std::fmt;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// An executable plus its ordered argument list.
///
/// Command lines are assembled as strings and split on whitespace, so an
/// argument can never contain internal whitespace. Paths fed into a command
/// line (output directory, host artifact, ...) must not contain spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    /// Split `line` on whitespace; the first word is the program.
    ///
    /// A blank line yields an empty program, which no runner can resolve.
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace().map(str::to_owned);
        Self {
            program: words.next().unwrap_or_default(),
            args: words.collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Answer of the confirmation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Proceed,
    Abort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_whitespace() {
        let cmd = CommandLine::parse("java  -classpath a:b\t-Xss16m mc");
        assert_eq!(cmd.program(), "java");
        assert_eq!(cmd.args(), ["-classpath", "a:b", "-Xss16m", "mc"]);
        assert_eq!(cmd.to_string(), "java -classpath a:b -Xss16m mc");
    }

    #[test]
    fn parse_blank_line_has_empty_program() {
        let cmd = CommandLine::parse("   ");
        assert_eq!(cmd.program(), "");
        assert!(cmd.args().is_empty());
    }

    #[test]
    fn quoted_whitespace_is_not_preserved() {
        let cmd = CommandLine::parse("git clone \"my dir\"");
        assert_eq!(cmd.args(), ["clone", "\"my", "dir\""]);
    }
}
