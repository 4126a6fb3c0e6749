use crate::config::Config;
use crate::error::BootstrapError;
use crate::external::ProcessRunner;
use crate::pipeline::{Pipeline, run_stage, run_stages, self_compiler};
use crate::prompt::Confirm;
use crate::stage::Stage;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

pub const HELP: &str = "\
mc help  -- Displays this help message
mc clean -- Cleans the M compiler
mc build -- Builds the M compiler
mc repl  -- Builds the M compiler and launches the M repl
mc test  -- Builds the M compiler and runs its tests
";

/// Top-level subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Clean,
    Build,
    Repl,
    Test,
}

impl Command {
    pub fn name(self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::Clean => "clean",
            Command::Build => "build",
            Command::Repl => "repl",
            Command::Test => "test",
        }
    }
}

impl FromStr for Command {
    type Err = BootstrapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "help" => Command::Help,
            "clean" => Command::Clean,
            "build" => Command::Build,
            "repl" => Command::Repl,
            "test" => Command::Test,
            other => {
                return Err(BootstrapError::UnknownCommand {
                    name: other.to_owned(),
                });
            }
        })
    }
}

/// Maps a subcommand onto the bootstrap pipeline and its follow-up stages.
///
/// The runner and the gate are injected so the whole command surface can be
/// driven without spawning anything.
pub struct Dispatcher<R, C> {
    config: Config,
    runner: R,
    gate: C,
}

impl<R: ProcessRunner, C: Confirm> Dispatcher<R, C> {
    pub fn new(config: Config, runner: R, gate: C) -> Self {
        Self {
            config,
            runner,
            gate,
        }
    }

    #[cfg(test)]
    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn runner(&self) -> &R {
        &self.runner
    }

    #[cfg(test)]
    pub(crate) fn gate(&self) -> &C {
        &self.gate
    }

    /// Execute `command`; `out` receives the help text.
    pub fn dispatch(&mut self, command: Command, out: &mut dyn Write) -> Result<()> {
        info!(command = command.name(), "dispatching");
        match command {
            Command::Help => help(out),
            Command::Clean => self.clean(),
            Command::Build => self.build(),
            Command::Repl => self.repl(),
            Command::Test => self.test(),
        }
    }

    /// Remove build output and cached packages, then clean the host compiler.
    ///
    /// Anything already missing is skipped, so cleaning a clean tree succeeds.
    pub fn clean(&mut self) -> Result<()> {
        let output_dir = &self.config.output_dir;
        if output_dir.exists() {
            info!("Removing {}", output_dir.display());
            fs::remove_dir_all(output_dir)
                .with_context(|| format!("cannot remove {}", output_dir.display()))?;
        }

        let cache = &self.config.package_cache;
        if cache.is_dir() {
            info!("Removing contents of {}", cache.display());
            clear_dir(cache)?;
        }

        if self.config.host_dir.is_dir() {
            info!("Cleaning {}", self.config.host_dir.display());
            run_stages(&mut self.runner, &[clean_host_stage(&self.config)])?.into_result()?;
        } else {
            info!(dir = %self.config.host_dir.display(), "host compiler checkout missing, nothing to clean");
        }
        Ok(())
    }

    pub fn build(&mut self) -> Result<()> {
        Pipeline::new(&self.config, &mut self.runner, &mut self.gate)
            .run()?
            .into_result()?;
        info!("Build finished");
        Ok(())
    }

    pub fn repl(&mut self) -> Result<()> {
        self.build()?;
        let code = run_stage(&mut self.runner, &repl_stage(&self.config))?;
        if code != 0 {
            return Err(BootstrapError::ReplFailed { code }.into());
        }
        Ok(())
    }

    pub fn test(&mut self) -> Result<()> {
        self.build()?;
        info!("Running tests");
        run_stages(&mut self.runner, &[test_stage(&self.config)])?.into_result()?;
        Ok(())
    }
}

pub fn help(out: &mut dyn Write) -> Result<()> {
    out.write_all(HELP.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Host build tool's clean step, run inside the host checkout.
pub fn clean_host_stage(config: &Config) -> Stage {
    Stage::inherited("clean-host-compiler", &format!("{} clean", config.gradle), &config.host_dir)
}

/// Interactive session of the freshly built compiler on its own source.
pub fn repl_stage(config: &Config) -> Stage {
    Stage::inherited("repl", &self_compiler(config, &config.source), &config.root)
}

/// The compiler's self-test suite, requested on its standard input.
pub fn test_stage(config: &Config) -> Stage {
    Stage::scripted("test", &self_compiler(config, &config.source), &config.root, "!mc-test")
}

fn clear_dir(dir: &Path) -> Result<()> {
    let entries = fs::read_dir(dir).with_context(|| format!("cannot list {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let removed = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.with_context(|| format!("cannot remove {}", path.display()))?;
    }
    Ok(())
}
