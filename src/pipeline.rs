//! The bootstrap stage machine.
//!
//! Stages run strictly one after another, each blocking until its child exits.
//! The first stage with a non-zero exit ends the run; nothing is checkpointed,
//! so a failed build starts again from the top.

use crate::command::{Confirmation, ExitCode};
use crate::config::Config;
use crate::error::BootstrapError;
use crate::external::ProcessRunner;
use crate::prompt::Confirm;
use crate::stage::{PipelineOutcome, Stage};
use anyhow::{Context, Result};
use std::fs;
use tracing::{info, warn};

pub const CLONE_HOST_COMPILER: &str = "clone-host-compiler";
pub const BUILD_HOST_COMPILER: &str = "build-host-compiler";
pub const HOST_COMPILE: &str = "host-compile";
pub const PUBLISH_STDLIB: &str = "publish-stdlib";
pub const REGENERATE_ENTRY_SOURCE: &str = "regenerate-entry-source";

pub struct Pipeline<'a> {
    config: &'a Config,
    runner: &'a mut dyn ProcessRunner,
    gate: &'a mut dyn Confirm,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        runner: &'a mut dyn ProcessRunner,
        gate: &'a mut dyn Confirm,
    ) -> Self {
        Self {
            config,
            runner,
            gate,
        }
    }

    /// Run the whole bootstrap.
    ///
    /// A declined clone is an `Err(BootstrapError::Declined)`; a failing stage is
    /// an outcome with `completed == false`.
    pub fn run(&mut self) -> Result<PipelineOutcome> {
        if !self.config.host_dir.exists() {
            let message = format!(
                "{} does not exist, would you like to clone it from {}?",
                self.config.host_dir.display(),
                self.config.host_remote
            );
            if self.gate.confirm(&message)? == Confirmation::Abort {
                warn!(dir = %self.config.host_dir.display(), "host compiler checkout declined");
                return Err(BootstrapError::declined().into());
            }
            let clone = clone_stage(self.config);
            let code = run_stage(&mut *self.runner, &clone)?;
            if code != 0 {
                return Ok(PipelineOutcome::failure(&clone, code));
            }
        }

        fs::create_dir_all(&self.config.output_dir).with_context(|| {
            format!("cannot create {}", self.config.output_dir.display())
        })?;

        run_stages(&mut *self.runner, &build_stages(self.config))
    }
}

/// Run `stages` in order, stopping at the first non-zero exit.
pub fn run_stages(runner: &mut dyn ProcessRunner, stages: &[Stage]) -> Result<PipelineOutcome> {
    for (i, stage) in stages.iter().enumerate() {
        info!("[{}/{}] {}", i + 1, stages.len(), stage.name);
        let code = run_stage(runner, stage)?;
        if code != 0 {
            return Ok(PipelineOutcome::failure(stage, code));
        }
    }
    Ok(PipelineOutcome::success())
}

pub fn run_stage(runner: &mut dyn ProcessRunner, stage: &Stage) -> Result<ExitCode> {
    runner
        .run(&stage.command, &stage.working_dir, stage.payload.as_ref())
        .with_context(|| format!("stage {} could not be run", stage.name))
}

/// `git clone` of the host-hosted compiler next to the main checkout.
pub fn clone_stage(config: &Config) -> Stage {
    let parent = config
        .host_dir
        .parent()
        .unwrap_or(&config.host_dir)
        .to_owned();
    let name = config
        .host_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Stage::inherited(
        CLONE_HOST_COMPILER,
        &format!("{} clone {} {}", config.git, config.host_remote, name),
        parent,
    )
}

/// Every stage after the host compiler checkout is known to exist.
pub fn build_stages(config: &Config) -> Vec<Stage> {
    let rounds = config.self_compile_rounds;
    let mut stages = Vec::with_capacity(4 + 2 * rounds);

    stages.push(Stage::inherited(
        BUILD_HOST_COMPILER,
        &format!("{} fatJar", config.gradle),
        &config.host_dir,
    ));
    stages.push(Stage::inherited(
        HOST_COMPILE,
        &format!(
            "{} -classpath {} {} {} {} {}",
            config.java,
            config.host_classpath(),
            config.host_stack,
            config.host_main_class,
            config.entry_source,
            config.output_dir.display()
        ),
        &config.root,
    ));
    stages.push(Stage::scripted(
        PUBLISH_STDLIB,
        &self_compiler(config, &config.entry_source),
        &config.root,
        format!("!(mpm-put {})", local_file(&config.stdlib)),
    ));
    for round in 1..=rounds {
        stages.push(self_compile(config, format!("self-compile-{round}"), &config.entry_source));
    }
    stages.push(Stage::scripted(
        REGENERATE_ENTRY_SOURCE,
        &self_compiler(config, &config.source),
        &config.root,
        format!(
            "!(desugar-file {} {})",
            local_file(&config.source),
            local_file(&config.entry_source)
        ),
    ));
    for round in 1..=rounds {
        stages.push(self_compile(config, format!("recompile-{round}"), &config.source));
    }
    stages
}

/// The self-hosted compiler running `input` from the repository root.
pub fn self_compiler(config: &Config, input: &str) -> String {
    format!(
        "{} -classpath {} {} {} {}",
        config.java,
        config.self_classpath(),
        config.self_stack,
        config.self_main_class,
        input
    )
}

fn self_compile(config: &Config, name: String, input: &str) -> Stage {
    Stage::inherited(
        name,
        &format!("{} {}", self_compiler(config, input), config.output_dir.display()),
        &config.root,
    )
}

fn local_file(name: &str) -> String {
    format!("(file.child file.local-file (symbol {name}))")
}
